use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::similarity::SimilarityEngine;
use crate::core::store;

/// What the alarm controller should do after a pair was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSignal {
    /// A pair matched; the alarm can stop. Sent at most once per pass.
    StopAlarm,
    /// A pair did not match. Sent for every non-matching pair, so a
    /// single pass can emit this many times.
    NoMatch,
}

pub type SignalCallback = Box<dyn Fn(AlarmSignal) + Send + Sync>;

/// Aggregate outcome of one comparison pass.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Qualifying photos found when the pass started.
    pub listed: usize,
    /// Pairs scored; always every unordered pair over the listing.
    pub pairs_compared: usize,
    /// Whether any pair met the similarity threshold.
    pub matched: bool,
    /// Files removed during the pass.
    pub deleted: Vec<PathBuf>,
    /// The survivor, when the pass had at least one pair to score.
    pub kept: Option<PathBuf>,
}

/// Runs the capture-directory comparison pass.
///
/// A pass snapshots the directory listing once, scores every unordered
/// pair through the [`SimilarityEngine`], and deletes the second file of
/// each pair right after scoring it, match or not. The first listed file
/// therefore meets every other file while it still exists and ends the
/// pass as the lone survivor; later pairs find their files already gone
/// and score as non-matches. The loop is kept in that literal shape on
/// purpose, see DESIGN.md.
pub struct SweepRunner {
    engine: SimilarityEngine,
}

impl SweepRunner {
    pub fn new() -> Self {
        Self {
            engine: SimilarityEngine::new(),
        }
    }

    /// Run one pass over `dir`. With fewer than two photos listed there
    /// is nothing to score and the directory is left untouched.
    pub fn run(&self, dir: &Path, signals: Option<&SignalCallback>) -> SweepReport {
        let images = store::list_images(dir);
        log::info!("Comparison pass over {} photo(s)", images.len());

        if images.len() < 2 {
            return SweepReport {
                listed: images.len(),
                pairs_compared: 0,
                matched: false,
                deleted: Vec::new(),
                kept: None,
            };
        }

        let mut deleted = Vec::new();
        let mut matched = false;
        let mut pairs_compared = 0;

        for i in 0..images.len() {
            for j in (i + 1)..images.len() {
                let first = &images[i];
                let second = &images[j];

                let similar = self.engine.images_similar(first, second);
                pairs_compared += 1;
                log::debug!(
                    "{} vs {}: {}",
                    first.display(),
                    second.display(),
                    if similar { "similar" } else { "not similar" }
                );

                // The second file of a scored pair is always removed,
                // match or not.
                match fs::remove_file(second) {
                    Ok(()) => deleted.push(second.clone()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        log::debug!("{} already removed", second.display());
                    }
                    Err(err) => {
                        log::warn!("Could not delete {}: {}", second.display(), err);
                    }
                }

                if similar {
                    if !matched {
                        matched = true;
                        if let Some(callback) = signals {
                            callback(AlarmSignal::StopAlarm);
                        }
                    }
                } else if let Some(callback) = signals {
                    callback(AlarmSignal::NoMatch);
                }
            }
        }

        log::info!(
            "Pass finished: {} pair(s), matched: {}, deleted: {}",
            pairs_compared,
            matched,
            deleted.len()
        );

        SweepReport {
            listed: images.len(),
            pairs_compared,
            matched,
            deleted,
            kept: Some(images[0].clone()),
        }
    }
}

impl Default for SweepRunner {
    fn default() -> Self {
        Self::new()
    }
}
