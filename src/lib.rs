pub mod config;
pub mod core;
pub mod history;

pub use crate::config::AlarmWindow;
pub use crate::core::similarity::{SIMILARITY_THRESHOLD, SimilarityEngine};
pub use crate::core::store::CaptureStore;
pub use crate::core::sweep::{AlarmSignal, SignalCallback, SweepReport, SweepRunner};
