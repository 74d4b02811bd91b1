pub mod similarity;
pub mod store;
pub mod sweep;

pub use similarity::SimilarityEngine;
pub use store::CaptureStore;
pub use sweep::SweepRunner;
