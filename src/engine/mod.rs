pub mod classifier;
pub mod hangul;
pub mod pool;
pub mod scoring;
