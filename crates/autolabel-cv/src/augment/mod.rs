//! Rejection-sampling generation of augmented samples from a labeled corpus

pub mod config;
pub mod corpus;
pub mod driver;

pub use config::{AugmentConfig, CorpusPaths};
pub use corpus::{Corpus, SourceImage};
pub use driver::{AbandonCounts, AugmentationDriver, OutputPair, RunReport};
