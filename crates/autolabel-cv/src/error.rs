//! Typed failures for each stage of an augmentation attempt.

use autolabel_core::LabelError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid pipeline construction or a transform that cannot be applied.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("non-finite parameter limit for '{0}'")]
    InvalidParameter(&'static str),

    #[error("choice group has no variant with a positive weight")]
    EmptyChoice,

    #[error("choice group mixes geometric and photometric variants")]
    MixedChoice,

    #[error("geometric step '{0}' is placed after a photometric step")]
    OutOfOrder(&'static str),

    #[error("{0} produced a non-invertible projection")]
    Singular(&'static str),

    #[error("border crop would leave a {width}x{height} image")]
    DegenerateCrop { width: u32, height: u32 },
}

/// Why a single augmentation attempt was abandoned.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("no label file at {0:?}")]
    MissingLabel(PathBuf),

    #[error("failed to decode image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("label file {0:?} lists no objects")]
    EmptyLabels(PathBuf),

    #[error("transform failed")]
    Transform(#[from] TransformError),

    #[error("no box survived filtering")]
    EmptyResult,

    #[error("failed to encode image {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counting category of an abandoned attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    MissingLabel,
    Decode,
    Label,
    EmptyLabels,
    Transform,
    EmptyResult,
    Io,
}

impl AbandonReason {
    /// Failures tied to the source files themselves; retrying the same
    /// source can never succeed.
    pub fn is_source_fault(self) -> bool {
        matches!(
            self,
            AbandonReason::MissingLabel
                | AbandonReason::Decode
                | AbandonReason::Label
                | AbandonReason::EmptyLabels
        )
    }
}

impl AttemptError {
    pub fn reason(&self) -> AbandonReason {
        match self {
            AttemptError::MissingLabel(_) => AbandonReason::MissingLabel,
            AttemptError::Decode { .. } => AbandonReason::Decode,
            AttemptError::Label(_) => AbandonReason::Label,
            AttemptError::EmptyLabels(_) => AbandonReason::EmptyLabels,
            AttemptError::Transform(_) => AbandonReason::Transform,
            AttemptError::EmptyResult => AbandonReason::EmptyResult,
            AttemptError::Encode { .. } | AttemptError::Io { .. } => AbandonReason::Io,
        }
    }
}

/// Run-level failures; everything else is recovered per attempt.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no source images found in {0:?}")]
    EmptyCorpus(PathBuf),

    #[error("no source image can produce a valid sample ({attempts} attempts made)")]
    NoValidSources { attempts: usize },

    #[error("failed to prepare output directory {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
