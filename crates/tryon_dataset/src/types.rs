//! Core types, error definitions, and data structures for tryon_dataset.

use data_contracts::{ManifestError, Modality};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, TryOnDatasetError>;

#[derive(Debug, Error)]
pub enum TryOnDatasetError {
    #[error("{modality} not found{} at {path}", for_subject(.subject))]
    NotFound {
        path: PathBuf,
        subject: String,
        modality: Modality,
    },
    #[error("layout does not support required modality '{0}'")]
    UnsupportedModality(Modality),
    #[error(
        "alignment error for subject '{subject}': expected {expected} frames, \
         {modality} has {actual}"
    )]
    Alignment {
        subject: String,
        modality: Modality,
        expected: usize,
        actual: usize,
    },
    #[error(
        "frame number mismatch for subject '{subject}' at offset {offset}: \
         reference has {expected:?}, {modality} has {actual:?}"
    )]
    FrameNumberMismatch {
        subject: String,
        modality: Modality,
        offset: usize,
        expected: Option<u64>,
        actual: Option<u64>,
    },
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("{modality} has no file for subject '{subject}' at offset {offset}")]
    MissingFrame {
        subject: String,
        modality: Modality,
        offset: usize,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("config error: {0}")]
    Config(String),
}

/// Discovery failures have no subject to name.
fn for_subject(subject: &str) -> String {
    if subject.is_empty() {
        String::new()
    } else {
        format!(" for subject '{subject}'")
    }
}

impl TryOnDatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TryOnDatasetError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A frame addressed by a flat index: the subject and the position within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRef {
    pub subject: String,
    pub frame_offset: usize,
}

impl FrameRef {
    pub fn new(subject: impl Into<String>, frame_offset: usize) -> Self {
        Self {
            subject: subject.into(),
            frame_offset,
        }
    }
}

/// One modality's contribution to a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Slot<T> {
    Present(T),
    /// Optional modality with nothing on disk for this subject.
    Absent,
}

impl<T> Slot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Slot::Present(v) => Some(v),
            Slot::Absent => None,
        }
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Slot::Present(v) => Some(v),
            Slot::Absent => None,
        }
    }
}

/// Everything a flat index yields, keyed by modality name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBundle<T> {
    pub dataset_name: String,
    pub subject: String,
    pub frame_offset: usize,
    pub artifacts: BTreeMap<String, Slot<T>>,
}

impl<T> SampleBundle<T> {
    pub fn get(&self, modality: &Modality) -> Option<&Slot<T>> {
        self.artifacts.get(modality.name())
    }

    pub fn frame_ref(&self) -> FrameRef {
        FrameRef::new(self.subject.clone(), self.frame_offset)
    }
}

pub type PathBundle = SampleBundle<PathBuf>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Per-subject file counts must match the reference.
    #[default]
    CountOnly,
    /// Counts must match and the numbers embedded in filenames must agree
    /// position by position.
    StrictFrameNumbers,
}

/// Decoded image in CHW layout, normalized to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTensor {
    pub chw: Vec<f32>,
    pub channels: u32,
    pub width: u32,
    pub height: u32,
}

/// What a loader materializes for one modality path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Path { path: PathBuf },
    Bytes { data: Vec<u8> },
    Image(ImageTensor),
    Json { value: serde_json::Value },
}

impl Artifact {
    pub fn as_image(&self) -> Option<&ImageTensor> {
        match self {
            Artifact::Image(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "count", rename_all = "snake_case")]
pub enum ModalityCount {
    Present(usize),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub reference_count: usize,
    pub modalities: BTreeMap<String, ModalityCount>,
    /// All required per-frame modalities match the reference count.
    pub aligned: bool,
    /// Optional modalities that are present but disagree with the reference.
    pub optional_mismatches: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Pass,
    Warn,
    Fail,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Pass => "pass",
            ValidationOutcome::Warn => "warn",
            ValidationOutcome::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub root: PathBuf,
    pub reference: String,
    pub subjects: Vec<SubjectSummary>,
    pub total_frames: usize,
    pub misaligned_subjects: usize,
    pub outcome: ValidationOutcome,
    pub reasons: Vec<String>,
}
