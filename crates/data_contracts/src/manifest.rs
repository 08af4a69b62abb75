use crate::modality::Modality;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ManifestSchemaVersion {
    #[default]
    V1,
}

/// How a modality's resolved files map onto a subject's frame offsets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameBinding {
    /// File `k` belongs to frame `k`.
    #[default]
    PerFrame,
    /// One per-subject artifact (the first resolved file) serves every frame.
    Shared,
}

/// One manifest entry: a modality plus how it participates in alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModalitySpec {
    pub modality: Modality,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub binding: FrameBinding,
    /// Lowercase extensions without the dot; empty accepts any regular file.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_required() -> bool {
    true
}

impl ModalitySpec {
    pub fn required(modality: impl Into<Modality>) -> Self {
        Self {
            modality: modality.into(),
            required: true,
            binding: FrameBinding::PerFrame,
            extensions: Vec::new(),
        }
    }

    pub fn optional(modality: impl Into<Modality>) -> Self {
        Self {
            required: false,
            ..Self::required(modality)
        }
    }

    pub fn shared(mut self) -> Self {
        self.binding = FrameBinding::Shared;
        self
    }

    pub fn with_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Whether this entry takes part in the per-subject count check.
    pub fn is_count_checked(&self) -> bool {
        self.required && self.binding == FrameBinding::PerFrame
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest declares no modalities")]
    Empty,
    #[error("reference modality '{0}' is not declared in the manifest")]
    MissingReference(Modality),
    #[error("reference modality '{0}' must be required and per-frame")]
    InvalidReference(Modality),
    #[error("modality '{0}' is declared more than once")]
    Duplicate(Modality),
}

/// The set of modalities a dataset instance requires, declared once at
/// construction. The reference modality's per-subject count is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModalityManifest {
    #[serde(default)]
    pub schema_version: ManifestSchemaVersion,
    pub reference: Modality,
    pub entries: Vec<ModalitySpec>,
}

impl ModalityManifest {
    pub fn new(reference: impl Into<Modality>, entries: Vec<ModalitySpec>) -> Self {
        Self {
            schema_version: ManifestSchemaVersion::V1,
            reference: reference.into(),
            entries,
        }
    }

    /// Manifest for the reference video try-on layout: raw frames drive the
    /// count, keypoints are optional (densepose usually replaces them) and
    /// the `clothes_person` artifacts are per-subject.
    pub fn vvt_default() -> Self {
        Self::new(
            Modality::Frame,
            vec![
                ModalitySpec::required(Modality::Frame),
                ModalitySpec::required(Modality::Cloth),
                ModalitySpec::required(Modality::Densepose),
                ModalitySpec::required(Modality::OpticalFlow),
                ModalitySpec::required(Modality::Parsing),
                ModalitySpec::optional(Modality::Keypoint),
                ModalitySpec::optional(Modality::PersonImage).shared(),
                ModalitySpec::optional(Modality::PersonKeypoint).shared(),
                ModalitySpec::optional(Modality::PersonParsing).shared(),
            ],
        )
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.entries.is_empty() {
            return Err(ManifestError::Empty);
        }
        let mut seen = BTreeSet::new();
        for spec in &self.entries {
            if !seen.insert(&spec.modality) {
                return Err(ManifestError::Duplicate(spec.modality.clone()));
            }
        }
        let reference = self
            .get(&self.reference)
            .ok_or_else(|| ManifestError::MissingReference(self.reference.clone()))?;
        if !reference.is_count_checked() {
            return Err(ManifestError::InvalidReference(self.reference.clone()));
        }
        Ok(())
    }

    pub fn get(&self, modality: &Modality) -> Option<&ModalitySpec> {
        self.entries.iter().find(|s| &s.modality == modality)
    }

    pub fn reference_spec(&self) -> Option<&ModalitySpec> {
        self.get(&self.reference)
    }

    pub fn modalities(&self) -> impl Iterator<Item = &Modality> {
        self.entries.iter().map(|s| &s.modality)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ModalityManifest {
    fn default() -> Self {
        Self::vvt_default()
    }
}
