//! Shared data contracts for modality manifests and dataset splits.

pub mod manifest;
pub mod modality;

pub use manifest::{
    FrameBinding, ManifestError, ManifestSchemaVersion, ModalityManifest, ModalitySpec,
};
pub use modality::{Modality, Split};
