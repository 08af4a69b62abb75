//! Multi-modal frame alignment for video virtual try-on datasets.
//!
//! This crate provides utilities for:
//! - Resolving per-subject modality files under a folder-layout convention
//! - Building a validated flat index over every subject's frames
//! - Loading aligned per-frame bundles through injected loaders
//! - Surveying a dataset root for alignment problems
//! - Concatenating datasets and opening them from TOML config

pub mod concat;
pub mod config;
pub mod dataset;
pub mod index;
pub mod layout;
pub mod loader;
pub mod resolver;
pub mod types;
pub mod validation;

pub use concat::ConcatDataset;
pub use config::{DatasetConfig, LayoutKind};
pub use dataset::{AlignedDataset, AlignedDatasetBuilder, TryOnDataset};
pub use index::{flat_index, SampleIndex};
pub use layout::{FolderLayout, TableLayout, VvtLayout};
pub use loader::{
    ArtifactLoader, BytesLoader, ImageLoader, JsonLoader, LoaderSet, PathLoader,
    DEFAULT_FINE_SIZE,
};
pub use resolver::{discover_subjects, frame_number, list_frames, natural_cmp, resolve};
pub use types::*;
pub use validation::summarize_alignment;

pub use data_contracts::{FrameBinding, Modality, ModalityManifest, ModalitySpec, Split};
