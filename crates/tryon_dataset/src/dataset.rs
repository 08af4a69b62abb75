//! Dataset façade: flat index -> aligned per-modality bundle.

use crate::index::SampleIndex;
use crate::layout::FolderLayout;
use crate::loader::LoaderSet;
use crate::types::{
    AlignmentPolicy, Artifact, DatasetResult, PathBundle, SampleBundle, Slot,
};
use data_contracts::ModalityManifest;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An indexed collection of aligned multi-modal frames.
///
/// Implementations must be `Send + Sync` so training loops can query from
/// several worker threads at once.
pub trait TryOnDataset: Send + Sync {
    /// Total number of frames across all subjects.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name carried by every bundle, e.g. `vvt`.
    fn name(&self) -> &str;

    /// Resolved paths for every manifest modality at `index`.
    fn paths(&self, index: usize) -> DatasetResult<PathBundle>;

    /// Loaded artifacts for every manifest modality at `index`.
    fn get_item(&self, index: usize) -> DatasetResult<SampleBundle<Artifact>>;
}

/// A folder layout composed with the shared index and injected loaders.
#[derive(Debug)]
pub struct AlignedDataset<L: FolderLayout> {
    name: String,
    layout: L,
    manifest: ModalityManifest,
    index: SampleIndex,
    loaders: LoaderSet,
}

impl<L: FolderLayout> AlignedDataset<L> {
    pub fn builder(layout: L, root: impl Into<PathBuf>) -> AlignedDatasetBuilder<L> {
        AlignedDatasetBuilder::new(layout, root)
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn manifest(&self) -> &ModalityManifest {
        &self.manifest
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }

    pub fn root(&self) -> &Path {
        self.index.root()
    }

    fn bundle<T>(
        &self,
        index: usize,
        mut materialize: impl FnMut(usize, &Path) -> DatasetResult<T>,
    ) -> DatasetResult<SampleBundle<T>> {
        let (pos, offset) = self.index.position(index)?;
        let mut artifacts = BTreeMap::new();
        for (entry, spec) in self.index.entries().iter().enumerate() {
            let slot = match self.index.path_at(pos, entry, offset)? {
                Slot::Present(path) => Slot::Present(materialize(entry, path)?),
                Slot::Absent => Slot::Absent,
            };
            artifacts.insert(spec.modality.name().to_string(), slot);
        }
        Ok(SampleBundle {
            dataset_name: self.name.clone(),
            subject: self.index.subject_id(pos).to_string(),
            frame_offset: offset,
            artifacts,
        })
    }
}

impl<L: FolderLayout> TryOnDataset for AlignedDataset<L> {
    fn len(&self) -> usize {
        self.index.total_length()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn paths(&self, index: usize) -> DatasetResult<PathBundle> {
        self.bundle(index, |_, path| Ok(path.to_path_buf()))
    }

    fn get_item(&self, index: usize) -> DatasetResult<SampleBundle<Artifact>> {
        let entries = self.index.entries();
        self.bundle(index, |entry, path| {
            let modality = &entries[entry].modality;
            self.loaders.load(modality, path)
        })
    }
}

/// Builder for [`AlignedDataset`]; `build` performs discovery and validation.
pub struct AlignedDatasetBuilder<L: FolderLayout> {
    layout: L,
    root: PathBuf,
    name: Option<String>,
    manifest: ModalityManifest,
    subjects: Option<Vec<String>>,
    policy: AlignmentPolicy,
    loaders: LoaderSet,
}

impl<L: FolderLayout> AlignedDatasetBuilder<L> {
    pub fn new(layout: L, root: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            root: root.into(),
            name: None,
            manifest: ModalityManifest::vvt_default(),
            subjects: None,
            policy: AlignmentPolicy::CountOnly,
            loaders: LoaderSet::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn manifest(mut self, manifest: ModalityManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Restrict to (and order by) an explicit subject list instead of
    /// discovering subjects from the reference directory.
    pub fn subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    pub fn policy(mut self, policy: AlignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn loaders(mut self, loaders: LoaderSet) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn build(self) -> DatasetResult<AlignedDataset<L>> {
        let index = match &self.subjects {
            Some(subjects) => SampleIndex::build(
                &self.layout,
                &self.root,
                subjects,
                &self.manifest,
                self.policy,
            )?,
            None => SampleIndex::discover(&self.layout, &self.root, &self.manifest, self.policy)?,
        };
        let name = self
            .name
            .unwrap_or_else(|| self.layout.layout_name().to_string());
        Ok(AlignedDataset {
            name,
            layout: self.layout,
            manifest: self.manifest,
            index,
            loaders: self.loaders,
        })
    }
}
