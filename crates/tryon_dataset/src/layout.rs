//! Folder-layout conventions: where each modality lives under a dataset root.
//!
//! A layout only answers "which directory holds modality M"; listing,
//! filtering and ordering the files under `<dir>/<subject>/` is shared by
//! every layout (see [`crate::resolver`]).

use data_contracts::{Modality, Split};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-modality directory convention.
///
/// Every method defaults to `None`, meaning the layout does not support that
/// modality. A custom layout overrides the methods for the modalities it
/// stores and inherits indexing and validation by being composed into
/// [`crate::AlignedDataset`].
pub trait FolderLayout: Send + Sync {
    fn frame_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn cloth_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn densepose_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn optical_flow_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn parsing_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn keypoint_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn person_image_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn person_keypoint_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn person_parsing_dir(&self, _root: &Path) -> Option<PathBuf> {
        None
    }
    fn custom_dir(&self, _root: &Path, _name: &str) -> Option<PathBuf> {
        None
    }

    /// Short name used in logs and as the default dataset name.
    fn layout_name(&self) -> &str {
        "custom"
    }

    /// Directory containing one subdirectory per subject for `modality`.
    fn modality_dir(&self, root: &Path, modality: &Modality) -> Option<PathBuf> {
        match modality {
            Modality::Frame => self.frame_dir(root),
            Modality::Cloth => self.cloth_dir(root),
            Modality::Densepose => self.densepose_dir(root),
            Modality::OpticalFlow => self.optical_flow_dir(root),
            Modality::Parsing => self.parsing_dir(root),
            Modality::Keypoint => self.keypoint_dir(root),
            Modality::PersonImage => self.person_image_dir(root),
            Modality::PersonKeypoint => self.person_keypoint_dir(root),
            Modality::PersonParsing => self.person_parsing_dir(root),
            Modality::Custom(name) => self.custom_dir(root, name),
        }
    }
}

impl<L: FolderLayout + ?Sized> FolderLayout for Box<L> {
    fn layout_name(&self) -> &str {
        (**self).layout_name()
    }

    fn modality_dir(&self, root: &Path, modality: &Modality) -> Option<PathBuf> {
        (**self).modality_dir(root, modality)
    }
}

/// The reference video try-on layout:
///
/// ```text
/// root/
///   clothes_person/{img,keypoint,parsing}/<subject>/
///   <split>/cloth/<subject>/
///   <split>/densepose/<subject>/
///   <split>/optical_flow/<subject>/
///   <split>/<split>_frames/<subject>/
///   <split>/<split>_frames_keypoint/<subject>/
///   <split>/<split>_frames_parsing/<subject>/
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VvtLayout {
    pub split: Split,
}

impl VvtLayout {
    pub fn new(split: Split) -> Self {
        Self { split }
    }

    fn split_dir(&self, root: &Path) -> PathBuf {
        root.join(self.split.as_str())
    }

    fn frames_dir_name(&self, suffix: &str) -> String {
        format!("{}_frames{}", self.split.as_str(), suffix)
    }
}

impl FolderLayout for VvtLayout {
    fn frame_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join(self.frames_dir_name("")))
    }
    fn cloth_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join("cloth"))
    }
    fn densepose_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join("densepose"))
    }
    fn optical_flow_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join("optical_flow"))
    }
    fn parsing_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join(self.frames_dir_name("_parsing")))
    }
    fn keypoint_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(self.split_dir(root).join(self.frames_dir_name("_keypoint")))
    }
    fn person_image_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(root.join("clothes_person").join("img"))
    }
    fn person_keypoint_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(root.join("clothes_person").join("keypoint"))
    }
    fn person_parsing_dir(&self, root: &Path) -> Option<PathBuf> {
        Some(root.join("clothes_person").join("parsing"))
    }

    fn layout_name(&self) -> &str {
        "vvt"
    }
}

/// Layout driven by a modality -> relative directory table, typically read
/// from config. Modalities missing from the table are unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    name: String,
    dirs: BTreeMap<Modality, PathBuf>,
}

impl TableLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dirs: BTreeMap::new(),
        }
    }

    pub fn with_dir(mut self, modality: impl Into<Modality>, rel: impl Into<PathBuf>) -> Self {
        self.dirs.insert(modality.into(), rel.into());
        self
    }

    pub fn from_table<I, M, P>(name: impl Into<String>, table: I) -> Self
    where
        I: IntoIterator<Item = (M, P)>,
        M: Into<Modality>,
        P: Into<PathBuf>,
    {
        table
            .into_iter()
            .fold(Self::new(name), |layout, (m, p)| layout.with_dir(m, p))
    }

    fn lookup(&self, root: &Path, modality: Modality) -> Option<PathBuf> {
        self.dirs.get(&modality).map(|rel| root.join(rel))
    }
}

impl FolderLayout for TableLayout {
    fn frame_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::Frame)
    }
    fn cloth_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::Cloth)
    }
    fn densepose_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::Densepose)
    }
    fn optical_flow_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::OpticalFlow)
    }
    fn parsing_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::Parsing)
    }
    fn keypoint_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::Keypoint)
    }
    fn person_image_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::PersonImage)
    }
    fn person_keypoint_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::PersonKeypoint)
    }
    fn person_parsing_dir(&self, root: &Path) -> Option<PathBuf> {
        self.lookup(root, Modality::PersonParsing)
    }
    fn custom_dir(&self, root: &Path, name: &str) -> Option<PathBuf> {
        self.lookup(root, Modality::Custom(name.to_string()))
    }

    fn layout_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vvt_test_split_uses_test_frames() {
        let layout = VvtLayout::new(Split::Test);
        let root = Path::new("/data");
        assert_eq!(
            layout.modality_dir(root, &Modality::Frame),
            Some(PathBuf::from("/data/test/test_frames"))
        );
        assert_eq!(
            layout.modality_dir(root, &Modality::Keypoint),
            Some(PathBuf::from("/data/test/test_frames_keypoint"))
        );
        assert_eq!(
            layout.modality_dir(root, &Modality::PersonParsing),
            Some(PathBuf::from("/data/clothes_person/parsing"))
        );
        assert_eq!(
            layout.modality_dir(root, &Modality::Custom("warp".into())),
            None
        );
    }

    #[test]
    fn table_layout_only_supports_listed_modalities() {
        let layout = TableLayout::new("flat")
            .with_dir(Modality::Frame, "frames")
            .with_dir("warp_mask", "masks/warp");
        let root = Path::new("/r");
        assert_eq!(
            layout.modality_dir(root, &Modality::Frame),
            Some(PathBuf::from("/r/frames"))
        );
        assert_eq!(
            layout.modality_dir(root, &Modality::from("warp_mask")),
            Some(PathBuf::from("/r/masks/warp"))
        );
        assert_eq!(layout.modality_dir(root, &Modality::Cloth), None);
        assert_eq!(layout.layout_name(), "flat");
    }
}
