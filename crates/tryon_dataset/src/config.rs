//! TOML configuration for opening a dataset without writing code.
//!
//! ```toml
//! root = "~/data/vvt"
//! split = "test"
//! layout = "vvt"              # or "table" together with [layout_dirs]
//! strict_frame_numbers = true
//! fine_width = 192
//! fine_height = 256
//!
//! [layout_dirs]               # only read for layout = "table"
//! frame = "frames"
//! cloth = "warped/cloth"
//!
//! [manifest]                  # optional; defaults to the vvt manifest
//! reference = "frame"
//! [[manifest.entries]]
//! modality = "frame"
//! ```

use crate::dataset::{AlignedDataset, TryOnDataset};
use crate::layout::{FolderLayout, TableLayout, VvtLayout};
use crate::loader::{LoaderSet, DEFAULT_FINE_SIZE};
use crate::types::{AlignmentPolicy, DatasetResult, TryOnDatasetError};
use data_contracts::{ModalityManifest, Split};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "tryon-dataset.toml";
pub const CONFIG_ENV: &str = "TRYON_DATASET_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Vvt,
    Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub root: PathBuf,
    pub name: Option<String>,
    pub split: Split,
    pub layout: LayoutKind,
    pub layout_dirs: BTreeMap<String, PathBuf>,
    pub policy: AlignmentPolicy,
    pub fine_size: (u32, u32),
    pub subjects: Option<Vec<String>>,
    pub manifest: ModalityManifest,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            name: None,
            split: Split::Train,
            layout: LayoutKind::Vvt,
            layout_dirs: BTreeMap::new(),
            policy: AlignmentPolicy::CountOnly,
            fine_size: DEFAULT_FINE_SIZE,
            subjects: None,
            manifest: ModalityManifest::vvt_default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DatasetConfigFile {
    root: Option<String>,
    name: Option<String>,
    split: Option<Split>,
    layout: Option<LayoutKind>,
    layout_dirs: Option<BTreeMap<String, String>>,
    strict_frame_numbers: Option<bool>,
    fine_width: Option<u32>,
    fine_height: Option<u32>,
    subjects: Option<Vec<String>>,
    manifest: Option<ModalityManifest>,
}

impl DatasetConfig {
    /// `$TRYON_DATASET_CONFIG` if set (must exist), else `tryon-dataset.toml`
    /// in the working directory if present, else defaults.
    pub fn load() -> DatasetResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_NAME);
        if default_path.exists() {
            return Self::from_path(default_path);
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> DatasetResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| TryOnDatasetError::io(path, e))?;
        Self::from_toml_str(&raw)
            .map_err(|e| TryOnDatasetError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> DatasetResult<Self> {
        let file: DatasetConfigFile =
            toml::from_str(raw).map_err(|e| TryOnDatasetError::Config(e.to_string()))?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        cfg.warn_if_suspicious();
        Ok(cfg)
    }

    fn from_file(file: DatasetConfigFile) -> Self {
        let defaults = Self::default();
        let fine_size = (
            file.fine_width.unwrap_or(defaults.fine_size.0),
            file.fine_height.unwrap_or(defaults.fine_size.1),
        );
        DatasetConfig {
            root: file.root.map(|v| expand_path(&v)).unwrap_or(defaults.root),
            name: file.name.filter(|n| !n.trim().is_empty()),
            split: file.split.unwrap_or_default(),
            layout: file.layout.unwrap_or_default(),
            layout_dirs: file
                .layout_dirs
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, PathBuf::from(v)))
                .collect(),
            policy: if file.strict_frame_numbers.unwrap_or(false) {
                AlignmentPolicy::StrictFrameNumbers
            } else {
                AlignmentPolicy::CountOnly
            },
            fine_size,
            subjects: file.subjects,
            manifest: file.manifest.unwrap_or(defaults.manifest),
        }
    }

    pub fn validate(&self) -> DatasetResult<()> {
        self.manifest.validate()?;
        if self.fine_size.0 == 0 || self.fine_size.1 == 0 {
            return Err(TryOnDatasetError::Config(
                "fine_width and fine_height must be non-zero".into(),
            ));
        }
        if self.layout == LayoutKind::Table && self.layout_dirs.is_empty() {
            return Err(TryOnDatasetError::Config(
                "layout = \"table\" requires a [layout_dirs] table".into(),
            ));
        }
        Ok(())
    }

    fn warn_if_suspicious(&self) {
        if self.layout == LayoutKind::Vvt && !self.layout_dirs.is_empty() {
            tracing::warn!("dataset config: layout_dirs is ignored for layout = \"vvt\"");
        }
        if self.layout == LayoutKind::Table {
            for modality in self.manifest.modalities() {
                if !self.layout_dirs.contains_key(modality.name()) {
                    tracing::warn!(
                        modality = %modality,
                        "dataset config: manifest modality has no layout_dirs entry"
                    );
                }
            }
        }
    }

    /// The folder layout this config describes.
    pub fn folder_layout(&self) -> Box<dyn FolderLayout> {
        match self.layout {
            LayoutKind::Vvt => Box::new(VvtLayout::new(self.split)),
            LayoutKind::Table => Box::new(TableLayout::from_table(
                self.name.clone().unwrap_or_else(|| "custom".to_string()),
                self.layout_dirs.iter().map(|(k, v)| (k.as_str(), v.clone())),
            )),
        }
    }

    /// Discover, validate and index the configured dataset.
    pub fn open(&self) -> DatasetResult<Box<dyn TryOnDataset>> {
        self.validate()?;
        let layout = self.folder_layout();
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| layout.layout_name().to_string());
        let mut builder = AlignedDataset::builder(layout, &self.root)
            .name(name)
            .manifest(self.manifest.clone())
            .policy(self.policy)
            .loaders(LoaderSet::vvt_default(self.fine_size));
        if let Some(subjects) = &self.subjects {
            builder = builder.subjects(subjects.iter().cloned());
        }
        Ok(Box::new(builder.build()?))
    }
}

/// Expand a leading `~` and `${VAR}` references; unknown variables are kept
/// verbatim.
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = match raw.strip_prefix('~') {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => format!("{home}{rest}"),
            Err(_) => raw.to_string(),
        },
        None => raw.to_string(),
    };
    PathBuf::from(expand_env(&expanded))
}

fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_contracts::Modality;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = DatasetConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, DatasetConfig::default());
    }

    #[test]
    fn parses_table_layout_and_strict_policy() {
        let raw = r#"
root = "/datasets/mpv"
name = "mpv"
split = "test"
layout = "table"
strict_frame_numbers = true
fine_width = 96
subjects = ["b", "a"]

[layout_dirs]
frame = "frames"

[manifest]
reference = "frame"
[[manifest.entries]]
modality = "frame"
"#;
        let cfg = DatasetConfig::from_toml_str(raw).unwrap();
        assert_eq!(cfg.root, PathBuf::from("/datasets/mpv"));
        assert_eq!(cfg.split, Split::Test);
        assert_eq!(cfg.layout, LayoutKind::Table);
        assert_eq!(cfg.policy, AlignmentPolicy::StrictFrameNumbers);
        assert_eq!(cfg.fine_size, (96, 256));
        assert_eq!(cfg.subjects, Some(vec!["b".to_string(), "a".to_string()]));
        assert_eq!(cfg.manifest.reference, Modality::Frame);
        assert_eq!(cfg.layout_dirs["frame"], PathBuf::from("frames"));
    }

    #[test]
    fn folder_layout_follows_layout_kind() {
        let cfg = DatasetConfig::from_toml_str(
            "layout = \"table\"\nname = \"mpv\"\n[layout_dirs]\nframe = \"frames\"\n",
        )
        .unwrap();
        let layout = cfg.folder_layout();
        assert_eq!(layout.layout_name(), "mpv");
        assert_eq!(
            layout.modality_dir(Path::new("/r"), &Modality::Frame),
            Some(PathBuf::from("/r/frames"))
        );

        let vvt = DatasetConfig::default().folder_layout();
        assert_eq!(vvt.layout_name(), "vvt");
        assert_eq!(
            vvt.modality_dir(Path::new("/r"), &Modality::Frame),
            Some(PathBuf::from("/r/train/train_frames"))
        );
    }

    #[test]
    fn table_layout_without_dirs_is_rejected() {
        let err = DatasetConfig::from_toml_str("layout = \"table\"").unwrap_err();
        assert!(matches!(err, TryOnDatasetError::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DatasetConfig::from_toml_str("roots = \"x\"").is_err());
    }

    #[test]
    fn misspelled_manifest_entry_key_is_rejected() {
        let raw = r#"
[manifest]
reference = "frame"
[[manifest.entries]]
modality = "frame"
[[manifest.entries]]
modality = "keypoint"
requird = false
"#;
        let err = DatasetConfig::from_toml_str(raw).unwrap_err();
        match err {
            TryOnDatasetError::Config(msg) => assert!(msg.contains("requird"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn expand_env_keeps_unknown_variables() {
        let out = expand_env("/a/${TRYON_SURELY_UNSET_VAR}/b");
        assert_eq!(out, "/a/${TRYON_SURELY_UNSET_VAR}/b");
        assert_eq!(expand_env("/plain/${unterminated"), "/plain/${unterminated");
    }
}
