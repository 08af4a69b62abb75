//! Injected per-modality loaders that turn a resolved path into an artifact.

use crate::types::{Artifact, DatasetResult, ImageTensor, TryOnDatasetError};
use data_contracts::Modality;
use image::imageops::FilterType;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Fine size used by the try-on models: 192 wide, 256 high.
pub const DEFAULT_FINE_SIZE: (u32, u32) = (192, 256);

/// Materializes one modality file. Implementations are shared across
/// worker threads.
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, modality: &Modality, path: &Path) -> DatasetResult<Artifact>;
}

impl<F> ArtifactLoader for F
where
    F: Fn(&Modality, &Path) -> DatasetResult<Artifact> + Send + Sync,
{
    fn load(&self, modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        self(modality, path)
    }
}

/// Hands back the path untouched; decoding is left to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLoader;

impl ArtifactLoader for PathLoader {
    fn load(&self, _modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        Ok(Artifact::Path {
            path: path.to_path_buf(),
        })
    }
}

/// Raw file contents, e.g. `.flo` optical flow or `.npy` dense pose dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesLoader;

impl ArtifactLoader for BytesLoader {
    fn load(&self, _modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        let data = fs::read(path).map_err(|e| TryOnDatasetError::io(path, e))?;
        Ok(Artifact::Bytes { data })
    }
}

/// Parsed JSON, e.g. OpenPose keypoint files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl ArtifactLoader for JsonLoader {
    fn load(&self, _modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        let raw = fs::read(path).map_err(|e| TryOnDatasetError::io(path, e))?;
        let value = serde_json::from_slice(&raw).map_err(|e| TryOnDatasetError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Artifact::Json { value })
    }
}

/// Decodes an image into CHW `f32` in [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader {
    /// Optional (width, height) to resize to.
    pub resize: Option<(u32, u32)>,
    /// Single channel output, for parsing masks.
    pub grayscale: bool,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.resize = Some((width, height));
        self
    }

    pub fn grayscale(mut self, yes: bool) -> Self {
        self.grayscale = yes;
        self
    }

    /// Parsing masks are label maps: nearest-neighbour keeps class ids intact.
    fn filter(&self) -> FilterType {
        if self.grayscale {
            FilterType::Nearest
        } else {
            FilterType::Triangle
        }
    }
}

impl ArtifactLoader for ImageLoader {
    fn load(&self, _modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        let img = image::open(path).map_err(|e| TryOnDatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?;
        let img = match self.resize {
            Some((w, h)) if img.width() != w || img.height() != h => {
                img.resize_exact(w, h, self.filter())
            }
            _ => img,
        };
        let (width, height) = (img.width(), img.height());
        let npix = (width * height) as usize;
        let tensor = if self.grayscale {
            let gray = img.to_luma8();
            ImageTensor {
                chw: gray.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
                channels: 1,
                width,
                height,
            }
        } else {
            let rgb = img.to_rgb8();
            let raw = rgb.as_raw();
            let mut chw = vec![0.0f32; 3 * npix];
            for i in 0..npix {
                for c in 0..3 {
                    chw[c * npix + i] = raw[i * 3 + c] as f32 / 255.0;
                }
            }
            ImageTensor {
                chw,
                channels: 3,
                width,
                height,
            }
        };
        Ok(Artifact::Image(tensor))
    }
}

/// Default loader plus per-modality overrides.
#[derive(Clone)]
pub struct LoaderSet {
    fallback: Arc<dyn ArtifactLoader>,
    overrides: BTreeMap<Modality, Arc<dyn ArtifactLoader>>,
}

impl std::fmt::Debug for LoaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderSet")
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for LoaderSet {
    fn default() -> Self {
        Self::new(PathLoader)
    }
}

impl LoaderSet {
    pub fn new(fallback: impl ArtifactLoader + 'static) -> Self {
        Self {
            fallback: Arc::new(fallback),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with(
        mut self,
        modality: impl Into<Modality>,
        loader: impl ArtifactLoader + 'static,
    ) -> Self {
        self.overrides.insert(modality.into(), Arc::new(loader));
        self
    }

    /// Image modalities decoded at `fine_size`, keypoints parsed as JSON,
    /// dense pose and flow kept as raw bytes.
    pub fn vvt_default(fine_size: (u32, u32)) -> Self {
        let (w, h) = fine_size;
        let rgb = ImageLoader::new().resize(w, h);
        let mask = ImageLoader::new().resize(w, h).grayscale(true);
        Self::new(PathLoader)
            .with(Modality::Frame, rgb)
            .with(Modality::Cloth, rgb)
            .with(Modality::PersonImage, rgb)
            .with(Modality::Parsing, mask)
            .with(Modality::PersonParsing, mask)
            .with(Modality::Keypoint, JsonLoader)
            .with(Modality::PersonKeypoint, JsonLoader)
            .with(Modality::Densepose, BytesLoader)
            .with(Modality::OpticalFlow, BytesLoader)
    }

    pub fn loader_for(&self, modality: &Modality) -> &dyn ArtifactLoader {
        self.overrides
            .get(modality)
            .map(|l| l.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn load(&self, modality: &Modality, path: &Path) -> DatasetResult<Artifact> {
        self.loader_for(modality).load(modality, path)
    }
}
