//! The flat sample index: subject boundaries plus every resolved path,
//! built and validated once per dataset instance.

use crate::layout::FolderLayout;
use crate::resolver::{discover_subjects, ensure_unique_subjects, frame_number, resolve};
use crate::types::{AlignmentPolicy, DatasetResult, FrameRef, Slot, TryOnDatasetError};
use data_contracts::{FrameBinding, Modality, ModalityManifest, ModalitySpec};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct SubjectFrames {
    id: String,
    frame_count: usize,
    /// Resolved files per manifest entry, in manifest order.
    files: Vec<Vec<PathBuf>>,
}

/// Immutable mapping from flat indices to `(subject, frame_offset)` and on
/// to each modality's file.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    root: PathBuf,
    entries: Vec<ModalitySpec>,
    subjects: Vec<SubjectFrames>,
    /// Exclusive end offset of each subject in the flat index.
    ends: Vec<usize>,
}

impl SampleIndex {
    /// Discover subjects from the reference modality's directory and build.
    pub fn discover<L: FolderLayout + ?Sized>(
        layout: &L,
        root: &Path,
        manifest: &ModalityManifest,
        policy: AlignmentPolicy,
    ) -> DatasetResult<Self> {
        manifest.validate()?;
        let subjects = discover_subjects(layout, root, &manifest.reference)?;
        Self::build(layout, root, &subjects, manifest, policy)
    }

    /// Resolve and validate every modality for `subjects` (kept in the given
    /// order). Fails on the first misaligned subject; no partial index is
    /// ever returned.
    pub fn build<L: FolderLayout + ?Sized>(
        layout: &L,
        root: &Path,
        subjects: &[String],
        manifest: &ModalityManifest,
        policy: AlignmentPolicy,
    ) -> DatasetResult<Self> {
        manifest.validate()?;
        ensure_unique_subjects(subjects)?;
        let reference = manifest
            .reference_spec()
            .ok_or_else(|| TryOnDatasetError::UnsupportedModality(manifest.reference.clone()))?;

        let mut built = Vec::with_capacity(subjects.len());
        let mut ends = Vec::with_capacity(subjects.len());
        let mut total = 0usize;
        for subject in subjects {
            let reference_files = resolve(layout, root, subject, reference)?;
            let frame_count = reference_files.len();
            if frame_count == 0 {
                tracing::warn!(subject = %subject, "subject has no reference frames");
            }
            let mut files = Vec::with_capacity(manifest.entries.len());
            for spec in &manifest.entries {
                if spec.modality == manifest.reference {
                    files.push(reference_files.clone());
                    continue;
                }
                let resolved = resolve(layout, root, subject, spec)?;
                check_modality(
                    layout,
                    root,
                    subject,
                    spec,
                    &reference_files,
                    &resolved,
                    policy,
                )?;
                files.push(resolved);
            }
            tracing::debug!(subject = %subject, frames = frame_count, "indexed subject");
            total += frame_count;
            ends.push(total);
            built.push(SubjectFrames {
                id: subject.clone(),
                frame_count,
                files,
            });
        }
        tracing::info!(
            root = %root.display(),
            subjects = built.len(),
            frames = total,
            "built sample index"
        );
        Ok(Self {
            root: root.to_path_buf(),
            entries: manifest.entries.clone(),
            subjects: built,
            ends,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn total_length(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_length() == 0
    }

    pub fn num_subjects(&self) -> usize {
        self.subjects.len()
    }

    /// Manifest entries in declaration order.
    pub fn entries(&self) -> &[ModalitySpec] {
        &self.entries
    }

    /// `(subject_id, frame_count)` in discovery order.
    pub fn subjects(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.subjects.iter().map(|s| (s.id.as_str(), s.frame_count))
    }

    pub fn locate(&self, index: usize) -> DatasetResult<FrameRef> {
        let (pos, offset) = self.position(index)?;
        Ok(FrameRef::new(self.subjects[pos].id.clone(), offset))
    }

    /// Flat indices covered by `subject`.
    pub fn subject_range(&self, subject: &str) -> Option<Range<usize>> {
        let pos = self.subjects.iter().position(|s| s.id == subject)?;
        let end = self.ends[pos];
        Some(end - self.subjects[pos].frame_count..end)
    }

    /// All resolved files of `modality` for `subject`.
    pub fn files(&self, subject: &str, modality: &Modality) -> Option<&[PathBuf]> {
        let subject = self.subjects.iter().find(|s| s.id == subject)?;
        let entry = self.entries.iter().position(|e| &e.modality == modality)?;
        Some(&subject.files[entry])
    }

    /// `(subject position, frame offset)` for a flat index.
    pub(crate) fn position(&self, index: usize) -> DatasetResult<(usize, usize)> {
        let len = self.total_length();
        if index >= len {
            return Err(TryOnDatasetError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len,
            });
        }
        let pos = self.ends.partition_point(|&end| end <= index);
        let start = self.ends[pos] - self.subjects[pos].frame_count;
        Ok((pos, index - start))
    }

    pub(crate) fn subject_id(&self, pos: usize) -> &str {
        &self.subjects[pos].id
    }

    /// The file for manifest entry `entry` at `offset` within subject `pos`.
    pub(crate) fn path_at(
        &self,
        pos: usize,
        entry: usize,
        offset: usize,
    ) -> DatasetResult<Slot<&Path>> {
        let subject = &self.subjects[pos];
        let spec = &self.entries[entry];
        let files = &subject.files[entry];
        if files.is_empty() {
            return Ok(Slot::Absent);
        }
        let path = match spec.binding {
            FrameBinding::Shared => files.first(),
            FrameBinding::PerFrame => files.get(offset),
        };
        path.map(|p| Slot::Present(p.as_path()))
            .ok_or_else(|| TryOnDatasetError::MissingFrame {
                subject: subject.id.clone(),
                modality: spec.modality.clone(),
                offset,
            })
    }
}

/// Map a caller-supplied signed index onto `[0, len)`.
pub fn flat_index(raw: i64, len: usize) -> DatasetResult<usize> {
    usize::try_from(raw)
        .ok()
        .filter(|&i| i < len)
        .ok_or(TryOnDatasetError::IndexOutOfRange { index: raw, len })
}

fn check_modality<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    subject: &str,
    spec: &ModalitySpec,
    reference: &[PathBuf],
    resolved: &[PathBuf],
    policy: AlignmentPolicy,
) -> DatasetResult<()> {
    let expected = reference.len();
    match (spec.required, spec.binding) {
        (true, FrameBinding::PerFrame) => {
            if resolved.len() != expected {
                return Err(TryOnDatasetError::Alignment {
                    subject: subject.to_string(),
                    modality: spec.modality.clone(),
                    expected,
                    actual: resolved.len(),
                });
            }
            if policy == AlignmentPolicy::StrictFrameNumbers {
                for (offset, (r, m)) in reference.iter().zip(resolved).enumerate() {
                    let (expected, actual) = (frame_number(r), frame_number(m));
                    if expected != actual {
                        return Err(TryOnDatasetError::FrameNumberMismatch {
                            subject: subject.to_string(),
                            modality: spec.modality.clone(),
                            offset,
                            expected,
                            actual,
                        });
                    }
                }
            }
        }
        (true, FrameBinding::Shared) => {
            if resolved.is_empty() {
                let path = layout
                    .modality_dir(root, &spec.modality)
                    .map(|d| d.join(subject))
                    .unwrap_or_else(|| root.to_path_buf());
                return Err(TryOnDatasetError::NotFound {
                    path,
                    subject: subject.to_string(),
                    modality: spec.modality.clone(),
                });
            }
        }
        (false, FrameBinding::PerFrame) => {
            if !resolved.is_empty() && resolved.len() != expected {
                tracing::warn!(
                    subject = %subject,
                    modality = %spec.modality,
                    expected,
                    actual = resolved.len(),
                    "optional modality does not match reference frame count"
                );
            }
        }
        (false, FrameBinding::Shared) => {}
    }
    Ok(())
}
