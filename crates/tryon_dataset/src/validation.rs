//! Non-fatal alignment survey of a dataset root, for tooling and reports.
//!
//! Building a dataset stops at the first misaligned subject; this walks every
//! subject and records what it finds instead.

use crate::layout::FolderLayout;
use crate::resolver::{discover_subjects, ensure_unique_subjects, is_existing_dir, list_frames};
use crate::types::{
    AlignmentReport, DatasetResult, ModalityCount, SubjectSummary, ValidationOutcome,
};
use data_contracts::{FrameBinding, ModalityManifest, ModalitySpec};
use std::collections::BTreeMap;
use std::path::Path;

/// Survey `subjects` in the given order, or every subject under the
/// reference directory when `None`. A listed subject with no reference
/// directory is reported as misaligned rather than skipped.
pub fn summarize_alignment<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    manifest: &ModalityManifest,
    subjects: Option<&[String]>,
) -> DatasetResult<AlignmentReport> {
    manifest.validate()?;
    let subjects = match subjects {
        Some(explicit) => {
            ensure_unique_subjects(explicit)?;
            explicit.to_vec()
        }
        None => discover_subjects(layout, root, &manifest.reference)?,
    };
    let mut summaries = Vec::with_capacity(subjects.len());
    for subject in &subjects {
        summaries.push(summarize_subject(layout, root, subject, manifest)?);
    }
    Ok(build_report(root, manifest, summaries))
}

fn summarize_subject<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    subject: &str,
    manifest: &ModalityManifest,
) -> DatasetResult<SubjectSummary> {
    let mut modalities = BTreeMap::new();
    let mut reference_count = 0;
    for spec in &manifest.entries {
        let count = count_files(layout, root, subject, spec)?;
        if spec.modality == manifest.reference {
            if let ModalityCount::Present(n) = count {
                reference_count = n;
            }
        }
        modalities.insert(spec.modality.name().to_string(), count);
    }

    let mut aligned = true;
    let mut optional_mismatches = Vec::new();
    for spec in &manifest.entries {
        let count = modalities[spec.modality.name()];
        match (spec.required, spec.binding, count) {
            (true, FrameBinding::PerFrame, ModalityCount::Present(n)) => {
                aligned &= n == reference_count;
            }
            (true, FrameBinding::Shared, ModalityCount::Present(n)) => {
                aligned &= n > 0;
            }
            (true, _, ModalityCount::Missing) => aligned = false,
            (false, FrameBinding::PerFrame, ModalityCount::Present(n)) if n != reference_count => {
                optional_mismatches.push(spec.modality.name().to_string());
            }
            _ => {}
        }
    }
    Ok(SubjectSummary {
        subject: subject.to_string(),
        reference_count,
        modalities,
        aligned,
        optional_mismatches,
    })
}

/// `Missing` when the layout has no directory for the subject, otherwise
/// the number of matching files (possibly zero).
fn count_files<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    subject: &str,
    spec: &ModalitySpec,
) -> DatasetResult<ModalityCount> {
    let Some(dir) = layout.modality_dir(root, &spec.modality) else {
        return Ok(ModalityCount::Missing);
    };
    let subject_dir = dir.join(subject);
    if !is_existing_dir(&subject_dir)? {
        return Ok(ModalityCount::Missing);
    }
    let files = list_frames(&subject_dir, &spec.extensions)?;
    Ok(ModalityCount::Present(files.len()))
}

fn build_report(
    root: &Path,
    manifest: &ModalityManifest,
    subjects: Vec<SubjectSummary>,
) -> AlignmentReport {
    let total_frames = subjects.iter().map(|s| s.reference_count).sum();
    let mut outcome = ValidationOutcome::Pass;
    let mut reasons = Vec::new();

    let misaligned: Vec<&SubjectSummary> = subjects.iter().filter(|s| !s.aligned).collect();
    for s in &misaligned {
        let detail = s
            .modalities
            .iter()
            .map(|(name, count)| match count {
                ModalityCount::Present(n) => format!("{name}={n}"),
                ModalityCount::Missing => format!("{name}=missing"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        reasons.push(format!(
            "subject {}: expected {} frames ({detail})",
            s.subject, s.reference_count
        ));
    }
    let misaligned_subjects = misaligned.len();
    if misaligned_subjects > 0 {
        outcome = ValidationOutcome::Fail;
    }

    let optional_warnings = subjects
        .iter()
        .filter(|s| !s.optional_mismatches.is_empty())
        .count();
    if optional_warnings > 0 {
        reasons.push(format!(
            "optional modality count mismatches: {optional_warnings} subjects"
        ));
    }
    let empty = subjects.iter().filter(|s| s.reference_count == 0).count();
    if empty > 0 {
        reasons.push(format!("subjects without reference frames: {empty}"));
    }
    if outcome == ValidationOutcome::Pass && (optional_warnings > 0 || empty > 0) {
        outcome = ValidationOutcome::Warn;
    }

    AlignmentReport {
        root: root.to_path_buf(),
        reference: manifest.reference.name().to_string(),
        misaligned_subjects,
        total_frames,
        subjects,
        outcome,
        reasons,
    }
}
