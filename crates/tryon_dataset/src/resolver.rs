//! Modality resolution: list, filter and order one subject's files.

use crate::layout::FolderLayout;
use crate::types::{DatasetResult, TryOnDatasetError};
use data_contracts::{Modality, ModalitySpec};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Resolve the ordered files of one modality for one subject.
///
/// Position `k` of the result is frame `k` for every modality that follows
/// the same numbering convention. Absent optional modalities resolve to an
/// empty list; absent required ones are `NotFound`.
pub fn resolve<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    subject: &str,
    spec: &ModalitySpec,
) -> DatasetResult<Vec<PathBuf>> {
    let Some(modality_dir) = layout.modality_dir(root, &spec.modality) else {
        if spec.required {
            return Err(TryOnDatasetError::UnsupportedModality(spec.modality.clone()));
        }
        return Ok(Vec::new());
    };
    let subject_dir = modality_dir.join(subject);
    if !is_existing_dir(&subject_dir)? {
        if !spec.required {
            return Ok(Vec::new());
        }
        // Name the outermost missing directory so a wholly absent modality
        // is reported as such.
        let path = if is_existing_dir(&modality_dir)? {
            subject_dir
        } else {
            modality_dir
        };
        return Err(TryOnDatasetError::NotFound {
            path,
            subject: subject.to_string(),
            modality: spec.modality.clone(),
        });
    }
    list_frames(&subject_dir, &spec.extensions)
}

/// Regular, non-hidden files under `dir` matching `extensions` (any when
/// empty), in natural frame order.
pub fn list_frames(dir: &Path, extensions: &[String]) -> DatasetResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TryOnDatasetError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TryOnDatasetError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        if !extensions.is_empty() && !has_extension(&path, extensions) {
            continue;
        }
        files.push(path);
    }
    sort_frames(&mut files);
    Ok(files)
}

/// Subject ids for the reference modality, in lexicographic order.
pub fn discover_subjects<L: FolderLayout + ?Sized>(
    layout: &L,
    root: &Path,
    reference: &Modality,
) -> DatasetResult<Vec<String>> {
    let dir = layout
        .modality_dir(root, reference)
        .ok_or_else(|| TryOnDatasetError::UnsupportedModality(reference.clone()))?;
    if !is_existing_dir(&dir)? {
        return Err(TryOnDatasetError::NotFound {
            path: dir,
            subject: String::new(),
            modality: reference.clone(),
        });
    }
    let mut subjects = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| TryOnDatasetError::io(&dir, e))? {
        let entry = entry.map_err(|e| TryOnDatasetError::io(&dir, e))?;
        let path = entry.path();
        if !path.is_dir() || is_hidden(&path) {
            continue;
        }
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => subjects.push(name.to_string()),
            None => tracing::warn!(
                path = %path.display(),
                "skipping subject directory with a non UTF-8 name"
            ),
        }
    }
    subjects.sort();
    Ok(subjects)
}

/// `true` for a directory, `false` when nothing is there (or a non-directory
/// is). Any other metadata failure, e.g. a permission error, is `Io`.
pub(crate) fn is_existing_dir(path: &Path) -> DatasetResult<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TryOnDatasetError::io(path, e)),
    }
}

/// Explicit subject lists must not repeat an id.
pub(crate) fn ensure_unique_subjects(subjects: &[String]) -> DatasetResult<()> {
    let mut seen = BTreeSet::new();
    match subjects.iter().find(|s| !seen.insert(s.as_str())) {
        Some(dup) => Err(TryOnDatasetError::Config(format!(
            "subject '{dup}' listed more than once"
        ))),
        None => Ok(()),
    }
}

pub fn sort_frames(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&file_name_lossy(a), &file_name_lossy(b)));
}

/// Compare filenames treating digit runs as numbers, so `frame_2` sorts
/// before `frame_10`. Ties fall back to plain string order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut lhs = chunks(a);
    let mut rhs = chunks(b);
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => cmp_numeric(x, y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// The last run of digits in the file stem, e.g. `000123` in
/// `frame_000123_flow.flo`.
pub fn frame_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_string_lossy();
    let number = chunks(&stem)
        .filter(|c| is_digits(c))
        .last()
        .and_then(|digits| digits.parse().ok());
    number
}

fn cmp_numeric(x: &str, y: &str) -> Ordering {
    let xs = x.trim_start_matches('0');
    let ys = y.trim_start_matches('0');
    xs.len()
        .cmp(&ys.len())
        .then_with(|| xs.cmp(ys))
        .then_with(|| x.len().cmp(&y.len()))
}

fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

fn is_digits(s: &str) -> bool {
    s.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::VvtLayout;
    use data_contracts::Split;

    #[test]
    fn natural_order_compares_digit_runs_numerically() {
        let mut names = vec!["frame_10.png", "frame_2.png", "frame_1.png", "frame_02.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["frame_1.png", "frame_2.png", "frame_02.png", "frame_10.png"]
        );
    }

    #[test]
    fn frame_number_takes_last_digit_run() {
        assert_eq!(frame_number(Path::new("a/v12_000034.png")), Some(34));
        assert_eq!(frame_number(Path::new("a/frame_7_flow.flo")), Some(7));
        assert_eq!(frame_number(Path::new("a/cover.jpg")), None);
    }

    #[test]
    fn list_frames_filters_hidden_dirs_and_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        for name in ["f_10.png", "f_9.PNG", "f_1.png", ".DS_Store", "notes.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        fs::create_dir(dir.join("nested")).unwrap();

        let all = list_frames(dir, &[]).unwrap();
        assert_eq!(all.len(), 4);

        let pngs = list_frames(dir, &["png".to_string()]).unwrap();
        let names: Vec<_> = pngs.iter().map(|p| file_name_lossy(p)).collect();
        assert_eq!(names, vec!["f_1.png", "f_9.PNG", "f_10.png"]);
    }

    #[test]
    fn optional_modality_absent_resolves_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = VvtLayout::new(Split::Train);
        let spec = ModalitySpec::optional(Modality::Keypoint);
        let files = resolve(&layout, tmp.path(), "subj", &spec).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn file_in_place_of_modality_dir_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("train")).unwrap();
        fs::write(tmp.path().join("train/densepose"), b"not a dir").unwrap();
        let layout = VvtLayout::new(Split::Train);
        let spec = ModalitySpec::required(Modality::Densepose);
        let err = resolve(&layout, tmp.path(), "subj", &spec).unwrap_err();
        match err {
            TryOnDatasetError::Io { path, .. } => {
                assert_eq!(path, tmp.path().join("train/densepose/subj"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_reference_dir_names_no_subject() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = VvtLayout::new(Split::Train);
        let err = discover_subjects(&layout, tmp.path(), &Modality::Frame).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, TryOnDatasetError::NotFound { .. }));
        assert!(!msg.contains("subject ''"), "{msg}");
        assert!(msg.starts_with("frame not found at "), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_subject_dirs_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let frames = tmp.path().join("train/train_frames");
        fs::create_dir_all(frames.join("A")).unwrap();
        if fs::create_dir(frames.join(OsStr::from_bytes(b"bad\xff"))).is_err() {
            // Filesystem refuses non UTF-8 names.
            return;
        }
        let layout = VvtLayout::new(Split::Train);
        let subjects = discover_subjects(&layout, tmp.path(), &Modality::Frame).unwrap();
        assert_eq!(subjects, vec!["A".to_string()]);
    }

    #[test]
    fn repeated_subjects_are_config_errors() {
        let ok = vec!["a".to_string(), "b".to_string()];
        assert!(ensure_unique_subjects(&ok).is_ok());
        let dup = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert!(matches!(
            ensure_unique_subjects(&dup),
            Err(TryOnDatasetError::Config(msg)) if msg.contains("'a'")
        ));
    }

    #[test]
    fn required_modality_absent_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = VvtLayout::new(Split::Train);
        let spec = ModalitySpec::required(Modality::Densepose);
        let err = resolve(&layout, tmp.path(), "subj", &spec).unwrap_err();
        match err {
            TryOnDatasetError::NotFound { path, modality, .. } => {
                assert_eq!(modality, Modality::Densepose);
                assert_eq!(path, tmp.path().join("train/densepose"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
