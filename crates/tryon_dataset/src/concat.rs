//! Several datasets (e.g. different roots or layouts) behind one flat index.

use crate::dataset::TryOnDataset;
use crate::types::{Artifact, DatasetResult, PathBundle, SampleBundle, TryOnDatasetError};

/// Concatenation of member datasets in the order given. Bundles keep the
/// member's `dataset_name`, so callers can tell the sources apart.
pub struct ConcatDataset {
    name: String,
    members: Vec<Box<dyn TryOnDataset>>,
    /// Exclusive end offset of each member.
    ends: Vec<usize>,
}

impl ConcatDataset {
    pub fn new(members: Vec<Box<dyn TryOnDataset>>) -> Self {
        let name = members
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join("_");
        let mut total = 0usize;
        let ends = members
            .iter()
            .map(|m| {
                total += m.len();
                total
            })
            .collect();
        Self {
            name,
            members,
            ends,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn members(&self) -> &[Box<dyn TryOnDataset>] {
        &self.members
    }

    fn route(&self, index: usize) -> DatasetResult<(&dyn TryOnDataset, usize)> {
        let len = self.len();
        if index >= len {
            return Err(TryOnDatasetError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len,
            });
        }
        let pos = self.ends.partition_point(|&end| end <= index);
        let start = self.ends[pos] - self.members[pos].len();
        Ok((self.members[pos].as_ref(), index - start))
    }
}

impl TryOnDataset for ConcatDataset {
    fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn paths(&self, index: usize) -> DatasetResult<PathBundle> {
        let (member, local) = self.route(index)?;
        member.paths(local)
    }

    fn get_item(&self, index: usize) -> DatasetResult<SampleBundle<Artifact>> {
        let (member, local) = self.route(index)?;
        member.get_item(local)
    }
}
