//! Results keyed by test label, in insertion order.

use crate::{PostError, PostResult, ProcessedResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedResults {
    entries: Vec<(String, ProcessedResult)>,
}

impl NamedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Labels must be unique.
    pub fn insert(&mut self, label: impl Into<String>, result: ProcessedResult) -> PostResult<()> {
        let label = label.into();
        if self.contains(&label) {
            return Err(PostError::DuplicateLabel { label });
        }
        self.entries.push((label, result));
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&ProcessedResult> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, r)| r)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessedResult)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for NamedResults {
    type Item = (String, ProcessedResult);
    type IntoIter = std::vec::IntoIter<(String, ProcessedResult)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
