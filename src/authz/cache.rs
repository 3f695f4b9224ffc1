use dashmap::DashMap;
use std::fmt;

use crate::schema::object_type_name;

/// Identity of a guarded field: `<ParentType>.<field>.<directive>`.
///
/// The credential is not part of the key; a request carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey(String);

impl DecisionKey {
    pub fn new(parent_type: &str, field_name: &str, directive: &str) -> Self {
        Self(format!("{parent_type}.{field_name}.{directive}"))
    }

    /// Builds the key from a possibly non-null-wrapped parent type name.
    pub fn for_field(parent_type: &str, field_name: &str, directive: &str) -> Self {
        Self::new(object_type_name(parent_type), field_name, directive)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped memo of authorization outcomes.
///
/// An entry is written once and never changes for the rest of the request.
#[derive(Debug, Default)]
pub struct DecisionCache {
    entries: DashMap<DecisionKey, bool>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DecisionKey) -> Option<bool> {
        self.entries.get(key).map(|entry| *entry)
    }

    /// Returns the cached outcome, computing and storing it on first use.
    ///
    /// `compute` runs under the shard lock, so concurrent callers with the
    /// same key wait for the first result instead of recomputing it.
    pub fn get_or_compute<F>(&self, key: DecisionKey, compute: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        *self.entries.entry(key).or_insert_with(compute)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
