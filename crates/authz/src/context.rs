//! Role assignment context: a typed key-value restriction on where a role applies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Context payload attached to a role assignment (e.g. `{"groupId": "G1"}`).
///
/// Matching is a structural conjunction, not free-form logic: an assignment
/// context is satisfied by a query context iff every key it stores is present
/// and equal in the query. The map is order-independent by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleContext(BTreeMap<String, JsonValue>);

impl RoleContext {
    /// The empty context: a global grant, satisfied by any query.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Conjunctive match of this (stored) context against a query context.
    ///
    /// - Every key stored here must be present and equal in `query`.
    /// - An empty stored context matches unconditionally.
    /// - `None` (the caller omitted a context) matches **every** assignment,
    ///   whatever this context holds. That permissive default is a deliberate
    ///   policy choice so plain permission checks work without contextual
    ///   roles; it is intentionally asymmetric and pinned by tests.
    pub fn satisfied_by(&self, query: Option<&RoleContext>) -> bool {
        let Some(query) = query else {
            return true;
        };

        self.0.iter().all(|(key, value)| query.get(key) == Some(value))
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for RoleContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<RoleContext> for BTreeMap<String, JsonValue> {
    fn from(value: RoleContext) -> Self {
        value.0
    }
}

impl From<BTreeMap<String, JsonValue>> for RoleContext {
    fn from(value: BTreeMap<String, JsonValue>) -> Self {
        Self(value)
    }
}
