use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one pre-created asset, unique per `(worker, item)` pair.
///
/// The textual form is `<worker>_<item>`. Because both halves are decimal
/// integers and `_` never appears in either, distinct pairs always render to
/// distinct strings, and the worker prefix keeps every worker's namespace
/// disjoint from the others.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    #[must_use]
    pub fn new(worker_index: u32, item_index: u64) -> Self {
        Self(format!("{worker_index}_{item_index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the identifier back into its worker and item indices.
    #[must_use]
    pub fn parse(raw: &str) -> Option<(u32, u64)> {
        let (worker, item) = raw.split_once('_')?;
        Some((worker.parse().ok()?, item.parse().ok()?))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[must_use]
pub fn identifier_for(worker_index: u32, item_index: u64) -> AssetId {
    AssetId::new(worker_index, item_index)
}
