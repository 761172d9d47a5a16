use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::{ErrorKind, TetherError, TetherResult};

/// Identifier assigned by a document store to a document inserted without
/// an explicit `_id`.
///
/// A `DocumentId` wraps a random (v4) UUID. Ids are totally ordered so they
/// can be used as keys of ordered maps, and they round-trip through their
/// hyphenated string form.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::common::DocumentId;
///
/// let id = DocumentId::new();
/// let parsed: DocumentId = id.to_string().parse()?;
/// assert_eq!(id, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh, random id.
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        DocumentId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Debug for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentId({})", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = TetherError;

    fn from_str(s: &str) -> TetherResult<Self> {
        Uuid::parse_str(s).map(DocumentId).map_err(|err| {
            log::error!("Invalid document id {}: {}", s, err);
            TetherError::new(
                &format!("Invalid document id '{}'", s),
                ErrorKind::ObjectMappingError,
            )
        })
    }
}
