use std::fmt::{Debug, Display, Formatter};

use im::OrdMap;
use itertools::Itertools;

use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, TetherError, TetherResult};

/// A schemaless record: an ordered map of field names to [Value]s.
///
/// Documents are what a document store persists and what selectors,
/// projections and sort specifications are written in. Keys are stored
/// literally, so a selector such as `doc!{ "address.city": "Paris" }` keeps
/// the dotted key, while [`Document::get`] resolves dotted paths through
/// embedded documents and arrays when looking a field up.
///
/// The `_id` field is reserved for the document identifier.
///
/// ## Persistent storage
///
/// The map is an `im::OrdMap`, so cloning a document is O(1) and stores can
/// hand out snapshots of their contents without copying every field.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ValidationError`] if `key` is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("age", 30)?;
    /// assert_eq!(doc.len(), 2);
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> TetherResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(TetherError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }
        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Returns the value stored under `key`, or `None` when the field is absent.
    ///
    /// A literal key wins; otherwise the key is split on `.` and resolved
    /// through embedded documents, with numeric segments indexing arrays.
    ///
    /// ```ignore
    /// let doc = doc!{ location: { city: "New York" }, tags: ["a", "b"] };
    /// assert_eq!(doc.get("location.city"), Some(&Value::from("New York")));
    /// assert_eq!(doc.get("tags.1"), Some(&Value::from("b")));
    /// ```
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut segments = key.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes a top-level field and returns its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns the document identifier, ignoring a null `_id`.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID).filter(|id| !id.is_null())
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    /// Copies every field of `other` into this document.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.data
                .iter()
                .map(|(key, value)| format!("\"{}\": {}", key, value))
                .join(", ")
        )
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

/// Strips the quotes `stringify!` leaves around string-literal keys.
#[doc(hidden)]
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Builds a [Document] from `key: value` pairs.
///
/// Keys may be identifiers or string literals; values may be literals,
/// parenthesized expressions, nested `{ ... }` documents or `[ ... ]` arrays.
///
/// ```ignore
/// let base = 100;
/// let doc = doc!{
///     _id: "u-1",
///     "address.city": "Paris",
///     score: (base * 2),
///     tags: ["admin", "user"],
///     profile: { active: true },
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::common::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::common::Document::new();
            $(
                doc.put(&$crate::common::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect("doc! keys are never empty");
            )*
            doc
        }
    };
}

/// Helper macro converting the values of a [`doc!`] invocation.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
