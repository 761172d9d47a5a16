use crate::common::Document;

/// Sort direction of a sort field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Cursor configuration forwarded to the document store by a find.
///
/// `FindOptions` collects everything a query can ask of the server-side
/// cursor: pagination, ordering, field selection, batch size and an index
/// hint. The options are independent of each other and can be set in any
/// order; a store applies filter, sort, skip, limit and projection in that
/// sequence.
///
/// # Examples
///
/// ```rust,ignore
/// use tether::store::{FindOptions, SortOrder};
///
/// let options = FindOptions::new()
///     .sort_by("age", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// // mgo-style sort keys, `-` means descending
/// let options = FindOptions::new().sort_fields(&["lastname", "-age"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    skip: Option<u64>,
    limit: Option<u64>,
    sort: Vec<(String, SortOrder)>,
    projection: Option<Document>,
    batch_size: Option<u32>,
    hint: Vec<String>,
}

/// Creates `FindOptions` sorted by a single field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips the first `skip` results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` that returns at most `limit` results.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return. Zero means no limit.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    /// Appends a sort field.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort.push((field_name.to_string(), sort_order));
        self
    }

    /// Appends sort fields given as names, a leading `-` sorting descending.
    pub fn sort_fields(mut self, fields: &[&str]) -> FindOptions {
        for field in fields {
            match field.strip_prefix('-') {
                Some(name) => self.sort.push((name.to_string(), SortOrder::Descending)),
                None => self.sort.push((
                    field.trim_start_matches('+').to_string(),
                    SortOrder::Ascending,
                )),
            }
        }
        self
    }

    /// Restricts the returned fields, e.g. `doc!{ name: 1 }`.
    pub fn projection(mut self, projection: Document) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    /// Sets the number of documents fetched per round trip.
    pub fn batch_size(mut self, batch_size: u32) -> FindOptions {
        self.batch_size = Some(batch_size);
        self
    }

    /// Asks the store to use the index made of `fields`.
    pub fn hint(mut self, fields: &[&str]) -> FindOptions {
        self.hint = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn sort_spec(&self) -> &[(String, SortOrder)] {
        &self.sort
    }

    pub fn projection_spec(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn batch_size_hint(&self) -> Option<u32> {
        self.batch_size
    }

    pub fn index_hint(&self) -> &[String] {
        &self.hint
    }
}
