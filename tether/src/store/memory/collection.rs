use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::common::{atomic, Atomic, Document, DocumentId, Value, DOC_ID};
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::store::memory::cursor::MemoryCursor;
use crate::store::memory::matcher::{compare_documents, matches, project};
use crate::store::memory::store::SessionState;
use crate::store::{ChangeOutcome, FindOptions, StoreCollection, StoreCursor};

/// Documents of one collection, keyed by `_id` in insertion order.
pub(crate) struct CollectionData {
    name: String,
    documents: Atomic<IndexMap<Value, Document>>,
}

impl CollectionData {
    pub(crate) fn new(name: &str) -> Self {
        CollectionData {
            name: name.to_string(),
            documents: atomic(IndexMap::new()),
        }
    }
}

/// A session-bound handle to an in-memory collection.
pub(crate) struct MemoryCollection {
    data: Arc<CollectionData>,
    session: Arc<SessionState>,
}

impl MemoryCollection {
    pub(crate) fn new(data: Arc<CollectionData>, session: Arc<SessionState>) -> Self {
        MemoryCollection { data, session }
    }

    fn select(&self, filter: &Document, options: &FindOptions) -> TetherResult<Vec<Document>> {
        let mut selected = Vec::new();
        {
            let documents = self.data.documents.read();
            for doc in documents.values() {
                if matches(doc, filter)? {
                    selected.push(doc.clone());
                }
            }
        }

        if !options.sort_spec().is_empty() {
            selected.sort_by(|a, b| compare_documents(a, b, options.sort_spec()));
        }

        let skip = options
            .skip_count()
            .map_or(0, |s| usize::try_from(s).unwrap_or(usize::MAX));
        let limit = options
            .limit_count()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(selected.into_iter().skip(skip).take(limit).collect())
    }

    fn first_match(documents: &IndexMap<Value, Document>, filter: &Document) -> TetherResult<Option<Value>> {
        for (key, doc) in documents.iter() {
            if matches(doc, filter)? {
                return Ok(Some(key.clone()));
            }
        }
        Ok(None)
    }

    fn not_found(&self, filter: &Document) -> TetherError {
        log::debug!("No document in {} matches {}", self.data.name, filter);
        TetherError::new(
            &format!("No document in {} matches {}", self.data.name, filter),
            ErrorKind::NotFound,
        )
    }

    /// Keeps the stored `_id` of a replaced document.
    fn replacement(old_id: &Value, mut document: Document) -> TetherResult<Document> {
        match document.id() {
            None => {
                document.put(DOC_ID, old_id.clone())?;
                Ok(document)
            }
            Some(id) if id == old_id => Ok(document),
            Some(id) => {
                log::error!("Cannot change document id from {} to {}", old_id, id);
                Err(TetherError::new(
                    "The _id of an existing document cannot be changed",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    fn insert_new(
        &self,
        documents: &mut IndexMap<Value, Document>,
        id: Value,
        mut document: Document,
    ) -> TetherResult<()> {
        if documents.contains_key(&id) {
            log::error!("Duplicate key {} in {}", id, self.data.name);
            return Err(TetherError::new(
                &format!("Duplicate key {} in collection {}", id, self.data.name),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        document.put(DOC_ID, id.clone())?;
        documents.insert(id, document);
        Ok(())
    }
}

impl StoreCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn find(&self, filter: &Document, options: &FindOptions) -> TetherResult<Box<dyn StoreCursor>> {
        self.session.ensure_open()?;
        if !options.index_hint().is_empty() || options.batch_size_hint().is_some() {
            log::debug!(
                "In-memory collection {} ignores hint {:?} and batch size {:?}",
                self.data.name,
                options.index_hint(),
                options.batch_size_hint()
            );
        }

        let selected = self.select(filter, options)?;
        let documents = match options.projection_spec() {
            Some(projection) => selected
                .into_iter()
                .map(|doc| project(doc, projection))
                .collect(),
            None => selected,
        };
        Ok(Box::new(MemoryCursor::new(&self.data.name, documents)))
    }

    fn count(&self, filter: &Document, options: &FindOptions) -> TetherResult<usize> {
        self.session.ensure_open()?;
        Ok(self.select(filter, options)?.len())
    }

    fn distinct(&self, field: &str, filter: &Document) -> TetherResult<Vec<Value>> {
        self.session.ensure_open()?;
        let mut values = IndexSet::new();
        for doc in self.select(filter, &FindOptions::new())? {
            match doc.get(field) {
                Some(Value::Array(items)) => values.extend(items.iter().cloned()),
                Some(value) => {
                    values.insert(value.clone());
                }
                None => {}
            }
        }
        Ok(values.into_iter().collect())
    }

    fn insert(&self, document: Document) -> TetherResult<Value> {
        self.session.ensure_open()?;
        let id = document
            .id()
            .cloned()
            .unwrap_or_else(|| Value::Id(DocumentId::new()));
        let mut documents = self.data.documents.write();
        self.insert_new(&mut documents, id.clone(), document)?;
        Ok(id)
    }

    fn update(&self, filter: &Document, document: Document) -> TetherResult<()> {
        self.session.ensure_open()?;
        let mut documents = self.data.documents.write();
        let key = Self::first_match(&documents, filter)?.ok_or_else(|| self.not_found(filter))?;
        let replacement = Self::replacement(&key, document)?;
        if let Some(slot) = documents.get_mut(&key) {
            *slot = replacement;
        }
        Ok(())
    }

    fn upsert(&self, filter: &Document, document: Document) -> TetherResult<ChangeOutcome> {
        self.session.ensure_open()?;
        let mut documents = self.data.documents.write();
        if let Some(key) = Self::first_match(&documents, filter)? {
            let replacement = Self::replacement(&key, document)?;
            if let Some(slot) = documents.get_mut(&key) {
                *slot = replacement;
            }
            return Ok(ChangeOutcome::updated(1));
        }

        let filter_id = filter
            .id()
            .filter(|id| !matches!(id, Value::Document(_)))
            .cloned();
        let id = document
            .id()
            .cloned()
            .or(filter_id)
            .unwrap_or_else(|| Value::Id(DocumentId::new()));
        self.insert_new(&mut documents, id.clone(), document)?;
        Ok(ChangeOutcome::inserted(id))
    }

    fn remove(&self, filter: &Document) -> TetherResult<()> {
        self.session.ensure_open()?;
        let mut documents = self.data.documents.write();
        let key = Self::first_match(&documents, filter)?.ok_or_else(|| self.not_found(filter))?;
        documents.shift_remove(&key);
        Ok(())
    }
}
