//! Fixed-capacity document accumulator

use crate::search::ParsedDocument;

/// Documents waiting for the next commit
///
/// Owned by the indexer stage alone. `take` hands the filled batch off and
/// leaves an empty one in its place.
#[derive(Debug)]
pub struct IndexBatch {
    documents: Vec<ParsedDocument>,
    capacity: usize,
}

impl IndexBatch {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            documents: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, document: ParsedDocument) {
        self.documents.push(document);
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.documents.len() >= self.capacity
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn documents(&self) -> &[ParsedDocument] {
        &self.documents
    }

    #[must_use]
    pub fn take(&mut self) -> IndexBatch {
        let fresh = Vec::with_capacity(self.capacity);
        IndexBatch {
            documents: std::mem::replace(&mut self.documents, fresh),
            capacity: self.capacity,
        }
    }

    #[must_use]
    pub fn into_documents(self) -> Vec<ParsedDocument> {
        self.documents
    }
}
