//! # Providers
//!
//! The source of ownership for open documents. One history per document lives inside each
//! [`Document`].

use super::{Document, DocumentID};

/// A provider that keeps documents in-memory.
#[derive(Default)]
pub struct DocumentProvider {
    documents: hashbrown::HashMap<DocumentID, Document>,
}
impl DocumentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Insert a new document, returning its ID.
    pub fn insert_new(&mut self, document: Document) -> DocumentID {
        let id = document.id();
        // Fresh documents have fresh IDs, can't clash.
        self.documents.insert(id, document);
        log::debug!("Opened document {id}");
        id
    }
    /// Insert a document into this provider.
    /// If a document with this ID already exists, the untouched document is returned as an error.
    pub fn insert(&mut self, document: Document) -> Result<(), Document> {
        match self.documents.entry(document.id()) {
            hashbrown::hash_map::Entry::Occupied(_) => return Err(document),
            hashbrown::hash_map::Entry::Vacant(v) => {
                v.insert(document);
            }
        }
        Ok(())
    }
    #[must_use]
    pub fn get(&self, id: DocumentID) -> Option<&Document> {
        self.documents.get(&id)
    }
    pub fn get_mut(&mut self, id: DocumentID) -> Option<&mut Document> {
        self.documents.get_mut(&id)
    }
    /// Close a document, handing it back.
    pub fn close(&mut self, id: DocumentID) -> Option<Document> {
        let closed = self.documents.remove(&id);
        if closed.is_some() {
            log::debug!("Closed document {id}");
        }
        closed
    }
    /// Iterate over all the open documents, by ID, in the order they were opened.
    pub fn document_iter(&self) -> impl Iterator<Item = DocumentID> {
        let mut ids: Vec<_> = self.documents.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
