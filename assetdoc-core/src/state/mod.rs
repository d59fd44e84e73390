pub mod document;
pub mod provider;

pub use document::{Document, ID as DocumentID};
pub use provider::DocumentProvider;
