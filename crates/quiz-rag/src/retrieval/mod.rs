//! Indexing and similarity retrieval over stored collections

mod indexer;
mod search;

pub use indexer::Indexer;
pub use search::{cosine_similarity, Retriever};
