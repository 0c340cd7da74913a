//! Vector index retrieval

mod vector_index;

pub use vector_index::{IndexSnapshot, IndexedPassage, RetrievalConfig, VectorIndexRetriever};
