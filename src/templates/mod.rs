//! Reference template corpus and retrieval
//!
//! - [`corpus`]: the read-only set of reference games
//! - [`vector`]: optional similarity tier
//! - [`retriever`]: two-tier ranking with a guaranteed default

pub mod corpus;
pub mod retriever;
pub mod vector;

pub use corpus::{TemplateCorpus, TemplateRecord, DEFAULT_TEMPLATE_ID};
pub use retriever::TemplateRetriever;
pub use vector::{Embedder, HashingEmbedder, InMemoryVectorIndex, VectorIndex, VectorIndexError};
