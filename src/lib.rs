//! Topic modeling for archived email corpora.
//!
//! The pipeline is linear: read an mbox archive into typed records, clean
//! and tokenize the text, build a vocabulary and bag-of-words corpus, train
//! an LDA model with collapsed Gibbs sampling, score it with sliding-window
//! NPMI coherence, then derive per-document dominant topics and a ranked
//! topic-term table.

pub mod clean;
pub mod coherence;
pub mod corpus;
pub mod error;
pub mod export;
pub mod ingest;
pub mod lda;
pub mod models;
pub mod ranking;

pub use error::{Result, TopicError};
