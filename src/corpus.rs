use std::collections::HashMap;

use counter::Counter;
use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Sparse per-document term counts, sorted by vocabulary id.
pub type BagOfWords = Vec<(u32, u32)>;

/// Mapping between token strings and dense integer ids.
///
/// Ids are assigned in first-seen order over the input documents, so the
/// same ordered document set always yields the same vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn insert(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.tokens.len() as u32;
        self.tokens.push(token.to_string());
        self.ids.insert(token.to_string(), id);
        id
    }
}

/// A vocabulary plus one bag-of-words per document, in input order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub vocabulary: Vocabulary,
    pub bags: Vec<BagOfWords>,
    pub document_ids: Vec<String>,
}

impl Corpus {
    /// Build the vocabulary and bag-of-words representations for a set of
    /// documents. Tokens are taken case-sensitive as received; an empty
    /// token sequence yields an empty bag.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut vocabulary = Vocabulary::default();
        for document in documents {
            for token in &document.tokens {
                vocabulary.insert(token);
            }
        }

        let bags = documents
            .iter()
            .map(|document| {
                let counts: Counter<u32> = document
                    .tokens
                    .iter()
                    .filter_map(|token| vocabulary.id(token))
                    .collect();
                let mut bag: BagOfWords = counts
                    .into_map()
                    .into_iter()
                    .map(|(id, count)| (id, count as u32))
                    .collect();
                bag.sort_unstable_by_key(|&(id, _)| id);
                bag
            })
            .collect();

        let document_ids = documents.iter().map(|d| d.id.clone()).collect();

        Corpus {
            vocabulary,
            bags,
            document_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }
}
