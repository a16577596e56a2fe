use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One email as read from the archive, before any cleaning.
#[derive(Debug, Clone)]
pub struct EmailRecord {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub sent_at: Option<DateTime<FixedOffset>>,
}

/// One processed email: an identifier plus its ordered, normalized tokens.
///
/// Produced by the cleaning stage and consumed read-only by the corpus
/// builder; the core never mutates a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub tokens: Vec<String>,
    pub sent_at: Option<DateTime<FixedOffset>>,
}

/// The dominant topic chosen for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub document_id: String,
    pub dominant_topic: usize,
}

/// One row of the ranked topic table: a topic, its corpus-averaged
/// importance, and its top terms with weights (heaviest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTopic {
    pub topic_id: usize,
    pub importance: f64,
    pub terms: Vec<(String, f64)>,
}

/// Topics sorted by importance descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTopicTable {
    pub topics: Vec<RankedTopic>,
}
