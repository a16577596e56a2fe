use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::models::{Document, EmailRecord};

/// Stop words stripped before modeling: common English plus the
/// email-specific noise that otherwise dominates every topic.
const STOPWORDS: &[&str] = &[
    // Common English stop words
    "the", "and", "for", "are", "but", "not", "you", "your", "all", "can", "had",
    "her", "was", "one", "our", "out", "day", "get", "has", "him", "his",
    "how", "its", "may", "new", "now", "old", "see", "two", "who", "did",
    "man", "way", "what", "when", "where", "will", "with", "this", "that",
    "have", "from", "they", "know", "want", "been", "good", "much", "some",
    "time", "very", "come", "here", "just", "like", "long", "make", "many",
    "over", "such", "take", "than", "them", "well", "were", "there", "would",
    "could", "should", "might", "shall", "does", "done", "being", "having",
    "doing", "more", "most", "less", "least", "few", "little", "big", "small",
    "large", "great", "same", "different", "other", "first", "last", "next",
    "each", "every", "any", "about", "into", "only", "also", "then", "these",
    "those", "which", "their", "because", "before", "after", "between",
    // Email-specific noise
    "wrote", "said", "email", "message", "sent", "reply", "forward", "original",
    "subject", "mailto", "http", "https", "www", "com", "org", "net", "edu",
    "thanks", "please", "hello", "dear", "regards", "attached",
];

/// Normalizes raw email text into the token sequences the corpus builder
/// consumes: strip HTML, addresses, and URLs, lowercase, keep alphabetic
/// words of three or more letters, drop stop words, stem the rest.
pub struct TextCleaner {
    html_re: Regex,
    address_re: Regex,
    url_re: Regex,
    word_re: Regex,
    stopwords: HashSet<&'static str>,
    stemmer: Stemmer,
}

impl TextCleaner {
    pub fn new() -> Self {
        TextCleaner {
            html_re: Regex::new(r"<[^>]+>").unwrap(),
            address_re: Regex::new(r"\S+@\S+").unwrap(),
            url_re: Regex::new(r"(?:https?://|www\.)\S+").unwrap(),
            word_re: Regex::new(r"\b[a-z]{3,}\b").unwrap(),
            stopwords: STOPWORDS.iter().copied().collect(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Tokenize one piece of text.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let text = self.html_re.replace_all(text, " ");
        let text = self.address_re.replace_all(&text, " ");
        let text = self.url_re.replace_all(&text, " ");
        let lowered = text.to_lowercase();

        self.word_re
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| !self.stopwords.contains(word))
            .map(|word| self.stemmer.stem(word).to_string())
            .collect()
    }

    /// Turn parsed email records into documents, subject and body combined.
    pub fn clean_emails(&self, records: &[EmailRecord]) -> Vec<Document> {
        records
            .iter()
            .map(|record| Document {
                id: record.id.clone(),
                tokens: self.tokens(&format!("{} {}", record.subject, record.body)),
                sent_at: record.sent_at,
            })
            .collect()
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_tags() {
        let cleaner = TextCleaner::new();
        let tokens = cleaner.tokens("<html><body>gas market</body></html>");
        assert_eq!(tokens, vec!["gas", "market"]);
    }

    #[test]
    fn strips_addresses_and_urls() {
        let cleaner = TextCleaner::new();
        let tokens = cleaner.tokens("contact trader@example.com via https://example.com/report today");
        assert!(!tokens.iter().any(|t| t.contains("example")));
        assert!(tokens.contains(&"contact".to_string()));
    }

    #[test]
    fn lowercases_and_drops_short_and_stop_words() {
        let cleaner = TextCleaner::new();
        let tokens = cleaner.tokens("The Gas IS up BY 3 points");
        assert_eq!(tokens, vec!["gas", "point"]);
    }

    #[test]
    fn stems_inflected_forms_together() {
        let cleaner = TextCleaner::new();
        let singular = cleaner.tokens("connection");
        let plural = cleaner.tokens("connections");
        assert_eq!(singular, plural);
        assert_eq!(singular, vec!["connect"]);
    }

    #[test]
    fn clean_emails_keeps_order_and_ids() {
        let cleaner = TextCleaner::new();
        let records = vec![
            EmailRecord {
                id: "m1".to_string(),
                subject: "Gas report".to_string(),
                body: "pipeline flows increased".to_string(),
                sent_at: None,
            },
            EmailRecord {
                id: "m2".to_string(),
                subject: String::new(),
                body: String::new(),
                sent_at: None,
            },
        ];

        let documents = cleaner.clean_emails(&records);
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "m1");
        assert!(!documents[0].tokens.is_empty());
        assert!(documents[1].tokens.is_empty());
    }
}
