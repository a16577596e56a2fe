use crate::corpus::Corpus;
use crate::error::{Result, TopicError};
use crate::lda::LdaModel;
use crate::models::{RankedTopic, RankedTopicTable, TopicAssignment};

const STAGE: &str = "topic-ranking";

/// For each document, the topic with the highest posterior probability.
/// Exact ties resolve to the lowest topic index; output follows corpus order.
pub fn dominant_topics(corpus: &Corpus, model: &LdaModel) -> Result<Vec<TopicAssignment>> {
    check_model_fits_corpus(corpus, model)?;

    Ok(corpus
        .bags
        .iter()
        .zip(&corpus.document_ids)
        .map(|(bag, document_id)| {
            let theta = model.document_topics(bag);
            TopicAssignment {
                document_id: document_id.clone(),
                dominant_topic: argmax_lowest(&theta),
            }
        })
        .collect())
}

/// Rank topics by corpus-averaged importance and attach each topic's top
/// `num_terms` terms.
///
/// Importance of a topic is the mean of its probability mass across all
/// document-topic distributions; since each distribution sums to 1, the
/// importance scores sum to 1 as well. Rows come back sorted by importance
/// descending, term lists by weight descending with ties broken by ascending
/// vocabulary id.
pub fn ranked_topic_table(
    corpus: &Corpus,
    model: &LdaModel,
    num_terms: usize,
) -> Result<RankedTopicTable> {
    check_model_fits_corpus(corpus, model)?;
    if num_terms == 0 {
        return Err(TopicError::invalid_input(STAGE, "num_terms must be at least 1"));
    }
    if num_terms > corpus.vocabulary.len() {
        return Err(TopicError::invalid_input(
            STAGE,
            format!(
                "num_terms {} exceeds vocabulary size {}",
                num_terms,
                corpus.vocabulary.len()
            ),
        ));
    }
    if corpus.is_empty() {
        return Err(TopicError::invalid_input(STAGE, "corpus contains no documents"));
    }

    let k = model.num_topics();
    let mut importance = vec![0.0f64; k];
    for bag in &corpus.bags {
        for (topic, weight) in model.document_topics(bag).into_iter().enumerate() {
            importance[topic] += weight;
        }
    }
    for weight in importance.iter_mut() {
        *weight /= corpus.len() as f64;
    }

    let mut topics: Vec<RankedTopic> = (0..k)
        .map(|topic_id| {
            let terms = model
                .top_terms(topic_id, num_terms)
                .into_iter()
                .filter_map(|(id, weight)| {
                    corpus.vocabulary.token(id).map(|t| (t.to_string(), weight))
                })
                .collect();
            RankedTopic {
                topic_id,
                importance: importance[topic_id],
                terms,
            }
        })
        .collect();

    topics.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then(a.topic_id.cmp(&b.topic_id))
    });

    Ok(RankedTopicTable { topics })
}

fn check_model_fits_corpus(corpus: &Corpus, model: &LdaModel) -> Result<()> {
    if model.vocab_size() != corpus.vocabulary.len() {
        return Err(TopicError::invalid_input(
            STAGE,
            format!(
                "model vocabulary size {} does not match corpus vocabulary size {}",
                model.vocab_size(),
                corpus.vocabulary.len()
            ),
        ));
    }
    Ok(())
}

fn argmax_lowest(theta: &[f64]) -> usize {
    let mut best = 0;
    for (topic, &p) in theta.iter().enumerate().skip(1) {
        if p > theta[best] {
            best = topic;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lda::{self, LdaConfig};
    use crate::models::Document;

    const TOL: f64 = 1e-6;

    fn doc(id: &str, tokens: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            sent_at: None,
        }
    }

    fn trained() -> (Corpus, LdaModel) {
        let corpus = Corpus::from_documents(&[
            doc("a", &["oil", "gas", "oil"]),
            doc("b", &["stock", "trade", "stock"]),
        ]);
        let model = lda::train(&corpus, &LdaConfig::new(2).passes(5).seed(42)).unwrap();
        (corpus, model)
    }

    #[test]
    fn one_assignment_per_document_in_topic_range() {
        let (corpus, model) = trained();
        let assignments = dominant_topics(&corpus, &model).unwrap();

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].document_id, "a");
        assert_eq!(assignments[1].document_id, "b");
        for assignment in &assignments {
            assert!(assignment.dominant_topic < 2);
        }
    }

    #[test]
    fn assignments_are_reproducible() {
        let (corpus, model) = trained();
        let first = dominant_topics(&corpus, &model).unwrap();
        let second = dominant_topics(&corpus, &model).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_document_ties_break_to_topic_zero() {
        let corpus = Corpus::from_documents(&[doc("a", &["oil", "gas"]), doc("b", &[])]);
        let model = lda::train(&corpus, &LdaConfig::new(3).passes(2).seed(9)).unwrap();

        let assignments = dominant_topics(&corpus, &model).unwrap();
        assert_eq!(assignments[1].dominant_topic, 0);
    }

    #[test]
    fn importance_scores_sum_to_one() {
        let (corpus, model) = trained();
        let table = ranked_topic_table(&corpus, &model, 2).unwrap();

        let total: f64 = table.topics.iter().map(|t| t.importance).sum();
        assert!((total - 1.0).abs() < TOL, "importance sums to {}", total);
    }

    #[test]
    fn table_has_one_row_per_topic_sorted_by_importance() {
        let (corpus, model) = trained();
        let table = ranked_topic_table(&corpus, &model, 2).unwrap();

        assert_eq!(table.topics.len(), 2);
        for pair in table.topics.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn terms_within_a_row_are_sorted_by_weight_descending() {
        let (corpus, model) = trained();
        let table = ranked_topic_table(&corpus, &model, 4).unwrap();

        for topic in &table.topics {
            assert_eq!(topic.terms.len(), 4);
            for pair in topic.terms.windows(2) {
                assert!(pair[0].1 >= pair[1].1);
            }
        }
    }

    #[test]
    fn rejects_num_terms_beyond_vocabulary() {
        let (corpus, model) = trained();
        let err = ranked_topic_table(&corpus, &model, 1000).unwrap_err();
        assert!(matches!(err, TopicError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_zero_num_terms() {
        let (corpus, model) = trained();
        let err = ranked_topic_table(&corpus, &model, 0).unwrap_err();
        assert!(matches!(err, TopicError::InvalidInput { .. }));
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax_lowest(&[0.25, 0.25, 0.25, 0.25]), 0);
        assert_eq!(argmax_lowest(&[0.1, 0.45, 0.45]), 1);
        assert_eq!(argmax_lowest(&[0.2, 0.1, 0.7]), 2);
    }
}
