use std::collections::{HashMap, HashSet};

use crate::corpus::Vocabulary;
use crate::error::{Result, TopicError};
use crate::lda::LdaModel;
use crate::models::Document;

const STAGE: &str = "coherence-scoring";

/// Sliding co-occurrence window width, in tokens. Documents shorter than the
/// window contribute a single window.
const WINDOW: usize = 10;

const EPS: f64 = 1e-12;

/// Score a trained model against the original token sequences with a
/// sliding-window NPMI coherence measure, averaged over the top-term pairs of
/// each topic and then over topics. Higher is better.
///
/// Topics whose top terms never co-occur get a zero joint count, not an
/// error; the epsilon-smoothed joint probability keeps the pair defined.
pub fn coherence_score(
    vocabulary: &Vocabulary,
    documents: &[Document],
    model: &LdaModel,
    top_terms: usize,
) -> Result<f64> {
    if documents.is_empty() {
        return Err(TopicError::invalid_input(STAGE, "no documents to score against"));
    }
    if top_terms < 2 {
        return Err(TopicError::invalid_input(
            STAGE,
            format!("need at least 2 top terms per topic, got {}", top_terms),
        ));
    }

    let n = top_terms.min(vocabulary.len());
    let topic_terms: Vec<Vec<u32>> = (0..model.num_topics())
        .map(|topic| model.top_terms(topic, n).into_iter().map(|(w, _)| w).collect())
        .collect();
    let tracked: HashSet<u32> = topic_terms.iter().flatten().copied().collect();

    let (marginals, joints, num_windows) = window_counts(vocabulary, documents, &tracked);
    if num_windows == 0 {
        return Err(TopicError::invalid_input(STAGE, "no co-occurrence windows in corpus"));
    }
    let num_windows = num_windows as f64;

    let mut topic_scores = Vec::with_capacity(topic_terms.len());
    for terms in &topic_terms {
        let mut pair_total = 0.0;
        let mut pairs = 0usize;
        for (i, &wi) in terms.iter().enumerate() {
            for &wj in &terms[i + 1..] {
                let p_i = marginals.get(&wi).copied().unwrap_or(0) as f64 / num_windows;
                let p_j = marginals.get(&wj).copied().unwrap_or(0) as f64 / num_windows;
                if p_i <= 0.0 || p_j <= 0.0 {
                    continue;
                }
                let key = if wi < wj { (wi, wj) } else { (wj, wi) };
                let p_ij = joints.get(&key).copied().unwrap_or(0) as f64 / num_windows;
                pair_total += npmi(p_i, p_j, p_ij);
                pairs += 1;
            }
        }
        topic_scores.push(if pairs == 0 { 0.0 } else { pair_total / pairs as f64 });
    }

    Ok(topic_scores.iter().sum::<f64>() / topic_scores.len() as f64)
}

/// NPMI in [-1, 1]: ln(P(i,j) / (P(i)P(j))) / -ln(P(i,j)), with the joint
/// probability smoothed so a zero co-occurrence count stays defined. A pair
/// present in every window is maximal association by convention; without the
/// special case the smoothed joint would cross 1 and flip the sign of the
/// normalizer.
fn npmi(p_i: f64, p_j: f64, p_ij: f64) -> f64 {
    let joint = p_ij + EPS;
    if joint >= 1.0 {
        return 1.0;
    }
    ((joint / (p_i * p_j)).ln() / -joint.ln()).min(1.0)
}

type PairCounts = HashMap<(u32, u32), u64>;

fn window_counts(
    vocabulary: &Vocabulary,
    documents: &[Document],
    tracked: &HashSet<u32>,
) -> (HashMap<u32, u64>, PairCounts, u64) {
    let mut marginals: HashMap<u32, u64> = HashMap::new();
    let mut joints: PairCounts = HashMap::new();
    let mut num_windows = 0u64;

    for document in documents {
        let ids: Vec<u32> = document
            .tokens
            .iter()
            .filter_map(|token| vocabulary.id(token))
            .collect();
        if ids.is_empty() {
            continue;
        }

        let width = WINDOW.min(ids.len());
        for window in ids.windows(width) {
            num_windows += 1;
            let mut present: Vec<u32> = window
                .iter()
                .filter(|id| tracked.contains(id))
                .copied()
                .collect();
            present.sort_unstable();
            present.dedup();

            for &id in &present {
                *marginals.entry(id).or_insert(0) += 1;
            }
            for (i, &wi) in present.iter().enumerate() {
                for &wj in &present[i + 1..] {
                    *joints.entry((wi, wj)).or_insert(0) += 1;
                }
            }
        }
    }

    (marginals, joints, num_windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::lda::{self, LdaConfig};

    fn doc(id: &str, tokens: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            sent_at: None,
        }
    }

    #[test]
    fn score_is_finite_and_bounded() {
        let docs = vec![
            doc("a", &["oil", "gas", "oil", "barrel"]),
            doc("b", &["stock", "trade", "stock", "market"]),
        ];
        let corpus = Corpus::from_documents(&docs);
        let model = lda::train(&corpus, &LdaConfig::new(2).passes(5).seed(42)).unwrap();

        let score = coherence_score(&corpus.vocabulary, &docs, &model, 4).unwrap();
        assert!(score.is_finite());
        assert!((-1.001..=1.001).contains(&score));
    }

    #[test]
    fn disjoint_top_terms_are_not_an_error() {
        // Two single-token documents: no pair of distinct terms ever shares
        // a window, so every joint count is zero.
        let docs = vec![doc("a", &["oil"]), doc("b", &["stock"])];
        let corpus = Corpus::from_documents(&docs);
        let model = lda::train(&corpus, &LdaConfig::new(2).passes(2).seed(1)).unwrap();

        let score = coherence_score(&corpus.vocabulary, &docs, &model, 2).unwrap();
        assert!(score.is_finite());
    }

    #[test]
    fn perfect_cooccurrence_scores_above_disjoint_terms() {
        // Both terms share every window.
        let perfect_docs: Vec<Document> =
            (0..10).map(|i| doc(&format!("d{}", i), &["oil", "gas"])).collect();
        let perfect_corpus = Corpus::from_documents(&perfect_docs);

        // Same vocabulary, but the terms never share a window.
        let disjoint_docs: Vec<Document> = (0..10)
            .map(|i| {
                let tokens: &[&str] = if i % 2 == 0 { &["oil"] } else { &["gas"] };
                doc(&format!("d{}", i), tokens)
            })
            .collect();
        let disjoint_corpus = Corpus::from_documents(&disjoint_docs);

        let model = LdaModel::from_parts(LdaConfig::new(1), vec![vec![0.6, 0.4]]);

        let perfect =
            coherence_score(&perfect_corpus.vocabulary, &perfect_docs, &model, 2).unwrap();
        let disjoint =
            coherence_score(&disjoint_corpus.vocabulary, &disjoint_docs, &model, 2).unwrap();

        assert!((perfect - 1.0).abs() < 1e-6, "expected 1.0, got {}", perfect);
        assert!(
            perfect > disjoint,
            "expected {} > {}",
            perfect,
            disjoint
        );
    }

    #[test]
    fn rejects_empty_document_set() {
        let docs = vec![doc("a", &["oil", "gas"])];
        let corpus = Corpus::from_documents(&docs);
        let model = lda::train(&corpus, &LdaConfig::new(1).passes(1).seed(1)).unwrap();

        let err = coherence_score(&corpus.vocabulary, &[], &model, 2).unwrap_err();
        assert!(matches!(err, TopicError::InvalidInput { .. }));
    }

    #[test]
    fn cooccurring_top_terms_score_higher_than_separated_ones() {
        // "oil gas" always travel together; "oil" and "stock" never do.
        let docs: Vec<Document> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    doc(&format!("d{}", i), &["oil", "gas", "oil", "gas"])
                } else {
                    doc(&format!("d{}", i), &["stock", "trade", "stock", "trade"])
                }
            })
            .collect();
        let corpus = Corpus::from_documents(&docs);

        // Vocabulary order is first-seen: oil=0, gas=1, stock=2, trade=3.
        let separated = LdaModel::from_parts(
            LdaConfig::new(2),
            vec![vec![0.4, 0.4, 0.1, 0.1], vec![0.1, 0.1, 0.4, 0.4]],
        );
        let mixed = LdaModel::from_parts(
            LdaConfig::new(2),
            vec![vec![0.4, 0.1, 0.4, 0.1], vec![0.1, 0.4, 0.1, 0.4]],
        );

        let good = coherence_score(&corpus.vocabulary, &docs, &separated, 2).unwrap();
        let bad = coherence_score(&corpus.vocabulary, &docs, &mixed, 2).unwrap();
        assert!(good > bad, "expected {} > {}", good, bad);
    }
}
