use std::collections::HashMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::{BagOfWords, Corpus};
use crate::error::{Result, TopicError};

const STAGE: &str = "lda-training";

/// Documents per sampling block. Fixed so that the block decomposition, and
/// with it the per-block RNG streams, never depends on the worker count.
const BLOCK_DOCS: usize = 64;

const INFERENCE_ITERS: usize = 50;
const INFERENCE_TOL: f64 = 1e-8;

/// Hyperparameters for LDA training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaConfig {
    pub num_topics: usize,
    pub passes: usize,
    /// Dirichlet prior on document-topic distributions.
    pub alpha: f64,
    /// Dirichlet prior on topic-word distributions.
    pub beta: f64,
    pub seed: u64,
    pub workers: usize,
}

impl LdaConfig {
    pub fn new(num_topics: usize) -> Self {
        LdaConfig {
            num_topics,
            passes: 10,
            alpha: 0.1,
            beta: 0.01,
            seed: 42,
            workers: 1,
        }
    }

    pub fn passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// A trained LDA model: K topic-term distributions plus the hyperparameters
/// that produced them. Read-only once trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    config: LdaConfig,
    /// phi[t][w] = P(word w | topic t); each row sums to 1.
    phi: Vec<Vec<f64>>,
}

impl LdaModel {
    pub(crate) fn from_parts(config: LdaConfig, phi: Vec<Vec<f64>>) -> Self {
        LdaModel { config, phi }
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    pub fn num_topics(&self) -> usize {
        self.config.num_topics
    }

    pub fn vocab_size(&self) -> usize {
        self.phi.first().map(Vec::len).unwrap_or(0)
    }

    /// Term weights for one topic, indexed by vocabulary id.
    pub fn topic_terms(&self, topic: usize) -> &[f64] {
        &self.phi[topic]
    }

    /// Top `n` vocabulary ids for a topic, sorted by weight descending with
    /// ties broken by ascending id.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(u32, f64)> {
        let mut pairs: Vec<(u32, f64)> = self.phi[topic]
            .iter()
            .enumerate()
            .map(|(w, &p)| (w as u32, p))
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(n);
        pairs
    }

    /// Document-topic distribution for a bag-of-words, inferred by iterating
    /// the responsibilities against the trained topic-term weights until the
    /// distribution stops moving. Deterministic; an empty bag yields the
    /// uniform distribution.
    pub fn document_topics(&self, bag: &BagOfWords) -> Vec<f64> {
        let k = self.num_topics();
        let uniform = vec![1.0 / k as f64; k];
        if bag.is_empty() {
            return uniform;
        }

        let mut theta = uniform;
        for _ in 0..INFERENCE_ITERS {
            let mut gamma = vec![self.config.alpha; k];
            for &(w, count) in bag {
                let w = w as usize;
                let norm: f64 = (0..k).map(|t| theta[t] * self.phi[t][w]).sum();
                if norm <= f64::EPSILON {
                    continue;
                }
                for (t, slot) in gamma.iter_mut().enumerate() {
                    *slot += count as f64 * theta[t] * self.phi[t][w] / norm;
                }
            }
            let total: f64 = gamma.iter().sum();
            let next: Vec<f64> = gamma.into_iter().map(|g| g / total).collect();
            let moved: f64 = next
                .iter()
                .zip(&theta)
                .map(|(a, b)| (a - b).abs())
                .sum();
            theta = next;
            if moved < INFERENCE_TOL {
                break;
            }
        }
        theta
    }
}

/// Per-block result of one sampling pass: the block's updated document-topic
/// counts and assignments, plus its deltas against the pass-start snapshot of
/// the shared topic-word counts.
struct BlockOutcome {
    start_doc: usize,
    ndk: Vec<Vec<u32>>,
    assignments: Vec<Vec<usize>>,
    delta_nkw: Vec<HashMap<u32, i64>>,
    delta_nk: Vec<i64>,
}

/// Train an LDA model over a corpus with collapsed Gibbs sampling.
///
/// Identical corpus, config, and seed reproduce the identical model, for any
/// worker count: documents are partitioned into fixed-size blocks, each block
/// samples against the pass-start snapshot of the topic-word counts with an
/// RNG stream derived from (seed, pass, block), and block deltas are merged
/// after the pass.
pub fn train(corpus: &Corpus, config: &LdaConfig) -> Result<LdaModel> {
    validate(corpus, config)?;

    let k = config.num_topics;
    let v = corpus.vocabulary.len();
    let vb = v as f64 * config.beta;

    // Expand bags into token instance lists for per-position sampling.
    let docs: Vec<Vec<u32>> = corpus
        .bags
        .iter()
        .map(|bag| {
            let mut words = Vec::new();
            for &(w, count) in bag {
                for _ in 0..count {
                    words.push(w);
                }
            }
            words
        })
        .collect();

    let mut nkw = vec![vec![0i64; v]; k];
    let mut nk = vec![0i64; k];
    let mut ndk = vec![vec![0u32; k]; docs.len()];
    let mut assignments: Vec<Vec<usize>> = docs.iter().map(|d| vec![0; d.len()]).collect();

    // Seeded sequential initialization.
    let mut rng = StdRng::seed_from_u64(config.seed);
    for (di, doc) in docs.iter().enumerate() {
        for (pi, &w) in doc.iter().enumerate() {
            let topic = rng.gen_range(0..k);
            assignments[di][pi] = topic;
            ndk[di][topic] += 1;
            nkw[topic][w as usize] += 1;
            nk[topic] += 1;
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .map_err(|e| TopicError::workers(STAGE, e.to_string()))?;

    for pass in 0..config.passes {
        let outcomes: Vec<BlockOutcome> = pool.install(|| {
            docs.par_chunks(BLOCK_DOCS)
                .enumerate()
                .map(|(block_index, block)| {
                    sample_block(
                        block,
                        block_index,
                        pass,
                        config,
                        &nkw,
                        &nk,
                        &ndk,
                        &assignments,
                        vb,
                    )
                })
                .collect()
        });

        for outcome in outcomes {
            for (offset, (ndk_row, z_row)) in outcome
                .ndk
                .into_iter()
                .zip(outcome.assignments)
                .enumerate()
            {
                ndk[outcome.start_doc + offset] = ndk_row;
                assignments[outcome.start_doc + offset] = z_row;
            }
            for topic in 0..k {
                nk[topic] += outcome.delta_nk[topic];
                for (&w, &delta) in &outcome.delta_nkw[topic] {
                    nkw[topic][w as usize] += delta;
                }
            }
        }
        log::debug!("completed LDA pass {}/{}", pass + 1, config.passes);
    }

    let mut phi = vec![vec![0.0f64; v]; k];
    for topic in 0..k {
        let denom = nk[topic] as f64 + vb;
        for w in 0..v {
            phi[topic][w] = (nkw[topic][w] as f64 + config.beta) / denom;
        }
    }
    if phi.iter().flatten().any(|p| !p.is_finite()) {
        return Err(TopicError::numeric(
            STAGE,
            "trained topic-term weights are not finite",
        ));
    }

    Ok(LdaModel::from_parts(config.clone(), phi))
}

fn validate(corpus: &Corpus, config: &LdaConfig) -> Result<()> {
    if config.num_topics < 1 {
        return Err(TopicError::invalid_input(
            STAGE,
            format!("num_topics must be at least 1, got {}", config.num_topics),
        ));
    }
    if config.passes < 1 {
        return Err(TopicError::invalid_input(
            STAGE,
            format!("passes must be at least 1, got {}", config.passes),
        ));
    }
    if !(config.alpha > 0.0 && config.alpha.is_finite()) || !(config.beta > 0.0 && config.beta.is_finite()) {
        return Err(TopicError::invalid_input(
            STAGE,
            format!("alpha and beta must be positive, got {} / {}", config.alpha, config.beta),
        ));
    }
    if corpus.is_empty() {
        return Err(TopicError::invalid_input(STAGE, "corpus contains no documents"));
    }
    if corpus.bags.iter().all(|bag| bag.is_empty()) {
        return Err(TopicError::invalid_input(
            STAGE,
            "every document has an empty bag-of-words",
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn sample_block(
    block: &[Vec<u32>],
    block_index: usize,
    pass: usize,
    config: &LdaConfig,
    nkw: &[Vec<i64>],
    nk: &[i64],
    ndk_all: &[Vec<u32>],
    assignments_all: &[Vec<usize>],
    vb: f64,
) -> BlockOutcome {
    let k = config.num_topics;
    let start_doc = block_index * BLOCK_DOCS;
    let mut ndk: Vec<Vec<u32>> = ndk_all[start_doc..start_doc + block.len()].to_vec();
    let mut assignments: Vec<Vec<usize>> =
        assignments_all[start_doc..start_doc + block.len()].to_vec();
    let mut delta_nkw: Vec<HashMap<u32, i64>> = vec![HashMap::new(); k];
    let mut delta_nk = vec![0i64; k];

    let mut rng = StdRng::seed_from_u64(block_seed(config.seed, pass, block_index));
    let mut weights = vec![0.0f64; k];

    for (li, doc) in block.iter().enumerate() {
        for (pi, &w) in doc.iter().enumerate() {
            let old_topic = assignments[li][pi];
            ndk[li][old_topic] -= 1;
            *delta_nkw[old_topic].entry(w).or_insert(0) -= 1;
            delta_nk[old_topic] -= 1;

            // p(t) ∝ (ndk[d][t] + alpha) * (nkw[t][w] + beta) / (nk[t] + V*beta),
            // with nkw/nk read as snapshot plus this block's own deltas.
            for (topic, weight) in weights.iter_mut().enumerate() {
                let word_count =
                    (nkw[topic][w as usize] + delta_nkw[topic].get(&w).copied().unwrap_or(0)) as f64;
                let topic_count = (nk[topic] + delta_nk[topic]) as f64;
                let doc_side = ndk[li][topic] as f64 + config.alpha;
                *weight = doc_side * (word_count + config.beta) / (topic_count + vb);
            }

            let total: f64 = weights.iter().sum();
            let new_topic = if total <= f64::EPSILON {
                rng.gen_range(0..k)
            } else {
                match WeightedIndex::new(&weights) {
                    Ok(dist) => dist.sample(&mut rng),
                    Err(_) => rng.gen_range(0..k),
                }
            };

            assignments[li][pi] = new_topic;
            ndk[li][new_topic] += 1;
            *delta_nkw[new_topic].entry(w).or_insert(0) += 1;
            delta_nk[new_topic] += 1;
        }
    }

    BlockOutcome {
        start_doc,
        ndk,
        assignments,
        delta_nkw,
        delta_nk,
    }
}

fn block_seed(seed: u64, pass: usize, block: usize) -> u64 {
    seed.wrapping_add((pass as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add((block as u64 + 1).wrapping_mul(0xd1b5_4a32_d192_ed03))
}
