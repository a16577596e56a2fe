use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use mail_topics::clean::TextCleaner;
use mail_topics::corpus::Corpus;
use mail_topics::lda::LdaConfig;
use mail_topics::{coherence, export, ingest, lda, ranking};

#[derive(Parser, Debug)]
#[command(version, about = "Discover latent topics in an mbox email archive", long_about = None)]
struct Args {
    /// Path to the mbox archive
    path: PathBuf,
    #[clap(short, long, default_value_t = 10, help = "Number of topics to fit")]
    topics: usize,
    #[clap(short, long, default_value_t = 10, help = "Training passes over the corpus")]
    passes: usize,
    #[clap(short, long, default_value_t = 42, help = "Random seed for reproducible training")]
    seed: u64,
    #[clap(short, long, default_value_t = 1, help = "Parallel sampling workers")]
    workers: usize,
    #[clap(short = 'n', long, default_value_t = 10, help = "Terms to report per topic")]
    top_terms: usize,
    #[clap(short, long, default_value = "out", help = "Directory for CSV and model output")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let records = ingest::read_mbox(&args.path)?;
    let cleaner = TextCleaner::new();
    let documents = cleaner.clean_emails(&records);

    let corpus = Corpus::from_documents(&documents);
    log::info!(
        "corpus: {} documents, {} vocabulary terms",
        corpus.len(),
        corpus.vocabulary.len()
    );

    let config = LdaConfig::new(args.topics)
        .passes(args.passes)
        .seed(args.seed)
        .workers(args.workers);

    log::info!(
        "training LDA model with {} topics and {} passes",
        args.topics,
        args.passes
    );
    let started = Instant::now();
    let model = lda::train(&corpus, &config)?;
    log::info!("trained LDA model in {:.2} s", started.elapsed().as_secs_f64());

    let started = Instant::now();
    let score = coherence::coherence_score(
        &corpus.vocabulary,
        &documents,
        &model,
        args.top_terms.min(corpus.vocabulary.len()).max(2),
    )?;
    log::info!(
        "coherence score {:.4}, computed in {:.2} s",
        score,
        started.elapsed().as_secs_f64()
    );

    let assignments = ranking::dominant_topics(&corpus, &model)?;
    let table = ranking::ranked_topic_table(&corpus, &model, args.top_terms)?;

    std::fs::create_dir_all(&args.out_dir)?;
    export::write_assignments(
        &args.out_dir.join("emails_topics.csv"),
        &documents,
        &assignments,
    )?;
    export::write_ranked_topics(&args.out_dir.join("ranked_topics.csv"), &table)?;
    export::write_model(&args.out_dir.join("lda_model.json"), &model)?;

    println!("coherence: {:.4}", score);
    for topic in &table.topics {
        let terms: Vec<&str> = topic.terms.iter().map(|(term, _)| term.as_str()).collect();
        println!(
            "topic {:>2}  importance {:.4}  {}",
            topic.topic_id,
            topic.importance,
            terms.join(" ")
        );
    }

    Ok(())
}
