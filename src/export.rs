use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;

use crate::lda::LdaModel;
use crate::models::{Document, RankedTopicTable, TopicAssignment};

/// Write the document table merged with dominant-topic labels.
pub fn write_assignments(
    path: &Path,
    documents: &[Document],
    assignments: &[TopicAssignment],
) -> Result<()> {
    if documents.len() != assignments.len() {
        anyhow::bail!(
            "documents and assignments length mismatch: {} vs {}",
            documents.len(),
            assignments.len()
        );
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["document_id", "sent_at", "token_count", "dominant_topic"])?;

    for (document, assignment) in documents.iter().zip(assignments) {
        writer.write_record(&[
            document.id.clone(),
            document
                .sent_at
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            document.tokens.len().to_string(),
            assignment.dominant_topic.to_string(),
        ])?;
    }

    writer.flush()?;
    log::info!("dominant topics written to {}", path.display());
    Ok(())
}

/// Write the ranked topic table in wide form: one row per topic, one
/// (term, weight) column pair per reported term.
pub fn write_ranked_topics(path: &Path, table: &RankedTopicTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let num_terms = table.topics.first().map(|t| t.terms.len()).unwrap_or(0);
    let mut header = vec!["topic".to_string(), "importance".to_string()];
    for i in 1..=num_terms {
        header.push(format!("term_{}", i));
        header.push(format!("term_{}_weight", i));
    }
    writer.write_record(&header)?;

    for topic in &table.topics {
        let mut record = vec![topic.topic_id.to_string(), format!("{:.6}", topic.importance)];
        for (term, weight) in &topic.terms {
            record.push(term.clone());
            record.push(format!("{:.6}", weight));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    log::info!("ranked topics written to {}", path.display());
    Ok(())
}

/// Serialize the trained model as JSON for external tooling.
pub fn write_model(path: &Path, model: &LdaModel) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), model)?;
    log::info!("model written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, tokens: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            sent_at: None,
        }
    }

    fn assignment(id: &str, topic: usize) -> TopicAssignment {
        TopicAssignment {
            document_id: id.to_string(),
            dominant_topic: topic,
        }
    }

    #[test]
    fn rejects_assignment_length_mismatch() {
        let path = std::env::temp_dir().join("mail_topics_test_mismatch.csv");
        let documents = vec![doc("a", &["oil"]), doc("b", &["gas"])];
        let assignments = vec![assignment("a", 0)];

        let err = write_assignments(&path, &documents, &assignments).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn writes_header_plus_one_row_per_document() {
        let path = std::env::temp_dir().join("mail_topics_test_assignments.csv");
        let documents = vec![doc("a", &["oil", "gas"]), doc("b", &[])];
        let assignments = vec![assignment("a", 1), assignment("b", 0)];

        write_assignments(&path, &documents, &assignments).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "document_id,sent_at,token_count,dominant_topic");
        assert_eq!(lines[1], "a,,2,1");
        assert_eq!(lines[2], "b,,0,0");
    }
}
