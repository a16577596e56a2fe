use std::path::Path;

use anyhow::Result;
use chrono::DateTime;

use crate::models::EmailRecord;

/// Read every parseable message out of an mbox archive.
///
/// Messages that fail to parse are skipped with a warning rather than
/// aborting the run; messages without a Message-ID get a positional one.
/// Malformed dates are stored as `None`.
pub fn read_mbox(path: &Path) -> Result<Vec<EmailRecord>> {
    let mbox = mbox_reader::MboxFile::from_file(path)?;
    let parser = mail_parser::MessageParser::new();
    let mut records = Vec::new();

    for (i, entry) in mbox.iter().enumerate() {
        let Some(message_bytes) = entry.message() else {
            log::warn!("empty mbox entry at {}", entry.start().as_str());
            continue;
        };

        let Some(message) = parser.parse(message_bytes) else {
            log::warn!("failed to parse message at {}", entry.start().as_str());
            continue;
        };

        let id = message
            .message_id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("message-{}", i));
        let subject = message.subject().unwrap_or("").to_string();
        let body = message
            .body_text(0)
            .map(|text| text.into_owned())
            .unwrap_or_default();
        let sent_at = message
            .date()
            .and_then(|date| DateTime::parse_from_rfc3339(&date.to_rfc3339()).ok());

        records.push(EmailRecord {
            id,
            subject,
            body,
            sent_at,
        });

        if (i + 1) % 1000 == 0 {
            log::debug!("parsed {} messages", i + 1);
        }
    }

    log::info!("parsed {} messages from {}", records.len(), path.display());
    Ok(records)
}
