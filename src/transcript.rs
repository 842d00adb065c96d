//! Transcript sink: a human-readable block per extract record.
//!
//! Blocks carry the title, URL, optional publish date, and the extract text,
//! separated by an 80-character rule. The transcript is written even when
//! the run produced nothing, so a degraded run still leaves evidence behind.

use crate::models::ExtractRecord;
use std::fmt::Write as _;
use tokio::fs;
use tracing::{info, instrument};

const BLOCK_DELIMITER: &str =
    "================================================================================";

/// Render records into the block format, in order.
pub fn format_records(records: &[ExtractRecord]) -> String {
    let mut out = String::new();
    for record in records {
        writeln!(out, "Title: {}", record.title).unwrap();
        writeln!(out, "URL: {}", record.url).unwrap();
        if !record.published_at.is_empty() {
            writeln!(out, "Published: {}", record.published_at).unwrap();
        }
        writeln!(out, "Extract:\n{}", record.extract).unwrap();
        writeln!(out, "{BLOCK_DELIMITER}\n").unwrap();
    }
    out
}

/// Write the transcript file for this run.
#[instrument(level = "info", skip(records), fields(%path, count = records.len()))]
pub async fn write_records(records: &[ExtractRecord], path: &str) -> std::io::Result<()> {
    fs::write(path, format_records(records)).await?;
    info!("Wrote transcript");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, published_at: &str) -> ExtractRecord {
        ExtractRecord {
            title: title.to_string(),
            url: format!("http://x/{}", title.to_lowercase()),
            published_at: published_at.to_string(),
            extract: format!("extract-{title}"),
        }
    }

    #[test]
    fn test_blocks_in_record_order() {
        let records = vec![record("A", ""), record("B", "")];
        let out = format_records(&records);
        let a = out.find("Title: A").unwrap();
        let b = out.find("Title: B").unwrap();
        assert!(a < b);
        assert_eq!(out.matches(BLOCK_DELIMITER).count(), 2);
    }

    #[test]
    fn test_published_line_only_when_present() {
        let records = vec![
            record("Dated", "Mon, 05 May 2025 10:00:00 GMT"),
            record("Undated", ""),
        ];
        let out = format_records(&records);
        assert!(out.contains("Published: Mon, 05 May 2025 10:00:00 GMT"));
        assert_eq!(out.matches("Published:").count(), 1);
    }

    #[test]
    fn test_block_layout() {
        let out = format_records(&[record("A", "")]);
        assert!(out.starts_with("Title: A\nURL: http://x/a\nExtract:\nextract-A\n"));
        assert!(out.ends_with(&format!("{BLOCK_DELIMITER}\n\n")));
    }

    #[test]
    fn test_no_records_formats_empty() {
        assert!(format_records(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_write_records_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "rss_narrator_transcript_test_{}.txt",
            std::process::id()
        ));
        let path_str = path.to_str().unwrap();

        let records = vec![record("A", ""), record("B", "")];
        write_records(&records, path_str).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, format_records(&records));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
