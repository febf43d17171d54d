//! Table and JSON rendering of the port view.

use anyhow::Result;
use portwatch_core::{PortViewRecord, ScanSummary};
use serde_json::json;

pub fn print_table(records: &[PortViewRecord]) {
    if records.is_empty() {
        println!("No ports match.");
        return;
    }

    println!(
        "{:<5} {:<6} {:<12} {:<8} {:<20} {:<24} {:<22} CONTAINER",
        "PROTO", "PORT", "STATUS", "PID", "PROCESS", "LOCAL", "REMOTE"
    );
    println!("{}", "-".repeat(120));

    for record in records {
        let b = &record.binding;
        let pid = b.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<5} {:<6} {:<12} {:<8} {:<20} {:<24} {:<22} {}",
            b.protocol,
            b.port,
            truncate(record.status_label(), 12),
            pid,
            truncate(&b.process_name, 20),
            truncate(&b.local_address, 24),
            truncate(&b.remote_address, 22),
            record.container_label()
        );
    }
}

pub fn print_json(records: &[PortViewRecord], summary: &ScanSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&document(records, summary)?)?);
    Ok(())
}

/// One compact document per line, for streaming consumers.
pub fn print_json_line(records: &[PortViewRecord], summary: &ScanSummary) -> Result<()> {
    println!("{}", serde_json::to_string(&document(records, summary)?)?);
    Ok(())
}

fn document(records: &[PortViewRecord], summary: &ScanSummary) -> Result<serde_json::Value> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let mut value = serde_json::to_value(record)?;
        if let Some(url) = record.browser_url() {
            value["url"] = json!(url);
        }
        rows.push(value);
    }
    Ok(json!({ "records": rows, "summary": serde_json::to_value(summary)? }))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portwatch_core::Protocol;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("sshd", 20), "sshd");
        assert_eq!(truncate("com.docker.backend", 8), "com.doc…");
        assert_eq!(truncate("ünïcødé-name", 4), "ünï…");
    }

    #[test]
    fn test_document_shape() {
        let records = vec![PortViewRecord::free(80, Protocol::Tcp)];
        let summary = ScanSummary {
            total_found: 0,
            total_displayed: 1,
            mapping_count: 0,
        };
        let doc = document(&records, &summary).unwrap();
        assert_eq!(doc["records"][0]["port"], 80);
        assert_eq!(doc["records"][0]["protocol"], "TCP");
        assert_eq!(doc["records"][0]["state"], "FREE");
        assert_eq!(doc["records"][0]["is_free"], true);
        assert!(doc["records"][0].get("url").is_none());
        assert_eq!(doc["summary"]["total_displayed"], 1);
    }
}
