//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): aligned table rows and short confirmations
//! - **JSON** (`--json`): `serde_json::to_string_pretty`, one document per
//!   command; `watch` prints one compact event per line

use serde_json::json;
use vigil_core::{Error, PositionedRecord, ViolationRecord, ViolationStats};
use vigil_engine::ChangeEvent;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

fn pretty(value: serde_json::Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!({
            "error": err.to_string(),
            "retryable": err.is_retryable(),
        })),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Format a listing.
pub fn format_listing(listing: &[PositionedRecord], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!(listing)),
        OutputMode::Human => {
            if listing.is_empty() {
                return "(no records)".to_string();
            }
            let mut lines = vec![format!(
                "{:>4}  {:<8}  {:<17}  {:<14}  {:<14}  {:<20}  {:<8}  {}",
                "pos", "id", "time", "area", "section", "violation", "resolved", "confirmed"
            )];
            for p in listing {
                let r = &p.record;
                lines.push(format!(
                    "{:>4}  {:<8}  {:<17}  {:<14}  {:<14}  {:<20}  {:<8}  {}",
                    p.position,
                    r.id().short(),
                    r.timestamp().to_string(),
                    r.factory_area(),
                    r.inspection_section(),
                    r.violation_type(),
                    flag(r.is_resolved()),
                    flag(r.is_confirmed()),
                ));
            }
            lines.join("\n")
        }
    }
}

/// Format a single record with a verb describing what happened to it.
pub fn format_record(
    verb: &str,
    position: usize,
    record: &ViolationRecord,
    mode: OutputMode,
) -> String {
    match mode {
        OutputMode::Json => pretty(json!({
            "action": verb,
            "position": position,
            "record": record,
        })),
        OutputMode::Human => format!(
            "{} #{} ({}): {} at {} / {}, {}",
            verb,
            position,
            record.id().short(),
            record.violation_type(),
            record.factory_area(),
            record.inspection_section(),
            record.timestamp()
        ),
    }
}

/// Format summary counts.
pub fn format_stats(stats: &ViolationStats, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!({
            "total": stats.total,
            "unresolved": stats.unresolved,
            "resolved": stats.resolved,
            "confirmed": stats.confirmed,
            "resolution_rate": stats.resolution_rate(),
        })),
        OutputMode::Human => format!(
            "Total violations: {}\nUnresolved:       {}\nResolved:         {}\nConfirmed:        {}\nResolution rate:  {:.1}%",
            stats.total,
            stats.unresolved,
            stats.resolved,
            stats.confirmed,
            stats.resolution_rate()
        ),
    }
}

/// Format one change event.
pub fn format_event(event: &ChangeEvent, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string(event).unwrap_or_default(),
        OutputMode::Human => {
            let r = &event.record;
            if event.is_new_alert() {
                let mut text = format!(
                    "NEW VIOLATION #{} ({})\n  time:      {}\n  area:      {}\n  section:   {}\n  violation: {}",
                    event.position,
                    r.id().short(),
                    r.timestamp(),
                    r.factory_area(),
                    r.inspection_section(),
                    r.violation_type()
                );
                if let Some(url) = r.image_url() {
                    text.push_str(&format!("\n  evidence:  {}", url));
                }
                text.push_str(&format!("\n  resolve with: vigil resolve {}", r.id()));
                text
            } else {
                format!(
                    "{} #{} ({}): {} at {}, resolved: {}",
                    event.kind,
                    event.position,
                    r.id().short(),
                    r.violation_type(),
                    r.factory_area(),
                    flag(r.is_resolved())
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{RecordDraft, RecordId};
    use vigil_engine::ChangeKind;

    fn record() -> ViolationRecord {
        RecordDraft::new("01/02/24 09:15 AM", "A1", "S3", "NoHelmet")
            .with_image_url("https://cctv.example/clip.mp4")
            .validate(RecordId::new())
            .unwrap()
    }

    #[test]
    fn test_listing_json_is_array() {
        let listing = vec![PositionedRecord {
            position: 0,
            record: record(),
        }];
        let v: serde_json::Value =
            serde_json::from_str(&format_listing(&listing, OutputMode::Json)).unwrap();
        assert_eq!(v[0]["position"], 0);
        assert_eq!(v[0]["record"]["violation_type"], "NoHelmet");
    }

    #[test]
    fn test_empty_listing_human() {
        assert_eq!(format_listing(&[], OutputMode::Human), "(no records)");
    }

    #[test]
    fn test_alert_mentions_evidence_and_resolve() {
        let event = ChangeEvent {
            kind: ChangeKind::Added,
            position: 4,
            record: record(),
        };
        let text = format_event(&event, OutputMode::Human);
        assert!(text.starts_with("NEW VIOLATION #4"));
        assert!(text.contains("https://cctv.example/clip.mp4"));
        assert!(text.contains("vigil resolve "));
    }

    #[test]
    fn test_stats_human() {
        let stats = ViolationStats {
            total: 4,
            unresolved: 3,
            resolved: 1,
            confirmed: 0,
        };
        assert!(format_stats(&stats, OutputMode::Human).contains("25.0%"));
    }

    #[test]
    fn test_error_json() {
        let err = Error::config("bad");
        let v: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputMode::Json)).unwrap();
        assert_eq!(v["retryable"], false);
    }
}
