//! Timeline Export
//!
//! Serialises a snapshot to JSON or CSV for download. Pure transforms, no I/O.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DomainError, DomainResult, Dependency, Milestone, Post, TimelineSnapshot};

/// Fixed CSV column order
pub const CSV_HEADERS: [&str; 10] = [
    "Type",
    "ID",
    "Title",
    "Description",
    "Start Date",
    "End Date",
    "Status",
    "Priority",
    "Assignee",
    "Tags",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    roadmap_name: &'a str,
    export_date: &'a str,
    posts: &'a [Post],
    milestones: &'a [Milestone],
    dependencies: &'a [Dependency],
}

/// Pretty-printed JSON document with the whole snapshot
pub fn export_json(roadmap_name: &str, exported_at: &str, snapshot: &TimelineSnapshot) -> DomainResult<String> {
    let doc = ExportDocument {
        roadmap_name,
        export_date: exported_at,
        posts: &snapshot.posts,
        milestones: &snapshot.milestones,
        dependencies: &snapshot.dependencies,
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| DomainError::Internal(format!("JSON export failed: {}", e)))
}

/// Posts, then milestones, one row each. Dependencies are not part of the CSV.
pub fn export_csv(snapshot: &TimelineSnapshot) -> String {
    let mut lines = Vec::with_capacity(1 + snapshot.posts.len() + snapshot.milestones.len());
    lines.push(CSV_HEADERS.join(","));

    for post in &snapshot.posts {
        let row = [
            "Post".to_string(),
            post.id.to_string(),
            quoted(&post.title),
            quoted(post.description.as_deref().unwrap_or("")),
            field(post.start_date.as_deref().unwrap_or("")),
            field(post.end_date.as_deref().unwrap_or("")),
            post.status_id.map(|id| id.to_string()).unwrap_or_default(),
            post.priority.map(|p| p.as_str().to_string()).unwrap_or_default(),
            field(post.assignee_id.as_deref().unwrap_or("")),
            field(&post.tags.join(";")),
        ];
        lines.push(row.join(","));
    }

    for milestone in &snapshot.milestones {
        let row = [
            "Milestone".to_string(),
            milestone.id.to_string(),
            quoted(&milestone.title),
            quoted(milestone.description.as_deref().unwrap_or("")),
            field(&milestone.date),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// `<sanitised-name>-timeline-YYYY-MM-DD.<ext>`
pub fn export_filename(roadmap_name: &str, format: ExportFormat, date: NaiveDate) -> String {
    let sanitized: String = roadmap_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!(
        "{}-timeline-{}.{}",
        sanitized,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Always quoted, embedded quotes doubled
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Quoted only when needed
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, Priority};

    fn snapshot() -> TimelineSnapshot {
        let mut post = Post::new(1, 3, "Say \"hi\"".to_string()).with_dates(Some("2024-01-01"), None);
        post.description = Some("multi, part".to_string());
        post.status_id = Some(4);
        post.priority = Some(Priority::High);
        post.assignee_id = Some("u-1".to_string());
        post.tags = vec!["ui".to_string(), "api".to_string()];

        let mut milestone = Milestone::new(2, 3, "Launch".to_string(), "2024-02-01".to_string());
        milestone.description = None;

        TimelineSnapshot::new(
            vec![post],
            vec![milestone],
            vec![Dependency {
                id: 8,
                roadmap_id: 3,
                source_id: 1,
                target_id: 1,
                dependency_type: DependencyType::StartToStart,
            }],
        )
    }

    #[test]
    fn test_csv_layout() {
        let csv = export_csv(&snapshot());
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Type,ID,Title,Description,Start Date,End Date,Status,Priority,Assignee,Tags"
        );
        assert_eq!(
            lines[1],
            "Post,1,\"Say \"\"hi\"\"\",\"multi, part\",2024-01-01,,4,high,u-1,ui;api"
        );
        assert_eq!(lines[2], "Milestone,2,\"Launch\",\"\",2024-02-01,,,,,");
    }

    #[test]
    fn test_csv_quotes_tags_with_commas() {
        let mut snap = snapshot();
        snap.posts[0].tags = vec!["a,b".to_string()];
        let csv = export_csv(&snap);
        assert!(csv.lines().nth(1).unwrap().ends_with(",\"a,b\""));
    }

    #[test]
    fn test_csv_empty_snapshot_is_header_only() {
        let csv = export_csv(&TimelineSnapshot::default());
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_json_document() {
        let json = export_json("Q1 Plan", "2024-03-01T00:00:00Z", &snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["roadmapName"], "Q1 Plan");
        assert_eq!(value["exportDate"], "2024-03-01T00:00:00Z");
        assert_eq!(value["posts"][0]["priority"], "high");
        assert_eq!(value["dependencies"][0]["dependency_type"], "start-to-start");
        assert_eq!(value["milestones"].as_array().unwrap().len(), 1);
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            export_filename("Q1 Plan/Web", ExportFormat::Csv, date),
            "q1-plan-web-timeline-2024-03-09.csv"
        );
        assert_eq!(ExportFormat::parse("JSON"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse("xml"), None);
    }
}
