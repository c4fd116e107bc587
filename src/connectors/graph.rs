//! Microsoft Graph workbook access for attendance data.
//!
//! The attendance sheet is reachable only through a share link: the link is
//! encoded into a Graph share token, the first worksheet's used range is
//! fetched, and update counts are derived per engineer. Any failure along
//! the way degrades to empty stats (logged), matching the dashboard's
//! partial-data behavior.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::TokenProvider;
use crate::errors::ConnectorError;

const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";

/// Per-engineer attendance-sheet update stats.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub engineer_name: String,
    pub total_days: usize,
    pub updated_days: usize,
    /// updated / total × 100, rounded.
    pub update_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorksheetList {
    #[serde(default)]
    value: Vec<Worksheet>,
}

#[derive(Debug, Deserialize)]
struct Worksheet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UsedRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Encode a sharing URL as a Graph share token (`u!` + base64url, no pad).
fn share_token(link: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("u!{}", link).as_bytes())
}

pub struct GraphClient {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    share_link: Option<String>,
}

impl GraphClient {
    pub fn new(tokens: Arc<TokenProvider>, share_link: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            share_link,
        }
    }

    /// Whether the SharePoint connector can currently mint a token.
    pub async fn is_connected(&self) -> bool {
        self.tokens.access_token("sharepoint").await.is_ok()
    }

    async fn fetch_used_range(&self, link: &str) -> Result<UsedRange, ConnectorError> {
        let token = self.tokens.access_token("sharepoint").await?;
        let share = share_token(link);

        let worksheets: WorksheetList = self
            .client
            .get(format!(
                "{}/shares/{}/driveItem/workbook/worksheets",
                GRAPH_API, share
            ))
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let first = worksheets
            .value
            .first()
            .ok_or(ConnectorError::UnexpectedResponse {
                endpoint: "workbook/worksheets",
                message: "workbook has no worksheets".to_string(),
            })?;

        let range: UsedRange = self
            .client
            .get(format!(
                "{}/shares/{}/driveItem/workbook/worksheets/{}/usedRange",
                GRAPH_API, share, first.id
            ))
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(range)
    }

    /// Attendance stats for every engineer on the sheet; empty on any
    /// failure.
    pub async fn attendance_stats(&self) -> Vec<AttendanceStats> {
        let Some(link) = self.share_link.clone() else {
            warn!("attendance share link not configured; skipping attendance fetch");
            return Vec::new();
        };

        match self.fetch_used_range(&link).await {
            Ok(range) => parse_attendance(&range.values),
            Err(err) => {
                warn!(error = %err, "failed to fetch attendance data from workbook");
                Vec::new()
            }
        }
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Walk the used range: header row, name column, date columns after it;
/// count non-empty cells per engineer.
fn parse_attendance(values: &[Vec<serde_json::Value>]) -> Vec<AttendanceStats> {
    if values.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = values[0].iter().map(cell_text).collect();
    let Some(name_col) = headers.iter().position(|h| {
        let lower = h.to_lowercase();
        lower.contains("name") || lower.contains("engineer")
    }) else {
        warn!("attendance sheet has no name column; ignoring sheet");
        return Vec::new();
    };

    let date_headers: Vec<&String> = headers[name_col + 1..]
        .iter()
        .filter(|h| !h.is_empty())
        .collect();
    let total_days = date_headers.len();

    let mut stats = Vec::new();
    for row in &values[1..] {
        let engineer_name = row.get(name_col).map(cell_text).unwrap_or_default();
        if engineer_name.is_empty() {
            continue;
        }

        let mut updated_days = 0;
        let mut last_update = None;
        for offset in 0..total_days {
            let col = name_col + 1 + offset;
            let filled = row.get(col).map(cell_text).is_some_and(|c| !c.is_empty());
            if filled {
                updated_days += 1;
                last_update = headers.get(col).cloned();
            }
        }

        let update_rate = if total_days > 0 {
            ((updated_days as f64 / total_days as f64) * 100.0).round() as u32
        } else {
            0
        };

        stats.push(AttendanceStats {
            engineer_name,
            total_days,
            updated_days,
            update_rate,
            last_update,
        });
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn share_token_is_base64url_without_padding() {
        let token = share_token("https://contoso-my.sharepoint.com/:x:/g/personal/a/AbCd");
        assert!(!token.contains('='));
        assert!(!token.contains('/'));
        assert!(!token.contains('+'));

        let decoded = URL_SAFE_NO_PAD.decode(token.as_bytes()).unwrap();
        let decoded = String::from_utf8(decoded).unwrap();
        assert!(decoded.starts_with("u!https://"));
    }

    #[test]
    fn parse_attendance_counts_filled_cells() {
        let values = vec![
            vec![
                json!("Engineer Name"),
                json!("Dec 5"),
                json!("Dec 6"),
                json!("Dec 7"),
            ],
            vec![json!("Sachin"), json!("P"), json!(""), json!("P")],
            vec![json!("Keerthi"), json!(""), json!(""), json!("")],
        ];
        let stats = parse_attendance(&values);
        assert_eq!(stats.len(), 2);

        assert_eq!(stats[0].engineer_name, "Sachin");
        assert_eq!(stats[0].total_days, 3);
        assert_eq!(stats[0].updated_days, 2);
        assert_eq!(stats[0].update_rate, 67);
        assert_eq!(stats[0].last_update.as_deref(), Some("Dec 7"));

        assert_eq!(stats[1].updated_days, 0);
        assert_eq!(stats[1].update_rate, 0);
        assert!(stats[1].last_update.is_none());
    }

    #[test]
    fn parse_attendance_skips_blank_names_and_numeric_cells() {
        let values = vec![
            vec![json!("Name"), json!("Dec 5")],
            vec![json!(""), json!("P")],
            vec![json!("Prakash"), json!(1)],
        ];
        let stats = parse_attendance(&values);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].engineer_name, "Prakash");
        assert_eq!(stats[0].updated_days, 1);
    }

    #[test]
    fn parse_attendance_requires_name_column() {
        let values = vec![
            vec![json!("Column A"), json!("Column B")],
            vec![json!("x"), json!("y")],
        ];
        assert!(parse_attendance(&values).is_empty());
    }

    #[test]
    fn parse_attendance_empty_sheet() {
        assert!(parse_attendance(&[]).is_empty());
        assert!(parse_attendance(&[vec![json!("Name")]]).is_empty());
    }
}
