use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ErrorKind, FetchError, Result};
use crate::types::{BoardSnapshot, Column, Issue, RefreshResult};

const PAGE_SIZE: usize = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const ISSUE_FIELDS: &str = "summary,status,assignee,issuetype,description";

/// Anything that can produce a fresh board snapshot.
#[async_trait]
pub trait BoardSource: Send + Sync + std::fmt::Debug {
    async fn fetch_board(&self, board_id: &str) -> RefreshResult;
}

pub struct Jira {
    client: Client,
    host: String,
    user: String,
    token: String,
}

impl std::fmt::Debug for Jira {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jira")
            .field("host", &self.host)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Jira {
    pub fn new(host: String, user: String, token: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            host,
            user,
            token,
        })
    }

    fn board_url(&self, board_id: &str, path: &str) -> String {
        format!(
            "{}/rest/agile/1.0/board/{}{}",
            self.host,
            urlencoding::encode(board_id),
            path
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| {
            FetchError::new(
                ErrorKind::ServerError,
                format!("malformed response from {}: {}", url, e),
            )
        })
    }

    async fn get_columns(&self, board_id: &str) -> std::result::Result<Vec<JrColumn>, FetchError> {
        let url = self.board_url(board_id, "/configuration");
        let config: JrBoardConfiguration = self.get_json(&url, &[]).await?;
        Ok(config.column_config.columns)
    }

    async fn get_issues(&self, board_id: &str) -> std::result::Result<Vec<JrIssue>, FetchError> {
        let url = self.board_url(board_id, "/issue");
        let mut issues = Vec::new();
        let mut start_at = 0;

        loop {
            let query = [
                ("startAt", start_at.to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
                ("fields", ISSUE_FIELDS.to_string()),
            ];
            let page: JrIssuePage = self.get_json(&url, &query).await?;
            let page_count = page.issues.len();

            debug!(
                board_id,
                start_at = page.start_at,
                max_results = page.max_results,
                total = page.total,
                page_count,
                "fetched board issue page"
            );

            let total = page.total;
            issues.extend(page.issues);

            // Advance by what actually arrived; the echoed startAt is not trusted.
            start_at += page_count;
            if page_count == 0 || start_at >= total {
                break;
            }
        }

        Ok(issues)
    }
}

#[async_trait]
impl BoardSource for Jira {
    async fn fetch_board(&self, board_id: &str) -> RefreshResult {
        let columns = self.get_columns(board_id).await?;
        let issues = self.get_issues(board_id).await?;
        Ok(BoardSnapshot::new(assemble_columns(columns, issues), Utc::now()))
    }
}

/// Place issues into the columns that claim their status, keeping arrival (rank) order.
fn assemble_columns(columns: Vec<JrColumn>, issues: Vec<JrIssue>) -> Vec<Column> {
    let mut by_status = HashMap::new();
    for (index, column) in columns.iter().enumerate() {
        for status in &column.statuses {
            by_status.entry(status.id.clone()).or_insert(index);
        }
    }

    let mut board: Vec<Column> = columns.into_iter().map(|c| Column::new(c.name)).collect();

    for issue in issues {
        let status_id = issue.fields.status.as_ref().and_then(|s| s.id.clone());
        match status_id.and_then(|id| by_status.get(&id).copied()) {
            Some(index) => board[index].issues.push(issue.into()),
            None => debug!(key = %issue.key, "issue status is not mapped to a board column"),
        }
    }

    board
}

fn transport_error(err: reqwest::Error) -> FetchError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    FetchError::new(ErrorKind::Transport, message)
}

fn status_error(status: StatusCode, body: &str) -> FetchError {
    let kind = match status.as_u16() {
        401 | 403 => ErrorKind::Auth,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::Unexpected,
    };

    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("HTTP {}", status)
    } else if detail.chars().count() > 200 {
        let short: String = detail.chars().take(200).collect();
        format!("HTTP {}: {}...", status, short)
    } else {
        format!("HTTP {}: {}", status, detail)
    };

    FetchError::new(kind, message)
}

// Jira Agile API response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JrBoardConfiguration {
    column_config: JrColumnConfig,
}

#[derive(Deserialize)]
struct JrColumnConfig {
    #[serde(default)]
    columns: Vec<JrColumn>,
}

#[derive(Deserialize)]
struct JrColumn {
    name: String,
    #[serde(default)]
    statuses: Vec<JrStatusRef>,
}

#[derive(Deserialize)]
struct JrStatusRef {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JrIssuePage {
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    max_results: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<JrIssue>,
}

#[derive(Deserialize)]
struct JrIssue {
    key: String,
    fields: JrIssueFields,
}

#[derive(Deserialize)]
struct JrIssueFields {
    summary: Option<String>,
    status: Option<JrStatus>,
    assignee: Option<JrUser>,
    issuetype: Option<JrIssueType>,
    /// Plain text on most instances, an Atlassian document on some.
    description: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct JrIssueType {
    name: Option<String>,
}

#[derive(Deserialize)]
struct JrStatus {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JrUser {
    display_name: Option<String>,
}

impl From<JrIssue> for Issue {
    fn from(issue: JrIssue) -> Self {
        Issue {
            key: issue.key,
            summary: issue.fields.summary.unwrap_or_default(),
            status: issue
                .fields
                .status
                .and_then(|s| s.name)
                .unwrap_or_default(),
            assignee: issue.fields.assignee.and_then(|a| a.display_name),
            kind: issue.fields.issuetype.and_then(|t| t.name),
            description: issue
                .fields
                .description
                .as_ref()
                .map(description_text)
                .filter(|text| !text.trim().is_empty()),
        }
    }
}

/// Flatten a description into plain text. Document nodes contribute their
/// `text`; paragraphs and other block nodes end with a newline.
fn description_text(value: &serde_json::Value) -> String {
    fn collect(value: &serde_json::Value, out: &mut String) {
        match value {
            serde_json::Value::String(text) => out.push_str(text),
            serde_json::Value::Object(node) => {
                if let Some(serde_json::Value::String(text)) = node.get("text") {
                    out.push_str(text);
                }
                if let Some(serde_json::Value::Array(children)) = node.get("content") {
                    for child in children {
                        collect(child, out);
                    }
                    let is_doc = node.get("type").and_then(|t| t.as_str()) == Some("doc");
                    if !is_doc && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }

    let mut out = String::new();
    collect(value, &mut out);
    out.trim_end().to_string()
}
