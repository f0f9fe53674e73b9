use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// A Jira issue as shown on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    /// Issue type, e.g. "Bug"
    pub kind: Option<String>,
    pub description: Option<String>,
}

impl Issue {
    /// Up to three initials of the assignee's display name, e.g. "Ada Lovelace" -> "AL"
    pub fn assignee_initials(&self) -> Option<String> {
        let initials: String = self
            .assignee
            .as_deref()?
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(3)
            .flat_map(char::to_uppercase)
            .collect();

        if initials.is_empty() {
            None
        } else {
            Some(initials)
        }
    }
}

/// A board column. Issue order is the server's rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub issues: Vec<Issue>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issues: Vec::new(),
        }
    }
}

/// Address of an issue inside one particular snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssuePosition {
    pub column: usize,
    pub issue: usize,
}

impl IssuePosition {
    pub fn new(column: usize, issue: usize) -> Self {
        Self { column, issue }
    }
}

/// Immutable point-in-time view of the board.
///
/// `cursor` is `None` only when every column is empty; otherwise it always
/// points at an existing issue. Column data is shared between a snapshot and
/// the navigation-only successors derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    columns: Arc<[Column]>,
    fetched_at: DateTime<Utc>,
    cursor: Option<IssuePosition>,
}

impl BoardSnapshot {
    /// Build a snapshot with the cursor on the first issue of the first non-empty column.
    pub fn new(columns: Vec<Column>, fetched_at: DateTime<Utc>) -> Self {
        let cursor = columns
            .iter()
            .position(|c| !c.issues.is_empty())
            .map(|column| IssuePosition::new(column, 0));

        Self {
            columns: columns.into(),
            fetched_at,
            cursor,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn cursor(&self) -> Option<IssuePosition> {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn issue_at(&self, position: IssuePosition) -> Option<&Issue> {
        self.columns.get(position.column)?.issues.get(position.issue)
    }

    pub fn focused_issue(&self) -> Option<&Issue> {
        self.issue_at(self.cursor?)
    }

    pub fn position_of(&self, key: &str) -> Option<IssuePosition> {
        self.columns.iter().enumerate().find_map(|(c, column)| {
            column
                .issues
                .iter()
                .position(|issue| issue.key == key)
                .map(|i| IssuePosition::new(c, i))
        })
    }

    pub fn issue_count(&self) -> usize {
        self.columns.iter().map(|c| c.issues.len()).sum()
    }

    /// Same data, different cursor. Callers must pass a position valid for this snapshot.
    pub(crate) fn with_cursor(&self, cursor: Option<IssuePosition>) -> Self {
        debug_assert!(match cursor {
            Some(position) => self.issue_at(position).is_some(),
            None => self.issue_count() == 0,
        });

        Self {
            columns: Arc::clone(&self.columns),
            fetched_at: self.fetched_at,
            cursor,
        }
    }
}

/// Outcome of one board fetch
pub type RefreshResult = Result<BoardSnapshot, FetchError>;
