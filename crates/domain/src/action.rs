//! Operator maintenance requests and the reports they produce.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tablekeeper_core::{AppError, AppResult};

use crate::table::{TableName, TableStats};

/// Destructive statement applied to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableVerb {
    /// Remove every row, keep the table.
    Truncate,
    /// Remove the table.
    Drop,
}

impl TableVerb {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Drop => "drop",
        }
    }

    /// Past tense used in single and bulk status messages.
    #[must_use]
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Truncate => "truncated",
            Self::Drop => "dropped",
        }
    }

    fn all_scope_past_tense(&self) -> &'static str {
        match self {
            Self::Truncate => "emptied",
            Self::Drop => "dropped",
        }
    }
}

impl FromStr for TableVerb {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "truncate" => Ok(Self::Truncate),
            "drop" => Ok(Self::Drop),
            _ => Err(AppError::Validation(format!(
                "unknown table action '{value}'"
            ))),
        }
    }
}

impl Display for TableVerb {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Shape of an operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionScope {
    /// One named table, existence re-checked before acting.
    Single,
    /// An operator-selected list of tables.
    Bulk,
    /// Every table the classifier reports inactive at execution time.
    AllScope,
}

impl ActionScope {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Bulk => "bulk",
            Self::AllScope => "all_scope",
        }
    }
}

/// One validated operator submission. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Apply the verb to one table.
    Single {
        /// Target table.
        table: TableName,
        /// Statement to run.
        verb: TableVerb,
    },
    /// Apply the verb to each listed table in submission order.
    Bulk {
        /// Target tables without duplicates.
        tables: Vec<TableName>,
        /// Statement to run.
        verb: TableVerb,
    },
    /// Apply the verb to every currently inactive table.
    AllScope {
        /// Statement to run.
        verb: TableVerb,
    },
}

impl ActionRequest {
    /// Creates a single-table request.
    #[must_use]
    pub fn single(table: TableName, verb: TableVerb) -> Self {
        Self::Single { table, verb }
    }

    /// Creates a bulk request, dropping repeated names while keeping first-seen order.
    pub fn bulk(tables: impl IntoIterator<Item = TableName>, verb: TableVerb) -> AppResult<Self> {
        let mut seen = HashSet::new();
        let tables: Vec<TableName> = tables
            .into_iter()
            .filter(|table| seen.insert(table.clone()))
            .collect();

        if tables.is_empty() {
            return Err(AppError::Validation(
                "bulk action requires at least one table".to_owned(),
            ));
        }

        Ok(Self::Bulk { tables, verb })
    }

    /// Creates a request covering every inactive table.
    #[must_use]
    pub fn all_scope(verb: TableVerb) -> Self {
        Self::AllScope { verb }
    }

    /// Returns the requested statement.
    #[must_use]
    pub fn verb(&self) -> TableVerb {
        match self {
            Self::Single { verb, .. } | Self::Bulk { verb, .. } | Self::AllScope { verb } => *verb,
        }
    }

    /// Returns the request shape.
    #[must_use]
    pub fn scope(&self) -> ActionScope {
        match self {
            Self::Single { .. } => ActionScope::Single,
            Self::Bulk { .. } => ActionScope::Bulk,
            Self::AllScope { .. } => ActionScope::AllScope,
        }
    }
}

/// Result of one table statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The statement completed.
    Success,
    /// The table was missing or the engine rejected the statement.
    Failure,
}

/// Outcome of applying a verb to one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOutcome {
    table: TableName,
    verb: TableVerb,
    outcome: Outcome,
    detail: String,
    stats: Option<TableStats>,
}

impl TableOutcome {
    /// Records a completed statement.
    #[must_use]
    pub fn success(table: TableName, verb: TableVerb, stats: Option<TableStats>) -> Self {
        let detail = match (verb, stats) {
            (TableVerb::Truncate, Some(stats)) => {
                format!("Table {table} truncated successfully. New stats: {stats}")
            }
            _ => format!("Table {table} {} successfully.", verb.past_tense()),
        };

        Self {
            table,
            verb,
            outcome: Outcome::Success,
            detail,
            stats,
        }
    }

    /// Records a table that was absent when the request ran.
    #[must_use]
    pub fn missing(table: TableName, verb: TableVerb) -> Self {
        Self {
            detail: format!("Table {table} doesn't exist"),
            table,
            verb,
            outcome: Outcome::Failure,
            stats: None,
        }
    }

    /// Records a target refused before any statement was issued.
    #[must_use]
    pub fn protected(table: TableName, verb: TableVerb) -> Self {
        Self {
            detail: format!(
                "Table {table} is protected and cannot be {}",
                verb.past_tense()
            ),
            table,
            verb,
            outcome: Outcome::Failure,
            stats: None,
        }
    }

    /// Records a statement rejected by the engine, keeping the driver text verbatim.
    #[must_use]
    pub fn driver_failure(table: TableName, verb: TableVerb, driver_error: &str) -> Self {
        Self {
            detail: format!("Failed to {verb} {table}: {driver_error}"),
            table,
            verb,
            outcome: Outcome::Failure,
            stats: None,
        }
    }

    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Returns the applied verb.
    #[must_use]
    pub fn verb(&self) -> TableVerb {
        self.verb
    }

    /// Returns success or failure.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the human-readable detail line.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.detail.as_str()
    }

    /// Returns fresh stats captured after a truncate.
    #[must_use]
    pub fn stats(&self) -> Option<TableStats> {
        self.stats
    }

    /// Returns whether the statement completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Severity of a rendered status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    /// Shown as a confirmation.
    Success,
    /// Shown as an error.
    Error,
}

/// Inline status message handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Message severity.
    pub level: StatusLevel,
    /// Message text. Bulk failures are joined with newlines.
    pub text: String,
}

/// Ordered per-table outcomes for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    scope: ActionScope,
    verb: TableVerb,
    outcomes: Vec<TableOutcome>,
}

impl ActionReport {
    /// Starts an empty report.
    #[must_use]
    pub fn new(scope: ActionScope, verb: TableVerb) -> Self {
        Self {
            scope,
            verb,
            outcomes: Vec::new(),
        }
    }

    /// Appends one outcome, preserving processing order.
    pub fn push(&mut self, outcome: TableOutcome) {
        self.outcomes.push(outcome);
    }

    /// Returns the request shape.
    #[must_use]
    pub fn scope(&self) -> ActionScope {
        self.scope
    }

    /// Returns the applied verb.
    #[must_use]
    pub fn verb(&self) -> TableVerb {
        self.verb
    }

    /// Returns every outcome in processing order.
    #[must_use]
    pub fn outcomes(&self) -> &[TableOutcome] {
        &self.outcomes
    }

    /// Returns whether no table was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Counts completed statements.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_success())
            .count()
    }

    /// Returns the failed outcomes in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &TableOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
    }

    /// Joins every failure detail into one multi-line string.
    #[must_use]
    pub fn failure_detail(&self) -> Option<String> {
        let lines: Vec<&str> = self.failures().map(TableOutcome::detail).collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    /// Renders the inline status messages for this report.
    ///
    /// Single requests produce one message per outcome. Bulk and all-scope
    /// requests produce one combined error message and one success counter.
    #[must_use]
    pub fn status_messages(&self) -> Vec<StatusMessage> {
        if self.scope == ActionScope::Single {
            return self
                .outcomes
                .iter()
                .map(|outcome| StatusMessage {
                    level: if outcome.is_success() {
                        StatusLevel::Success
                    } else {
                        StatusLevel::Error
                    },
                    text: outcome.detail().to_owned(),
                })
                .collect();
        }

        let mut messages = Vec::new();
        if let Some(text) = self.failure_detail() {
            messages.push(StatusMessage {
                level: StatusLevel::Error,
                text,
            });
        }

        let success_count = self.success_count();
        if success_count > 0 {
            let text = match self.scope {
                ActionScope::AllScope => format!(
                    "{success_count} inactive tables {} successfully.",
                    self.verb.all_scope_past_tense()
                ),
                _ => format!(
                    "{success_count} tables {} successfully.",
                    self.verb.past_tense()
                ),
            };
            messages.push(StatusMessage {
                level: StatusLevel::Success,
                text,
            });
        }

        messages
    }
}
