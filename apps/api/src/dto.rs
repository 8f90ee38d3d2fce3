use serde::{Deserialize, Serialize};
use tablekeeper_application::InactiveTables;
use tablekeeper_core::{AppError, AppResult};
use tablekeeper_domain::{
    ActionReport, ActionRequest, Outcome, StatusLevel, StatusMessage, TableName, TableOutcome,
    TableStats, TableVerb,
};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Row and size metrics for one table.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/table-stats-response.ts"
)]
pub struct TableStatsResponse {
    #[ts(type = "number")]
    pub rows: u64,
    pub size_mib: f64,
}

impl From<TableStats> for TableStatsResponse {
    fn from(value: TableStats) -> Self {
        Self {
            rows: value.rows(),
            size_mib: value.size_mib(),
        }
    }
}

/// API representation of one inactive table.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/inactive-table-response.ts"
)]
pub struct InactiveTableResponse {
    pub name: String,
    pub stats: TableStatsResponse,
}

/// Maps a classifier result to its ordered API listing.
pub fn inactive_table_listing(tables: InactiveTables) -> Vec<InactiveTableResponse> {
    tables
        .into_iter()
        .map(|(name, stats)| InactiveTableResponse {
            name: name.into(),
            stats: stats.into(),
        })
        .collect()
}

/// Inactive table listing plus the token to submit with the next action.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/table-inventory-response.ts"
)]
pub struct TableInventoryResponse {
    pub tables: Vec<InactiveTableResponse>,
    pub form_token: String,
}

/// Incoming maintenance payload.
///
/// Exactly one of `action_table` (with `table_name`), `bulk_action` (with
/// `tables`), `empty_all` or `drop_all` must be set.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/table-action-request.ts"
)]
pub struct TableActionRequest {
    pub form_token: Option<String>,
    pub action_table: Option<String>,
    pub table_name: Option<String>,
    pub bulk_action: Option<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub empty_all: bool,
    #[serde(default)]
    pub drop_all: bool,
}

impl TableActionRequest {
    /// Validates the payload into a domain request, returning the submitted token alongside.
    pub fn into_action_request(self) -> AppResult<(Option<String>, ActionRequest)> {
        let requested_kinds = [
            self.action_table.is_some(),
            self.bulk_action.is_some(),
            self.empty_all,
            self.drop_all,
        ]
        .into_iter()
        .filter(|requested| *requested)
        .count();

        if requested_kinds != 1 {
            return Err(AppError::Validation(
                "exactly one table action must be requested".to_owned(),
            ));
        }

        let request = if let Some(verb) = self.action_table {
            let table_name = self.table_name.ok_or_else(|| {
                AppError::Validation("table_name is required for a single action".to_owned())
            })?;
            ActionRequest::single(TableName::new(table_name)?, verb.parse::<TableVerb>()?)
        } else if let Some(verb) = self.bulk_action {
            let verb = verb.parse::<TableVerb>()?;
            let tables = self
                .tables
                .into_iter()
                .map(TableName::new)
                .collect::<AppResult<Vec<_>>>()?;
            ActionRequest::bulk(tables, verb)?
        } else if self.empty_all {
            ActionRequest::all_scope(TableVerb::Truncate)
        } else {
            ActionRequest::all_scope(TableVerb::Drop)
        };

        Ok((self.form_token, request))
    }
}

/// API representation of one table outcome.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/table-outcome-response.ts"
)]
pub struct TableOutcomeResponse {
    pub table: String,
    pub verb: String,
    pub outcome: String,
    pub detail: String,
    pub stats: Option<TableStatsResponse>,
}

impl From<&TableOutcome> for TableOutcomeResponse {
    fn from(value: &TableOutcome) -> Self {
        let outcome = match value.outcome() {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        };

        Self {
            table: value.table().to_string(),
            verb: value.verb().as_str().to_owned(),
            outcome: outcome.to_owned(),
            detail: value.detail().to_owned(),
            stats: value.stats().map(TableStatsResponse::from),
        }
    }
}

/// Inline status message for the admin screen.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/status-message-response.ts"
)]
pub struct StatusMessageResponse {
    pub level: String,
    pub text: String,
}

impl From<StatusMessage> for StatusMessageResponse {
    fn from(value: StatusMessage) -> Self {
        let level = match value.level {
            StatusLevel::Success => "success",
            StatusLevel::Error => "error",
        };

        Self {
            level: level.to_owned(),
            text: value.text,
        }
    }
}

/// Result of one maintenance request plus the refreshed listing.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/table-action-response.ts"
)]
pub struct TableActionResponse {
    pub scope: String,
    pub verb: String,
    pub outcomes: Vec<TableOutcomeResponse>,
    pub messages: Vec<StatusMessageResponse>,
    pub tables: Vec<InactiveTableResponse>,
    /// Set when the listing could not be refreshed after the request ran.
    pub listing_error: Option<String>,
}

impl TableActionResponse {
    pub fn new(report: &ActionReport, tables: InactiveTables) -> Self {
        Self {
            scope: report.scope().as_str().to_owned(),
            verb: report.verb().as_str().to_owned(),
            outcomes: report
                .outcomes()
                .iter()
                .map(TableOutcomeResponse::from)
                .collect(),
            messages: report
                .status_messages()
                .into_iter()
                .map(StatusMessageResponse::from)
                .collect(),
            tables: inactive_table_listing(tables),
            listing_error: None,
        }
    }

    /// Keeps the report of statements that already ran when the refresh fails.
    pub fn without_listing(report: &ActionReport, message: impl Into<String>) -> Self {
        Self {
            listing_error: Some(message.into()),
            ..Self::new(report, InactiveTables::new())
        }
    }
}
