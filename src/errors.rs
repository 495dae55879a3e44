use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Simplified error structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Internal Server Error",
    "message": "Dataset error: table 'aging_inventory' (AgingInventory.csv) is missing required column 'DaysHighStock'",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Bad Request", "Internal Server Error")
    #[schema(example = "Bad Request")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Bad request: unknown gap type 'Sideways'")]
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// Failures while loading or shaping one input table.
///
/// Each variant names the table it belongs to so a failure can be reported
/// against the views that depend on it without affecting the others.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetError {
    #[error("table '{table}' ({file}) is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        file: &'static str,
        column: &'static str,
    },

    #[error("failed to read table '{table}' from {path}: {message}")]
    Io {
        table: &'static str,
        path: String,
        message: String,
    },

    #[error("failed to parse table '{table}' at line {line}: {message}")]
    Parse {
        table: &'static str,
        line: u64,
        message: String,
    },

    #[error("table '{table}' has more than one value for ({row}, {column})")]
    DuplicateEntry {
        table: &'static str,
        row: String,
        column: String,
    },
}

impl DatasetError {
    /// Name of the table the error belongs to.
    pub fn table(&self) -> &'static str {
        match self {
            Self::MissingColumn { table, .. }
            | Self::Io { table, .. }
            | Self::Parse { table, .. }
            | Self::DuplicateEntry { table, .. } => table,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Dataset(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    ///
    /// Dataset errors are configuration problems the operator has to fix, so
    /// the table and column are always shown. Other internal errors return a
    /// generic message.
    pub fn response_message(&self) -> String {
        match self {
            Self::InternalError(_) => "Internal server error".to_string(),
            Self::Dataset(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.response_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let request_id = current_request_id();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: error_message,
            details: None,
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn missing_days() -> DatasetError {
        DatasetError::MissingColumn {
            table: "aging_inventory",
            file: "AgingInventory.csv",
            column: "DaysHighStock",
        }
    }

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::BadRequest("unknown gap type 'Sideways'".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }

    #[tokio::test]
    async fn schema_error_response_names_table_and_column() {
        let response = ServiceError::from(missing_days()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(payload.message.contains("aging_inventory"));
        assert!(payload.message.contains("DaysHighStock"));
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::from(missing_days()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("join handle panicked".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::BadRequest("unknown gap type".into()).response_message(),
            "Bad request: unknown gap type"
        );
    }

    #[test]
    fn dataset_error_reports_its_table() {
        assert_eq!(missing_days().table(), "aging_inventory");
        let dup = DatasetError::DuplicateEntry {
            table: "turnover_region_category",
            row: "North".into(),
            column: "Toys".into(),
        };
        assert_eq!(dup.table(), "turnover_region_category");
        assert!(dup.to_string().contains("(North, Toys)"));
    }
}
