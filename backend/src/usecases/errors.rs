use axum::http::StatusCode;
use crates::domain::value_objects::time_window::TimeRangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("upstream query failed")]
    UpstreamQueryFailure(#[source] anyhow::Error),
}

impl AnalyticsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalyticsError::UpstreamQueryFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidParameter(_) => "invalid_parameter",
            AnalyticsError::NotFound(_) => "not_found",
            AnalyticsError::UpstreamQueryFailure(_) => "upstream_query_failure",
        }
    }
}

impl From<TimeRangeError> for AnalyticsError {
    fn from(err: TimeRangeError) -> Self {
        AnalyticsError::InvalidParameter(err.to_string())
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_errors_are_client_errors() {
        let err = AnalyticsError::from(TimeRangeError::Malformed("abcd".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "invalid_parameter");
        assert!(err.to_string().contains("abcd"));
    }

    #[test]
    fn upstream_failure_hides_its_source_in_display() {
        let err = AnalyticsError::UpstreamQueryFailure(anyhow::anyhow!("relation does not exist"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "upstream query failed");
    }
}
