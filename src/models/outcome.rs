// src/models/outcome.rs
use crate::error::{AppError, AppResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpStatus {
    Success,
    Error,
}

/// The record every core operation hands back to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct OpResult<T> {
    pub success: bool,
    pub message: String,
    pub status: OpStatus,
    pub data: Option<T>,
}

impl<T> OpResult<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        OpResult {
            success: true,
            message: message.into(),
            status: OpStatus::Success,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        OpResult {
            success: false,
            message: message.into(),
            status: OpStatus::Error,
            data: None,
        }
    }

    /// A refused operation that still reports state, e.g. the current enrollment status.
    pub fn failure_with(message: impl Into<String>, data: T) -> Self {
        OpResult {
            data: Some(data),
            ..OpResult::failure(message)
        }
    }
}

/// Folds recoverable errors into an error record. NotFound and Unauthorized
/// stay errors so the caller can redirect.
pub fn settle<T>(result: AppResult<OpResult<T>>, context: &str) -> AppResult<OpResult<T>> {
    match result {
        Ok(record) => Ok(record),
        Err(e) if e.aborts_request() => Err(e),
        Err(e) => {
            match &e {
                AppError::Conflict(_) | AppError::Invalid(_) => {
                    tracing::warn!("{}: {}", context, e)
                }
                _ => tracing::error!("{}: {:?}", context, e),
            }
            Ok(OpResult::failure(e.surface(context)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_passes_redirecting_errors_through() {
        let res: AppResult<OpResult<()>> = Err(AppError::Unauthorized);
        assert!(matches!(settle(res, "ctx"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn settle_turns_conflicts_into_error_records() {
        let res: AppResult<OpResult<()>> = Err(AppError::Conflict("taken".into()));
        let record = settle(res, "ctx").unwrap();
        assert!(!record.success);
        assert_eq!(record.status, OpStatus::Error);
        assert_eq!(record.message, "taken");
    }

    #[test]
    fn serializes_status_in_lowercase() {
        let json = serde_json::to_value(OpResult::success("ok", 7)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], 7);
    }
}
