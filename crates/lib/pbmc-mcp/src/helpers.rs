use std::borrow::Cow;

use pbmc_core::QueryResult;
use pbmc_model::FilterError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde::Serialize;
use tracing::warn;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Input rejected before any upstream request was built.
pub fn invalid_params(err: &FilterError) -> ErrorData {
    mcp_err(ErrorCode::INVALID_PARAMS, err.to_string())
}

/// `{ "result": ... }` wrapper used by the single-result tools.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

impl<T> ResultEnvelope<T> {
    pub const fn new(result: T) -> Self {
        Self { result }
    }
}

/// Converts an operation outcome into a tool result.
///
/// Success carries the structured value and its text mirror. Failure carries
/// only the diagnostic message and is flagged as an error.
pub fn envelope<T: Serialize>(outcome: QueryResult<T>) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Ok(value) => {
            let value = serde_json::to_value(value).map_err(|err| {
                mcp_err(
                    ErrorCode::INTERNAL_ERROR,
                    format!("failed to serialize tool result: {err}"),
                )
            })?;
            Ok(CallToolResult::structured(value))
        }
        Err(err) => {
            warn!(error = %err, "tool invocation failed");
            Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
        }
    }
}
