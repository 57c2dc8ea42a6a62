//! `pre-compact` hook: one evaluation over stdin/stdout.
//!
//! Reads an [`EvaluationContext`] JSON payload, runs the evaluator, and writes the
//! [`EvaluationResult`] JSON. A payload that cannot be parsed still yields a
//! well-formed `error` result, so the caller always gets one structured answer.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::{Read, Write};

use crate::compaction::{CompactionEvaluator, EvaluationContext, EvaluationResult, EvaluationStatus};

/// Evaluate the payload in `input` and write the result to `output`.
pub fn run_pre_compact(
    evaluator: &CompactionEvaluator,
    mut input: impl Read,
    mut output: impl Write,
) -> Result<EvaluationStatus> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read hook payload")?;

    let result = match parse_payload(&raw) {
        Ok(context) => evaluator.evaluate(&context),
        Err((echo, e)) => {
            tracing::error!(error = %e, "invalid pre-compaction payload");
            EvaluationResult {
                status: EvaluationStatus::Error,
                session_id: echo_field(echo.as_ref(), "sessionId"),
                agent_id: echo_field(echo.as_ref(), "agentId"),
                preserved: Vec::new(),
                removed: Vec::new(),
                message: format!("invalid pre-compaction payload: {e}"),
            }
        }
    };

    serde_json::to_writer_pretty(&mut output, &result).context("failed to write hook result")?;
    writeln!(output)?;
    output.flush()?;
    Ok(result.status)
}

/// Parse in two passes so a payload that is valid JSON but not a valid
/// context still hands back its raw value for echoing ids.
fn parse_payload(raw: &str) -> Result<EvaluationContext, (Option<Value>, serde_json::Error)> {
    let value: Value = serde_json::from_str(raw).map_err(|e| (None, e))?;
    EvaluationContext::deserialize(&value).map_err(|e| (Some(value.clone()), e))
}

fn echo_field(value: Option<&Value>, key: &str) -> String {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
