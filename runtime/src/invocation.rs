//! Custom handler invocation payloads
//!
//! The host POSTs an [`InvocationRequest`] to `/<FunctionName>` and expects an
//! [`InvocationResponse`] back. Both use the PascalCase field names of the
//! custom handler protocol.

use crate::{config::OutputMode, context::Context};
use http::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header carrying the host-assigned invocation id.
pub const INVOCATION_ID_HEADER: &str = "x-azure-functions-invocationid";

/// Invocation id reported when the host did not send one.
pub const UNKNOWN_INVOCATION_ID: &str = "unknown";

/// An invocation as sent by the host.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Input bindings, keyed by binding name.
    #[serde(rename = "Data", default)]
    pub data: Map<String, Value>,
    /// Trigger metadata, keyed by property name.
    #[serde(rename = "Metadata", default)]
    pub metadata: Map<String, Value>,
}

impl InvocationRequest {
    /// Deserializes a request from its JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, InvocationError> {
        let mut de = serde_json::Deserializer::from_slice(body);
        serde_path_to_error::deserialize(&mut de).map_err(InvocationError::Envelope)
    }

    /// Decodes the input bindings into the handler's event type, returning the
    /// event and the trigger metadata.
    pub fn into_event<A>(self) -> Result<(A, Value), InvocationError>
    where
        A: DeserializeOwned,
    {
        let event = serde_path_to_error::deserialize(Value::Object(self.data)).map_err(InvocationError::Event)?;
        Ok((event, Value::Object(self.metadata)))
    }
}

/// The reply to the host once an invocation finished.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct InvocationResponse {
    /// Output bindings that were assigned, keyed by binding name.
    #[serde(rename = "Outputs", default)]
    pub outputs: Map<String, Value>,
    /// Lines the function logged, in order.
    #[serde(rename = "Logs", default)]
    pub logs: Vec<String>,
    /// What the handler returned, if anything.
    #[serde(rename = "ReturnValue", default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
    /// Why the invocation failed.
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    /// Builds the reply for a handler that completed.
    pub fn completed(context: &Context, mode: OutputMode, return_value: Value) -> Self {
        let (logs, slots) = context.snapshot();
        let outputs = slots
            .into_iter()
            .filter(|(_, slot)| slot.is_set())
            .filter_map(|(name, slot)| {
                let value = match mode {
                    OutputMode::Last => slot.value().cloned()?,
                    OutputMode::All => Value::Array(slot.writes().to_vec()),
                };
                Some((name, value))
            })
            .collect();

        InvocationResponse {
            outputs,
            logs,
            return_value: Some(return_value).filter(|v| !v.is_null()),
            error: None,
        }
    }

    /// Builds the reply for an invocation that failed. Outputs are dropped, logs
    /// written before the failure are kept.
    pub fn failed(context: Option<&Context>, error: &InvocationError) -> Self {
        InvocationResponse {
            logs: context.map(Context::logs).unwrap_or_default(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Ways an invocation can fail.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The host used something other than POST.
    #[error("method {0} not allowed, invocations must be POSTed")]
    MethodNotAllowed(http::Method),
    /// The request body could not be read.
    #[error("unable to read invocation body: {0}")]
    Body(#[from] hyper::Error),
    /// The body is not a valid invocation request.
    #[error("malformed invocation request: {0}")]
    Envelope(serde_path_to_error::Error<serde_json::Error>),
    /// The input bindings do not match the handler's event type.
    #[error("unable to decode trigger payload: {0}")]
    Event(serde_path_to_error::Error<serde_json::Error>),
    /// The handler's return value could not be serialized.
    #[error("unable to encode return value: {0}")]
    ReturnValue(serde_json::Error),
    /// The handler returned an error.
    #[error("function failed: {0}")]
    Handler(String),
}

impl InvocationError {
    /// Status code reported to the host.
    pub fn status(&self) -> StatusCode {
        match self {
            InvocationError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Event {
        #[serde(rename = "items")]
        items: Vec<String>,
    }

    #[test]
    fn decodes_request_envelope() {
        let body = br#"{"Data":{"items":["a","b"]},"Metadata":{"sys":{"MethodName":"fn"}}}"#;
        let request = InvocationRequest::from_slice(body).expect("request");
        let (event, metadata): (Event, Value) = request.into_event().expect("event");
        assert_eq!(event.items, vec!["a", "b"]);
        assert_eq!(metadata["sys"]["MethodName"], "fn");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let request = InvocationRequest::from_slice(b"{}").expect("request");
        assert_eq!(request, InvocationRequest::default());
    }

    #[test]
    fn event_errors_carry_the_path() {
        let request = InvocationRequest::from_slice(br#"{"Data":{"items":["a",2]}}"#).expect("request");
        let err = request.into_event::<Event>().unwrap_err();
        match &err {
            InvocationError::Event(inner) => assert_eq!(inner.path().to_string(), "items[1]"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        let err = InvocationRequest::from_slice(br#"{"Data":[]}"#).unwrap_err();
        assert!(matches!(err, InvocationError::Envelope(_)));
    }

    #[test]
    fn completed_reports_last_write() {
        let ctx = Context::new("id", "fn");
        ctx.log("hello");
        ctx.set_output("out", "a");
        ctx.set_output("out", "b");
        let response = InvocationResponse::completed(&ctx, OutputMode::Last, Value::Null);
        assert_eq!(
            serde_json::to_value(&response).expect("json"),
            json!({ "Outputs": { "out": "b" }, "Logs": ["hello"] })
        );
    }

    #[test]
    fn completed_fans_out_every_write() {
        let ctx = Context::new("id", "fn");
        ctx.set_output("out", "a");
        ctx.set_output("out", "b");
        let response = InvocationResponse::completed(&ctx, OutputMode::All, json!(42));
        assert_eq!(
            serde_json::to_value(&response).expect("json"),
            json!({ "Outputs": { "out": ["a", "b"] }, "Logs": [], "ReturnValue": 42 })
        );
    }

    #[test]
    fn failed_keeps_logs_and_drops_outputs() {
        let ctx = Context::new("id", "fn");
        ctx.log("before");
        ctx.set_output("out", "a");
        let response = InvocationResponse::failed(Some(&ctx), &InvocationError::Handler("boom".into()));
        assert!(response.outputs.is_empty());
        assert_eq!(response.logs, vec!["before"]);
        assert_eq!(response.error.as_deref(), Some("function failed: boom"));
    }
}
