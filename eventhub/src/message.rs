use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single Event Hub message, kept opaque.
///
/// Messages usually arrive as text; anything else the host sends is kept as the
/// JSON value it was.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Message(Value);

impl Message {
    /// Wraps a payload.
    pub fn new(payload: impl Into<Value>) -> Self {
        Message(payload.into())
    }

    /// The payload as received.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Text payloads render verbatim, anything else as compact JSON.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{}", other),
        }
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        message.0
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::new(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::new(text)
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        Message(value)
    }
}
