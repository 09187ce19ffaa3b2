//! Event Hub trigger payload
//!
//! The host hands the trigger binding over in the invocation's `Data` object.
//! With `cardinality: many` the binding is an array of messages, with
//! `cardinality: one` it is the message itself; both decode into an
//! [`EventHubBatch`].
use crate::message::Message;
use serde::Deserialize;
use serde_json::{error::Error as JsonError, Value};
use std::io::Read;

use azfn_runtime::InvocationRequest;

/// The messages delivered by one invocation, in delivery order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "TriggerData")]
pub struct EventHubBatch {
    messages: Vec<Message>,
}

/// Shape of the invocation `Data` object for an Event Hub trigger.
#[derive(Deserialize)]
struct TriggerData {
    #[serde(rename = "eventHubMessages")]
    messages: Cardinality,
}

/// The order of the variants is notable: serde tries them in turn, so a
/// `cardinality: one` message that is itself a JSON array reads as a batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cardinality {
    Many(Vec<Message>),
    One(Message),
}

impl From<TriggerData> for EventHubBatch {
    fn from(data: TriggerData) -> Self {
        let messages = match data.messages {
            Cardinality::Many(messages) => messages,
            Cardinality::One(message) => vec![message],
        };
        EventHubBatch { messages }
    }
}

impl EventHubBatch {
    /// Builds a batch out of `messages`.
    pub fn new<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Message>,
    {
        EventHubBatch {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// The messages, in delivery order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the batch.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the batch carries no message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Event Hub trigger metadata the host sends along with a batch.
///
/// Every field is optional, a host that sends none of them is fine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriggerMetadata {
    /// Partition the batch was read from.
    pub partition_id: Option<String>,
    /// Sequence number of every message, in delivery order.
    pub sequence_numbers: Vec<i64>,
}

impl TriggerMetadata {
    /// Picks the known properties out of the invocation metadata.
    pub fn from_value(metadata: &Value) -> Self {
        let partition_id = metadata
            .pointer("/PartitionContext/PartitionId")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let sequence_numbers = metadata
            .get("SequenceNumberArray")
            .and_then(Value::as_array)
            .map(|numbers| numbers.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        TriggerMetadata {
            partition_id,
            sequence_numbers,
        }
    }
}

/// Deserializes a batch from a `Read` impl providing a JSON invocation request.
///
/// # Example
///
/// ```rust,no_run
/// use azfn_eventhub::batch::from_reader;
/// use std::fs::File;
/// use std::error::Error;
///
/// fn main() -> Result<(), Box<dyn Error>> {
///     let batch = from_reader(
///         File::open("path/to/invocation.json")?
///     )?;
///     Ok(println!("{:#?}", batch))
/// }
/// ```
pub fn from_reader<R>(rdr: R) -> Result<EventHubBatch, JsonError>
where
    R: Read,
{
    serde_json::from_reader(rdr).and_then(from_request)
}

/// Deserializes a batch from a string of JSON invocation request text.
///
/// # Example
///
/// ```rust,no_run
/// use azfn_eventhub::batch::from_str;
/// use std::error::Error;
///
/// fn main() -> Result<(), Box<dyn Error>> {
///     let batch = from_str(
///         r#"{ "Data": { "eventHubMessages": ["a", "b"] }, "Metadata": {} }"#
///     )?;
///     Ok(println!("{:#?}", batch))
/// }
/// ```
pub fn from_str(s: &str) -> Result<EventHubBatch, JsonError> {
    serde_json::from_str(s).and_then(from_request)
}

fn from_request(request: InvocationRequest) -> Result<EventHubBatch, JsonError> {
    serde_json::from_value(Value::Object(request.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_many_messages_in_order() {
        let batch = from_str(r#"{"Data":{"eventHubMessages":["a","b","c"]},"Metadata":{}}"#).expect("batch");
        assert_eq!(batch, EventHubBatch::new(vec!["a", "b", "c"]));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn decodes_a_single_message() {
        let batch = from_str(r#"{"Data":{"eventHubMessages":{"id":1}}}"#).expect("batch");
        assert_eq!(batch.messages(), &[Message::new(json!({ "id": 1 }))]);
    }

    #[test]
    fn decodes_an_empty_batch() {
        let batch = from_reader(&br#"{"Data":{"eventHubMessages":[]}}"#[..]).expect("batch");
        assert!(batch.is_empty());
    }

    #[test]
    fn missing_trigger_binding_is_an_error() {
        let err = from_str(r#"{"Data":{"somethingElse":[]}}"#).unwrap_err();
        assert!(err.to_string().contains("eventHubMessages"));
    }

    #[test]
    fn reads_trigger_metadata() {
        let metadata = TriggerMetadata::from_value(&json!({
            "PartitionContext": { "EventHubName": "hub", "PartitionId": "2" },
            "SequenceNumberArray": [41, 42],
            "EnqueuedTimeUtcArray": ["2026-10-19T10:00:00Z", "2026-10-19T10:00:01Z"]
        }));
        assert_eq!(metadata.partition_id.as_deref(), Some("2"));
        assert_eq!(metadata.sequence_numbers, vec![41, 42]);
    }

    #[test]
    fn absent_metadata_is_fine() {
        assert_eq!(TriggerMetadata::from_value(&Value::Null), TriggerMetadata::default());
    }
}
