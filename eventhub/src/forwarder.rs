//! Forwards every message of an Event Hub batch to the `outputBlob` binding.

use crate::{batch::EventHubBatch, batch::TriggerMetadata, message::Message};
use azfn_runtime::{Context, Error};

/// Name the function reports itself under in its batch summary.
pub const FUNCTION_NAME: &str = "LoggingEventHubTriggerJS1";

/// Output binding every message is written to.
pub const OUTPUT_BINDING: &str = "outputBlob";

/// Logs the batch, then logs and writes each message to [`OUTPUT_BINDING`], in order.
///
/// One summary line plus one line per message are logged, and the binding is
/// assigned once per message. When the binding is a single-value slot the last
/// message is what the host persists. Returning is the completion signal.
pub fn process(ctx: &Context, messages: &[Message]) {
    let rendered: Vec<String> = messages.iter().map(ToString::to_string).collect();
    ctx.log(format!("{} message array: {}", FUNCTION_NAME, rendered.join(",")));

    for (message, text) in messages.iter().zip(rendered) {
        ctx.log(format!("Processed message: {}", text));
        ctx.set_output(OUTPUT_BINDING, message.clone());
    }
}

/// Runtime entry point: forwards `batch` and completes the invocation.
pub async fn handle(batch: EventHubBatch, ctx: Context) -> Result<(), Error> {
    let metadata = TriggerMetadata::from_value(ctx.metadata());
    let span = tracing::debug_span!(
        "forward",
        messages = batch.len(),
        partition = ?metadata.partition_id,
        first_sequence_number = ?metadata.sequence_numbers.first(),
    );
    span.in_scope(|| process(&ctx, batch.messages()));
    tracing::debug!(invocation_id = %ctx.invocation_id(), "batch forwarded");
    Ok(())
}
