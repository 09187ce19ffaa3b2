use azfn_eventhub::{forwarder, EventHubBatch};
use azfn_runtime::{function, Context, Error};

// Serves the Event Hub to blob forwarding function as a custom handler.
#[function]
#[tokio::main]
async fn main(batch: EventHubBatch, ctx: Context) -> Result<(), Error> {
    forwarder::handle(batch, ctx).await
}
