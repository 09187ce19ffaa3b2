use azfn_runtime::{handler_fn, logging, run, Context, Error};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();
    run(handler_fn(func)).await
}

// Echoes every input binding back through the `res` output binding.
async fn func(event: Value, ctx: Context) -> Result<(), Error> {
    ctx.log(format!("{} invoked", ctx.function_name()));
    ctx.set_output("res", event);
    Ok(())
}
