use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// The invocation context, handed to a handler alongside its trigger payload.
///
/// A `Context` is the handler's only way of talking back to the host: lines passed
/// to [`Context::log`] end up in the host's log stream, values passed to
/// [`Context::set_output`] are persisted through the named output binding once the
/// handler completes. Clones share the same invocation state.
#[derive(Clone, Debug)]
pub struct Context {
    invocation_id: Arc<str>,
    function_name: Arc<str>,
    metadata: Arc<Value>,
    state: Arc<Mutex<InvocationState>>,
}

#[derive(Debug, Default)]
struct InvocationState {
    logs: Vec<String>,
    outputs: BTreeMap<String, OutputBinding>,
}

/// A single output binding slot.
///
/// Every assignment is kept in order. The host decides whether only the last one is
/// persisted or all of them are fanned out, see [`crate::OutputMode`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputBinding {
    writes: Vec<Value>,
}

impl OutputBinding {
    /// Assigns a value to the slot.
    pub fn set(&mut self, value: Value) {
        self.writes.push(value);
    }

    /// The value the slot currently holds, i.e. the last assignment.
    pub fn value(&self) -> Option<&Value> {
        self.writes.last()
    }

    /// All assignments, in the order they happened.
    pub fn writes(&self) -> &[Value] {
        &self.writes
    }

    /// Whether the slot was assigned at least once.
    pub fn is_set(&self) -> bool {
        !self.writes.is_empty()
    }
}

impl Context {
    /// Creates the context of a fresh invocation.
    pub fn new(invocation_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            invocation_id: Arc::from(invocation_id.into()),
            function_name: Arc::from(function_name.into()),
            metadata: Arc::new(Value::Null),
            state: Arc::default(),
        }
    }

    /// Attaches the trigger metadata the host sent along with the invocation.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Arc::new(metadata);
        self
    }

    /// The host-assigned id of this invocation.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// The name of the function being invoked.
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Trigger metadata, `Value::Null` when the host sent none.
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Writes a line to the invocation log.
    pub fn log(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(
            target: "azfn::function",
            invocation_id = %self.invocation_id,
            function = %self.function_name,
            "{}",
            text
        );
        self.lock().logs.push(text);
    }

    /// Assigns `value` to the output binding called `binding`.
    pub fn set_output(&self, binding: &str, value: impl Into<Value>) {
        self.lock()
            .outputs
            .entry(binding.to_owned())
            .or_default()
            .set(value.into());
    }

    /// The current value of an output binding.
    pub fn output(&self, binding: &str) -> Option<Value> {
        self.lock().outputs.get(binding).and_then(|slot| slot.value().cloned())
    }

    /// Every value assigned to an output binding so far.
    pub fn output_writes(&self, binding: &str) -> Vec<Value> {
        self.lock()
            .outputs
            .get(binding)
            .map(|slot| slot.writes().to_vec())
            .unwrap_or_default()
    }

    /// The invocation log so far.
    pub fn logs(&self) -> Vec<String> {
        self.lock().logs.clone()
    }

    /// Snapshot of logs and output slots, taken by the runtime once the handler is done.
    pub(crate) fn snapshot(&self) -> (Vec<String>, BTreeMap<String, OutputBinding>) {
        let state = self.lock();
        (state.logs.clone(), state.outputs.clone())
    }

    // a handler panicking while holding the lock must not take the runtime down with it
    fn lock(&self) -> MutexGuard<'_, InvocationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
