/// Destination for the registry's progress messages.
///
/// The registry logs one line per successful `reach`:
/// `"[OK] Reached target: <name>"`.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

/// Default sink: forwards to `tracing` at info level.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "tracsat::target", "{message}");
    }
}

/// Closures work as sinks too (handy for tests and ad-hoc wiring).
impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}
