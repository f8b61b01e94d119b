//! `tracing` layer writing one [`LogEvent`] JSON object per line.

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::events::{Level, LogEvent};

/// Fills a [`LogEvent`] from the fields of a tracing event.
struct Collector<'a>(&'a mut LogEvent);

impl Visit for Collector<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.put(field.name(), Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.put(field.name(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.put(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.put(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.put(field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities become null
        let v = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.0.put(field.name(), v);
    }
}

/// Writes events as JSONL. The event name is the tracing target.
pub struct JsonlLayer<W> {
    out: Mutex<W>,
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(out: W) -> Self {
        JsonlLayer {
            out: Mutex::new(out),
        }
    }
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber,
    W: Write + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut record = LogEvent::new(Level::from(meta.level()), meta.target());
        event.record(&mut Collector(&mut record));

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        if let Ok(mut out) = self.out.lock() {
            // Logging must never fail the command
            let _ = writeln!(out, "{line}");
        }
    }
}
