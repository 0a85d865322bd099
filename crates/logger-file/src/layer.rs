//! Bridge from `tracing` into a [`Sink`]

use crate::sinks::Sink;
use crate::{Error, Level, Record, Result};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// A tracing layer that writes every event to a sink.
///
/// Events emitted by this crate are not forwarded, so a sink never receives
/// its own rotation diagnostics while it holds its lock.
pub struct SinkLayer<S> {
    sink: Arc<S>,
    on_error: ErrorHandler,
}

impl<S: Sink> SinkLayer<S> {
    /// Forward events to `sink`, reporting write failures on stderr
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            on_error: Arc::new(|e| eprintln!("[*** LOG ERROR ***] {e}")),
        }
    }

    /// Replace the handler called when the sink fails to write
    #[must_use]
    pub fn with_error_handler(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(f);
        self
    }
}

fn is_own_target(target: &str) -> bool {
    let own = env!("CARGO_CRATE_NAME");
    target
        .strip_prefix(own)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S, Sub> Layer<Sub> for SinkLayer<S>
where
    S: Sink + Send + Sync + 'static,
    Sub: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, Sub>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let level = match *metadata.level() {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Trace,
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let spans: Vec<_> = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name()).collect())
            .unwrap_or_default();

        let message = visitor.finish();
        let message = if spans.is_empty() {
            message
        } else {
            format!("{}: {message}", spans.join("::"))
        };

        let record = Record::new(level, message).with_target(metadata.target());
        if let Err(e) = self.sink.log(&record) {
            (self.on_error)(&e);
        }
    }
}

/// Collects the message and remaining fields of an event
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, field: &Field, value: impl fmt::Display) {
        let _ = write!(self.fields, " {}={}", field.name(), value);
    }

    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }
}

/// Install a global subscriber that writes every tracing event to `sink`.
///
/// # Example
/// ```no_run
/// use proven_logger_file::{ColorConsoleSinkMt, ColorMode, init_tracing};
/// use std::sync::Arc;
///
/// let sink = Arc::new(ColorConsoleSinkMt::stdout(ColorMode::Automatic));
/// init_tracing(sink).expect("failed to install subscriber");
/// tracing::info!("ready");
/// ```
pub fn init_tracing<S>(sink: Arc<S>) -> Result<()>
where
    S: Sink + Send + Sync + 'static,
{
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(SinkLayer::new(sink))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Formatter;
    use parking_lot::Mutex;
    use std::io;
    use tracing_subscriber::prelude::*;

    #[derive(Default)]
    struct Collect {
        records: Mutex<Vec<(Level, String, String)>>,
        fail: bool,
    }

    impl Sink for Collect {
        fn log(&self, record: &Record<'_>) -> Result<()> {
            if self.fail {
                return Err(io::Error::other("disk full").into());
            }
            self.records.lock().push((
                record.level,
                record.target.to_string(),
                record.message.to_string(),
            ));
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn set_formatter(&self, _formatter: Box<dyn Formatter>) {}
    }

    #[test]
    fn test_forwards_events_with_fields_and_spans() {
        let sink = Arc::new(Collect::default());
        let subscriber = tracing_subscriber::registry().with(SinkLayer::new(sink.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app", attempt = 3, "retrying");
            let span = tracing::info_span!("upload");
            let _guard = span.enter();
            tracing::info!(target: "app::net", "sent");
        });

        let records = sink.records.lock();
        assert_eq!(
            *records,
            vec![
                (Level::Warn, "app".to_string(), "retrying attempt=3".to_string()),
                (Level::Info, "app::net".to_string(), "upload: sent".to_string()),
            ]
        );
    }

    #[test]
    fn test_skips_own_events() {
        let sink = Arc::new(Collect::default());
        let subscriber = tracing_subscriber::registry().with(SinkLayer::new(sink.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("from inside the crate");
            tracing::debug!(target: "proven_logger_file_extra", "neighbour");
        });

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, "proven_logger_file_extra");
    }

    #[test]
    fn test_reports_sink_errors() {
        let sink = Arc::new(Collect {
            fail: true,
            ..Default::default()
        });
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = errors.clone();
        let layer = SinkLayer::new(sink).with_error_handler(move |e| seen.lock().push(e.to_string()));

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), || {
            tracing::error!(target: "app", "lost");
        });

        assert_eq!(errors.lock().len(), 1);
        assert!(errors.lock()[0].contains("disk full"));
    }
}
