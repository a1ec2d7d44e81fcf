//! Scoped capture of log output.
//!
//! [`LogCapture::start`] installs a subscriber that writes into an in-memory
//! [`LogSink`] as the current thread's default, and restores the previous
//! default when the guard is dropped, including during a panic unwind.
//! Captures are serialized through one process-wide lock; a thread may nest
//! captures, the innermost one receiving the events.
//!
//! Events emitted on other threads are not captured unless the code under
//! test is handed [`LogCapture::dispatch`] explicitly.

use crate::logging::{format_layer, LogConfig, LogFormat};
use parking_lot::{const_reentrant_mutex, Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::io;
use std::sync::Arc;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

static CAPTURE_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Shared in-memory log buffer.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

/// Writer handed out by [`LogSink`] for one event.
#[derive(Debug)]
pub struct SinkWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for SinkWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            buf: Arc::clone(&self.buf),
        }
    }
}

/// Guard redirecting log output into a [`LogSink`] while it lives.
///
/// # Example
///
/// ```
/// use gauntlet_telemetry::LogCapture;
///
/// let capture = LogCapture::start();
/// tracing::info!("widget created");
/// assert!(capture.contents().contains("widget created"));
/// ```
#[must_use = "logs are only captured while the guard is alive"]
pub struct LogCapture {
    sink: LogSink,
    dispatch: Dispatch,
    // field order matters: the default is restored before the lock is released
    _default: DefaultGuard,
    _serial: ReentrantMutexGuard<'static, ()>,
}

impl LogCapture {
    /// Starts capturing every event, at all levels, as compact lines.
    pub fn start() -> Self {
        Self::with_config(&Self::capture_config())
    }

    /// Starts capturing with the given format and filter.
    ///
    /// Invalid directives in `level` are ignored. `enabled` and `test_writer`
    /// only apply to [`init_logging`](crate::init_logging): a capture always
    /// records, and always writes into its own sink.
    pub fn with_config(config: &LogConfig) -> Self {
        let serial = CAPTURE_LOCK.lock();

        let sink = LogSink::new();
        let filter = EnvFilter::new(&config.level);
        let subscriber = Registry::default()
            .with(filter)
            .with(format_layer(config, sink.clone()));

        let dispatch = Dispatch::new(subscriber);
        let default = dispatcher::set_default(&dispatch);

        Self {
            sink,
            dispatch,
            _default: default,
            _serial: serial,
        }
    }

    /// Returns what has been captured so far.
    pub fn contents(&self) -> String {
        self.sink.contents()
    }

    /// Returns the sink receiving the output.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Returns the capturing dispatcher, to hand to code running on other
    /// threads (see [`tracing::dispatcher::with_default`]).
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Stops capturing and returns the output.
    pub fn finish(self) -> String {
        self.sink.contents()
    }

    fn capture_config() -> LogConfig {
        LogConfig {
            enabled: true,
            level: "trace".to_string(),
            format: LogFormat::Compact,
            file_line_info: false,
            include_target: true,
            ansi: false,
            test_writer: false,
        }
    }
}

impl std::fmt::Debug for LogCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCapture")
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

/// Runs `f` while capturing its log output.
///
/// Returns `f`'s result together with everything it logged. If `f` panics,
/// the previous subscriber is restored before the panic continues.
pub fn capture_logs<F, R>(f: F) -> (R, String)
where
    F: FnOnce() -> R,
{
    let capture = LogCapture::start();
    let result = f();
    (result, capture.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_capture_logs_returns_output() {
        let (value, logs) = capture_logs(|| {
            tracing::debug!(attempt = 2, "retrying");
            "done"
        });
        assert_eq!(value, "done");
        assert!(logs.contains("retrying"));
        assert!(logs.contains("attempt=2"));
        assert!(logs.contains("DEBUG"));
    }

    #[test]
    fn test_nothing_captured_after_finish() {
        let capture = LogCapture::start();
        let sink = capture.sink().clone();
        tracing::info!("inside");
        let logs = capture.finish();

        tracing::info!("outside");
        assert!(logs.contains("inside"));
        assert!(!sink.contents().contains("outside"));
    }

    #[test]
    fn test_restored_after_panic() {
        let sink = {
            let capture = LogCapture::start();
            let sink = capture.sink().clone();
            let result = panic::catch_unwind(panic::AssertUnwindSafe(move || {
                let _capture = capture;
                tracing::warn!("before panic");
                panic!("boom");
            }));
            assert!(result.is_err());
            sink
        };

        tracing::warn!("after panic");
        let logs = sink.contents();
        assert!(logs.contains("before panic"));
        assert!(!logs.contains("after panic"));

        // the lock was released: a new capture can start
        let (_, logs) = capture_logs(|| tracing::warn!("next"));
        assert!(logs.contains("next"));
    }

    #[test]
    fn test_nested_capture_on_same_thread() {
        let outer = LogCapture::start();
        let (_, inner) = capture_logs(|| tracing::info!("inner event"));
        tracing::info!("outer event");

        assert!(inner.contains("inner event"));
        let outer = outer.finish();
        assert!(outer.contains("outer event"));
        assert!(!outer.contains("inner event"));
    }

    #[test]
    fn test_with_config_filters_and_formats() {
        let config = LogConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            ..LogConfig::default()
        };
        let capture = LogCapture::with_config(&config);
        tracing::info!("filtered out");
        tracing::warn!(code = 2004, "kept");
        let logs = capture.finish();

        assert!(!logs.contains("filtered out"));
        let line: serde_json::Value = serde_json::from_str(logs.trim()).unwrap();
        assert_eq!(line["fields"]["message"], "kept");
        assert_eq!(line["fields"]["code"], 2004);
    }

    #[test]
    fn test_with_config_ignores_output_switches() {
        let config = LogConfig {
            enabled: false,
            test_writer: true,
            ..LogConfig::default()
        };
        let capture = LogCapture::with_config(&config);
        tracing::info!("still recorded");
        let logs = capture.finish();

        assert!(logs.contains("still recorded"));
    }

    #[test]
    fn test_dispatch_handle_captures_other_threads() {
        let capture = LogCapture::start();
        let dispatch = capture.dispatch().clone();
        std::thread::spawn(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::info!("from worker");
            });
        })
        .join()
        .unwrap();

        assert!(capture.contents().contains("from worker"));
    }

    #[test]
    fn test_sink_clear() {
        let sink = LogSink::new();
        io::Write::write_all(&mut sink.make_writer(), b"hello").unwrap();
        assert_eq!(sink.contents(), "hello");
        sink.clear();
        assert!(sink.contents().is_empty());
    }
}
