//! Tracing subscriber setup.
//!
//! Native builds log to stderr. On wasm32 every formatted line goes to
//! `console.log` and timestamps are left to the browser console.

use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Calling it again is harmless.
pub fn init(filter: &str) {
    let (env_filter, invalid) = match EnvFilter::try_new(filter) {
        Ok(env_filter) => (env_filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some(e)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    #[cfg(target_arch = "wasm32")]
    let result = builder
        .with_ansi(false)
        .without_time()
        .with_writer(console::MakeConsoleWriter)
        .try_init();

    #[cfg(not(target_arch = "wasm32"))]
    let result = builder.try_init();

    if let Some(e) = invalid {
        warn!("Invalid log filter `{filter}` ({e}), using `{DEFAULT_FILTER}`");
    }
    if result.is_err() {
        debug!("Global subscriber already installed");
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;
    use tracing_subscriber::fmt::MakeWriter;

    /// Buffers one formatted event and logs it when dropped.
    pub struct ConsoleWriter {
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end();
            if !line.is_empty() {
                web_sys::console::log_1(&line.into());
            }
        }
    }

    pub struct MakeConsoleWriter;

    impl<'a> MakeWriter<'a> for MakeConsoleWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter { buffer: Vec::new() }
        }
    }
}
