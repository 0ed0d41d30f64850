use std::io;
use std::sync::mpsc::Sender;

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Forwards each formatted log event to the console's log pane as one line.
#[derive(Clone)]
pub struct PaneWriter {
    tx: Sender<String>,
}

impl PaneWriter {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl<'a> MakeWriter<'a> for PaneWriter {
    type Writer = PaneLine;

    fn make_writer(&'a self) -> Self::Writer {
        PaneLine {
            tx: self.tx.clone(),
            buf: Vec::with_capacity(128),
        }
    }
}

/// Buffers one event; the line is sent when the writer is dropped.
pub struct PaneLine {
    tx: Sender<String>,
    buf: Vec<u8>,
}

impl io::Write for PaneLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PaneLine {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            let _ = self.tx.send(line.to_string());
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_pane_logging(tx: Sender<String>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(PaneWriter::new(tx))
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn one_event_becomes_one_line() {
        let (tx, rx) = mpsc::channel();
        let writer = PaneWriter::new(tx);
        {
            let mut line = writer.make_writer();
            write!(line, " INFO command ").unwrap();
            writeln!(line, "finished").unwrap();
        }
        assert_eq!(rx.try_recv().unwrap(), " INFO command finished");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn blank_events_are_dropped() {
        let (tx, rx) = mpsc::channel();
        drop(PaneWriter::new(tx).make_writer());
        assert!(rx.try_recv().is_err());
    }
}
