use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc, Mutex,
};

// ── Events from loading/parsing to the UI ──────────────────────────────────

#[derive(Debug, Clone)]
pub enum UiEvent {
    Log(String),

    LoadStarted { source: String },
    DownloadStarted { total_bytes: u64 },
    DownloadProgress { bytes_read: u64 },
    DownloadComplete { size_bytes: u64 },
    LoadComplete { bytes: usize },

    ParseStarted { chunks: usize },
    ParseProgress { chunks_done: usize },
    /// A chunk faulted while being parsed and was left out of the result.
    ChunkSkipped { index: usize, reason: String },
    ParseComplete { games: usize, skipped: usize },

    Finished,
    Error(String),
}

// ── Load control (cancel) ───────────────────────────────────────────────────

pub struct LoadControl {
    cancelled: AtomicBool,
}

impl LoadControl {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `Err` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            anyhow::bail!("Cancelled by user");
        }
        Ok(())
    }
}

impl Default for LoadControl {
    fn default() -> Self {
        Self::new()
    }
}

// ── EventSink trait ─────────────────────────────────────────────────────────

/// Abstraction for reporting load and parse events.
pub trait EventSink: Send + Sync {
    fn send(&self, event: UiEvent);
    /// Check for cancellation. Returns Err if cancelled.
    fn check(&self) -> Result<()>;
}

// ── Silent sink (library callers) ───────────────────────────────────────────

pub struct SilentSink;

impl EventSink for SilentSink {
    fn send(&self, _event: UiEvent) {}

    fn check(&self) -> Result<()> {
        Ok(())
    }
}

// ── Console sink (headless mode) ────────────────────────────────────────────

pub struct ConsoleSink {
    pb: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pb: Mutex::new(None),
        })
    }

    fn make_pb(total: u64, template: &str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    fn with_pb(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut guard) = self.pb.lock() {
            f(&mut guard);
        }
    }

    fn finish_pb(&self) {
        self.with_pb(|pb| {
            if let Some(pb) = pb.take() {
                pb.finish_and_clear();
            }
        });
    }
}

impl EventSink for ConsoleSink {
    fn send(&self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => println!("  {}", msg),

            UiEvent::LoadStarted { source } => println!("Loading {}", source),
            UiEvent::DownloadStarted { total_bytes } => {
                let pb = Self::make_pb(
                    total_bytes,
                    "  DL {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                );
                self.with_pb(|slot| *slot = Some(pb));
            }
            UiEvent::DownloadProgress { bytes_read } => {
                self.with_pb(|pb| {
                    if let Some(pb) = pb.as_ref() {
                        pb.set_position(bytes_read);
                    }
                });
            }
            UiEvent::DownloadComplete { size_bytes } => {
                self.finish_pb();
                println!("  Downloaded {}", fmt_bytes(size_bytes));
            }
            UiEvent::LoadComplete { bytes } => println!("  Read {}", fmt_bytes(bytes as u64)),

            UiEvent::ParseStarted { chunks } => {
                let pb = Self::make_pb(
                    chunks as u64,
                    "  Parsing {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks",
                );
                self.with_pb(|slot| *slot = Some(pb));
            }
            UiEvent::ParseProgress { chunks_done } => {
                self.with_pb(|pb| {
                    if let Some(pb) = pb.as_ref() {
                        pb.set_position(chunks_done as u64);
                    }
                });
            }
            UiEvent::ChunkSkipped { index, reason } => {
                eprintln!("  WARN: skipped game chunk {}: {}", index + 1, reason);
            }
            UiEvent::ParseComplete { games, skipped } => {
                self.finish_pb();
                println!("  Parsed {} games ({} chunks skipped)", games, skipped);
            }

            UiEvent::Finished => println!("\n=== Complete ==="),
            UiEvent::Error(msg) => eprintln!("\n  ERROR: {}", msg),
        }
    }

    fn check(&self) -> Result<()> {
        Ok(())
    }
}

// ── Channel sink (TUI mode) ────────────────────────────────────────────────

pub struct ChannelSink {
    tx: mpsc::Sender<UiEvent>,
    control: Arc<LoadControl>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<UiEvent>, control: Arc<LoadControl>) -> Arc<Self> {
        Arc::new(Self { tx, control })
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    fn check(&self) -> Result<()> {
        self.control.check()
    }
}

pub fn fmt_bytes(n: u64) -> String {
    if n >= 1_073_741_824 { format!("{:.1} GB", n as f64 / 1_073_741_824.0) }
    else if n >= 1_048_576 { format!("{:.1} MB", n as f64 / 1_048_576.0) }
    else if n >= 1024 { format!("{:.1} KB", n as f64 / 1024.0) }
    else { format!("{} B", n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx, Arc::new(LoadControl::new()));
        sink.send(UiEvent::ParseComplete { games: 2, skipped: 1 });

        match rx.try_recv() {
            Ok(UiEvent::ParseComplete { games, skipped }) => assert_eq!((games, skipped), (2, 1)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_cancel_makes_check_fail() {
        let (tx, _rx) = mpsc::channel();
        let control = Arc::new(LoadControl::new());
        let sink = ChannelSink::new(tx, control.clone());

        assert!(sink.check().is_ok());
        control.cancel();
        assert!(sink.check().is_err());
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(3 * 1_048_576), "3.0 MB");
    }
}
