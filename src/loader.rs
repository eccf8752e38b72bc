use crate::events::{EventSink, UiEvent};
use anyhow::{Context, Result};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Where PGN text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Url(arg.to_string())
        } else {
            Source::File(PathBuf::from(arg))
        }
    }

    /// True when the payload is zstd-compressed.
    pub fn is_compressed(&self) -> bool {
        let name = match self {
            Source::File(path) => path.to_string_lossy().into_owned(),
            Source::Url(url) => url.split(['?', '#']).next().unwrap_or(url.as_str()).to_string(),
        };
        name.to_ascii_lowercase().ends_with(".zst")
    }

    /// Last modification time of a local file; `None` for URLs or unreadable files.
    pub fn modified_time(&self) -> Option<SystemTime> {
        match self {
            Source::File(path) => fs::metadata(path).and_then(|m| m.modified()).ok(),
            Source::Url(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Read `source` fully into memory and decode it as UTF-8, replacing invalid
/// sequences.
pub fn load(source: &Source, sink: &dyn EventSink) -> Result<String> {
    sink.send(UiEvent::LoadStarted {
        source: source.to_string(),
    });

    let bytes = match source {
        Source::File(path) => read_file(path, source.is_compressed())?,
        Source::Url(url) => {
            let raw = fetch(url, sink)?;
            if source.is_compressed() {
                zstd::decode_all(raw.as_slice()).context("Failed to decompress download")?
            } else {
                raw
            }
        }
    };

    sink.send(UiEvent::LoadComplete { bytes: bytes.len() });
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_file(path: &Path, compressed: bool) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut bytes = Vec::new();
    if compressed {
        let mut decoder = zstd::Decoder::new(file)
            .context("Failed to create zstd decoder")?;
        decoder
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to decompress {}", path.display()))?;
    } else {
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }
    Ok(bytes)
}

/// Download `url` into memory with progress reported through `sink`.
fn fetch(url: &str, sink: &dyn EventSink) -> Result<Vec<u8>> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(300)))
        .build()
        .new_agent();

    let resp = agent.get(url).call().context("HTTP request failed")?;

    let total_size: u64 = resp
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    sink.send(UiEvent::DownloadStarted { total_bytes: total_size });

    let mut reader = resp.into_body().into_reader();
    let mut bytes = Vec::with_capacity(total_size as usize);
    let mut buffer = [0u8; 64 * 1024];
    let mut last_report = 0u64;

    loop {
        sink.check()?;

        let n = reader.read(&mut buffer).context("Network read error")?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..n]);

        let downloaded = bytes.len() as u64;
        if downloaded - last_report > 256 * 1024 {
            sink.send(UiEvent::DownloadProgress { bytes_read: downloaded });
            last_report = downloaded;
        }
    }

    sink.send(UiEvent::DownloadComplete {
        size_bytes: bytes.len() as u64,
    });
    Ok(bytes)
}
