use std::any::Any;
use std::cell::Cell;
use std::panic;
use std::sync::Once;

use crate::assemble::{assemble, starting_point};
use crate::chunk::{normalize_line_endings, split_chunks};
use crate::events::{EventSink, SilentSink, UiEvent};
use crate::header::{Headers, parse_header_line};
use crate::lexer::tokenize;
use crate::tree::{Game, build_tree};

/// How often parse progress is reported, in chunks.
const PROGRESS_EVERY: usize = 256;

thread_local! {
    /// Set while this thread parses a chunk; faults there are reported as events.
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static INSTALL_HOOK: Once = Once::new();

/// Wrap the process panic hook so chunk faults stay off stderr, which the
/// browser has taken over. Panics elsewhere still reach the previous hook.
fn install_quiet_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run `f`, catching a panic without printing it.
fn catch_quietly<T>(f: impl FnOnce() -> T + panic::UnwindSafe) -> std::thread::Result<T> {
    install_quiet_hook();
    QUIET_PANICS.with(|quiet| quiet.set(true));
    let result = panic::catch_unwind(f);
    QUIET_PANICS.with(|quiet| quiet.set(false));
    result
}

#[derive(PartialEq)]
enum State {
    InHeaders,
    InMoveText,
}

/// Parse every game in `text`. Faulty chunks are skipped silently.
pub fn parse_games(text: &str) -> Vec<Game> {
    parse_text(text, &SilentSink)
}

/// Parse every game in `text`, reporting progress and skipped chunks to `sink`.
/// A chunk that faults is left out; its siblings still produce games.
pub fn parse_text(text: &str, sink: &dyn EventSink) -> Vec<Game> {
    let normalized = normalize_line_endings(text);
    let chunks = split_chunks(&normalized);
    sink.send(UiEvent::ParseStarted { chunks: chunks.len() });

    let mut games = Vec::with_capacity(chunks.len());
    let mut skipped = 0usize;

    for (index, chunk) in chunks.iter().enumerate() {
        match catch_quietly(|| parse_chunk(chunk)) {
            Ok(Some(game)) => games.push(game),
            Ok(None) => {}
            Err(payload) => {
                skipped += 1;
                sink.send(UiEvent::ChunkSkipped {
                    index,
                    reason: panic_message(payload.as_ref()),
                });
            }
        }
        if (index + 1) % PROGRESS_EVERY == 0 {
            sink.send(UiEvent::ParseProgress { chunks_done: index + 1 });
        }
    }

    sink.send(UiEvent::ParseProgress { chunks_done: chunks.len() });
    sink.send(UiEvent::ParseComplete {
        games: games.len(),
        skipped,
    });
    games
}

/// Parse one game chunk. Returns `None` when it holds neither tags nor moves.
pub fn parse_chunk(chunk: &str) -> Option<Game> {
    let mut headers = Headers::new();
    let mut state = State::InHeaders;
    let mut movetext = String::with_capacity(chunk.len());

    for line in chunk.lines() {
        let trimmed = line.trim();

        if state == State::InHeaders {
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') {
                // Malformed tag lines are ignored without leaving the tag block.
                if let Some((key, value)) = parse_header_line(trimmed) {
                    headers.insert(key, value);
                }
                continue;
            }
            state = State::InMoveText;
        }

        movetext.push_str(line);
        movetext.push('\n');
    }

    let (setup, initial_position) = starting_point(&headers);
    let moves = build_tree(tokenize(&movetext), setup.fullmove, setup.side_to_move);
    if headers.is_empty() && moves.is_empty() {
        return None;
    }
    Some(assemble(headers, moves, &setup, initial_position))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "internal error".to_string()
    }
}
