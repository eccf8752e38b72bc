use crate::config::Config;
use anyhow::Result;
use pgn_tree::events::{ConsoleSink, EventSink, UiEvent};
use pgn_tree::loader;
use pgn_tree::parser::parse_text;
use pgn_tree::tree::Game;
use std::sync::Arc;

/// Run in headless mode (console output).
pub fn run(config: &Config) -> Result<()> {
    let sink = ConsoleSink::new();
    run_with_sink(config, sink)
}

/// Load, parse and print one summary line block per game.
pub fn run_with_sink(config: &Config, sink: Arc<dyn EventSink>) -> Result<()> {
    let text = match loader::load(&config.source, &*sink) {
        Ok(text) => text,
        Err(e) => {
            sink.send(UiEvent::Error(format!("{:#}", e)));
            return Err(e);
        }
    };
    sink.check()?;

    let games = parse_text(&text, &*sink);
    for (i, game) in games.iter().enumerate() {
        println!("\n#{} {}", i + 1, summarize(game));
    }

    sink.send(UiEvent::Finished);
    Ok(())
}

/// Human-readable summary of one game.
pub fn summarize(game: &Game) -> String {
    let tag = |key: &str| game.headers.get(key).unwrap_or("?").to_string();
    let last = game
        .moves
        .last()
        .map(|node| format!("{}{}", node.ply, node.notation))
        .unwrap_or_else(|| "-".into());

    format!(
        "{} - {} ({}) {}\n   {} moves, {} variations, last {}\n   {}",
        tag("White"),
        tag("Black"),
        tag("Event"),
        tag("Result"),
        game.moves.len(),
        game.variation_count(),
        last,
        game.final_position(),
    )
}
