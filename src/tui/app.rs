use pgn_tree::events::{LoadControl, UiEvent, fmt_bytes};
use pgn_tree::path::NodePath;
use pgn_tree::reparse::Outcome;
use pgn_tree::tree::{Game, MoveNode};
use std::sync::{Arc, mpsc};

// ── Load state ──────────────────────────────────────────────────────────────

#[derive(PartialEq, Clone, Debug)]
pub enum LoadState {
    Loading,
    Ready,
    Error(String),
}

// ── App state ───────────────────────────────────────────────────────────────

pub struct App {
    pub source_label: String,
    pub load_state: LoadState,

    // Parsed games, replaced wholesale on every successful re-parse
    pub games: Vec<Game>,
    pub game_index: usize,
    /// Selected move. `None` is the position before the first move.
    pub cursor: Option<NodePath>,

    // Load progress
    pub dl_total: u64,
    pub dl_read: u64,
    pub parse_total: usize,
    pub parse_done: usize,

    // Logs
    pub logs: Vec<String>,
    pub log_scroll: usize,

    // Communication
    pub event_rx: Option<mpsc::Receiver<UiEvent>>,
    pub control: Option<Arc<LoadControl>>,

    pub should_quit: bool,
}

impl App {
    pub fn new(source_label: String) -> Self {
        Self {
            source_label,
            load_state: LoadState::Loading,

            games: Vec::new(),
            game_index: 0,
            cursor: None,

            dl_total: 0,
            dl_read: 0,
            parse_total: 0,
            parse_done: 0,

            logs: Vec::new(),
            log_scroll: 0,

            event_rx: None,
            control: None,
            should_quit: false,
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.logs.push(msg);
        let visible = 5usize;
        if self.logs.len() > visible {
            self.log_scroll = self.logs.len() - visible;
        }
    }

    pub fn current_game(&self) -> Option<&Game> {
        self.games.get(self.game_index)
    }

    pub fn selected_node(&self) -> Option<&MoveNode> {
        let game = self.current_game()?;
        game.node_at(self.cursor.as_ref()?)
    }

    /// Position string shown for the current selection.
    pub fn current_position(&self) -> Option<&str> {
        match self.selected_node() {
            Some(node) => Some(&node.position_after),
            None => self.current_game().map(|g| g.initial_position.as_str()),
        }
    }

    /// Process a load or parse event.
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => self.add_log(msg),

            UiEvent::LoadStarted { source } => {
                self.load_state = LoadState::Loading;
                self.dl_total = 0;
                self.dl_read = 0;
                self.add_log(format!("Loading {}", source));
            }
            UiEvent::DownloadStarted { total_bytes } => {
                self.dl_total = total_bytes;
                self.dl_read = 0;
            }
            UiEvent::DownloadProgress { bytes_read } => self.dl_read = bytes_read,
            UiEvent::DownloadComplete { size_bytes } => {
                self.dl_read = size_bytes;
                self.add_log(format!("Download complete ({})", fmt_bytes(size_bytes)));
            }
            UiEvent::LoadComplete { bytes } => {
                self.add_log(format!("Read {}", fmt_bytes(bytes as u64)));
            }

            UiEvent::ParseStarted { chunks } => {
                self.parse_total = chunks;
                self.parse_done = 0;
            }
            UiEvent::ParseProgress { chunks_done } => self.parse_done = chunks_done,
            UiEvent::ChunkSkipped { index, reason } => {
                self.add_log(format!("WARN: skipped game chunk {}: {}", index + 1, reason));
            }
            UiEvent::ParseComplete { games, skipped } => {
                self.add_log(format!("Parse done: {} games, {} chunks skipped", games, skipped));
            }

            UiEvent::Finished => {}
            UiEvent::Error(msg) => self.add_log(format!("ERROR: {}", msg)),
        }
    }

    /// Apply the result of the latest re-parse request.
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome.result {
            Ok(games) => {
                self.load_state = LoadState::Ready;
                self.apply_games(games);
            }
            Err(msg) => {
                // Keep showing whatever was parsed before.
                self.add_log(format!("ERROR: {}", msg));
                self.load_state = LoadState::Error(msg);
            }
        }
    }

    /// Swap in a new set of games, keeping the selection where it still
    /// addresses a move.
    pub fn apply_games(&mut self, games: Vec<Game>) {
        self.games = games;
        if self.game_index >= self.games.len() {
            self.game_index = self.games.len().saturating_sub(1);
            self.cursor = None;
        }
        let still_valid = match (self.games.get(self.game_index), &self.cursor) {
            (Some(game), Some(path)) => game.node_at(path).is_some(),
            _ => false,
        };
        if !still_valid {
            self.cursor = None;
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    pub fn next_move(&mut self) {
        let Some(game) = self.games.get(self.game_index) else { return };
        let next = match &self.cursor {
            None => (!game.moves.is_empty()).then(|| NodePath::main(0)),
            Some(path) => game.next_node(path),
        };
        if next.is_some() {
            self.cursor = next;
        }
    }

    /// Step back along the line; from the first move of a variation, step
    /// out to the move it replaces.
    pub fn previous_move(&mut self) {
        let Some(game) = self.games.get(self.game_index) else { return };
        let Some(path) = &self.cursor else { return };
        self.cursor = match game.previous_node(path) {
            Some(prev) => Some(prev),
            None if path.depth() == 0 => None,
            None => path.parent(),
        };
    }

    pub fn line_start(&mut self) {
        let Some(game) = self.games.get(self.game_index) else { return };
        let Some(path) = &self.cursor else { return };
        self.cursor = if path.depth() == 0 {
            None
        } else {
            game.line_start(path)
        };
    }

    pub fn line_end(&mut self) {
        let Some(game) = self.games.get(self.game_index) else { return };
        let end = match &self.cursor {
            None => game.moves.len().checked_sub(1).map(NodePath::main),
            Some(path) => game.line_end(path),
        };
        if end.is_some() {
            self.cursor = end;
        }
    }

    pub fn enter_variation(&mut self) {
        let Some(game) = self.games.get(self.game_index) else { return };
        if let Some(inside) = self.cursor.as_ref().and_then(|path| game.enter_variation(path)) {
            self.cursor = Some(inside);
        }
    }

    pub fn leave_variation(&mut self) {
        if let Some(parent) = self.cursor.as_ref().and_then(NodePath::parent) {
            self.cursor = Some(parent);
        }
    }

    pub fn sibling_variation(&mut self, forward: bool) {
        let Some(game) = self.games.get(self.game_index) else { return };
        if let Some(sibling) = self.cursor.as_ref().and_then(|path| game.sibling_variation(path, forward)) {
            self.cursor = Some(sibling);
        }
    }

    pub fn next_game(&mut self) {
        if self.games.is_empty() {
            return;
        }
        self.game_index = (self.game_index + 1) % self.games.len();
        self.cursor = None;
    }

    pub fn previous_game(&mut self) {
        if self.games.is_empty() {
            return;
        }
        self.game_index = if self.game_index == 0 {
            self.games.len() - 1
        } else {
            self.game_index - 1
        };
        self.cursor = None;
    }
}

/// Display form of a numeric annotation glyph.
pub fn nag_text(nag: u8) -> String {
    match nag {
        1 => "!".into(),
        2 => "?".into(),
        3 => "!!".into(),
        4 => "??".into(),
        5 => "!?".into(),
        6 => "?!".into(),
        n => format!("${}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgn_tree::parse_games;
    use pgn_tree::START_POSITION;

    const TWO_GAMES: &str = "[Event \"A\"]\n\n1. e4 e5 (1... c5 2. Nf3) (1... e6) 2. Nf3 Nc6 *\n\n[Event \"B\"]\n\n1. d4 *\n";

    fn loaded() -> App {
        let mut app = App::new("test".into());
        app.apply_games(parse_games(TWO_GAMES));
        app
    }

    fn selected(app: &App) -> Option<&str> {
        app.selected_node().map(|n| n.notation.as_str())
    }

    #[test]
    fn test_walk_main_line() {
        let mut app = loaded();
        assert_eq!(app.current_position(), Some(START_POSITION));

        app.next_move();
        app.next_move();
        assert_eq!(selected(&app), Some("e5"));
        app.line_end();
        assert_eq!(selected(&app), Some("Nc6"));
        app.next_move();
        assert_eq!(selected(&app), Some("Nc6"));
        app.line_start();
        assert_eq!(app.cursor, None);
        app.previous_move();
        assert_eq!(app.cursor, None);
    }

    #[test]
    fn test_variation_navigation() {
        let mut app = loaded();
        app.cursor = Some(NodePath::main(1));

        app.enter_variation();
        assert_eq!(selected(&app), Some("c5"));
        app.next_move();
        assert_eq!(selected(&app), Some("Nf3"));
        app.line_start();
        assert_eq!(selected(&app), Some("c5"));

        app.sibling_variation(true);
        assert_eq!(selected(&app), Some("e6"));
        app.sibling_variation(true);
        assert_eq!(selected(&app), Some("e6"));

        app.previous_move();
        assert_eq!(app.cursor, Some(NodePath::main(1)));

        app.enter_variation();
        app.leave_variation();
        assert_eq!(app.cursor, Some(NodePath::main(1)));
    }

    #[test]
    fn test_switching_games_resets_cursor() {
        let mut app = loaded();
        app.next_move();
        app.next_game();
        assert_eq!(app.game_index, 1);
        assert_eq!(app.cursor, None);
        app.next_game();
        assert_eq!(app.game_index, 0);
        app.previous_game();
        assert_eq!(app.game_index, 1);
    }

    #[test]
    fn test_reparse_keeps_valid_cursor() {
        let mut app = loaded();
        app.cursor = Some(NodePath::from_indices(vec![1, 0, 1]));
        app.apply_games(parse_games(TWO_GAMES));
        assert_eq!(selected(&app), Some("Nf3"));

        app.apply_games(parse_games("1. e4 e5 *\n"));
        assert_eq!(app.cursor, None);
    }

    #[test]
    fn test_reparse_clamps_game_index() {
        let mut app = loaded();
        app.game_index = 1;
        app.cursor = Some(NodePath::main(0));
        app.apply_games(parse_games("1. c4 *\n"));
        assert_eq!(app.game_index, 0);
        assert_eq!(app.cursor, None);
    }

    #[test]
    fn test_failed_outcome_keeps_games() {
        let mut app = loaded();
        app.apply_outcome(Outcome {
            id: 2,
            result: Err("boom".into()),
        });
        assert_eq!(app.games.len(), 2);
        assert_eq!(app.load_state, LoadState::Error("boom".into()));
        assert!(app.logs.last().is_some_and(|l| l.contains("boom")));
    }

    #[test]
    fn test_nag_text() {
        assert_eq!(nag_text(1), "!");
        assert_eq!(nag_text(6), "?!");
        assert_eq!(nag_text(14), "$14");
    }
}
