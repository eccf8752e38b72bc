//! PGN move-tree parsing with an approximate board-state engine.
//!
//! [`parse_games`] turns PGN text into [`Game`] records: headers, a main line
//! of moves where any move may carry nested variations, and the position
//! after every move.

pub mod assemble;
pub mod board;
pub mod chunk;
pub mod engine;
pub mod events;
pub mod header;
pub mod lexer;
pub mod loader;
pub mod notation;
pub mod parser;
pub mod path;
pub mod reparse;
pub mod tree;

pub use board::{Board, Color, START_POSITION};
pub use header::Headers;
pub use parser::{parse_games, parse_text};
pub use path::NodePath;
pub use tree::{Game, MoveNode, Ply};
