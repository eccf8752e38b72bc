use std::fmt;

use crate::board::Color;
use crate::header::Headers;
use crate::lexer::Token;

/// Fullmove number plus side. Orders like `n` for White and `n.5` for Black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ply {
    pub fullmove: u32,
    pub side: Color,
}

impl Ply {
    pub fn new(fullmove: u32, side: Color) -> Self {
        Self { fullmove, side }
    }
}

impl fmt::Display for Ply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Color::White => write!(f, "{}.", self.fullmove),
            Color::Black => write!(f, "{}...", self.fullmove),
        }
    }
}

/// One move of a line. Each entry of `variations` replaces this move: it is
/// played from the position before it, not after it.
///
/// Variations nest without limit, so equality and drop walk the tree with an
/// explicit stack instead of recursing.
#[derive(Debug)]
pub struct MoveNode {
    pub ply: Ply,
    pub notation: String,
    pub is_white: bool,
    pub comment: Option<String>,
    pub nags: Vec<u8>,
    pub position_after: String,
    pub variations: Vec<Vec<MoveNode>>,
}

impl MoveNode {
    fn new(ply: Ply, notation: String, comment: Option<String>) -> Self {
        Self {
            ply,
            notation,
            is_white: ply.side == Color::White,
            comment,
            nags: Vec::new(),
            position_after: String::new(),
            variations: Vec::new(),
        }
    }

    pub fn side(&self) -> Color {
        self.ply.side
    }

    fn same_move(&self, other: &Self) -> bool {
        self.ply == other.ply
            && self.notation == other.notation
            && self.is_white == other.is_white
            && self.comment == other.comment
            && self.nags == other.nags
            && self.position_after == other.position_after
            && self.variations.len() == other.variations.len()
    }
}

impl PartialEq for MoveNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending: Vec<(&[MoveNode], &[MoveNode])> =
            vec![(std::slice::from_ref(self), std::slice::from_ref(other))];
        while let Some((left, right)) = pending.pop() {
            if left.len() != right.len() {
                return false;
            }
            for (a, b) in left.iter().zip(right) {
                if !a.same_move(b) {
                    return false;
                }
                for (va, vb) in a.variations.iter().zip(&b.variations) {
                    pending.push((va.as_slice(), vb.as_slice()));
                }
            }
        }
        true
    }
}

impl Eq for MoveNode {}

impl Drop for MoveNode {
    fn drop(&mut self) {
        let mut lines = std::mem::take(&mut self.variations);
        while let Some(line) = lines.pop() {
            for mut node in line {
                lines.append(&mut node.variations);
            }
        }
    }
}

/// A parsed game. Built once and read-only afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct Game {
    pub headers: Headers,
    pub moves: Vec<MoveNode>,
    pub initial_position: String,
}

impl Game {
    /// Number of variations anywhere in the tree.
    pub fn variation_count(&self) -> usize {
        let mut count = 0;
        let mut lines: Vec<&[MoveNode]> = vec![self.moves.as_slice()];
        while let Some(line) = lines.pop() {
            for node in line {
                count += node.variations.len();
                lines.extend(node.variations.iter().map(Vec::as_slice));
            }
        }
        count
    }

    /// Position string at the end of the main line.
    pub fn final_position(&self) -> &str {
        self.moves
            .last()
            .map(|node| node.position_after.as_str())
            .unwrap_or(&self.initial_position)
    }
}

struct OpenLine {
    nodes: Vec<MoveNode>,
    /// Counter state to restore when this line closes.
    resume: (u32, bool),
}

/// Builds the move tree from a token stream. Tolerant: malformed nesting is
/// dropped, never reported.
pub struct TreeBuilder {
    stack: Vec<OpenLine>,
    fullmove: u32,
    expect_black: bool,
    pending_comment: Option<String>,
}

impl TreeBuilder {
    pub fn new(fullmove: u32, side_to_move: Color) -> Self {
        let expect_black = side_to_move == Color::Black;
        Self {
            stack: vec![OpenLine {
                nodes: Vec::new(),
                resume: (fullmove, expect_black),
            }],
            fullmove,
            expect_black,
            pending_comment: None,
        }
    }

    pub fn push(&mut self, token: Token) {
        match token {
            Token::Comment(text) => self.pending_comment = Some(text),
            Token::OpenVar => {
                let resume = (self.fullmove, self.expect_black);
                // The variation replaces the last move, so it starts at that ply.
                if let Some(last) = self.top().nodes.last() {
                    let ply = last.ply;
                    self.fullmove = ply.fullmove;
                    self.expect_black = ply.side == Color::Black;
                }
                self.stack.push(OpenLine {
                    nodes: Vec::new(),
                    resume,
                });
            }
            Token::CloseVar => {
                if self.stack.len() < 2 {
                    return;
                }
                let Some(finished) = self.stack.pop() else {
                    return;
                };
                (self.fullmove, self.expect_black) = finished.resume;
                if finished.nodes.is_empty() {
                    return;
                }
                if let Some(parent) = self.top_mut().nodes.last_mut() {
                    parent.variations.push(finished.nodes);
                }
            }
            Token::MoveNumber { number, black } => {
                self.fullmove = number;
                self.expect_black = black;
            }
            Token::Move(notation) => {
                let side = if self.expect_black { Color::Black } else { Color::White };
                let node = MoveNode::new(Ply::new(self.fullmove, side), notation, self.pending_comment.take());
                self.top_mut().nodes.push(node);
                // Past the last representable fullmove the ply stays put.
                if !self.expect_black {
                    self.expect_black = true;
                } else if let Some(next) = self.fullmove.checked_add(1) {
                    self.fullmove = next;
                    self.expect_black = false;
                }
            }
            Token::Nag(nag) => {
                if let Some(node) = self.top_mut().nodes.last_mut() {
                    node.nags.push(nag);
                }
            }
            Token::Discard(_) => {}
        }
    }

    /// The main line. Variations left open at end of input are dropped, as is
    /// a comment with no move after it.
    pub fn finish(mut self) -> Vec<MoveNode> {
        self.stack.truncate(1);
        self.stack.pop().map(|line| line.nodes).unwrap_or_default()
    }

    fn top(&self) -> &OpenLine {
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut OpenLine {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}

pub fn build_tree(tokens: impl IntoIterator<Item = Token>, fullmove: u32, side_to_move: Color) -> Vec<MoveNode> {
    let mut builder = TreeBuilder::new(fullmove, side_to_move);
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}
