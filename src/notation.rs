//! Move-token grammar.
//!
//! A move token is either castling (`O-O`, `O-O-O`, or the zero spellings) or
//! `[piece][from-file][from-rank][x]<to-square>[[=]promotion][+|#]`.

use crate::board::{PieceKind, Square, file_index, rank_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

/// Everything a move token says about the move, before looking at a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceMove {
    pub piece: PieceKind,
    pub from_file: Option<u8>,
    pub from_rank: Option<u8>,
    pub capture: bool,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Castle(CastleSide),
    Move(PieceMove),
}

impl Notation {
    pub fn parse(token: &str) -> Option<Self> {
        let body = token
            .strip_suffix('+')
            .or_else(|| token.strip_suffix('#'))
            .unwrap_or(token);

        match body {
            "O-O" | "0-0" => return Some(Notation::Castle(CastleSide::King)),
            "O-O-O" | "0-0-0" => return Some(Notation::Castle(CastleSide::Queen)),
            _ => {}
        }

        let chars: Vec<char> = body.chars().collect();
        let mut end = chars.len();

        let mut promotion = None;
        if let Some(kind) = chars.last().copied().and_then(promotion_kind) {
            match chars.get(end.wrapping_sub(2)) {
                Some('=') => end -= 2,
                Some(c) if rank_number(*c).is_some() => end -= 1,
                _ => return None,
            }
            promotion = Some(kind);
        }

        if end < 2 {
            return None;
        }
        let to_file = file_index(chars[end - 2])?;
        let to_rank = rank_number(chars[end - 1])?;
        let to = Square::from_file_rank(to_file, to_rank);

        let prefix = &chars[..end - 2];
        let mut i = 0;
        let mut piece = PieceKind::Pawn;
        if let Some(kind) = prefix.first().copied().and_then(piece_letter) {
            piece = kind;
            i += 1;
        }
        let from_file = prefix.get(i).copied().and_then(file_index);
        if from_file.is_some() {
            i += 1;
        }
        let from_rank = prefix.get(i).copied().and_then(rank_number);
        if from_rank.is_some() {
            i += 1;
        }
        let capture = prefix.get(i) == Some(&'x');
        if capture {
            i += 1;
        }
        if i != prefix.len() {
            return None;
        }

        Some(Notation::Move(PieceMove {
            piece,
            from_file,
            from_rank,
            capture,
            to,
            promotion,
        }))
    }
}

fn piece_letter(c: char) -> Option<PieceKind> {
    match c {
        'N' | 'B' | 'R' | 'Q' | 'K' => PieceKind::from_letter(c),
        _ => None,
    }
}

fn promotion_kind(c: char) -> Option<PieceKind> {
    match c {
        'N' | 'B' | 'R' | 'Q' => PieceKind::from_letter(c),
        _ => None,
    }
}

/// Split a trailing move-quality glyph off a token, returning the bare token
/// and the equivalent numeric annotation glyph.
pub fn split_glyph(word: &str) -> (&str, Option<u8>) {
    const GLYPHS: [(&str, u8); 6] = [("!!", 3), ("??", 4), ("!?", 5), ("?!", 6), ("!", 1), ("?", 2)];
    for (glyph, nag) in GLYPHS {
        if let Some(bare) = word.strip_suffix(glyph) {
            return (bare, Some(nag));
        }
    }
    (word, None)
}
