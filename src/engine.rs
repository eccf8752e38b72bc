//! Approximate move executor.
//!
//! Resolves a move token against a board by piece type, disambiguation and
//! movement geometry only. There is no check detection and no legality oracle:
//! the aim is to recover a plausible board trajectory from well-formed text.

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::notation::{CastleSide, Notation, PieceMove};

/// Apply `token` for `side` to a copy of `board`. A token that cannot be
/// resolved yields an unchanged copy.
pub fn apply_move(board: &Board, token: &str, side: Color) -> Board {
    try_apply_move(board, token, side).unwrap_or_else(|| board.clone())
}

/// Like [`apply_move`] but reports whether the token resolved.
pub fn try_apply_move(board: &Board, token: &str, side: Color) -> Option<Board> {
    match Notation::parse(token)? {
        Notation::Castle(castle_side) => Some(castle(board, castle_side, side)),
        Notation::Move(m) => {
            let from = resolve_source(board, &m, side)?;
            let moving = board.get(from)?;
            let placed = match m.promotion {
                Some(kind) => Piece::new(kind, side),
                None => moving,
            };
            let mut next = board.clone();
            next.set(from, None);
            next.set(m.to, Some(placed));
            Some(next)
        }
    }
}

/// Source square for `m`. When several pieces qualify the first one in
/// row-major order wins; well-formed notation never leaves more than one.
pub fn resolve_source(board: &Board, m: &PieceMove, side: Color) -> Option<Square> {
    board
        .pieces()
        .filter(|(_, piece)| piece.kind == m.piece && piece.color == side)
        .map(|(sq, _)| sq)
        .filter(|sq| m.from_file.is_none_or(|file| sq.file() == file))
        .filter(|sq| m.from_rank.is_none_or(|rank| sq.rank() == rank))
        .find(|&sq| can_reach(board, m.piece, side, sq, m.to))
}

fn castle(board: &Board, castle_side: CastleSide, side: Color) -> Board {
    let row = match side {
        Color::White => 7,
        Color::Black => 0,
    };
    let (king_to, rook_from, rook_to) = match castle_side {
        CastleSide::King => (6, 7, 5),
        CastleSide::Queen => (2, 0, 3),
    };

    let mut next = board.clone();
    next.set(Square::new(row, 4), None);
    next.set(Square::new(row, rook_from), None);
    next.set(Square::new(row, king_to), Some(Piece::new(PieceKind::King, side)));
    next.set(Square::new(row, rook_to), Some(Piece::new(PieceKind::Rook, side)));
    next
}

fn can_reach(board: &Board, kind: PieceKind, side: Color, from: Square, to: Square) -> bool {
    let d_row = to.row as i8 - from.row as i8;
    let d_col = to.col as i8 - from.col as i8;
    if d_row == 0 && d_col == 0 {
        return false;
    }

    let straight = d_row == 0 || d_col == 0;
    let diagonal = d_row.abs() == d_col.abs();

    match kind {
        PieceKind::Pawn => pawn_can_reach(board, side, from, to, d_row, d_col),
        PieceKind::Knight => matches!((d_row.abs(), d_col.abs()), (1, 2) | (2, 1)),
        PieceKind::Bishop => diagonal && ray_is_clear(board, from, to),
        PieceKind::Rook => straight && ray_is_clear(board, from, to),
        PieceKind::Queen => (straight || diagonal) && ray_is_clear(board, from, to),
        PieceKind::King => d_row.abs() <= 1 && d_col.abs() <= 1,
    }
}

fn pawn_can_reach(board: &Board, side: Color, from: Square, to: Square, d_row: i8, d_col: i8) -> bool {
    let (forward, start_row) = match side {
        Color::White => (-1, 6),
        Color::Black => (1, 1),
    };

    if d_col == 0 {
        if d_row == forward {
            board.is_empty(to)
        } else if d_row == 2 * forward && from.row == start_row {
            board.is_empty(to) && from.offset(forward, 0).is_some_and(|mid| board.is_empty(mid))
        } else {
            false
        }
    } else {
        // Diagonal steps are captures only; en passant is not tracked.
        d_col.abs() == 1 && d_row == forward && !board.is_empty(to)
    }
}

/// Every square strictly between `from` and `to` is empty. Callers guarantee
/// the two squares share a rank, file or diagonal.
fn ray_is_clear(board: &Board, from: Square, to: Square) -> bool {
    let step_row = (to.row as i8 - from.row as i8).signum();
    let step_col = (to.col as i8 - from.col as i8).signum();

    let mut cursor = from.offset(step_row, step_col);
    while let Some(sq) = cursor {
        if sq == to {
            return true;
        }
        if !board.is_empty(sq) {
            return false;
        }
        cursor = sq.offset(step_row, step_col);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::parse(name).unwrap()
    }

    fn play(tokens: &[&str]) -> Board {
        let mut board = Board::standard();
        let mut side = Color::White;
        for token in tokens {
            board = try_apply_move(&board, token, side).unwrap_or_else(|| panic!("{token} did not resolve"));
            side = side.opponent();
        }
        board
    }

    fn piece(kind: PieceKind, color: Color) -> Option<Piece> {
        Some(Piece::new(kind, color))
    }

    #[test]
    fn test_opening_moves() {
        let board = play(&["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert_eq!(
            board.to_position(Color::Black),
            "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 0 1"
        );
    }

    #[test]
    fn test_kingside_castling_after_clearing() {
        let mut board = Board::standard();
        board.set(sq("f1"), None);
        board.set(sq("g1"), None);

        let after = apply_move(&board, "O-O", Color::White);
        assert_eq!(after.get(sq("g1")), piece(PieceKind::King, Color::White));
        assert_eq!(after.get(sq("f1")), piece(PieceKind::Rook, Color::White));
        assert!(after.is_empty(sq("e1")));
        assert!(after.is_empty(sq("h1")));
    }

    #[test]
    fn test_black_queenside_castling() {
        let mut board = Board::standard();
        for name in ["b8", "c8", "d8"] {
            board.set(sq(name), None);
        }
        let after = apply_move(&board, "O-O-O", Color::Black);
        assert_eq!(after.get(sq("c8")), piece(PieceKind::King, Color::Black));
        assert_eq!(after.get(sq("d8")), piece(PieceKind::Rook, Color::Black));
        assert!(after.is_empty(sq("e8")));
        assert!(after.is_empty(sq("a8")));
    }

    #[test]
    fn test_file_disambiguation() {
        let mut board = Board::empty();
        board.set(sq("b1"), piece(PieceKind::Knight, Color::White));
        board.set(sq("f1"), piece(PieceKind::Knight, Color::White));

        let after = apply_move(&board, "Nfd2", Color::White);
        assert_eq!(after.get(sq("d2")), piece(PieceKind::Knight, Color::White));
        assert_eq!(after.get(sq("b1")), piece(PieceKind::Knight, Color::White));
        assert!(after.is_empty(sq("f1")));
    }

    #[test]
    fn test_ambiguous_move_takes_first_in_row_major_order() {
        let mut board = Board::empty();
        board.set(sq("b1"), piece(PieceKind::Knight, Color::White));
        board.set(sq("f3"), piece(PieceKind::Knight, Color::White));

        // Both reach d2; f3 (rank 3) is scanned before b1 (rank 1).
        let after = apply_move(&board, "Nd2", Color::White);
        assert!(after.is_empty(sq("f3")));
        assert_eq!(after.get(sq("b1")), piece(PieceKind::Knight, Color::White));
    }

    #[test]
    fn test_blocked_slider_is_not_a_candidate() {
        let mut board = Board::empty();
        board.set(sq("a8"), piece(PieceKind::Rook, Color::White));
        board.set(sq("a6"), piece(PieceKind::Pawn, Color::White));
        board.set(sq("h4"), piece(PieceKind::Rook, Color::White));

        // a8 is scanned first but the pawn on a6 blocks it.
        let after = apply_move(&board, "Ra4", Color::White);
        assert_eq!(after.get(sq("a4")), piece(PieceKind::Rook, Color::White));
        assert_eq!(after.get(sq("a8")), piece(PieceKind::Rook, Color::White));
        assert!(after.is_empty(sq("h4")));
    }

    #[test]
    fn test_pawn_double_push_needs_clear_path() {
        let mut board = Board::standard();
        board.set(sq("e3"), piece(PieceKind::Knight, Color::Black));
        assert!(try_apply_move(&board, "e4", Color::White).is_none());
    }

    #[test]
    fn test_pawn_capture_needs_occupied_target() {
        let board = play(&["e4", "d5"]);
        let after = apply_move(&board, "exd5", Color::White);
        assert_eq!(after.get(sq("d5")), piece(PieceKind::Pawn, Color::White));
        assert!(after.is_empty(sq("e4")));

        assert!(try_apply_move(&Board::standard(), "exd3", Color::White).is_none());
    }

    #[test]
    fn test_promotion_places_promoted_piece() {
        let mut board = Board::empty();
        board.set(sq("g7"), piece(PieceKind::Pawn, Color::White));
        let after = apply_move(&board, "g8=N+", Color::White);
        assert_eq!(after.get(sq("g8")), piece(PieceKind::Knight, Color::White));
        assert!(after.is_empty(sq("g7")));

        let mut board = Board::empty();
        board.set(sq("b2"), piece(PieceKind::Pawn, Color::Black));
        board.set(sq("a1"), piece(PieceKind::Rook, Color::White));
        let after = apply_move(&board, "bxa1=Q", Color::Black);
        assert_eq!(after.get(sq("a1")), piece(PieceKind::Queen, Color::Black));
    }

    #[test]
    fn test_unresolvable_token_leaves_board_unchanged() {
        let board = Board::standard();
        assert_eq!(apply_move(&board, "Qh5", Color::White), board);
        assert_eq!(apply_move(&board, "1-0", Color::White), board);
        assert_eq!(apply_move(&board, "Ke2", Color::Black), board);
    }

    #[test]
    fn test_king_moves_one_square() {
        let board = play(&["e4", "e5"]);
        let after = apply_move(&board, "Ke2", Color::White);
        assert_eq!(after.get(sq("e2")), piece(PieceKind::King, Color::White));
        assert!(try_apply_move(&board, "Ke3", Color::White).is_none());
    }
}
