use std::fmt;

/// Position string of the standard starting array.
pub const START_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Trailing fields emitted after the active color. Castling rights, en-passant
/// target and both clocks are not tracked, so they are always this constant.
const PLACEHOLDER_FIELDS: &str = "KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn position_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Uppercase piece letter as written in move text and position strings.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Uppercase for White, lowercase for Black.
    pub fn to_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c.to_ascii_uppercase())?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Self::new(kind, color))
    }
}

/// A board cell. Row 0 is rank 8, column 0 is file a.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Self { row, col }
    }

    /// `file` is 0..8 (a..h), `rank` is 1..=8.
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        Self::new(8 - rank, file)
    }

    /// Parse a square name such as `e4`.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let file = file_index(chars.next()?)?;
        let rank = rank_number(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self::from_file_rank(file, rank))
    }

    pub fn file(self) -> u8 {
        self.col
    }

    pub fn rank(self) -> u8 {
        8 - self.row
    }

    /// Offset by (rows, cols), or `None` when it falls off the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank())
    }
}

/// `a`..`h` to 0..8.
pub fn file_index(c: char) -> Option<u8> {
    if ('a'..='h').contains(&c) {
        Some(c as u8 - b'a')
    } else {
        None
    }
}

/// `1`..`8` to 1..=8.
pub fn rank_number(c: char) -> Option<u8> {
    if ('1'..='8').contains(&c) {
        Some(c as u8 - b'0')
    } else {
        None
    }
}

/// Row-major 8x8 placement. Boards are plain values: moves are applied to a
/// copy, so a stored board never aliases another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [[None; 8]; 8] }
    }

    pub fn standard() -> Self {
        let mut board = Self::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, kind) in back.into_iter().enumerate() {
            board.cells[0][col] = Some(Piece::new(kind, Color::Black));
            board.cells[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board.cells[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board.cells[7][col] = Some(Piece::new(kind, Color::White));
        }
        board
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row as usize][sq.col as usize]
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.row as usize][sq.col as usize] = piece;
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Occupied squares in row-major order (rank 8 first, a-file first).
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, cell)| {
                cell.map(|piece| (Square::new(row as u8, col as u8), piece))
            })
        })
    }

    /// Run-length placement field, e.g. `rnbqkbnr/pppppppp/8/...`.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for (row, cells) in self.cells.iter().enumerate() {
            if row > 0 {
                out.push('/');
            }
            let mut empty = 0u8;
            for cell in cells {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
        }
        out
    }

    /// Full position string with `side` to move and placeholder trailing fields.
    pub fn to_position(&self, side: Color) -> String {
        format!("{} {} {}", self.placement(), side.position_char(), PLACEHOLDER_FIELDS)
    }

    /// Parse the placement field of a position string. Trailing fields are
    /// ignored here; see [`SetUp::parse`].
    pub fn from_position(position: &str) -> Option<Self> {
        let placement = position.split_whitespace().next()?;
        let mut board = Self::empty();
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return None;
        }
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if run == 0 || run > 8 {
                        return None;
                    }
                    col += run as usize;
                } else {
                    let piece = Piece::from_char(c)?;
                    if col >= 8 {
                        return None;
                    }
                    board.cells[row][col] = Some(piece);
                    col += 1;
                }
                if col > 8 {
                    return None;
                }
            }
            if col != 8 {
                return None;
            }
        }
        Some(board)
    }
}

/// A position string decoded for use as a game's starting point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetUp {
    pub board: Board,
    pub side_to_move: Color,
    pub fullmove: u32,
}

impl SetUp {
    /// Missing or unreadable side/fullmove fields fall back to White and 1.
    pub fn parse(position: &str) -> Option<Self> {
        let board = Board::from_position(position)?;
        let mut fields = position.split_whitespace().skip(1);
        let side_to_move = match fields.next() {
            Some("b") => Color::Black,
            _ => Color::White,
        };
        let fullmove = fields
            .nth(3)
            .and_then(|f| f.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        Some(Self { board, side_to_move, fullmove })
    }
}

impl Default for SetUp {
    fn default() -> Self {
        Self {
            board: Board::standard(),
            side_to_move: Color::White,
            fullmove: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_board_matches_start_position() {
        assert_eq!(Board::standard().to_position(Color::White), START_POSITION);
    }

    #[test]
    fn test_round_trip_standard() {
        let board = Board::standard();
        let parsed = Board::from_position(&board.to_position(Color::Black)).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn test_round_trip_sparse_board() {
        let mut board = Board::empty();
        board.set(Square::parse("e1").unwrap(), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(Square::parse("e8").unwrap(), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set(Square::parse("a7").unwrap(), Some(Piece::new(PieceKind::Pawn, Color::White)));
        board.set(Square::parse("h2").unwrap(), Some(Piece::new(PieceKind::Queen, Color::Black)));

        let position = board.to_position(Color::White);
        assert_eq!(position, "4k3/P7/8/8/8/8/7q/4K3 w KQkq - 0 1");
        assert_eq!(Board::from_position(&position).unwrap(), board);
    }

    #[test]
    fn test_from_position_rejects_malformed_placement() {
        assert!(Board::from_position("").is_none());
        assert!(Board::from_position("8/8/8/8/8/8/8 w").is_none());
        assert!(Board::from_position("9/8/8/8/8/8/8/8").is_none());
        assert!(Board::from_position("ppppppppp/8/8/8/8/8/8/8").is_none());
        assert!(Board::from_position("7/8/8/8/8/8/8/8").is_none());
        assert!(Board::from_position("x7/8/8/8/8/8/8/8").is_none());
    }

    #[test]
    fn test_square_names() {
        let e4 = Square::parse("e4").unwrap();
        assert_eq!((e4.row, e4.col), (4, 4));
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(Square::parse("a8").unwrap(), Square::new(0, 0));
        assert_eq!(Square::parse("h1").unwrap(), Square::new(7, 7));
        assert!(Square::parse("i1").is_none());
        assert!(Square::parse("a9").is_none());
        assert!(Square::parse("a1x").is_none());
    }

    #[test]
    fn test_pieces_are_row_major() {
        let squares: Vec<String> = Board::standard()
            .pieces()
            .take(3)
            .map(|(sq, _)| sq.to_string())
            .collect();
        assert_eq!(squares, vec!["a8", "b8", "c8"]);
    }

    #[test]
    fn test_setup_reads_side_and_fullmove() {
        let setup = SetUp::parse("4k3/8/8/8/8/8/8/4K3 b - - 3 42").unwrap();
        assert_eq!(setup.side_to_move, Color::Black);
        assert_eq!(setup.fullmove, 42);

        let bare = SetUp::parse("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(bare.side_to_move, Color::White);
        assert_eq!(bare.fullmove, 1);
    }
}
