use crate::board::{Board, START_POSITION, SetUp};
use crate::engine::try_apply_move;
use crate::header::Headers;
use crate::tree::{Game, MoveNode};

/// Where a game starts: a readable `FEN` tag (kept verbatim as the initial
/// position string), otherwise the standard array.
pub fn starting_point(headers: &Headers) -> (SetUp, String) {
    headers
        .get("FEN")
        .map(str::trim)
        .and_then(|fen| SetUp::parse(fen).map(|setup| (setup, fen.to_string())))
        .unwrap_or_else(|| (SetUp::default(), START_POSITION.to_string()))
}

/// Stamp every node of the tree with the position after its move and wrap
/// the result into a finished [`Game`].
pub fn assemble(headers: Headers, mut moves: Vec<MoveNode>, setup: &SetUp, initial_position: String) -> Game {
    annotate_line(&mut moves, setup.board.clone(), initial_position.clone());
    Game {
        headers,
        moves,
        initial_position,
    }
}

/// Walk every line from its starting board. A variation is seeded from the
/// board before the move it replaces; the line itself continues from the
/// board after it. An unresolved move keeps the previous position string
/// verbatim. Lines wait on an explicit stack so nesting depth is unbounded.
fn annotate_line(line: &mut [MoveNode], board: Board, position: String) {
    let mut pending: Vec<(&mut [MoveNode], Board, String)> = vec![(line, board, position)];

    while let Some((line, mut board, mut position)) = pending.pop() {
        for node in line {
            let side = node.side();
            let (after, after_position) = match try_apply_move(&board, &node.notation, side) {
                Some(next) => {
                    let encoded = next.to_position(side.opponent());
                    (next, encoded)
                }
                None => (board.clone(), position.clone()),
            };
            node.position_after = after_position.clone();

            for variation in node.variations.iter_mut() {
                pending.push((variation.as_mut_slice(), board.clone(), position.clone()));
            }

            board = after;
            position = after_position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, PieceKind, Square};
    use crate::lexer::tokenize;
    use crate::tree::build_tree;

    fn game(headers: Headers, text: &str) -> Game {
        let (setup, initial) = starting_point(&headers);
        let moves = build_tree(tokenize(text), setup.fullmove, setup.side_to_move);
        assemble(headers, moves, &setup, initial)
    }

    fn placement(position: &str) -> &str {
        position.split(' ').next().unwrap_or_default()
    }

    #[test]
    fn test_variation_is_seeded_from_position_before_replaced_move() {
        let g = game(Headers::new(), "1. e4 e5 (1...c5) 2. Nf3");
        let e5 = &g.moves[1];
        let c5 = &e5.variations[0][0];

        let after_e4 = Board::from_position(&g.moves[0].position_after).unwrap();
        let mut expected = after_e4.clone();
        expected.set(Square::parse("c7").unwrap(), None);
        expected.set(Square::parse("c5").unwrap(), after_e4.get(Square::parse("c7").unwrap()));

        assert_eq!(Board::from_position(&c5.position_after).unwrap(), expected);
        assert_ne!(c5.position_after, e5.position_after);
        assert!(c5.position_after.contains(" w "));
    }

    #[test]
    fn test_main_line_continues_after_variation() {
        let g = game(Headers::new(), "1. e4 e5 (1...c5 2. Nf3 d6) 2. Nf3 Nc6");
        assert_eq!(
            placement(&g.moves[3].position_after),
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R"
        );
        assert_eq!(
            placement(&g.moves[1].variations[0][2].position_after),
            "rnbqkbnr/pp2pppp/3p4/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R"
        );
    }

    #[test]
    fn test_nested_variation_seeding() {
        let g = game(Headers::new(), "1. d4 d5 2. c4 (2. Nf3 Nf6 (2... c5)) e6");
        let nf3_line = &g.moves[2].variations[0];
        let c5 = &nf3_line[1].variations[0][0];
        assert_eq!(
            placement(&c5.position_after),
            "rnbqkbnr/pp2pppp/8/2pp4/3P4/5N2/PPP1PPPP/RNBQKB1R"
        );
    }

    #[test]
    fn test_unresolved_move_reuses_previous_position() {
        let g = game(Headers::new(), "1. e4 Qh4 2. Qh5");
        assert_eq!(g.moves.len(), 3);
        // Qh4 is blocked by the e7 pawn.
        assert_eq!(g.moves[1].position_after, g.moves[0].position_after);
    }

    #[test]
    fn test_first_unresolved_move_reuses_initial_position() {
        let g = game(Headers::new(), "1. Nd4");
        assert_eq!(g.moves[0].position_after, START_POSITION);
    }

    #[test]
    fn test_fen_header_sets_start() {
        let mut headers = Headers::new();
        headers.insert("SetUp", "1".into());
        headers.insert("FEN", "4k3/8/8/8/8/8/4P3/4K3 b - - 0 30".into());

        let g = game(headers, "Kd7 31. e4");
        assert_eq!(g.initial_position, "4k3/8/8/8/8/8/4P3/4K3 b - - 0 30");
        assert_eq!(g.moves[0].ply.side, Color::Black);
        assert_eq!(g.moves[0].ply.fullmove, 30);
        assert_eq!(placement(&g.moves[1].position_after), "8/3k4/8/8/4P3/8/8/4K3");
        assert_eq!(
            Board::from_position(g.final_position()).unwrap().get(Square::parse("e4").unwrap()).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );
    }

    #[test]
    fn test_unreadable_fen_falls_back_to_standard() {
        let mut headers = Headers::new();
        headers.insert("FEN", "not a position".into());
        let (setup, initial) = starting_point(&headers);
        assert_eq!(initial, START_POSITION);
        assert_eq!(setup.board, Board::standard());
    }

    #[test]
    fn test_deep_nesting_is_stamped() {
        let depth = 10_000;
        let text = format!("1. e4 {}{}", "(1. d4 ".repeat(depth), ")".repeat(depth));
        let g = game(Headers::new(), &text);

        let mut current = &g.moves[0];
        let mut levels = 0;
        while let Some(variation) = current.variations.first() {
            current = &variation[0];
            levels += 1;
        }
        assert_eq!(levels, depth);
        // Every level replaces the same first move, so it starts from the initial board.
        assert_eq!(
            placement(&current.position_after),
            "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR"
        );
    }
}
