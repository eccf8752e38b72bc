use crate::notation::{Notation, split_glyph};

/// Typed move-text token. Whitespace only separates tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{ ... }` or `; ...` to end of line, inner text trimmed.
    Comment(String),
    OpenVar,
    CloseVar,
    /// `12.` or `12...`; `black` is set by the three-dot form.
    MoveNumber { number: u32, black: bool },
    /// A token that matches the move grammar, with any `!`/`?` suffix removed.
    Move(String),
    /// `$n`, or a `!`/`?` suffix translated to its numeric glyph.
    Nag(u8),
    /// Result markers and anything else the grammar does not know.
    Discard(String),
}

pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start();
        let Some(c) = rest.chars().next() else {
            break;
        };

        match c {
            '{' => {
                // No nesting: the first closing brace ends the comment.
                let body = &rest[1..];
                let (inner, after) = match body.find('}') {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                };
                tokens.push(Token::Comment(inner.trim().to_string()));
                rest = after;
            }
            ';' => {
                let body = &rest[1..];
                let (inner, after) = match body.find('\n') {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                };
                tokens.push(Token::Comment(inner.trim().to_string()));
                rest = after;
            }
            '(' => {
                tokens.push(Token::OpenVar);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::CloseVar);
                rest = &rest[1..];
            }
            '}' => {
                tokens.push(Token::Discard("}".to_string()));
                rest = &rest[1..];
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | ';'))
                    .unwrap_or(rest.len());
                lex_word(&rest[..end], &mut tokens);
                rest = &rest[end..];
            }
        }
    }

    tokens
}

fn lex_word(word: &str, tokens: &mut Vec<Token>) {
    let mut word = word;

    let digits = word.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let after = &word[digits..];
        let dots = after.bytes().take_while(|b| *b == b'.').count();
        if after.is_empty() || dots > 0 {
            let Ok(number) = word[..digits].parse::<u32>() else {
                tokens.push(Token::Discard(word.to_string()));
                return;
            };
            tokens.push(Token::MoveNumber { number, black: dots >= 3 });
            // `1.e4` carries the move in the same word.
            word = &after[dots..];
            if word.is_empty() {
                return;
            }
        }
    }

    if let Some(Ok(nag)) = word.strip_prefix('$').map(str::parse::<u8>) {
        tokens.push(Token::Nag(nag));
        return;
    }

    let (bare, glyph) = split_glyph(word);
    if bare.is_empty() {
        if let Some(nag) = glyph {
            tokens.push(Token::Nag(nag));
            return;
        }
    } else if Notation::parse(bare).is_some() {
        tokens.push(Token::Move(bare.to_string()));
        if let Some(nag) = glyph {
            tokens.push(Token::Nag(nag));
        }
        return;
    }

    tokens.push(Token::Discard(word.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> Token {
        Token::Move(s.to_string())
    }

    fn num(number: u32, black: bool) -> Token {
        Token::MoveNumber { number, black }
    }

    #[test]
    fn test_basic_sequence() {
        assert_eq!(
            tokenize("1. e4 e5 2. Nf3"),
            vec![num(1, false), mv("e4"), mv("e5"), num(2, false), mv("Nf3")]
        );
    }

    #[test]
    fn test_black_move_number() {
        assert_eq!(tokenize("1... c5"), vec![num(1, true), mv("c5")]);
        assert_eq!(tokenize("7"), vec![num(7, false)]);
    }

    #[test]
    fn test_move_glued_to_number() {
        assert_eq!(tokenize("1.e4 1...e5"), vec![num(1, false), mv("e4"), num(1, true), mv("e5")]);
    }

    #[test]
    fn test_comments_and_variations() {
        assert_eq!(
            tokenize("e4 {  best by test } (d4)e5"),
            vec![
                mv("e4"),
                Token::Comment("best by test".to_string()),
                Token::OpenVar,
                mv("d4"),
                Token::CloseVar,
                mv("e5"),
            ]
        );
    }

    #[test]
    fn test_first_brace_closes_comment() {
        assert_eq!(
            tokenize("{a {b} c}"),
            vec![
                Token::Comment("a {b".to_string()),
                Token::Discard("c".to_string()),
                Token::Discard("}".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        assert_eq!(tokenize("e4 { dangling"), vec![mv("e4"), Token::Comment("dangling".to_string())]);
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            tokenize("e4 ; a note with e5 inside\nd5"),
            vec![mv("e4"), Token::Comment("a note with e5 inside".to_string()), mv("d5")]
        );
    }

    #[test]
    fn test_results_and_noise_are_discarded() {
        assert_eq!(
            tokenize("e4 1-0 0-1 1/2-1/2 * --"),
            vec![
                mv("e4"),
                Token::Discard("1-0".to_string()),
                Token::Discard("0-1".to_string()),
                Token::Discard("1/2-1/2".to_string()),
                Token::Discard("*".to_string()),
                Token::Discard("--".to_string()),
            ]
        );
    }

    #[test]
    fn test_castling_is_not_a_move_number() {
        assert_eq!(tokenize("0-0 O-O-O"), vec![mv("0-0"), mv("O-O-O")]);
    }

    #[test]
    fn test_nags() {
        assert_eq!(
            tokenize("e4! $14 e5?? !?"),
            vec![mv("e4"), Token::Nag(1), Token::Nag(14), mv("e5"), Token::Nag(4), Token::Nag(5)]
        );
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokenize(" \n\t ").is_empty());
    }
}
