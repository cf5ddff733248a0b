//! Scans zsh/bash-style extended-glob patterns: `?(...)`, `*(...)`,
//! `+(...)`, `@(...)`, `!(...)`, and the bare alternation forms used in
//! `case` patterns.
//!
//! Declines entirely on the `esac` keyword, which always closes the
//! enclosing `case` statement rather than starting a pattern.

use super::Scanner;
use crate::grammar::Terminal;
use crate::lexer::LexInput;

const PREFIX_OPERATORS: [char; 5] = ['?', '*', '+', '@', '!'];

pub(super) fn scan<I: LexInput>(scanner: &mut Scanner, input: &mut I) -> Option<Terminal> {
    if looks_like_esac(input) {
        return None;
    }

    let mark = input.mark();
    let Some(first) = input.lookahead() else { return None };

    if PREFIX_OPERATORS.contains(&first) && peek_second(input) == Some('(') {
        input.advance(); // prefix operator
        input.advance(); // '('
        if scan_balanced_body(scanner, input) {
            input.mark_end();
            return Some(Terminal::ExtglobPattern);
        }
        input.reset(mark);
        return None;
    }

    // Bare glob atoms used in case alternatives: a run of `*`, `?`, and
    // literal characters, stopping at whitespace, `)`, or `|`.
    let mut saw_any = false;
    loop {
        match input.lookahead() {
            Some(c) if matches!(c, '*' | '?') => {
                input.advance();
                saw_any = true;
            }
            Some(c) if is_bare_glob_char(c) => {
                input.advance();
                saw_any = true;
            }
            _ => break,
        }
    }

    if !saw_any {
        input.reset(mark);
        return None;
    }
    input.mark_end();
    Some(Terminal::ExtglobPattern)
}

/// Scans a pattern's `(...)` body, tracking nesting depth on the
/// [`Scanner`] itself (not a local) so it is carried across the whole
/// pattern the way spec's Data Model attributes it, and honoring the
/// quote/extglob interplay: a `(`/`)` encountered inside a double-quoted
/// run is a literal character, not a structural paren, since quoting
/// disables pattern matching on whatever it covers. A body that never
/// has any content outside quotes isn't a pattern at all, just a quoted
/// literal, so it's declined rather than matched.
fn scan_balanced_body<I: LexInput>(scanner: &mut Scanner, input: &mut I) -> bool {
    scanner.glob_paren_depth = 1;
    scanner.ext_in_double_quote = false;
    scanner.ext_saw_outside_quote = false;

    let result = loop {
        match input.lookahead() {
            None => break false,
            Some('"') => {
                scanner.ext_in_double_quote = !scanner.ext_in_double_quote;
                input.advance();
            }
            Some('(') => {
                input.advance();
                if !scanner.ext_in_double_quote {
                    scanner.glob_paren_depth += 1;
                    scanner.ext_saw_outside_quote = true;
                }
            }
            Some(')') => {
                input.advance();
                if scanner.ext_in_double_quote {
                    continue;
                }
                scanner.glob_paren_depth -= 1;
                if scanner.glob_paren_depth == 0 {
                    // The terminating close itself doesn't count as
                    // pattern content; only what came before it does.
                    break scanner.ext_saw_outside_quote;
                }
                scanner.ext_saw_outside_quote = true;
            }
            Some(_) => {
                if !scanner.ext_in_double_quote {
                    scanner.ext_saw_outside_quote = true;
                }
                input.advance();
            }
        }
    };

    scanner.glob_paren_depth = 0;
    scanner.ext_in_double_quote = false;
    scanner.ext_saw_outside_quote = false;
    result
}

fn is_bare_glob_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

fn peek_second<I: LexInput>(input: &mut I) -> Option<char> {
    if input.lookahead().is_none() {
        return None;
    }
    let mark = input.mark();
    input.advance();
    let second = input.lookahead();
    input.reset(mark);
    second
}

fn looks_like_esac<I: LexInput>(input: &mut I) -> bool {
    let mark = input.mark();
    let mut matched = 0;
    for expected in "esac".chars() {
        if input.lookahead() != Some(expected) {
            input.reset(mark);
            return false;
        }
        input.advance();
        matched += 1;
    }
    let boundary = matches!(input.lookahead(), None | Some(' ') | Some('\t') | Some('\n') | Some(';'));
    input.reset(mark);
    matched == 4 && boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::StrInput;

    #[test]
    fn matches_star_paren_group() {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new("*(foo|bar)");
        input.begin_token();
        assert_eq!(scan(&mut scanner, &mut input), Some(Terminal::ExtglobPattern));
        assert_eq!(input.marked_text(), "*(foo|bar)");
        assert_eq!(scanner.glob_paren_depth, 0);
    }

    #[test]
    fn quoted_parens_inside_a_pattern_are_literal() {
        // The `(` inside the quoted run isn't structural: if it were, the
        // body would be unbalanced (only one real closing paren follows)
        // and this would decline instead of matching.
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(r#"*(foo"("..bar)"#);
        input.begin_token();
        assert_eq!(scan(&mut scanner, &mut input), Some(Terminal::ExtglobPattern));
        assert_eq!(input.marked_text(), r#"*(foo"("..bar)"#);
    }

    #[test]
    fn fully_quoted_body_is_not_a_pattern() {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(r#"*("abc")"#);
        input.begin_token();
        assert_eq!(scan(&mut scanner, &mut input), None);
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn bare_glob_atom() {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new("*.txt)");
        input.begin_token();
        assert_eq!(scan(&mut scanner, &mut input), Some(Terminal::ExtglobPattern));
        assert_eq!(input.marked_text(), "*.txt");
    }

    #[test]
    fn esac_is_a_hard_boundary() {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new("esac");
        input.begin_token();
        assert_eq!(scan(&mut scanner, &mut input), None);
        assert_eq!(input.cursor(), 0);
    }
}
