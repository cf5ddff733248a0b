//! Scans the balanced-expression forms that appear on the right of
//! `[[ ... =~ ... ]]`.
//!
//! All three terminals (`REGEX`, `REGEX_NO_SLASH`, `REGEX_NO_SPACE`)
//! share the same balanced-paren/bracket/brace tracking and single-quote
//! literal handling; they differ only in what additionally stops them,
//! so one scan loop serves all three and the caller picks which
//! terminal, if any, is valid to try.

use crate::grammar::{Terminal, ValidSymbols};
use crate::lexer::LexInput;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stop {
    UnbalancedCloseOrSpace,
    AlsoSlash,
    AnySpace,
}

pub(super) fn scan<I: LexInput>(input: &mut I, valid: ValidSymbols) -> Option<Terminal> {
    for (terminal, stop) in [
        (Terminal::RegexNoSpace, Stop::AnySpace),
        (Terminal::RegexNoSlash, Stop::AlsoSlash),
        (Terminal::Regex, Stop::UnbalancedCloseOrSpace),
    ] {
        if !valid.contains(terminal) {
            continue;
        }
        if let Some(result) = try_scan_one(input, stop, terminal) {
            return Some(result);
        }
    }
    None
}

fn try_scan_one<I: LexInput>(input: &mut I, stop: Stop, terminal: Terminal) -> Option<Terminal> {
    let mark = input.mark();
    let mut depth: i32 = 0;
    let mut saw_non_trivial = false;
    let mut saw_any = false;

    loop {
        let Some(c) = input.lookahead() else { break };

        if c.is_whitespace() && depth == 0 {
            if stop == Stop::AnySpace {
                break;
            }
            if matches!(stop, Stop::UnbalancedCloseOrSpace | Stop::AlsoSlash) {
                break;
            }
        }

        match c {
            '(' | '[' | '{' => {
                depth += 1;
                input.advance();
                saw_any = true;
            }
            ')' | ']' | '}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                input.advance();
                saw_any = true;
            }
            '/' if depth == 0 && stop == Stop::AlsoSlash => break,
            '\'' => {
                input.advance();
                while let Some(c) = input.lookahead() {
                    input.advance();
                    if c == '\'' {
                        break;
                    }
                }
                saw_any = true;
                saw_non_trivial = true;
            }
            c => {
                if !is_bare_word_char(c) {
                    saw_non_trivial = true;
                }
                input.advance();
                saw_any = true;
            }
        }
    }

    if !saw_any || depth != 0 {
        input.reset(mark);
        return None;
    }

    if stop == Stop::AnySpace && !saw_non_trivial {
        input.reset(mark);
        return None;
    }

    input.mark_end();
    Some(terminal)
}

fn is_bare_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-'
}
