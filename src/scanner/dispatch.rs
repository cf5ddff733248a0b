//! The token dispatcher: a priority list of handlers, one per terminal
//! family, checked in the order the host contract requires.
//!
//! The list's order is not an optimization; it is the disambiguation
//! rule. A `(` after a bare dollar means something different from a
//! bare `(`, and whether `#` inside `${...}` is a length operator or a
//! prefix-removal operator depends only on which terminal the caller
//! currently considers valid and on state recorded by an earlier
//! handler in the same call. Each handler either commits to an emission
//! (advancing `input` and returning `Some`) or leaves `input` exactly as
//! it found it and returns `None`, so a declined handler can never leak
//! partial progress into the next one — mirroring the "no token; no
//! state change" outcome from the host contract.

use super::{LastEmitted, Scanner};
use crate::context::Context;
use crate::grammar::{Terminal, ValidSymbols};
use crate::heredoc::Heredoc;
use crate::lexer::LexInput;

use super::extglob;
use super::regex;

type Handler<I> =
    fn(&mut Scanner, &mut I, ValidSymbols, bool, LastEmitted) -> Option<Terminal>;

pub(super) fn dispatch<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    macro_rules! try_handlers {
        ($($handler:path),+ $(,)?) => {
            $(
                if let Some(terminal) = $handler(scanner, input, valid, in_error_recovery, last_emitted) {
                    return Some(terminal);
                }
            )+
        };
    }

    try_handlers!(
        newline,
        closing_brace_for_expansion,
        concat,
        bare_dollar,
        peek_bare_dollar,
        brace_start_for_parameter,
        opening_parens_or_extglob_flags,
        opening_brackets,
        closing_brackets,
        closing_parens,
        pattern_start_tokens,
        hash_pattern_tokens,
        array_operator_tokens,
        empty_value,
        heredoc_family,
        test_operator,
        simple_variable_name,
        special_variable_name,
        variable_file_descriptor_heredoc_arrow,
        regex_family,
        extglob_pattern,
        expansion_word,
        brace_range_start,
    );
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_glob_flag_char(c: char) -> bool {
    "iqbmnsBINUXcelfaCo".contains(c) || c.is_ascii_digit() || c == '.'
}

/// Whitespace that separates words, not counting the newline (which is
/// its own terminal).
fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn skip_inline_space<I: LexInput>(input: &mut I) {
    while matches!(input.lookahead(), Some(c) if is_inline_space(c)) {
        input.skip();
    }
}

/// Reads the character just past the current lookahead without
/// consuming either one.
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

fn is_separator<I: LexInput>(
    scanner: &Scanner,
    c: Option<char>,
    last_emitted: LastEmitted,
) -> bool {
    let Some(c) = c else { return true };
    if matches!(c, ' ' | '\t' | '\n' | '<' | '>' | ';' | '&' | '|') {
        return true;
    }
    match c {
        '}' if scanner.context_stack.in_parameter_expansion() => return true,
        ')' if matches!(scanner.context_stack.top(), Context::Command | Context::Arithmetic) => {
            return true
        }
        ']' if matches!(scanner.context_stack.top(), Context::Test | Context::Arithmetic) => {
            return true
        }
        _ => {}
    }
    if c == '[' && last_emitted != LastEmitted::VariableName {
        return true;
    }
    false
}

fn newline<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::Newline) || input.lookahead() != Some('\n') {
        return None;
    }
    while input.lookahead() == Some('\n') {
        input.advance();
    }
    input.mark_end();
    Some(Terminal::Newline)
}

fn closing_brace_for_expansion<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::ClosingBrace) || input.lookahead() != Some('}') {
        return None;
    }
    if !scanner.context_stack.in_parameter_expansion() {
        return None;
    }
    input.advance();
    input.mark_end();
    let top = scanner.context_stack.top();
    scanner.context_stack.pop_expected(top);
    Some(Terminal::ClosingBrace)
}

/// Looks past a backtick-quoted token starting at the current lookahead
/// (which must be `` ` ``) for its matching closing backtick, and
/// reports whether the character right after that close is whitespace
/// or EOF. Peeks only — `input` is left exactly where it started.
fn backtick_followed_by_whitespace<I: LexInput>(input: &mut I) -> bool {
    let mark = input.mark();
    input.advance(); // opening backtick
    let closed = loop {
        match input.lookahead() {
            None => break false,
            Some('`') => {
                input.advance();
                break true;
            }
            Some('\\') => {
                input.advance();
                if input.lookahead().is_some() {
                    input.advance();
                }
            }
            Some(_) => input.advance(),
        }
    };
    let followed_by_whitespace = closed && matches!(input.lookahead(), None | Some(' ') | Some('\t') | Some('\n'));
    input.reset(mark);
    followed_by_whitespace
}

fn concat<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::Concat) {
        return None;
    }
    let next = input.lookahead();
    if next == Some('\\') {
        // A backslash followed by a quote or another backslash still
        // glues the surrounding word together.
        if matches!(peek_second(input), Some('"') | Some('\'') | Some('\\')) {
            return Some(Terminal::Concat);
        }
        return None;
    }
    if next == Some('`') {
        // A trailing backtick token adjacent to a word only glues it to
        // what follows if the closing backtick is itself followed by
        // whitespace.
        return if backtick_followed_by_whitespace(input) {
            Some(Terminal::Concat)
        } else {
            None
        };
    }
    if is_separator::<I>(scanner, next, last_emitted) {
        return None;
    }
    Some(Terminal::Concat)
}

/// A bare (unbraced, unparenthesized) `$`. Emits [`Terminal::RawDollar`]
/// if nothing an expansion could start on follows (whitespace or EOF —
/// a `"` is left for the double-quoted-string path), [`Terminal::BareDollar`]
/// otherwise.
fn bare_dollar<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::BareDollar) && !valid.contains(Terminal::RawDollar) {
        return None;
    }
    let mark = input.mark();
    skip_inline_space(input);
    if input.lookahead() != Some('$') {
        input.reset(mark);
        return None;
    }
    let second = peek_second(input);
    if second == Some('"') {
        // Let the (out-of-scope) double-quoted-string path consume this
        // `$` instead.
        input.reset(mark);
        return None;
    }
    // Nothing follows that an expansion could start on: this `$` is a
    // literal character in the word, not the beginning of one.
    if matches!(second, None | Some(' ') | Some('\t') | Some('\n')) {
        if !valid.contains(Terminal::RawDollar) {
            input.reset(mark);
            return None;
        }
        input.advance();
        input.mark_end();
        return Some(Terminal::RawDollar);
    }
    if !valid.contains(Terminal::BareDollar) {
        input.reset(mark);
        return None;
    }
    input.advance();
    input.mark_end();
    scanner.last_emitted = LastEmitted::BareDollar;
    Some(Terminal::BareDollar)
}

fn peek_bare_dollar<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::PeekBareDollar) || input.lookahead() != Some('$') {
        return None;
    }
    Some(Terminal::PeekBareDollar)
}

fn brace_start_for_parameter<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    if in_error_recovery
        || !valid.contains(Terminal::BraceStart)
        || last_emitted != LastEmitted::BareDollar
        || input.lookahead() != Some('{')
    {
        return None;
    }
    input.advance();
    input.mark_end();
    scanner.context_stack.push(Context::Parameter);
    Some(Terminal::BraceStart)
}

fn opening_parens_or_extglob_flags<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    let outer_mark = input.mark();
    skip_inline_space(input);
    if input.lookahead() != Some('(') {
        input.reset(outer_mark);
        return None;
    }

    let second = peek_second(input);

    if !in_error_recovery
        && last_emitted == LastEmitted::BareDollar
        && second == Some('(')
        && valid.contains(Terminal::DoubleOpeningParen)
    {
        input.advance();
        input.advance();
        input.mark_end();
        scanner.context_stack.push(Context::Arithmetic);
        return Some(Terminal::DoubleOpeningParen);
    }

    if !in_error_recovery && last_emitted == LastEmitted::BareDollar && valid.contains(Terminal::OpeningParen) {
        input.advance();
        input.mark_end();
        scanner.context_stack.push(Context::Command);
        return Some(Terminal::OpeningParen);
    }

    if !in_error_recovery && second == Some('#') && valid.contains(Terminal::ZshExtendedGlobFlags) {
        input.advance(); // '('
        input.advance(); // '#'
        while matches!(input.lookahead(), Some(c) if is_glob_flag_char(c)) {
            input.advance();
        }
        if input.lookahead() == Some(')') {
            input.advance();
            input.mark_end();
            return Some(Terminal::ZshExtendedGlobFlags);
        }
        input.reset(outer_mark);
        return None;
    }

    if valid.contains(Terminal::OpeningParen) {
        input.advance();
        input.mark_end();
        // A bare `((` with no preceding `$` is zsh's legacy arithmetic
        // command form; the second `(` arrives as its own OpeningParen
        // on the next call, so the context is pushed here and must not
        // be pushed again then.
        if !in_error_recovery && input.lookahead() == Some('(') {
            scanner.context_stack.push(Context::Arithmetic);
        }
        return Some(Terminal::OpeningParen);
    }

    input.reset(outer_mark);
    None
}

fn opening_brackets<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    let outer_mark = input.mark();
    skip_inline_space(input);
    if input.lookahead() != Some('[') {
        input.reset(outer_mark);
        return None;
    }

    if !in_error_recovery && peek_second(input) == Some('[') && valid.contains(Terminal::TestCommandStart) {
        input.advance();
        input.advance();
        input.mark_end();
        scanner.context_stack.push(Context::Test);
        return Some(Terminal::TestCommandStart);
    }

    if !in_error_recovery && last_emitted == LastEmitted::BareDollar && valid.contains(Terminal::OpeningBracket) {
        input.advance();
        input.mark_end();
        scanner.context_stack.push(Context::Arithmetic);
        return Some(Terminal::OpeningBracket);
    }

    if valid.contains(Terminal::OpeningBracket) {
        input.advance();
        input.mark_end();
        return Some(Terminal::OpeningBracket);
    }

    input.reset(outer_mark);
    None
}

fn closing_brackets<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if input.lookahead() != Some(']') {
        return None;
    }

    if peek_second(input) == Some(']')
        && valid.contains(Terminal::TestCommandEnd)
        && scanner.context_stack.top() == Context::Test
    {
        input.advance();
        input.advance();
        input.mark_end();
        scanner.context_stack.pop_expected(Context::Test);
        return Some(Terminal::TestCommandEnd);
    }

    if valid.contains(Terminal::ClosingBracket) {
        input.advance();
        input.mark_end();
        if scanner.context_stack.top() == Context::Arithmetic {
            scanner.context_stack.pop_expected(Context::Arithmetic);
        }
        return Some(Terminal::ClosingBracket);
    }

    None
}

fn closing_parens<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if input.lookahead() != Some(')') {
        return None;
    }

    if peek_second(input) == Some(')')
        && valid.contains(Terminal::DoubleClosingParen)
        && scanner.context_stack.top() == Context::Arithmetic
    {
        input.advance();
        input.advance();
        input.mark_end();
        scanner.context_stack.pop_expected(Context::Arithmetic);
        return Some(Terminal::DoubleClosingParen);
    }

    if valid.contains(Terminal::ClosingParen) {
        input.advance();
        input.mark_end();
        if matches!(
            scanner.context_stack.top(),
            Context::Arithmetic | Context::Command
        ) {
            let top = scanner.context_stack.top();
            scanner.context_stack.pop_expected(top);
        }
        return Some(Terminal::ClosingParen);
    }

    None
}

fn pattern_start_tokens<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if scanner.context_stack.top() != Context::Parameter {
        return None;
    }
    let Some(c) = input.lookahead() else { return None };
    if c == '}' {
        return None;
    }

    if c == '/' && valid.contains(Terminal::PatternStart) {
        input.advance();
        if input.lookahead() == Some('/') {
            input.advance();
        }
        input.mark_end();
        scanner.context_stack.retag_top(Context::ParamPatternSubstitute);
        return Some(Terminal::PatternStart);
    }

    if matches!(c, '%' | '#') && valid.contains(Terminal::PatternSuffixStart) {
        input.advance();
        if input.lookahead() == Some(c) {
            input.advance();
        }
        input.mark_end();
        scanner.context_stack.retag_top(Context::ParamPatternSuffix);
        return Some(Terminal::PatternSuffixStart);
    }

    None
}

/// `#`/`##` inside `${...}` is either the length operator (right after
/// `${`, before any variable name) or the prefix/longest-prefix removal
/// operator (right after the variable name) — the same two characters,
/// disambiguated purely by whether a variable name has already been
/// consumed this expansion. Only the latter case pushes
/// [`Context::ParamPatternSuffix`].
fn hash_pattern_tokens<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    last_emitted: LastEmitted,
) -> Option<Terminal> {
    if scanner.context_stack.top() != Context::Parameter || input.lookahead() != Some('#') {
        return None;
    }
    let second = peek_second(input);
    let after_variable_name = last_emitted == LastEmitted::VariableName;

    if second == Some('#') {
        // Need third character to disambiguate `##}` from `##pattern`.
        let mark = input.mark();
        input.advance();
        let third = input.lookahead();
        input.reset(mark);

        if third == Some('}') && valid.contains(Terminal::ImmediateDoubleHash) {
            input.advance();
            input.advance();
            input.mark_end();
            return Some(Terminal::ImmediateDoubleHash);
        }
        if valid.contains(Terminal::DoubleHashPattern) {
            input.advance();
            input.advance();
            input.mark_end();
            if after_variable_name {
                scanner.context_stack.retag_top(Context::ParamPatternSuffix);
            }
            return Some(Terminal::DoubleHashPattern);
        }
        return None;
    }

    if valid.contains(Terminal::HashPattern) {
        input.advance();
        input.mark_end();
        if after_variable_name {
            scanner.context_stack.retag_top(Context::ParamPatternSuffix);
        }
        return Some(Terminal::HashPattern);
    }

    None
}

fn array_operator_tokens<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    let regex_valid = valid.contains(Terminal::Regex)
        || valid.contains(Terminal::RegexNoSlash)
        || valid.contains(Terminal::RegexNoSpace);
    if regex_valid {
        return None;
    }

    match input.lookahead() {
        Some('*') if valid.contains(Terminal::ArrayStarToken) => {
            input.advance();
            input.mark_end();
            Some(Terminal::ArrayStarToken)
        }
        Some('@') if valid.contains(Terminal::ArrayAtToken) => {
            input.advance();
            input.mark_end();
            Some(Terminal::ArrayAtToken)
        }
        _ => None,
    }
}

fn empty_value<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::EmptyValue) {
        return None;
    }
    match input.lookahead() {
        None => Some(Terminal::EmptyValue),
        Some(c) if matches!(c, ' ' | '\t' | '\n' | ';' | '&') => Some(Terminal::EmptyValue),
        _ => None,
    }
}

fn heredoc_family<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if valid.contains(Terminal::HeredocStart) && scanner.heredocs.has_pending() {
        return scan_heredoc_start(scanner, input);
    }

    if !scanner.heredocs.has_pending() {
        return None;
    }

    let is_raw = scanner.heredocs.front().expect("just checked").is_raw;
    let allows_indent = scanner.heredocs.front().expect("just checked").allows_indent;

    if (valid.contains(Terminal::HeredocBodyBeginning) || valid.contains(Terminal::SimpleHeredocBody))
        && !scanner.heredocs.front().expect("just checked").started
    {
        return scan_heredoc_body_beginning(scanner, input, valid, is_raw);
    }

    if valid.contains(Terminal::HeredocEnd) {
        if let Some(terminal) = try_scan_heredoc_end(scanner, input) {
            return Some(terminal);
        }
    }

    if in_error_recovery {
        return None;
    }

    if valid.contains(Terminal::HeredocContent) {
        return scan_heredoc_content(scanner, input, is_raw, allows_indent);
    }

    None
}

fn scan_heredoc_start<I: LexInput>(scanner: &mut Scanner, input: &mut I) -> Option<Terminal> {
    let mark = input.mark();
    skip_inline_space(input);

    let mut is_raw = false;
    let mut delimiter = Vec::new();

    loop {
        match input.lookahead() {
            None => break,
            Some('\n') | Some(' ') | Some('\t') => break,
            Some('\\') => {
                is_raw = true;
                input.advance();
                if let Some(c) = input.lookahead() {
                    delimiter.extend(c.to_string().into_bytes());
                    input.advance();
                }
            }
            Some(q @ ('\'' | '"')) => {
                is_raw = is_raw || q == '\'';
                input.advance();
                while let Some(c) = input.lookahead() {
                    if c == q {
                        input.advance();
                        break;
                    }
                    delimiter.extend(c.to_string().into_bytes());
                    input.advance();
                }
            }
            Some(c) => {
                delimiter.extend(c.to_string().into_bytes());
                input.advance();
            }
        }
    }

    if delimiter.is_empty() {
        input.reset(mark);
        return None;
    }

    input.mark_end();
    let Some(heredoc) = scanner.heredocs.back_mut() else {
        input.reset(mark);
        return None;
    };
    heredoc.is_raw = is_raw;
    heredoc.delimiter = delimiter;
    Some(Terminal::HeredocStart)
}

fn scan_heredoc_body_beginning<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    is_raw: bool,
) -> Option<Terminal> {
    let mark = input.mark();
    let mut saw_any = false;

    loop {
        match input.lookahead() {
            None | Some('\n') => break,
            Some('$') if !is_raw => break,
            Some(_) => {
                input.advance();
                saw_any = true;
            }
        }
    }

    if !saw_any {
        input.reset(mark);
        if input.eof() || input.lookahead() == Some('\n') {
            // An empty first line: still "begins" the body, just with no
            // text of its own.
            let heredoc = scanner.heredocs.front_mut().expect("checked by caller");
            heredoc.started = true;
            if valid.contains(Terminal::SimpleHeredocBody) && is_raw {
                return Some(Terminal::SimpleHeredocBody);
            }
            return Some(Terminal::HeredocBodyBeginning);
        }
        return None;
    }

    input.mark_end();
    let heredoc = scanner.heredocs.front_mut().expect("checked by caller");
    heredoc.started = true;

    if is_raw && valid.contains(Terminal::SimpleHeredocBody) {
        return Some(Terminal::SimpleHeredocBody);
    }
    Some(Terminal::HeredocBodyBeginning)
}

fn try_scan_heredoc_end<I: LexInput>(scanner: &mut Scanner, input: &mut I) -> Option<Terminal> {
    let mark = input.mark();
    let mut line = String::new();
    loop {
        match input.lookahead() {
            None | Some('\n') => break,
            Some(c) => {
                line.push(c);
                input.advance();
            }
        }
    }

    let closes = scanner
        .heredocs
        .front()
        .expect("caller checked pending")
        .line_closes_body(line.as_bytes());

    if closes {
        if input.lookahead() == Some('\n') {
            input.advance();
        }
        input.mark_end();
        scanner.heredocs.pop_front();
        return Some(Terminal::HeredocEnd);
    }

    input.reset(mark);
    None
}

fn scan_heredoc_content<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    is_raw: bool,
    allows_indent: bool,
) -> Option<Terminal> {
    let mark = input.mark();
    let mut made_progress = false;

    if allows_indent {
        while input.lookahead() == Some('\t') {
            input.advance();
            made_progress = true;
        }
    }

    loop {
        match input.lookahead() {
            None => {
                if made_progress {
                    input.mark_end();
                    scanner.heredocs.pop_front();
                    return Some(Terminal::HeredocEnd);
                }
                input.reset(mark);
                return None;
            }
            Some('\n') => {
                input.advance();
                made_progress = true;
                // A new line starts: if it closes the body, stop here
                // and let the next call emit HEREDOC_END.
                break;
            }
            Some('$') if !is_raw && made_progress => break,
            Some(_) => {
                input.advance();
                made_progress = true;
            }
        }
    }

    if !made_progress {
        input.reset(mark);
        return None;
    }
    input.mark_end();
    Some(Terminal::HeredocContent)
}

fn test_operator<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::TestOperator) || input.lookahead() != Some('-') {
        return None;
    }
    let mark = input.mark();
    input.advance();
    let mut saw_letter = false;
    while matches!(input.lookahead(), Some(c) if c.is_ascii_alphabetic()) {
        input.advance();
        saw_letter = true;
    }
    if !saw_letter {
        input.reset(mark);
        return None;
    }
    let followed_by_space = matches!(input.lookahead(), None | Some(' ') | Some('\t') | Some('\n'));
    let followed_by_brace = input.lookahead() == Some('}');

    if followed_by_brace && scanner.context_stack.in_parameter_expansion() && valid.contains(Terminal::ExpansionWord) {
        input.reset(mark);
        return None;
    }

    if !followed_by_space {
        input.reset(mark);
        return None;
    }
    input.mark_end();
    Some(Terminal::TestOperator)
}

fn simple_variable_name<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::SimpleVariableName) {
        return None;
    }
    let Some(c) = input.lookahead() else { return None };
    if !is_ident_start(c) {
        return None;
    }
    while matches!(input.lookahead(), Some(c) if is_ident_continue(c)) {
        input.advance();
    }
    input.mark_end();
    Some(Terminal::SimpleVariableName)
}

fn special_variable_name<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::SpecialVariableName) {
        return None;
    }
    let Some(c) = input.lookahead() else { return None };
    if !matches!(c, '*' | '@' | '?' | '!' | '#' | '-' | '$' | '_') && !c.is_ascii_digit() {
        return None;
    }
    if matches!(c, '#' | '!') && scanner.context_stack.in_parameter_expansion() {
        return None;
    }
    input.advance();
    input.mark_end();
    Some(Terminal::SpecialVariableName)
}

fn variable_file_descriptor_heredoc_arrow<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    let outer_mark = input.mark();
    skip_inline_space(input);

    if !in_error_recovery && input.lookahead() == Some('<') && peek_second(input) == Some('<') {
        input.advance();
        input.advance();
        let allows_indent = input.lookahead() == Some('-');
        if allows_indent {
            input.advance();
        }
        let terminal = if allows_indent {
            Terminal::HeredocArrowDash
        } else {
            Terminal::HeredocArrow
        };
        if !valid.contains(terminal) {
            input.reset(outer_mark);
            return None;
        }
        input.mark_end();
        scanner.heredocs.push_pending(Heredoc::new(allows_indent));
        return Some(terminal);
    }

    let Some(first) = input.lookahead() else {
        input.reset(outer_mark);
        return None;
    };

    if is_ident_start(first) {
        if !valid.contains(Terminal::VariableName) {
            input.reset(outer_mark);
            return None;
        }
        while matches!(input.lookahead(), Some(c) if is_ident_continue(c)) {
            input.advance();
        }
        input.mark_end();
        scanner.last_emitted = LastEmitted::VariableName;
        return Some(Terminal::VariableName);
    } else if first.is_ascii_digit() {
        let word_mark = input.mark();
        while matches!(input.lookahead(), Some(c) if c.is_ascii_digit()) {
            input.advance();
        }
        if matches!(input.lookahead(), Some('<') | Some('>')) && valid.contains(Terminal::FileDescriptor) {
            input.mark_end();
            return Some(Terminal::FileDescriptor);
        }
        if valid.contains(Terminal::VariableName) {
            input.mark_end();
            scanner.last_emitted = LastEmitted::VariableName;
            return Some(Terminal::VariableName);
        }
        input.reset(word_mark);
    }

    input.reset(outer_mark);
    None
}

fn regex_family<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if in_error_recovery || !scanner.context_stack.in_test() {
        return None;
    }
    regex::scan(input, valid)
}

fn extglob_pattern<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if in_error_recovery || !valid.contains(Terminal::ExtglobPattern) {
        return None;
    }
    if scanner.context_stack.in_parameter_expansion() {
        return None;
    }
    extglob::scan(scanner, input)
}

fn expansion_word<I: LexInput>(
    scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if in_error_recovery || !valid.contains(Terminal::ExpansionWord) {
        return None;
    }
    if !scanner.context_stack.in_parameter_expansion() {
        return None;
    }
    let break_on_slash = scanner.context_stack.should_break_on_slash();
    let mark = input.mark();
    let mut saw_any = false;

    loop {
        match input.lookahead() {
            None | Some('}') => break,
            Some('"') => break,
            Some('/') if break_on_slash => break,
            Some('#') | Some('%') | Some(':') | Some(']') if !saw_any => break,
            Some('$') => {
                let starts_expansion = matches!(
                    peek_second(input),
                    Some('{') | Some('(') | Some('\'')
                ) || matches!(peek_second(input), Some(c) if c.is_ascii_alphanumeric());
                if starts_expansion {
                    break;
                }
                input.advance();
                saw_any = true;
            }
            Some(_) => {
                input.advance();
                saw_any = true;
            }
        }
    }

    if !saw_any {
        input.reset(mark);
        return None;
    }
    input.mark_end();
    Some(Terminal::ExpansionWord)
}

fn brace_range_start<I: LexInput>(
    _scanner: &mut Scanner,
    input: &mut I,
    valid: ValidSymbols,
    _in_error_recovery: bool,
    _last_emitted: LastEmitted,
) -> Option<Terminal> {
    if !valid.contains(Terminal::BraceStart) || input.lookahead() != Some('{') {
        return None;
    }
    let mark = input.mark();
    input.advance();
    let mut saw_first_digits = false;
    while matches!(input.lookahead(), Some(c) if c.is_ascii_digit()) {
        input.advance();
        saw_first_digits = true;
    }
    let looks_like_range = saw_first_digits
        && input.lookahead() == Some('.')
        && peek_second(input) == Some('.');

    input.reset(mark);
    if !looks_like_range {
        return None;
    }
    input.advance();
    input.mark_end();
    Some(Terminal::BraceStart)
}
