//! The host capability surface the scanner scans against.
//!
//! A real host (the parser generator's runtime) owns the source buffer
//! and exposes it through this trait rather than handing the scanner a
//! `&str` directly, so that the same [`crate::scanner::Scanner`] can run
//! against an editor's rope, a memory-mapped file, or (as here, for
//! tests) a plain `&str`, without the scanner ever needing to know which.
//!
//! This mirrors the role of `yash_syntax::parser::lex::Lexer`'s
//! `peek_char`/`consume_char`/`index` primitives in the teacher crate,
//! but is synchronous: the scanner contract (spec §5) forbids blocking
//! on I/O, so unlike the teacher's `async fn peek_char`, lookahead here
//! must already be available in memory.
//!
//! Dispatcher handlers routinely need more than one character of
//! lookahead (e.g. "is the character after `$(` also `(`?"). Rather than
//! widen [`lookahead`](LexInput::lookahead) itself, a handler calls
//! [`advance`](LexInput::advance) speculatively and can undo it with
//! [`reset`](LexInput::reset) if the extra character didn't pan out —
//! the same discard-on-failure model a real GLR host uses when an
//! external scan call returns `false`: nothing advanced past the last
//! [`mark_end`](LexInput::mark_end) is considered committed.

/// One character of lookahead plus the cursor-advance operations a
/// scanner needs, as provided by the host.
pub trait LexInput {
    /// An opaque snapshot of the input's position, cheap to copy, used
    /// to backtrack after speculative lookahead.
    type Mark: Copy;

    /// Returns the next character without consuming it, or `None` at
    /// end of input.
    fn lookahead(&self) -> Option<char>;

    /// Advances past the current lookahead character, including it in
    /// the token currently being matched.
    ///
    /// # Panics
    ///
    /// May panic if called when [`lookahead`](Self::lookahead) is `None`.
    fn advance(&mut self);

    /// Advances past the current lookahead character without including
    /// it in the token currently being matched (used to skip
    /// insignificant whitespace before a token starts).
    ///
    /// # Panics
    ///
    /// May panic if called when [`lookahead`](Self::lookahead) is `None`.
    fn skip(&mut self);

    /// Marks the current position as the end of the token being
    /// matched. A handler may keep calling [`advance`](Self::advance)
    /// after this for further lookahead; only the position as of the
    /// *last* `mark_end` call becomes the emitted token's end.
    fn mark_end(&mut self);

    /// The 1-based column of the lookahead character.
    fn column(&self) -> usize;

    /// True if [`lookahead`](Self::lookahead) is `None`, i.e. there is no
    /// more input.
    fn eof(&self) -> bool {
        self.lookahead().is_none()
    }

    /// Snapshots the current position for later [`reset`](Self::reset).
    fn mark(&self) -> Self::Mark;

    /// Restores a position snapshotted by [`mark`](Self::mark), undoing
    /// any `advance`/`skip`/`mark_end` calls since then.
    fn reset(&mut self, mark: Self::Mark);
}

/// An opaque position snapshot for [`StrInput`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StrMark {
    cursor: usize,
    token_start: usize,
    line: usize,
    column: usize,
}

/// A [`LexInput`] over an in-memory `&str`, for tests and for embedders
/// that do not need incremental/rope-backed input.
#[derive(Clone, Debug)]
pub struct StrInput<'a> {
    source: &'a str,
    /// Byte offset of the lookahead character.
    cursor: usize,
    /// Byte offset of the start of the token currently being matched.
    token_start: usize,
    /// Byte offset most recently confirmed as a token boundary by
    /// `mark_end`.
    mark: usize,
    line: usize,
    column: usize,
}

impl<'a> StrInput<'a> {
    /// Creates an input positioned at the start of `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        StrInput {
            source,
            cursor: 0,
            token_start: 0,
            mark: 0,
            line: 1,
            column: 1,
        }
    }

    /// Byte offset of the lookahead character.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The 1-based line of the lookahead character.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The text of the token confirmed so far by `mark_end`, starting
    /// from where the handler began matching (the cursor position as of
    /// the last call that did not itself extend an in-progress token —
    /// in practice, the position when the dispatcher entered this
    /// handler).
    #[must_use]
    pub fn marked_text(&self) -> &'a str {
        &self.source[self.token_start..self.mark]
    }

    /// Declares that a new token starts at the current cursor, resetting
    /// the reference point used by [`marked_text`](Self::marked_text).
    pub fn begin_token(&mut self) {
        self.token_start = self.cursor;
        self.mark = self.cursor;
    }
}

impl LexInput for StrInput<'_> {
    type Mark = StrMark;

    fn lookahead(&self) -> Option<char> {
        self.source[self.cursor..].chars().next()
    }

    fn advance(&mut self) {
        let c = self.lookahead().expect("advance called at end of input");
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn skip(&mut self) {
        self.advance();
        self.token_start = self.cursor;
        self.mark = self.cursor;
    }

    fn mark_end(&mut self) {
        self.mark = self.cursor;
    }

    fn column(&self) -> usize {
        self.column
    }

    fn mark(&self) -> StrMark {
        StrMark {
            cursor: self.cursor,
            token_start: self.token_start,
            line: self.line,
            column: self.column,
        }
    }

    fn reset(&mut self, mark: StrMark) {
        self.cursor = mark.cursor;
        self.token_start = mark.token_start;
        self.line = mark.line;
        self.column = mark.column;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_and_advance() {
        let mut input = StrInput::new("ab");
        assert_eq!(input.lookahead(), Some('a'));
        input.advance();
        assert_eq!(input.lookahead(), Some('b'));
        input.advance();
        assert_eq!(input.lookahead(), None);
        assert!(input.eof());
    }

    #[test]
    fn mark_end_slices_matched_text() {
        let mut input = StrInput::new("foo bar");
        input.begin_token();
        input.advance();
        input.advance();
        input.advance();
        input.mark_end();
        assert_eq!(input.marked_text(), "foo");
    }

    #[test]
    fn skip_moves_token_start_with_cursor() {
        let mut input = StrInput::new("  x");
        input.skip();
        input.skip();
        input.advance();
        input.mark_end();
        assert_eq!(input.marked_text(), "x");
    }

    #[test]
    fn column_tracks_newlines() {
        let mut input = StrInput::new("ab\ncd");
        assert_eq!(input.column(), 1);
        input.advance();
        assert_eq!(input.column(), 2);
        input.advance();
        assert_eq!(input.column(), 3);
        input.advance(); // consumes '\n'
        assert_eq!(input.column(), 1);
        assert_eq!(input.line(), 2);
    }

    #[test]
    fn mark_and_reset_undo_speculative_lookahead() {
        let mut input = StrInput::new("((x");
        input.begin_token();
        input.advance(); // consume first '('
        let checkpoint = input.mark();
        assert_eq!(input.lookahead(), Some('('));
        input.advance(); // peek second '(' speculatively
        assert_eq!(input.lookahead(), Some('x'));
        input.reset(checkpoint);
        assert_eq!(input.lookahead(), Some('('));
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    #[should_panic(expected = "advance called at end of input")]
    fn advance_past_eof_panics() {
        let mut input = StrInput::new("");
        input.advance();
    }
}
