//! The `extern "C"` host contract, gated behind the `capi` feature.
//!
//! This is the shape a generalized-parser runtime actually loads: four
//! functions operating on an opaque pointer, following the same
//! create/destroy/serialize/deserialize/scan contract the safe
//! [`crate::scanner::Scanner`] API models directly. Everything unsafe
//! about this crate lives here; [`crate::scanner::Scanner`] itself never
//! needs `unsafe`.
//!
//! The lexer the host passes to `scan` is not this crate's
//! [`crate::lexer::LexInput`] — a real parser-generator host calls
//! across its own ABI for `lookahead`/`advance`/etc. Wiring that up is
//! the host binding's job, not this crate's; [`HostLexer`] is the
//! minimal shape a binding needs to implement to get a
//! [`crate::lexer::LexInput`] for free.

use std::os::raw::c_void;
use std::slice;

use crate::grammar::{Terminal, ValidSymbols};
use crate::lexer::LexInput;
use crate::scanner::Scanner;

/// The function pointers a host-side lexer struct must provide. Mirrors
/// tree-sitter's `TSLexer` shape closely enough that a binding can
/// populate one directly from the other.
#[repr(C)]
pub struct HostLexer {
    pub payload: *mut c_void,
    pub lookahead: unsafe extern "C" fn(*mut c_void) -> u32,
    pub advance: unsafe extern "C" fn(*mut c_void),
    pub skip: unsafe extern "C" fn(*mut c_void),
    pub mark_end: unsafe extern "C" fn(*mut c_void),
    pub get_column: unsafe extern "C" fn(*mut c_void) -> u32,
}

/// Adapts a [`HostLexer`] to [`LexInput`].
///
/// Backtracking (`mark`/`reset`) cannot be expressed across an ABI that
/// only ever moves forward, so this adapter buffers every character
/// (and the host column it was seen at) as it is consumed or skipped,
/// and replays that buffer instead of asking the host to rewind:
/// `reset` just moves `position` back into the buffer, and `lookahead`/
/// `advance`/`skip`/`column` read from the buffer rather than the host
/// while `position` is behind its end. A fresh adapter is built for
/// every [`scanner_scan`] call, so the buffer only ever needs to cover
/// the speculative peeks a single call's dispatcher chain makes, not
/// the whole source.
///
/// `mark_end` always forwards to the host, which can only mark its own
/// live cursor. That is correct as long as `mark_end` is only called
/// once `position` has caught back up to the end of the buffer — true
/// for every dispatcher handler, which either resets to an earlier
/// mark and returns `None` without committing, or advances forward
/// (through replayed buffer entries and then past them) to the point
/// it wants to commit and calls `mark_end` right there.
struct HostLexerAdapter<'a> {
    host: &'a HostLexer,
    /// One entry per character seen so far, in order: the character
    /// itself and the host column it was looked ahead at.
    consumed: Vec<(char, usize)>,
    /// Logical cursor into `consumed`. Equal to `consumed.len()` when
    /// in sync with the host's own (forward-only) cursor; less than it
    /// while replaying a stretch the host has already moved past.
    position: usize,
}

impl<'a> HostLexerAdapter<'a> {
    fn new(host: &'a HostLexer) -> Self {
        HostLexerAdapter {
            host,
            consumed: Vec::new(),
            position: 0,
        }
    }

    fn host_lookahead(&self) -> Option<char> {
        // tree-sitter's convention: lookahead returns 0 at EOF.
        let raw = unsafe { (self.host.lookahead)(self.host.payload) };
        if raw == 0 {
            None
        } else {
            char::from_u32(raw)
        }
    }

    fn host_column(&self) -> usize {
        unsafe { (self.host.get_column)(self.host.payload) as usize }
    }

    fn replaying(&self) -> bool {
        self.position < self.consumed.len()
    }
}

impl LexInput for HostLexerAdapter<'_> {
    type Mark = usize;

    fn lookahead(&self) -> Option<char> {
        if self.replaying() {
            Some(self.consumed[self.position].0)
        } else {
            self.host_lookahead()
        }
    }

    fn advance(&mut self) {
        if self.replaying() {
            self.position += 1;
            return;
        }
        let c = self.host_lookahead().expect("advance called at end of input");
        let column = self.host_column();
        unsafe { (self.host.advance)(self.host.payload) };
        self.consumed.push((c, column));
        self.position += 1;
    }

    fn skip(&mut self) {
        if self.replaying() {
            self.position += 1;
            return;
        }
        let c = self.host_lookahead().expect("skip called at end of input");
        let column = self.host_column();
        unsafe { (self.host.skip)(self.host.payload) };
        self.consumed.push((c, column));
        self.position += 1;
    }

    fn mark_end(&mut self) {
        debug_assert!(
            !self.replaying(),
            "mark_end called while the adapter is still behind the host's live cursor"
        );
        unsafe { (self.host.mark_end)(self.host.payload) };
    }

    fn column(&self) -> usize {
        if self.replaying() {
            self.consumed[self.position].1
        } else {
            self.host_column()
        }
    }

    fn mark(&self) -> usize {
        self.position
    }

    fn reset(&mut self, mark: usize) {
        self.position = mark;
    }
}

/// Allocates a new scanner instance, as the host contract's `create`.
///
/// # Safety
///
/// The returned pointer must later be passed to exactly one
/// [`scanner_destroy`] call and to no other deallocation.
#[no_mangle]
pub unsafe extern "C" fn scanner_create() -> *mut Scanner {
    Box::into_raw(Box::new(Scanner::new()))
}

/// Releases a scanner instance created by [`scanner_create`].
///
/// # Safety
///
/// `scanner` must be a pointer previously returned by
/// [`scanner_create`] and not already destroyed.
#[no_mangle]
pub unsafe extern "C" fn scanner_destroy(scanner: *mut Scanner) {
    if !scanner.is_null() {
        drop(unsafe { Box::from_raw(scanner) });
    }
}

/// Writes `scanner`'s state into `buffer` (of `buffer_len` bytes),
/// returning the number of bytes written, or `0` if it would not fit.
///
/// # Safety
///
/// `scanner` must be a live pointer from [`scanner_create`]; `buffer`
/// must point to at least `buffer_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn scanner_serialize(
    scanner: *const Scanner,
    buffer: *mut u8,
    buffer_len: u32,
) -> u32 {
    let scanner = unsafe { &*scanner };
    let buffer = unsafe { slice::from_raw_parts_mut(buffer, buffer_len as usize) };
    scanner.serialize(buffer) as u32
}

/// Replaces `scanner`'s state from `buffer` (of `length` bytes),
/// tolerating truncation by resetting, per the host contract.
///
/// # Safety
///
/// `scanner` must be a live pointer from [`scanner_create`]; `buffer`
/// must point to at least `length` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn scanner_deserialize(scanner: *mut Scanner, buffer: *const u8, length: u32) {
    let scanner = unsafe { &mut *scanner };
    let buffer = unsafe { slice::from_raw_parts(buffer, length as usize) };
    scanner.deserialize(buffer);
}

/// Advances `lexer` and decides on at most one terminal out of
/// `valid_symbols`, writing it to `result_symbol` and returning `true`
/// on success, as the host contract's `scan`.
///
/// `valid_symbols` and `result_symbol` use each terminal's position in
/// [`Terminal`]'s declaration order as its bit/ordinal, matching the
/// convention a generated parser table would use.
///
/// # Safety
///
/// `scanner` and `lexer` must be live, non-aliased pointers of the
/// expected types; `result_symbol` must point to a writable `u32`.
#[no_mangle]
pub unsafe extern "C" fn scanner_scan(
    scanner: *mut Scanner,
    lexer: *const HostLexer,
    valid_symbols: *const bool,
    valid_symbols_len: u32,
    result_symbol: *mut u32,
    in_error_recovery: bool,
) -> bool {
    let scanner = unsafe { &mut *scanner };
    let host = unsafe { &*lexer };
    let valid_flags = unsafe { slice::from_raw_parts(valid_symbols, valid_symbols_len as usize) };

    let mut valid = ValidSymbols::new();
    for (terminal, &is_valid) in terminal_ordinals().zip(valid_flags) {
        if is_valid {
            valid.insert(terminal);
        }
    }

    let mut adapter = HostLexerAdapter::new(host);
    match scanner.scan(&mut adapter, valid, in_error_recovery) {
        Some(terminal) => {
            unsafe { *result_symbol = terminal_ordinal(terminal) };
            true
        }
        None => false,
    }
}

fn terminal_ordinals() -> impl Iterator<Item = Terminal> {
    use strum::IntoEnumIterator;
    Terminal::iter()
}

fn terminal_ordinal(terminal: Terminal) -> u32 {
    use strum::IntoEnumIterator;
    Terminal::iter()
        .position(|t| t == terminal)
        .expect("terminal is a Terminal variant") as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal one-directional C-style source for exercising
    /// [`HostLexerAdapter`] without a real host binding.
    struct TestSource {
        chars: Vec<char>,
        cursor: usize,
        marked_at: usize,
    }

    unsafe extern "C" fn test_lookahead(payload: *mut c_void) -> u32 {
        let src = unsafe { &*(payload as *const TestSource) };
        src.chars.get(src.cursor).map_or(0, |&c| c as u32)
    }

    unsafe extern "C" fn test_advance(payload: *mut c_void) {
        let src = unsafe { &mut *(payload as *mut TestSource) };
        src.cursor += 1;
    }

    unsafe extern "C" fn test_skip(payload: *mut c_void) {
        let src = unsafe { &mut *(payload as *mut TestSource) };
        src.cursor += 1;
    }

    unsafe extern "C" fn test_mark_end(payload: *mut c_void) {
        let src = unsafe { &mut *(payload as *mut TestSource) };
        src.marked_at = src.cursor;
    }

    unsafe extern "C" fn test_get_column(payload: *mut c_void) -> u32 {
        let src = unsafe { &*(payload as *const TestSource) };
        src.cursor as u32 + 1
    }

    fn make_host(source: &mut TestSource) -> HostLexer {
        HostLexer {
            payload: source as *mut TestSource as *mut c_void,
            lookahead: test_lookahead,
            advance: test_advance,
            skip: test_skip,
            mark_end: test_mark_end,
            get_column: test_get_column,
        }
    }

    #[test]
    fn reset_replays_buffered_characters_instead_of_rewinding_the_host() {
        let mut source = TestSource {
            chars: "ab".chars().collect(),
            cursor: 0,
            marked_at: 0,
        };
        let host = make_host(&mut source);
        let mut adapter = HostLexerAdapter::new(&host);

        let mark = adapter.mark();
        assert_eq!(adapter.lookahead(), Some('a'));
        adapter.advance();
        assert_eq!(adapter.lookahead(), Some('b'));

        adapter.reset(mark);
        assert_eq!(adapter.lookahead(), Some('a'));
        adapter.advance();
        assert_eq!(adapter.lookahead(), Some('b'));
        adapter.advance();
        adapter.mark_end();

        // The host only ever saw two real advances, both times 'a' then
        // 'b' — the replayed pass after reset never called it again.
        assert_eq!(source.cursor, 2);
        assert_eq!(source.marked_at, 2);
    }

    #[test]
    fn reset_then_diverging_past_the_buffer_pulls_fresh_host_characters() {
        let mut source = TestSource {
            chars: "abc".chars().collect(),
            cursor: 0,
            marked_at: 0,
        };
        let host = make_host(&mut source);
        let mut adapter = HostLexerAdapter::new(&host);

        adapter.advance(); // 'a', real
        let mark = adapter.mark();
        adapter.advance(); // 'b', real, buffered
        adapter.reset(mark);
        assert_eq!(adapter.lookahead(), Some('b'));
        adapter.advance(); // replays the buffered 'b'
        assert_eq!(adapter.lookahead(), Some('c'));
        adapter.advance(); // now past the buffer: a fresh host call
        adapter.mark_end();

        assert_eq!(source.cursor, 3);
        assert_eq!(source.marked_at, 3);
    }
}
