//! The external scanner: a context-sensitive, serializable lexer.
//!
//! [`Scanner`] is the only mutable entity in this crate (spec §3). One
//! [`Scanner::scan`] call reads as many characters as it needs to decide
//! on (at most) one [`Terminal`], possibly pushing or popping lexical
//! contexts or heredoc records, and returns that terminal or `None`. The
//! dispatcher that decides which terminal, if any, applies lives in
//! [`dispatch`]; this module owns the state those handlers mutate plus
//! the serialization contract (spec §4.4).

mod dispatch;
mod extglob;
mod regex;

use crate::context::{Context, ContextStack};
use crate::error::DeserializeError;
use crate::grammar::{Terminal, ValidSymbols};
use crate::heredoc::{Heredoc, HeredocQueue};
use crate::lexer::LexInput;

/// Which class of terminal was emitted last, consumed by the next
/// `scan` call.
///
/// The distilled spec tracks this as two independent booleans,
/// `just_returned_variable_name` and `just_returned_bare_dollar` (they
/// happen to be mutually exclusive in practice, since a single call
/// emits at most one terminal). Modeling it as one tagged value instead
/// of two bits is the re-architecture suggested by spec §9: "a small
/// tagged value capturing 'last-emitted class'". [`Scanner::serialize`]
/// still writes the two original bytes, so the wire format is unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum LastEmitted {
    #[default]
    Other,
    VariableName,
    BareDollar,
}

/// The external scanner's full state.
///
/// Serializable via [`Scanner::serialize`]/[`Scanner::deserialize`] so a
/// host can snapshot it at any token boundary and restore it later for
/// incremental reparse.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Scanner {
    pub(crate) glob_paren_depth: u8,
    pub(crate) ext_in_double_quote: bool,
    pub(crate) ext_saw_outside_quote: bool,
    pub(crate) context_stack: ContextStack,
    pub(crate) last_emitted: LastEmitted,
    pub(crate) heredocs: HeredocQueue,
}

impl Scanner {
    /// Allocates a zero-initialized scanner with empty stacks, as the
    /// host contract's `create` (spec §6).
    #[must_use]
    pub fn new() -> Self {
        Scanner::default()
    }

    /// The active lexical context, or [`Context::None`] at top level.
    #[must_use]
    pub fn context(&self) -> Context {
        self.context_stack.top()
    }

    /// The context stack, for introspection and tests.
    #[must_use]
    pub fn context_stack(&self) -> &ContextStack {
        &self.context_stack
    }

    /// The pending heredoc queue, for introspection and tests.
    #[must_use]
    pub fn heredocs(&self) -> &HeredocQueue {
        &self.heredocs
    }

    /// Advances `input` and decides on at most one terminal from
    /// `valid`, per the priority list in spec §4.2.
    ///
    /// Returns `Some(terminal)` if a token was matched — the scanner's
    /// state (including `input`'s position) has advanced accordingly.
    /// Returns `None` if nothing matched: per the host contract, the
    /// caller must treat the scanner and `input` as unchanged, and
    /// `in_error_recovery` having been consulted is the only state this
    /// call may have read (this crate never mutates on a declined scan,
    /// matching spec §9's "no token; no state change" result shape).
    pub fn scan<I: LexInput>(
        &mut self,
        input: &mut I,
        valid: ValidSymbols,
        in_error_recovery: bool,
    ) -> Option<Terminal> {
        // Step 1: capture and clear the one-token history flags for
        // this call (spec §4.2 item 1).
        let last_emitted = std::mem::take(&mut self.last_emitted);
        dispatch::dispatch(self, input, valid, in_error_recovery, last_emitted)
    }

    /// Writes this scanner's state to `buffer`, per spec §4.4.
    ///
    /// Returns the number of bytes written, or `0` if `buffer` is too
    /// small to hold the whole snapshot — the host contract's
    /// `serialize` (spec §6) treats `0` as "would not fit".
    #[must_use]
    pub fn serialize(&self, buffer: &mut [u8]) -> usize {
        let mut out = Vec::new();
        out.push(self.glob_paren_depth);
        out.push(self.ext_in_double_quote as u8);
        out.push(self.ext_saw_outside_quote as u8);
        out.push(self.context_stack.len() as u8);
        out.push(self.heredocs.len() as u8);
        out.push((self.last_emitted == LastEmitted::VariableName) as u8);
        out.push((self.last_emitted == LastEmitted::BareDollar) as u8);
        for context in self.context_stack.iter_innermost_first() {
            out.push(context_tag(context));
        }
        for heredoc in self.heredocs.iter() {
            out.push(heredoc.is_raw as u8);
            out.push(heredoc.started as u8);
            out.push(heredoc.allows_indent as u8);
            out.extend_from_slice(&(heredoc.delimiter.len() as u32).to_le_bytes());
            out.extend_from_slice(&heredoc.delimiter);
        }

        if out.len() > buffer.len() {
            return 0;
        }
        buffer[..out.len()].copy_from_slice(&out);
        out.len()
    }

    /// Replaces this scanner's state from `buffer`, per spec §4.4.
    ///
    /// Tolerates truncation by resetting to a fresh scanner: this is the
    /// host-facing entry point and, per the host contract, never fails.
    /// Use [`Scanner::try_deserialize`] to distinguish a clean reset from
    /// a genuinely malformed buffer.
    pub fn deserialize(&mut self, buffer: &[u8]) {
        match Scanner::try_deserialize(buffer) {
            Ok(scanner) => *self = scanner,
            Err(_) => *self = Scanner::new(),
        }
    }

    /// Like [`Scanner::deserialize`], but reports why a malformed buffer
    /// could not be parsed instead of silently resetting.
    ///
    /// A zero-length buffer always yields a fresh scanner successfully,
    /// per spec §4.4 ("A zero-length buffer always yields a fresh
    /// scanner").
    pub fn try_deserialize(buffer: &[u8]) -> Result<Scanner, DeserializeError> {
        if buffer.is_empty() {
            return Ok(Scanner::new());
        }
        if buffer.len() < 7 {
            return Err(DeserializeError::HeaderTruncated { len: buffer.len() });
        }

        let glob_paren_depth = buffer[0];
        let ext_in_double_quote = read_bool(buffer[1])?;
        let ext_saw_outside_quote = read_bool(buffer[2])?;
        let context_count = buffer[3] as usize;
        let heredoc_count = buffer[4] as usize;
        let just_returned_variable_name = read_bool(buffer[5])?;
        let just_returned_bare_dollar = read_bool(buffer[6])?;

        let mut cursor = 7usize;

        if buffer.len() - cursor < context_count {
            return Err(DeserializeError::ContextStackTruncated {
                declared: context_count,
                available: buffer.len() - cursor,
            });
        }
        let mut contexts = Vec::with_capacity(context_count);
        for _ in 0..context_count {
            let tag = buffer[cursor];
            cursor += 1;
            contexts.push(context_from_tag(tag)?);
        }
        // Bytes were written innermost-first; rebuild the stack so the
        // same order comes back out (outermost pushed first).
        contexts.reverse();
        let context_stack: ContextStack = contexts.into_iter().collect();

        let mut heredocs = HeredocQueue::new();
        for _ in 0..heredoc_count {
            if buffer.len() - cursor < 3 + 4 {
                return Err(DeserializeError::HeredocQueueTruncated);
            }
            let is_raw = read_bool(buffer[cursor])?;
            let started = read_bool(buffer[cursor + 1])?;
            let allows_indent = read_bool(buffer[cursor + 2])?;
            cursor += 3;
            let len_bytes: [u8; 4] = buffer[cursor..cursor + 4]
                .try_into()
                .expect("slice of length 4");
            let delimiter_len = u32::from_le_bytes(len_bytes) as usize;
            cursor += 4;
            if buffer.len() - cursor < delimiter_len {
                return Err(DeserializeError::HeredocDelimiterTruncated {
                    declared: delimiter_len,
                    available: buffer.len() - cursor,
                });
            }
            let delimiter = buffer[cursor..cursor + delimiter_len].to_vec();
            cursor += delimiter_len;
            heredocs.push_pending(Heredoc {
                is_raw,
                started,
                allows_indent,
                delimiter,
            });
        }

        let last_emitted = match (just_returned_variable_name, just_returned_bare_dollar) {
            (true, _) => LastEmitted::VariableName,
            (false, true) => LastEmitted::BareDollar,
            (false, false) => LastEmitted::Other,
        };

        Ok(Scanner {
            glob_paren_depth,
            ext_in_double_quote,
            ext_saw_outside_quote,
            context_stack,
            last_emitted,
            heredocs,
        })
    }
}

fn read_bool(byte: u8) -> Result<bool, DeserializeError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        found => Err(DeserializeError::InvalidBoolean { found }),
    }
}

fn context_tag(context: Context) -> u8 {
    match context {
        Context::None => 0,
        Context::Parameter => 1,
        Context::Arithmetic => 2,
        Context::Command => 3,
        Context::Test => 4,
        Context::BraceExpansion => 5,
        Context::ParamPatternSuffix => 6,
        Context::ParamPatternSubstitute => 7,
    }
}

fn context_from_tag(tag: u8) -> Result<Context, DeserializeError> {
    match tag {
        0 => Ok(Context::None),
        1 => Ok(Context::Parameter),
        2 => Ok(Context::Arithmetic),
        3 => Ok(Context::Command),
        4 => Ok(Context::Test),
        5 => Ok(Context::BraceExpansion),
        6 => Ok(Context::ParamPatternSuffix),
        7 => Ok(Context::ParamPatternSubstitute),
        found => Err(DeserializeError::InvalidContextTag { found }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::StrInput;

    #[test]
    fn fresh_scanner_has_no_context_or_heredocs() {
        let scanner = Scanner::new();
        assert_eq!(scanner.context(), Context::None);
        assert!(scanner.heredocs().is_empty());
    }

    #[test]
    fn zero_length_buffer_yields_fresh_scanner() {
        let scanner = Scanner::try_deserialize(&[]).unwrap();
        assert_eq!(scanner, Scanner::new());
    }

    #[test]
    fn round_trips_empty_state() {
        let scanner = Scanner::new();
        let mut buffer = [0u8; 64];
        let len = scanner.serialize(&mut buffer);
        let mut restored = Scanner::new();
        restored.deserialize(&buffer[..len]);
        assert_eq!(scanner, restored);
    }

    #[test]
    fn round_trips_nested_contexts_and_heredoc() {
        let mut scanner = Scanner::new();
        scanner.context_stack.push(Context::Command);
        scanner.context_stack.push(Context::Parameter);
        scanner.context_stack.retag_top(Context::ParamPatternSubstitute);
        let mut heredoc = Heredoc::new(true);
        heredoc.is_raw = true;
        heredoc.delimiter = b"EOF".to_vec();
        scanner.heredocs.push_pending(heredoc);
        scanner.last_emitted = LastEmitted::VariableName;

        let mut buffer = [0u8; 128];
        let len = scanner.serialize(&mut buffer);
        assert!(len > 0);

        let mut restored = Scanner::new();
        restored.deserialize(&buffer[..len]);
        assert_eq!(scanner, restored);
    }

    #[test]
    fn truncated_buffer_resets_via_deserialize() {
        let mut scanner = Scanner::new();
        scanner.context_stack.push(Context::Command);
        scanner.deserialize(&[1, 2, 3]); // too short for the header
        assert_eq!(scanner, Scanner::new());
    }

    #[test]
    fn truncated_buffer_is_reported_by_try_deserialize() {
        let err = Scanner::try_deserialize(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, DeserializeError::HeaderTruncated { len: 3 });
    }

    #[test]
    fn bad_context_tag_is_reported_by_try_deserialize() {
        use assert_matches::assert_matches;
        // Header claiming one context entry, tag byte 9 doesn't name any `Context` variant.
        let buffer = [0, 0, 0, 1, 0, 0, 0, 9];
        let err = Scanner::try_deserialize(&buffer).unwrap_err();
        assert_matches!(err, DeserializeError::InvalidContextTag { found: 9 });
    }

    #[test]
    fn declining_a_scan_leaves_input_untouched() {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new("x");
        let before = input.cursor();
        // No terminals valid at all: every handler must decline.
        let result = scanner.scan(&mut input, ValidSymbols::empty(), false);
        assert_eq!(result, None);
        assert_eq!(input.cursor(), before);
    }
}
