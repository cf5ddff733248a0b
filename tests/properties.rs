//! Property tests driving [`Scanner::scan`] against arbitrary character
//! runs, as opposed to `tests/corpus.rs`'s hand-picked scenarios.
//!
//! These don't assert any particular token comes out — a random string
//! need not be a meaningful zsh fragment — only the invariants the host
//! contract depends on: a declined scan never touches `input` or
//! `scanner`, a successful scan always makes progress, nested parameter
//! expansions balance back to an empty context stack, heredocs drain in
//! the order they were opened, and serialization round-trips whatever
//! state a walk produces.

use proptest::prelude::*;
use zsh_scanner::{LexInput, Scanner, StrInput, Terminal, ValidSymbols};

/// All terminals at once: the permissive case used to fuzz the
/// dispatcher's handler order without modeling a real grammar's
/// follow-sets.
fn all_terminals() -> ValidSymbols {
    use strum::IntoEnumIterator;
    let mut set = ValidSymbols::new();
    for terminal in Terminal::iter() {
        set.insert(terminal);
    }
    set
}

/// Characters likely to exercise the scanner's branchier handlers:
/// shell metacharacters, digits, identifier characters, and whitespace.
fn shell_fragment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_${}()\\[\\]<>=#%/*@!?:;.\\-' \\n]{0,24}"
}

/// Drives `scanner`/`input` through `${` `n` times, pushing `n` nested
/// [`Context::Parameter`](zsh_scanner::Context) scopes via the same
/// public `scan` calls a real host would make (`BareDollar` then
/// `BraceStart`).
fn open_n_parameter_expansions<I: LexInput>(scanner: &mut Scanner, input: &mut I, n: usize) {
    for _ in 0..n {
        input.begin_token();
        let dollar = scanner.scan(input, ValidSymbols::only(Terminal::BareDollar), false);
        assert_eq!(dollar, Some(Terminal::BareDollar));
        input.begin_token();
        let brace = scanner.scan(input, ValidSymbols::only(Terminal::BraceStart), false);
        assert_eq!(brace, Some(Terminal::BraceStart));
    }
}

proptest! {
    /// A declined scan (`None`) never advances the cursor or mutates the
    /// scanner; a successful scan always advances it by at least one
    /// character. Either way the scanner never panics.
    #[test]
    fn progress_or_no_change(fragment in shell_fragment()) {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(&fragment);

        loop {
            if input.eof() {
                break;
            }
            input.begin_token();
            let before_cursor = input.cursor();
            let before = scanner.clone();
            let valid = all_terminals();

            match scanner.scan(&mut input, valid, false) {
                // PeekBareDollar, EmptyValue, and Concat are lookahead-only
                // / implicit-boundary terminals by design (none of them
                // advance the input), so they're the legitimate exception
                // to "a match makes progress".
                Some(Terminal::PeekBareDollar) | Some(Terminal::EmptyValue) | Some(Terminal::Concat) => {
                    prop_assert_eq!(input.cursor(), before_cursor);
                    input.advance();
                }
                Some(_) => {
                    prop_assert!(input.cursor() > before_cursor);
                }
                None => {
                    prop_assert_eq!(input.cursor(), before_cursor);
                    prop_assert_eq!(&scanner, &before);
                    // Nothing matched with every terminal offered; advance
                    // by hand so the walk still covers the rest of the
                    // fragment instead of looping forever on this byte.
                    input.advance();
                }
            }
        }
    }

    /// Declining with an empty valid-symbol set is always a true no-op,
    /// regardless of what the input or prior scanner state looked like.
    #[test]
    fn empty_valid_set_always_declines(fragment in shell_fragment()) {
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(&fragment);
        input.begin_token();
        let before_cursor = input.cursor();
        let before = scanner.clone();

        let result = scanner.scan(&mut input, ValidSymbols::empty(), false);

        prop_assert_eq!(result, None);
        prop_assert_eq!(input.cursor(), before_cursor);
        prop_assert_eq!(scanner, before);
    }

    /// Any depth of nested `${` opens balances back to an empty context
    /// stack once the same number of `}` closes follow, regardless of
    /// depth.
    #[test]
    fn nested_parameter_expansions_balance(depth in 1usize..12) {
        let text = "${".repeat(depth) + &"}".repeat(depth);
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(&text);

        open_n_parameter_expansions(&mut scanner, &mut input, depth);
        prop_assert_eq!(scanner.context_stack().len(), depth);

        for _ in 0..depth {
            input.begin_token();
            let closed = scanner.scan(&mut input, ValidSymbols::only(Terminal::ClosingBrace), false);
            prop_assert_eq!(closed, Some(Terminal::ClosingBrace));
        }
        prop_assert!(scanner.context_stack().is_empty());
        prop_assert!(input.eof());
    }

    /// Serialization round-trips the context stack left behind by an
    /// arbitrary depth of nested parameter expansions, including mid-way
    /// (not only once the stack is back to empty).
    #[test]
    fn serialize_round_trips_nested_contexts(depth in 0usize..12) {
        let text = "${".repeat(depth);
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(&text);
        open_n_parameter_expansions(&mut scanner, &mut input, depth);

        let mut buffer = [0u8; 256];
        let len = scanner.serialize(&mut buffer);
        let mut restored = Scanner::new();
        restored.deserialize(&buffer[..len]);
        prop_assert_eq!(scanner, restored);
    }

    /// Queuing several heredocs back to back (as in `cmd <<A <<B <<C`)
    /// keeps the first one opened at the front of the queue — bodies are
    /// always read oldest-operator-first, never newest-first.
    #[test]
    fn heredocs_queue_oldest_first(delimiters in prop::collection::vec("[A-Za-z]{1,6}", 2..5)) {
        let text = delimiters
            .iter()
            .map(|d| format!("<<{d} "))
            .collect::<String>();
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(text.trim_end());

        for _ in &delimiters {
            input.begin_token();
            let arrow = scanner.scan(&mut input, ValidSymbols::only(Terminal::HeredocArrow), false);
            prop_assert_eq!(arrow, Some(Terminal::HeredocArrow));

            input.begin_token();
            let start = scanner.scan(&mut input, ValidSymbols::only(Terminal::HeredocStart), false);
            prop_assert_eq!(start, Some(Terminal::HeredocStart));

            if !input.eof() {
                input.advance(); // the space separating this operator from the next
            }
        }

        prop_assert_eq!(scanner.heredocs().len(), delimiters.len());
        let front = scanner.heredocs().front().expect("at least one queued heredoc");
        prop_assert_eq!(&front.delimiter, delimiters[0].as_bytes());
    }

    /// The one-call history flag (`LastEmitted`) only ever influences the
    /// very next `scan` call: a guaranteed decline in between clears
    /// whatever class of terminal was emitted two calls ago.
    #[test]
    fn history_flag_does_not_outlive_one_scan(identifier in "[a-zA-Z_][a-zA-Z0-9_]{0,8}") {
        let text = format!("{identifier}{{");
        let mut scanner = Scanner::new();
        let mut input = StrInput::new(&text);
        input.begin_token();
        let first = scanner.scan(&mut input, ValidSymbols::only(Terminal::VariableName), false);
        prop_assert_eq!(first, Some(Terminal::VariableName));

        // An empty valid set always declines, but still consumes (clears)
        // whatever history flag the prior call set.
        let _ = scanner.scan(&mut input, ValidSymbols::empty(), false);

        // BraceStart only fires right after a BareDollar (LastEmitted::BareDollar),
        // never right after a VariableName two calls back, so offering it
        // here must decline even if the input happens to look like `{`.
        input.begin_token();
        let spurious = scanner.scan(&mut input, ValidSymbols::only(Terminal::BraceStart), false);
        prop_assert_eq!(spurious, None);
    }
}
