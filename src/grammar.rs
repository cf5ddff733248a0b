//! The grammar contract: the closed set of external terminals and the
//! lexical contexts each one is reachable from.
//!
//! This module is not a grammar compiler — building the GLR tables that
//! decide, at a given parser state, which terminals are currently valid
//! is the out-of-scope parser generator's job. What belongs here is the
//! smaller, testable contract: the terminal catalogue itself (so a host
//! and this crate agree on what a `Terminal` even is) and, for tests
//! that want to exercise the scanner without a real parser, a record of
//! which [`Context`](crate::context::Context)s make each terminal
//! reachable.

use crate::context::Context;
use enumset::{EnumSet, EnumSetType};
use strum::{Display, EnumIter};

/// The closed set of terminals the scanner may emit, per spec §6.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumSetType, Eq, Hash, PartialEq)]
#[enumset(no_super_impls)]
pub enum Terminal {
    /// A run of `\n`.
    Newline,
    /// `}` closing a parameter expansion.
    ClosingBrace,
    /// `${` opening a parameter expansion, or `{N..M}` opening a brace
    /// range (spec §4.2 items 7 and 24 share this terminal).
    BraceStart,
    /// An implicit word-concatenation boundary.
    Concat,
    /// A consumed bare `$` that is not part of `${`, `$(`, `$((`, etc.
    BareDollar,
    /// A non-consuming lookahead confirming the next character is `$`.
    PeekBareDollar,
    /// A standalone `$` followed by whitespace, EOF, or `"`.
    RawDollar,
    /// `((` immediately after a bare dollar, opening arithmetic
    /// expansion.
    DoubleOpeningParen,
    /// `(` after a bare dollar, opening command substitution.
    OpeningParen,
    /// `)` closing a command substitution or subshell.
    ClosingParen,
    /// `))` closing an arithmetic expansion.
    DoubleClosingParen,
    /// `(#...)` extended-glob qualifier flags.
    ZshExtendedGlobFlags,
    /// `[[` opening a test command.
    TestCommandStart,
    /// `]]` closing a test command.
    TestCommandEnd,
    /// `[` opening a subscript or, after a bare dollar, arithmetic
    /// expansion (`$[`).
    OpeningBracket,
    /// `]` closing a subscript or legacy arithmetic expansion.
    ClosingBracket,
    /// `/` or `//` beginning a substitution pattern inside `${...}`.
    PatternStart,
    /// `%`, `%%`, `#`, or `##` beginning a suffix/prefix-removal pattern
    /// inside `${...}`.
    PatternSuffixStart,
    /// A single `#` inside `${...}`, not immediately before `}`.
    HashPattern,
    /// Two `#` inside `${...}`, not immediately before `}`.
    DoubleHashPattern,
    /// `##` immediately followed by `}` (length of `$#`-like form).
    ImmediateDoubleHash,
    /// `*` inside a subscript.
    ArrayStarToken,
    /// `@` inside a subscript.
    ArrayAtToken,
    /// An explicitly empty value (whitespace/EOF/`;`/`&` immediately
    /// follows).
    EmptyValue,
    /// `<<` introducing a here-document.
    HeredocArrow,
    /// `<<-` introducing an indent-stripping here-document.
    HeredocArrowDash,
    /// The delimiter word read right after a heredoc arrow.
    HeredocStart,
    /// The first line of heredoc body content, still on the same call
    /// as recognizing there is one.
    HeredocBodyBeginning,
    /// A heredoc body with no embedded expansions at all.
    SimpleHeredocBody,
    /// A chunk of heredoc body content up to (but not including) the
    /// next expansion or the closing delimiter.
    HeredocContent,
    /// The line that closes a heredoc body.
    HeredocEnd,
    /// A leading `-` followed by letters then whitespace (`-e`, `-f`, …).
    TestOperator,
    /// `[A-Za-z_][A-Za-z0-9_]*` outside a definition context.
    SimpleVariableName,
    /// One of `* @ ? ! # - $ _ 0..9`.
    SpecialVariableName,
    /// An identifier followed by `=`, `+=`, `[`, `:`, `-`, `%`, `#`, `@`,
    /// or `?letter`, in a context where it names something being
    /// defined or subscripted.
    VariableName,
    /// An all-digit word immediately followed by `<` or `>`.
    FileDescriptor,
    /// A balanced expression, stopping at unbalanced close or outer
    /// whitespace.
    Regex,
    /// Like [`Regex`](Self::Regex), additionally stopping at a bare `/`.
    RegexNoSlash,
    /// Like [`Regex`](Self::Regex), stopping at any unquoted whitespace;
    /// must contain a non-identifier character to succeed.
    RegexNoSpace,
    /// `?(...)`, `*(...)`, `+(...)`, `@(...)`, `!(...)`, and bare
    /// extended-glob forms.
    ExtglobPattern,
    /// A run of literal characters inside `${...}` that are not
    /// operators, expansions, or the closing brace.
    ExpansionWord,
    /// Informational flag: the host is attempting error recovery.
    ErrorRecovery,
}

/// A set of [`Terminal`]s, mirroring the host's "valid symbols" array
/// passed into [`crate::scanner::Scanner::scan`].
pub type ValidSymbols = EnumSet<Terminal>;

/// A record of which [`Context`]s make a [`Terminal`] reachable.
///
/// This is deliberately coarse — it documents reachability for the
/// isolated test harness (`tests/corpus.rs`), not the full precedence
/// and lookahead logic that actually decides emission (that belongs to
/// [`crate::scanner::dispatch`]).
#[derive(Debug)]
pub struct Production {
    pub terminal: Terminal,
    pub contexts: &'static [Context],
}

/// All contexts, used by [`Production`]s that are reachable everywhere.
const ANY_CONTEXT: &[Context] = &[
    Context::None,
    Context::Parameter,
    Context::Arithmetic,
    Context::Command,
    Context::Test,
    Context::BraceExpansion,
    Context::ParamPatternSuffix,
    Context::ParamPatternSubstitute,
];

/// The production table: for each terminal, the contexts it can be
/// validly emitted from. Order matches [`Terminal`]'s declaration order,
/// not dispatch priority (see [`crate::scanner::dispatch`] for that).
pub const PRODUCTIONS: &[Production] = &[
    Production { terminal: Terminal::Newline, contexts: ANY_CONTEXT },
    Production {
        terminal: Terminal::ClosingBrace,
        contexts: &[
            Context::Parameter,
            Context::ParamPatternSuffix,
            Context::ParamPatternSubstitute,
        ],
    },
    Production { terminal: Terminal::BraceStart, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::Concat, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::BareDollar, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::PeekBareDollar, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::RawDollar, contexts: ANY_CONTEXT },
    Production {
        terminal: Terminal::DoubleOpeningParen,
        contexts: &[Context::None, Context::Command],
    },
    Production {
        terminal: Terminal::OpeningParen,
        contexts: &[Context::None, Context::Command],
    },
    Production {
        terminal: Terminal::ClosingParen,
        contexts: &[Context::Command, Context::Arithmetic],
    },
    Production {
        terminal: Terminal::DoubleClosingParen,
        contexts: &[Context::Arithmetic],
    },
    Production {
        terminal: Terminal::ZshExtendedGlobFlags,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::TestCommandStart,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::TestCommandEnd,
        contexts: &[Context::Test],
    },
    Production {
        terminal: Terminal::OpeningBracket,
        contexts: &[Context::None, Context::Parameter],
    },
    Production {
        terminal: Terminal::ClosingBracket,
        contexts: &[Context::Arithmetic, Context::Parameter],
    },
    Production {
        terminal: Terminal::PatternStart,
        contexts: &[Context::Parameter],
    },
    Production {
        terminal: Terminal::PatternSuffixStart,
        contexts: &[Context::Parameter],
    },
    Production {
        terminal: Terminal::HashPattern,
        contexts: &[Context::Parameter],
    },
    Production {
        terminal: Terminal::DoubleHashPattern,
        contexts: &[Context::Parameter],
    },
    Production {
        terminal: Terminal::ImmediateDoubleHash,
        contexts: &[Context::Parameter],
    },
    Production {
        terminal: Terminal::ArrayStarToken,
        contexts: &[Context::Parameter, Context::Arithmetic],
    },
    Production {
        terminal: Terminal::ArrayAtToken,
        contexts: &[Context::Parameter, Context::Arithmetic],
    },
    Production { terminal: Terminal::EmptyValue, contexts: ANY_CONTEXT },
    Production {
        terminal: Terminal::HeredocArrow,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::HeredocArrowDash,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::HeredocStart,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::HeredocBodyBeginning,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::SimpleHeredocBody,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::HeredocContent,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::HeredocEnd,
        contexts: &[Context::None],
    },
    Production {
        terminal: Terminal::TestOperator,
        contexts: &[Context::None, Context::Test, Context::Parameter],
    },
    Production { terminal: Terminal::SimpleVariableName, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::SpecialVariableName, contexts: ANY_CONTEXT },
    Production { terminal: Terminal::VariableName, contexts: ANY_CONTEXT },
    Production {
        terminal: Terminal::FileDescriptor,
        contexts: &[Context::None],
    },
    Production { terminal: Terminal::Regex, contexts: &[Context::Test] },
    Production {
        terminal: Terminal::RegexNoSlash,
        contexts: &[Context::Test],
    },
    Production {
        terminal: Terminal::RegexNoSpace,
        contexts: &[Context::Test],
    },
    Production {
        terminal: Terminal::ExtglobPattern,
        contexts: &[
            Context::None,
            Context::Command,
            Context::Arithmetic,
            Context::Test,
            Context::BraceExpansion,
        ],
    },
    Production {
        terminal: Terminal::ExpansionWord,
        contexts: &[
            Context::Parameter,
            Context::ParamPatternSuffix,
            Context::ParamPatternSubstitute,
        ],
    },
    Production { terminal: Terminal::ErrorRecovery, contexts: ANY_CONTEXT },
];

/// Looks up the production for a terminal.
#[must_use]
pub fn production_for(terminal: Terminal) -> &'static Production {
    PRODUCTIONS
        .iter()
        .find(|p| p.terminal == terminal)
        .expect("every Terminal variant has a Production entry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_terminal_has_exactly_one_production() {
        for terminal in Terminal::iter() {
            let matches = PRODUCTIONS.iter().filter(|p| p.terminal == terminal).count();
            assert_eq!(matches, 1, "{terminal:?} should have exactly one Production entry");
        }
    }

    #[test]
    fn valid_symbols_set_operations() {
        let mut valid = ValidSymbols::new();
        assert!(valid.is_empty());
        valid.insert(Terminal::Newline);
        valid.insert(Terminal::Concat);
        assert!(valid.contains(Terminal::Newline));
        assert!(!valid.contains(Terminal::BareDollar));
        assert_eq!(valid.len(), 2);
    }

    #[test]
    fn closing_brace_only_reachable_from_parameter_contexts() {
        let production = production_for(Terminal::ClosingBrace);
        assert!(production.contexts.contains(&Context::Parameter));
        assert!(!production.contexts.contains(&Context::Command));
    }
}
