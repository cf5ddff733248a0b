//! Context-sensitive external scanner for a zsh grammar.
//!
//! This crate implements the hand-written lexical scanner that an
//! incremental GLR parser generator calls when its context-free grammar
//! cannot disambiguate the next token on its own. It does not build a
//! parser, a grammar table, or a concrete syntax tree; it only answers,
//! one call at a time, "given that these terminals could appear next,
//! advance the input and tell me which one (if any) you found."
//!
//! The scanner is synchronous and makes no system calls: see [`lexer`]
//! for the small capability trait it needs from its host, [`scanner`]
//! for the state machine itself, and [`grammar`] for the terminal
//! catalogue and the (intentionally partial) production table used to
//! drive tests in isolation from a real parser.
//!
//! The `capi` feature additionally exposes the four `extern "C"`
//! functions ([`ffi`]) that a parser-generator runtime would load.

pub mod context;
pub mod error;
#[cfg(feature = "capi")]
pub mod ffi;
pub mod grammar;
pub mod heredoc;
pub mod lexer;
pub mod scanner;

pub use context::{Context, ContextStack};
pub use error::DeserializeError;
pub use grammar::{Terminal, ValidSymbols};
pub use heredoc::Heredoc;
pub use lexer::{LexInput, StrInput};
pub use scanner::Scanner;
