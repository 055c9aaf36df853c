//! cmdx - run familiar Unix command lines on PowerShell and cmd
//!
//! This library rewrites a POSIX-style command line into the syntax of the
//! shell it will actually run under, and checks lines against the commands
//! and flags it knows how to rewrite.
//!
//! # Modules
//!
//! - [`translator`]: Lexing, segmentation and rule-based rewriting
//! - [`capability`]: Target shell detection and version probing
//! - [`lint`]: Unsupported command and flag reports with suggestions
//! - [`config`]: YAML configuration and rule overlays
//! - [`shell`]: Running a translated line through the target shell

pub mod capability;
pub mod config;
pub mod lint;
pub mod shell;
pub mod translator;

pub use capability::{ShellCapability, ShellKind};
pub use lint::{LintReport, Linter};
pub use translator::{CommandTranslator, TranslationResult};
