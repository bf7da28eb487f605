#![warn(clippy::pedantic)]
#![allow(
    clippy::single_match,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::enum_glob_use,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::single_match_else
)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod util;

pub use source::{Location, LocationRange};
