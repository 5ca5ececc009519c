//! Python Source Parser
//!
//! Tree-sitter based structural extraction. One parser, one language:
//! `PythonParser::parse` turns a source file into a `ParseResult` element
//! tree plus diagnostics. Malformed input never propagates raw tree-sitter
//! failures; it surfaces as a fatal `Diagnostic` with an empty tree.

pub mod python;

pub use python::PythonParser;
