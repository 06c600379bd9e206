#![allow(missing_docs)]
//! This module contains the internals of the compiler.
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod tags;
pub mod tokens;
