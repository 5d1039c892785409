#![cfg_attr(docsrs, feature(doc_cfg))]

//! # subc-base
//!
//! Pure structural atoms for the subc compiler.
//!
//! This crate provides the foundational types used throughout the compiler
//! pipeline:
//!
//! - [`Arena`] — Bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] — String interning for O(1) equality
//! - [`Span`] — Source location tracking
//! - [`SpannedError`]/[`Result`] — Errors with source positions
//!
//! # Design Principles
//!
//! This crate has **no knowledge of C syntax or AArch64 assembly**. It
//! provides only generic, reusable infrastructure that the lexer, parser,
//! resolver, and code generator build upon.

pub mod arena;
pub mod error;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use error::{Result, SpannedError};
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
