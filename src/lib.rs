//! A single-pass compiler for a strict subset of C, targeting AArch64
//! assembly.
//!
//! The pipeline is the textbook four stages, each its own module: lex,
//! parse (which resolves variable bindings and builds the AST as it
//! goes), resolve types, lay out stack frames, generate assembly. Nothing
//! here reads from disk or writes to it — see `main.rs` for that.

pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod layout;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod symtab;
pub mod token;
pub mod types;

use subc_base::{Arena, Interner};

use diagnostic::Result;
use lexer::Lexer;
use parser::Parser;
use resolve::Resolver;
use types::TypeArena;

/// Compiles one translation unit from source text to GNU-assembler-dialect
/// AArch64 text.
///
/// Owns every arena the pipeline needs; callers just get source in and
/// assembly text out.
pub fn compile(source: &str) -> Result<String> {
    let mut interner = Interner::new();
    let node_arena = Arena::new();
    let var_arena = Arena::new();
    let ty_arena = Arena::new();
    let types = TypeArena::new(&ty_arena);

    let tokens = Lexer::new(source).tokenize()?;
    let parser = Parser::new(tokens, &node_arena, &var_arena, &types, &mut interner);
    let program = parser.parse_program()?;

    let resolver = Resolver::new(&types);
    for function in &program.functions {
        resolver.resolve_function_body(&function.body)?;
    }

    for function in &program.functions {
        layout::assign_offsets(function);
    }

    codegen::emit_program(&program, &interner)
}
