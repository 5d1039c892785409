//! AArch64 code generator: typed, laid-out AST → GNU-assembler text.
//!
//! A stack machine: every expression pushes its one result; every statement
//! leaves the stack height it found. `x0` is the working register, `x1` its
//! companion for binary operators — `expr.rs` and `stmt.rs` only ever reach
//! for the `push`/`pop`/`gen_addr`/`load`/`store` primitives defined here,
//! never raw `str`/`ldr` text of their own.

use std::fmt::Write as _;

use subc_base::Interner;

use crate::ast::{Function, Node, NodeKind, Program};
use crate::diagnostic::{CompileError, Result};
use crate::symtab::Variable;
use crate::types::Type;

mod expr;
mod stmt;

/// Emits a full program as GNU-assembler-dialect AArch64 text: a `.data`
/// section for every global, then a `.text` section with one label per
/// function.
pub fn emit_program(program: &Program<'_>, interner: &Interner) -> Result<String> {
    let mut gen = Codegen::new(interner);
    gen.data_section(&program.globals);
    writeln!(gen.out, ".text").unwrap();
    for function in &program.functions {
        gen.function(function)?;
    }
    Ok(gen.out)
}

struct Codegen<'i> {
    out: String,
    interner: &'i Interner,
    label_seq: u32,
    /// `.L.return.<func>`, set fresh at the start of each function.
    return_label: String,
}

impl<'i> Codegen<'i> {
    fn new(interner: &'i Interner) -> Self {
        Codegen {
            out: String::new(),
            interner,
            label_seq: 0,
            return_label: String::new(),
        }
    }

    fn next_label(&mut self) -> u32 {
        let s = self.label_seq;
        self.label_seq += 1;
        s
    }

    // ---- data section -------------------------------------------------

    fn data_section(&mut self, globals: &[&Variable<'_>]) {
        if globals.is_empty() {
            return;
        }
        writeln!(self.out, ".data").unwrap();
        for g in globals {
            let name = self.interner.resolve(g.name);
            writeln!(self.out, ".globl .L.{name}").unwrap();
            writeln!(self.out, ".L.{name}:").unwrap();
            match &g.contents {
                Some(bytes) => {
                    for b in bytes {
                        writeln!(self.out, "  .byte {b}").unwrap();
                    }
                }
                None => {
                    writeln!(self.out, "  .zero {}", g.ty.size()).unwrap();
                }
            }
        }
    }

    // ---- function prologue / body / epilogue ---------------------------

    fn function(&mut self, function: &Function<'_>) -> Result<()> {
        let name = self.interner.resolve(function.name).to_string();
        self.return_label = format!(".L.return.{name}");

        writeln!(self.out, ".globl {name}").unwrap();
        writeln!(self.out, "{name}:").unwrap();
        writeln!(self.out, "  stp x29, x30, [sp, -16]!").unwrap();
        writeln!(self.out, "  mov x29, sp").unwrap();
        writeln!(self.out, "  sub sp, sp, #{}", function.stack_size.get()).unwrap();

        for (i, param) in function.params.iter().enumerate() {
            let offset = param.offset.get();
            if param.ty.size() == 1 {
                writeln!(self.out, "  strb w{i}, [x29, #-{offset}]").unwrap();
            } else {
                writeln!(self.out, "  str x{i}, [x29, #-{offset}]").unwrap();
            }
        }

        for stmt in &function.body {
            self.gen_stmt(stmt)?;
        }

        writeln!(self.out, "{}:", self.return_label).unwrap();
        writeln!(self.out, "  mov sp, x29").unwrap();
        writeln!(self.out, "  ldp x29, x30, [sp], #16").unwrap();
        writeln!(self.out, "  ret").unwrap();
        Ok(())
    }

    // ---- stack primitives -----------------------------------------------

    fn push(&mut self, reg: &str) {
        writeln!(self.out, "  str {reg}, [sp, -16]!").unwrap();
    }

    fn pop(&mut self, reg: &str) {
        writeln!(self.out, "  ldr {reg}, [sp], #16").unwrap();
    }

    /// Pushes the address a node designates. Fatal on anything that isn't
    /// an lvalue.
    fn gen_addr(&mut self, node: &Node<'_>) -> Result<()> {
        enum Addr<'n> {
            Var(&'n Variable<'n>),
            Deref(&'n Node<'n>),
        }

        let addr = {
            let kind = node.kind.borrow();
            match &*kind {
                NodeKind::Var(v) => Addr::Var(*v),
                NodeKind::Deref(e) => Addr::Deref(*e),
                _ => return Err(CompileError::new("lvalue required", node.span)),
            }
        };

        match addr {
            Addr::Var(var) => {
                if var.is_global() {
                    let name = self.interner.resolve(var.name);
                    writeln!(self.out, "  adrp x0, .L.{name}").unwrap();
                    writeln!(self.out, "  add x0, x0, :lo12:.L.{name}").unwrap();
                } else {
                    writeln!(self.out, "  sub x0, x29, #{}", var.offset.get()).unwrap();
                }
                self.push("x0");
                Ok(())
            }
            Addr::Deref(operand) => self.gen_expr(operand),
        }
    }

    /// Pops an address from `x0`, loads through it respecting `ty`'s size,
    /// and pushes the loaded value.
    fn load(&mut self, ty: &Type<'_>) {
        self.pop("x0");
        if ty.size() == 1 {
            writeln!(self.out, "  ldrsb w0, [x0]").unwrap();
        } else {
            writeln!(self.out, "  ldr x0, [x0]").unwrap();
        }
        self.push("x0");
    }

    /// Pops a value (`x1`) and an address (`x0`, pushed before the value),
    /// stores respecting `ty`'s size, and pushes the stored value back —
    /// an assignment is itself an expression.
    fn store(&mut self, ty: &Type<'_>) {
        self.pop("x1");
        self.pop("x0");
        if ty.size() == 1 {
            writeln!(self.out, "  strb w1, [x0]").unwrap();
        } else {
            writeln!(self.out, "  str x1, [x0]").unwrap();
        }
        self.push("x1");
    }
}
