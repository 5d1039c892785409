//! Expression lowering: every arm leaves exactly one value pushed.

use std::fmt::Write as _;

use subc_base::Symbol;

use crate::ast::{BinPair, Node, NodeKind};
use crate::diagnostic::Result;

use super::Codegen;

enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// The AArch64 condition code for a `cset`, if this op is a comparison.
    fn cond(&self) -> Option<&'static str> {
        match self {
            BinOp::Eq => Some("eq"),
            BinOp::Ne => Some("ne"),
            BinOp::Lt => Some("lt"),
            BinOp::Le => Some("le"),
            BinOp::Gt => Some("gt"),
            BinOp::Ge => Some("ge"),
            _ => None,
        }
    }
}

impl<'i> Codegen<'i> {
    pub(super) fn gen_expr(&mut self, node: &Node<'_>) -> Result<()> {
        enum Shape<'n> {
            Num(i64),
            Var,
            Addr(&'n Node<'n>),
            Deref(&'n Node<'n>),
            Assign(BinPair<'n>),
            Binary(BinOp, BinPair<'n>),
            Call(Symbol, Vec<&'n Node<'n>>),
            StmtExpr(Vec<&'n Node<'n>>),
        }

        let shape = {
            let kind = node.kind.borrow();
            match &*kind {
                NodeKind::Num(n) => Shape::Num(*n),
                NodeKind::Var(_) => Shape::Var,
                NodeKind::Addr(e) => Shape::Addr(*e),
                NodeKind::Deref(e) => Shape::Deref(*e),
                NodeKind::Assign(pair) => Shape::Assign(*pair),
                NodeKind::Add(pair) => Shape::Binary(BinOp::Add, *pair),
                NodeKind::Sub(pair) => Shape::Binary(BinOp::Sub, *pair),
                NodeKind::Mul(pair) => Shape::Binary(BinOp::Mul, *pair),
                NodeKind::Div(pair) => Shape::Binary(BinOp::Div, *pair),
                NodeKind::Eq(pair) => Shape::Binary(BinOp::Eq, *pair),
                NodeKind::Ne(pair) => Shape::Binary(BinOp::Ne, *pair),
                NodeKind::Lt(pair) => Shape::Binary(BinOp::Lt, *pair),
                NodeKind::Le(pair) => Shape::Binary(BinOp::Le, *pair),
                NodeKind::Gt(pair) => Shape::Binary(BinOp::Gt, *pair),
                NodeKind::Ge(pair) => Shape::Binary(BinOp::Ge, *pair),
                NodeKind::FunCall { name, args } => Shape::Call(*name, args.clone()),
                NodeKind::StmtExpr(children) => Shape::StmtExpr(children.clone()),
                other => unreachable!("{other:?} never reaches codegen as an expression"),
            }
        };

        match shape {
            Shape::Num(n) => {
                writeln!(self.out, "  mov x0, #{n}").unwrap();
                self.push("x0");
                Ok(())
            }
            Shape::Var => {
                self.gen_addr(node)?;
                if !node.ty().is_array() {
                    self.load(node.ty());
                }
                Ok(())
            }
            Shape::Addr(operand) => self.gen_addr(operand),
            Shape::Deref(operand) => {
                self.gen_expr(operand)?;
                if !node.ty().is_array() {
                    self.load(node.ty());
                }
                Ok(())
            }
            Shape::Assign((lhs, rhs)) => {
                self.gen_addr(lhs)?;
                self.gen_expr(rhs)?;
                self.store(node.ty());
                Ok(())
            }
            Shape::Binary(op, (lhs, rhs)) => self.gen_binary(node, op, lhs, rhs),
            Shape::Call(name, args) => {
                for arg in &args {
                    self.gen_expr(arg)?;
                }
                for i in (0..args.len()).rev() {
                    self.pop(&format!("x{i}"));
                }
                let name = self.interner.resolve(name).to_string();
                writeln!(self.out, "  bl {name}").unwrap();
                self.push("x0");
                Ok(())
            }
            Shape::StmtExpr(children) => self.gen_stmt_expr(&children),
        }
    }

    fn gen_binary(
        &mut self,
        node: &Node<'_>,
        op: BinOp,
        lhs: &Node<'_>,
        rhs: &Node<'_>,
    ) -> Result<()> {
        self.gen_expr(lhs)?;
        self.gen_expr(rhs)?;
        self.pop("x1");
        self.pop("x0");

        if matches!(op, BinOp::Add | BinOp::Sub) {
            if let Some(base) = node.ty().base() {
                writeln!(self.out, "  mov x2, #{}", base.size()).unwrap();
                writeln!(self.out, "  mul x1, x1, x2").unwrap();
            }
        }

        match op.cond() {
            Some(cond) => {
                writeln!(self.out, "  cmp x0, x1").unwrap();
                writeln!(self.out, "  cset x0, {cond}").unwrap();
            }
            None => {
                let mnemonic = match op {
                    BinOp::Add => "add",
                    BinOp::Sub => "sub",
                    BinOp::Mul => "mul",
                    BinOp::Div => "sdiv",
                    _ => unreachable!("comparisons handled above"),
                };
                writeln!(self.out, "  {mnemonic} x0, x0, x1").unwrap();
            }
        }

        self.push("x0");
        Ok(())
    }
}
