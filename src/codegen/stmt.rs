//! Statement lowering: every arm restores the stack height it found.

use std::fmt::Write as _;

use crate::ast::{Node, NodeKind};
use crate::diagnostic::Result;

use super::Codegen;

impl<'i> Codegen<'i> {
    pub(super) fn gen_stmt(&mut self, node: &Node<'_>) -> Result<()> {
        enum Shape<'n> {
            Null,
            Return(&'n Node<'n>),
            Expr(&'n Node<'n>),
            Seq(Vec<&'n Node<'n>>),
            If {
                cond: &'n Node<'n>,
                then: &'n Node<'n>,
                els: Option<&'n Node<'n>>,
            },
            While {
                cond: &'n Node<'n>,
                then: &'n Node<'n>,
            },
            For {
                init: Option<&'n Node<'n>>,
                cond: Option<&'n Node<'n>>,
                inc: Option<&'n Node<'n>>,
                then: &'n Node<'n>,
            },
        }

        let shape = {
            let kind = node.kind.borrow();
            match &*kind {
                NodeKind::Null => Shape::Null,
                NodeKind::Return(e) => Shape::Return(*e),
                NodeKind::ExprStmt(e) => Shape::Expr(*e),
                NodeKind::Block(children) => Shape::Seq(children.clone()),
                NodeKind::StmtExpr(children) => return self.gen_stmt_expr(&children.clone()),
                NodeKind::If { cond, then, els } => Shape::If {
                    cond: *cond,
                    then: *then,
                    els: *els,
                },
                NodeKind::While { cond, then } => Shape::While {
                    cond: *cond,
                    then: *then,
                },
                NodeKind::For {
                    init,
                    cond,
                    inc,
                    then,
                } => Shape::For {
                    init: *init,
                    cond: *cond,
                    inc: *inc,
                    then: *then,
                },
                other => unreachable!("{other:?} never reaches codegen as a statement"),
            }
        };

        match shape {
            Shape::Null => Ok(()),
            Shape::Return(e) => {
                self.gen_expr(e)?;
                self.pop("x0");
                writeln!(self.out, "  b {}", self.return_label).unwrap();
                Ok(())
            }
            Shape::Expr(e) => {
                self.gen_expr(e)?;
                writeln!(self.out, "  add sp, sp, #16").unwrap();
                Ok(())
            }
            Shape::Seq(children) => {
                for child in children {
                    self.gen_stmt(child)?;
                }
                Ok(())
            }
            Shape::If { cond, then, els } => {
                let s = self.next_label();
                self.gen_expr(cond)?;
                self.pop("x0");
                writeln!(self.out, "  cmp x0, #0").unwrap();
                if let Some(els) = els {
                    writeln!(self.out, "  b.eq .L.if.else.{s}").unwrap();
                    self.gen_stmt(then)?;
                    writeln!(self.out, "  b .L.if.end.{s}").unwrap();
                    writeln!(self.out, ".L.if.else.{s}:").unwrap();
                    self.gen_stmt(els)?;
                } else {
                    writeln!(self.out, "  b.eq .L.if.end.{s}").unwrap();
                    self.gen_stmt(then)?;
                }
                writeln!(self.out, ".L.if.end.{s}:").unwrap();
                Ok(())
            }
            Shape::While { cond, then } => {
                let s = self.next_label();
                writeln!(self.out, ".L.while.begin.{s}:").unwrap();
                self.gen_expr(cond)?;
                self.pop("x0");
                writeln!(self.out, "  cmp x0, #0").unwrap();
                writeln!(self.out, "  b.eq .L.while.end.{s}").unwrap();
                self.gen_stmt(then)?;
                writeln!(self.out, "  b .L.while.begin.{s}").unwrap();
                writeln!(self.out, ".L.while.end.{s}:").unwrap();
                Ok(())
            }
            Shape::For {
                init,
                cond,
                inc,
                then,
            } => {
                let s = self.next_label();
                if let Some(init) = init {
                    self.gen_stmt(init)?;
                }
                writeln!(self.out, ".L.for.begin.{s}:").unwrap();
                if let Some(cond) = cond {
                    self.gen_expr(cond)?;
                    self.pop("x0");
                    writeln!(self.out, "  cmp x0, #0").unwrap();
                    writeln!(self.out, "  b.eq .L.for.end.{s}").unwrap();
                }
                self.gen_stmt(then)?;
                if let Some(inc) = inc {
                    self.gen_stmt(inc)?;
                }
                writeln!(self.out, "  b .L.for.begin.{s}").unwrap();
                writeln!(self.out, ".L.for.end.{s}:").unwrap();
                Ok(())
            }
        }
    }

    /// Lowers a statement expression: every statement but the last is
    /// generated for effect (discarding pop included); the last is
    /// generated as a value, its result left on the stack as the whole
    /// construct's value.
    pub(super) fn gen_stmt_expr(&mut self, children: &[&Node<'_>]) -> Result<()> {
        let (last, rest) = match children.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        for child in rest {
            self.gen_stmt(child)?;
        }

        let inner = {
            let kind = last.kind.borrow();
            match &*kind {
                NodeKind::ExprStmt(e) => *e,
                other => unreachable!("statement expression must end in an expression, got {other:?}"),
            }
        };
        self.gen_expr(inner)
    }
}
