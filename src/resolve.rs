//! Type resolver: the post-order AST walk that attaches a [`Type`] to
//! every expression node, canonicalizes pointer arithmetic, and
//! constant-folds `sizeof`.
//!
//! Statement nodes (`Block`, `If`, `While`, `For`, `Return`, `Null`,
//! `ExprStmt`) never get a `.ty` of their own — only the expressions they
//! contain do.

use crate::ast::{Node, NodeKind};
use crate::diagnostic::{CompileError, Result};
use crate::types::{Type, TypeArena};

/// Walks a parsed function body, filling in every node's `ty` and folding
/// every `sizeof`. Holds the program's [`TypeArena`] so freshly-needed
/// descriptors (a `sizeof`'s `int`, an address-of's new `Ptr`) come from
/// the same arena as everything the parser built.
pub struct Resolver<'a> {
    types: &'a TypeArena<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(types: &'a TypeArena<'a>) -> Self {
        Resolver { types }
    }

    pub fn resolve_function_body(&self, body: &[&'a Node<'a>]) -> Result<()> {
        for stmt in body {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    fn resolve_stmt(&self, node: &'a Node<'a>) -> Result<()> {
        enum Shape<'a> {
            Expr(&'a Node<'a>),
            If {
                cond: &'a Node<'a>,
                then: &'a Node<'a>,
                els: Option<&'a Node<'a>>,
            },
            While {
                cond: &'a Node<'a>,
                then: &'a Node<'a>,
            },
            For {
                init: Option<&'a Node<'a>>,
                cond: Option<&'a Node<'a>>,
                inc: Option<&'a Node<'a>>,
                then: &'a Node<'a>,
            },
            Seq(Vec<&'a Node<'a>>),
            Null,
        }

        let shape = {
            let kind = node.kind.borrow();
            match &*kind {
                NodeKind::ExprStmt(e) | NodeKind::Return(e) => Shape::Expr(*e),
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
                NodeKind::Block(children) | NodeKind::StmtExpr(children) => {
                    Shape::Seq(children.clone())
                }
                NodeKind::Null => Shape::Null,
                other => unreachable!("parser never produces {other:?} in statement position"),
            }
        };

        match shape {
            Shape::Expr(e) => self.resolve_expr(e),
            Shape::If { cond, then, els } => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(then)?;
                if let Some(els) = els {
                    self.resolve_stmt(els)?;
                }
                Ok(())
            }
            Shape::While { cond, then } => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(then)
            }
            Shape::For {
                init,
                cond,
                inc,
                then,
            } => {
                if let Some(init) = init {
                    self.resolve_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.resolve_expr(cond)?;
                }
                if let Some(inc) = inc {
                    self.resolve_stmt(inc)?;
                }
                self.resolve_stmt(then)
            }
            Shape::Seq(children) => {
                for child in children {
                    self.resolve_stmt(child)?;
                }
                Ok(())
            }
            Shape::Null => Ok(()),
        }
    }

    fn resolve_expr(&self, node: &'a Node<'a>) -> Result<()> {
        enum Op {
            Add,
            Sub,
            IntOnly,
            Assign,
        }

        enum Shape<'a> {
            Num,
            Var(&'a Type<'a>),
            Addr(&'a Node<'a>),
            Deref(&'a Node<'a>),
            Binary(Op, &'a Node<'a>, &'a Node<'a>),
            Sizeof(&'a Node<'a>),
            Call(Vec<&'a Node<'a>>),
            StmtExpr(Vec<&'a Node<'a>>),
        }

        let shape = {
            let kind = node.kind.borrow();
            match &*kind {
                NodeKind::Num(_) => Shape::Num,
                NodeKind::Var(v) => Shape::Var(v.ty),
                NodeKind::Addr(e) => Shape::Addr(*e),
                NodeKind::Deref(e) => Shape::Deref(*e),
                NodeKind::Add((lhs, rhs)) => Shape::Binary(Op::Add, *lhs, *rhs),
                NodeKind::Sub((lhs, rhs)) => Shape::Binary(Op::Sub, *lhs, *rhs),
                NodeKind::Mul((lhs, rhs))
                | NodeKind::Div((lhs, rhs))
                | NodeKind::Eq((lhs, rhs))
                | NodeKind::Ne((lhs, rhs))
                | NodeKind::Lt((lhs, rhs))
                | NodeKind::Le((lhs, rhs))
                | NodeKind::Gt((lhs, rhs))
                | NodeKind::Ge((lhs, rhs)) => Shape::Binary(Op::IntOnly, *lhs, *rhs),
                NodeKind::Assign((lhs, rhs)) => Shape::Binary(Op::Assign, *lhs, *rhs),
                NodeKind::Sizeof(e) => Shape::Sizeof(*e),
                NodeKind::FunCall { args, .. } => Shape::Call(args.clone()),
                NodeKind::StmtExpr(children) => Shape::StmtExpr(children.clone()),
                _ => return Err(CompileError::new("expression required", node.span)),
            }
        };

        match shape {
            Shape::Num => {
                node.ty.set(Some(self.types.int()));
                Ok(())
            }
            Shape::Var(ty) => {
                node.ty.set(Some(ty));
                Ok(())
            }
            Shape::Addr(operand) => {
                self.resolve_expr(operand)?;
                let pointee = match operand.ty() {
                    Type::Array(base, _) => *base,
                    other => other,
                };
                node.ty.set(Some(self.types.ptr(pointee)));
                Ok(())
            }
            Shape::Deref(operand) => {
                self.resolve_expr(operand)?;
                let base = operand
                    .ty()
                    .base()
                    .ok_or_else(|| CompileError::new("invalid pointer dereference", node.span))?;
                node.ty.set(Some(base));
                Ok(())
            }
            Shape::Binary(Op::Add, lhs, rhs) => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)?;
                let (lhs, rhs) = if rhs.ty().is_pointer_like() && !lhs.ty().is_pointer_like() {
                    (rhs, lhs)
                } else {
                    (lhs, rhs)
                };
                if lhs.ty().is_pointer_like() && rhs.ty().is_pointer_like() {
                    return Err(CompileError::new("invalid operands", node.span));
                }
                node.replace_kind(NodeKind::Add((lhs, rhs)));
                node.ty.set(Some(lhs.ty()));
                Ok(())
            }
            Shape::Binary(Op::Sub, lhs, rhs) => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)?;
                if rhs.ty().is_pointer_like() {
                    return Err(CompileError::new("invalid operands", node.span));
                }
                node.ty.set(Some(lhs.ty()));
                Ok(())
            }
            Shape::Binary(Op::IntOnly, lhs, rhs) => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)?;
                node.ty.set(Some(self.types.int()));
                Ok(())
            }
            Shape::Binary(Op::Assign, lhs, rhs) => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)?;
                node.ty.set(Some(lhs.ty()));
                Ok(())
            }
            Shape::Sizeof(operand) => {
                self.resolve_expr(operand)?;
                let size = operand.ty().size() as i64;
                node.replace_kind(NodeKind::Num(size));
                node.ty.set(Some(self.types.int()));
                Ok(())
            }
            Shape::Call(args) => {
                for arg in &args {
                    self.resolve_expr(arg)?;
                }
                node.ty.set(Some(self.types.int()));
                Ok(())
            }
            Shape::StmtExpr(children) => {
                let (last, rest) = children
                    .split_last()
                    .ok_or_else(|| CompileError::new("expression required", node.span))?;
                for child in rest {
                    self.resolve_stmt(child)?;
                }
                let inner = match &*last.kind.borrow() {
                    NodeKind::ExprStmt(e) => *e,
                    _ => return Err(CompileError::new("expression required", node.span)),
                };
                self.resolve_expr(inner)?;
                node.ty.set(Some(inner.ty()));
                Ok(())
            }
        }
    }
}
