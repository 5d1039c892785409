//! Recursive-descent parser: token slice → typed(-enough) AST.
//!
//! State that the original implementation kept in module-level globals —
//! the current token cursor, the local/global variable lists, the scope
//! stack — lives here as fields of [`Parser`] instead, threaded explicitly
//! through every method.

use std::cell::Cell;

use subc_base::{Arena, Interner, Span, Symbol};

use crate::ast::{Function, Node, NodeKind, Program};
use crate::diagnostic::{CompileError, Result};
use crate::symtab::{Locality, SymbolTable, Variable};
use crate::token::{Token, TokenKind};
use crate::types::{Type, TypeArena};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    nodes: &'a Arena<Node<'a>>,
    vars: &'a Arena<Variable<'a>>,
    types: &'a TypeArena<'a>,
    interner: &'a mut Interner,
    symtab: SymbolTable<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(
        tokens: Vec<Token>,
        nodes: &'a Arena<Node<'a>>,
        vars: &'a Arena<Variable<'a>>,
        types: &'a TypeArena<'a>,
        interner: &'a mut Interner,
    ) -> Self {
        Parser {
            tokens,
            pos: 0,
            nodes,
            vars,
            types,
            interner,
            symtab: SymbolTable::new(),
        }
    }

    /// `program = (global-var | function)*`
    pub fn parse_program(mut self) -> Result<Program<'a>> {
        let mut functions = Vec::new();

        while !self.at_eof() {
            if self.function_follows()? {
                functions.push(self.function()?);
            } else {
                self.global_var()?;
            }
        }

        Ok(Program {
            functions,
            globals: self.symtab.globals().to_vec(),
        })
    }

    // ---- token cursor helpers ----------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn is(&self, s: &str) -> bool {
        self.current().is(s)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.is(s) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.consume(s) {
            Ok(())
        } else {
            Err(CompileError::new(
                format!("'{s}' expected"),
                self.current().span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<(Symbol, Span)> {
        if self.current().kind != TokenKind::Identifier {
            return Err(CompileError::new("identifier required", self.current().span));
        }
        let tok = self.advance();
        Ok((self.interner.intern(&tok.text), tok.span))
    }

    fn expect_number(&mut self) -> Result<i64> {
        if self.current().kind != TokenKind::Number {
            return Err(CompileError::new("number required", self.current().span));
        }
        Ok(self.advance().value)
    }

    fn alloc(&self, kind: NodeKind<'a>, span: Span) -> &'a Node<'a> {
        self.nodes.alloc(Node::new(kind, span))
    }

    // ---- types ----------------------------------------------------------

    /// `basetype = ("int" | "char") "*"*`
    fn basetype(&mut self) -> Result<&'a Type<'a>> {
        let mut ty = if self.consume("int") {
            self.types.int()
        } else if self.consume("char") {
            self.types.char()
        } else {
            return Err(CompileError::new("'int' or 'char' expected", self.current().span));
        };
        while self.consume("*") {
            ty = self.types.ptr(ty);
        }
        Ok(ty)
    }

    /// `type-suffix = ("[" num "]")*`, applied outermost-dimension-first.
    fn type_suffix(&mut self, base: &'a Type<'a>) -> Result<&'a Type<'a>> {
        let mut dims = Vec::new();
        while self.consume("[") {
            let n = self.expect_number()?;
            self.expect("]")?;
            dims.push(n as usize);
        }
        let mut ty = base;
        for &d in dims.iter().rev() {
            ty = self.types.array(ty, d);
        }
        Ok(ty)
    }

    // ---- top level --------------------------------------------------

    /// Non-destructively checks whether the declaration at the current
    /// position is a function (`basetype ident "("`) rather than a global.
    fn function_follows(&mut self) -> Result<bool> {
        let start = self.pos;
        let result = (|| -> Result<bool> {
            self.basetype()?;
            self.expect_identifier()?;
            Ok(self.is("("))
        })();
        self.pos = start;
        result
    }

    fn global_var(&mut self) -> Result<()> {
        let base = self.basetype()?;
        let (name, _) = self.expect_identifier()?;
        let ty = self.type_suffix(base)?;
        self.expect(";")?;

        let var = self.vars.alloc(Variable {
            name,
            ty,
            locality: Locality::Global,
            offset: Cell::new(0),
            contents: None,
        });
        self.symtab.push_var(var);
        Ok(())
    }

    /// `function = basetype ident "(" params? ")" "{" stmt* "}"`
    fn function(&mut self) -> Result<Function<'a>> {
        self.basetype()?;
        let (name, _) = self.expect_identifier()?;

        self.symtab.enter_function();
        self.expect("(")?;
        let params = self.params()?;
        self.expect(")")?;

        self.expect("{")?;
        let mut body = Vec::new();
        while !self.consume("}") {
            body.push(self.stmt()?);
        }

        Ok(Function {
            name,
            params,
            locals: self.symtab.locals().to_vec(),
            body,
            stack_size: Cell::new(0),
        })
    }

    /// `params = param ("," param)*`, `param = basetype ident type-suffix`
    fn params(&mut self) -> Result<Vec<&'a Variable<'a>>> {
        let mut params = Vec::new();
        if self.is(")") {
            return Ok(params);
        }
        loop {
            let base = self.basetype()?;
            let (name, _) = self.expect_identifier()?;
            let ty = self.type_suffix(base)?;
            let var = self.vars.alloc(Variable {
                name,
                ty,
                locality: Locality::Local,
                offset: Cell::new(0),
                contents: None,
            });
            self.symtab.push_var(var);
            params.push(var);
            if !self.consume(",") {
                break;
            }
        }
        Ok(params)
    }

    // ---- statements ---------------------------------------------------

    fn stmt(&mut self) -> Result<&'a Node<'a>> {
        let start = self.current().span;

        if self.consume("return") {
            let e = self.expr()?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Return(e), start.merge(e.span)));
        }

        if self.consume("if") {
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let then = self.stmt()?;
            let els = if self.consume("else") {
                Some(self.stmt()?)
            } else {
                None
            };
            let end = els.map(|e| e.span).unwrap_or(then.span);
            return Ok(self.alloc(NodeKind::If { cond, then, els }, start.merge(end)));
        }

        if self.consume("while") {
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let then = self.stmt()?;
            return Ok(self.alloc(NodeKind::While { cond, then }, start.merge(then.span)));
        }

        if self.consume("for") {
            self.expect("(")?;
            let init = if !self.is(";") {
                Some(self.wrap_expr_stmt()?)
            } else {
                None
            };
            self.expect(";")?;
            let cond = if !self.is(";") { Some(self.expr()?) } else { None };
            self.expect(";")?;
            let inc = if !self.is(")") {
                Some(self.wrap_expr_stmt()?)
            } else {
                None
            };
            self.expect(")")?;
            let then = self.stmt()?;
            return Ok(self.alloc(
                NodeKind::For {
                    init,
                    cond,
                    inc,
                    then,
                },
                start.merge(then.span),
            ));
        }

        if self.consume("{") {
            self.symtab.enter_scope();
            let mut children = Vec::new();
            while !self.consume("}") {
                children.push(self.stmt()?);
            }
            self.symtab.exit_scope();
            return Ok(self.alloc(NodeKind::Block(children), start));
        }

        if self.is("int") || self.is("char") {
            return self.declaration();
        }

        let e = self.expr()?;
        self.expect(";")?;
        Ok(self.alloc(NodeKind::ExprStmt(e), e.span))
    }

    /// Parses a bare `expr` and wraps it in `ExprStmt`, for `for`'s
    /// init/inc clauses.
    fn wrap_expr_stmt(&mut self) -> Result<&'a Node<'a>> {
        let e = self.expr()?;
        Ok(self.alloc(NodeKind::ExprStmt(e), e.span))
    }

    /// `declaration = basetype ident type-suffix ("=" expr)? ";"`
    fn declaration(&mut self) -> Result<&'a Node<'a>> {
        let start = self.current().span;
        let base = self.basetype()?;
        let (name, name_span) = self.expect_identifier()?;
        let ty = self.type_suffix(base)?;

        let var = self.vars.alloc(Variable {
            name,
            ty,
            locality: Locality::Local,
            offset: Cell::new(0),
            contents: None,
        });
        self.symtab.push_var(var);

        if self.consume("=") {
            let var_node = self.alloc(NodeKind::Var(var), name_span);
            let rhs = self.assign()?;
            let assign = self.alloc(NodeKind::Assign((var_node, rhs)), name_span.merge(rhs.span));
            self.expect(";")?;
            Ok(self.alloc(NodeKind::ExprStmt(assign), start.merge(assign.span)))
        } else {
            self.expect(";")?;
            Ok(self.alloc(NodeKind::Null, start))
        }
    }

    // ---- expressions ----------------------------------------------------

    fn expr(&mut self) -> Result<&'a Node<'a>> {
        self.assign()
    }

    /// `assign = equality ("=" assign)?` — right-associative.
    fn assign(&mut self) -> Result<&'a Node<'a>> {
        let lhs = self.equality()?;
        if self.consume("=") {
            let rhs = self.assign()?;
            return Ok(self.alloc(NodeKind::Assign((lhs, rhs)), lhs.span.merge(rhs.span)));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<&'a Node<'a>> {
        let mut node = self.relational()?;
        loop {
            if self.consume("==") {
                let rhs = self.relational()?;
                node = self.alloc(NodeKind::Eq((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume("!=") {
                let rhs = self.relational()?;
                node = self.alloc(NodeKind::Ne((node, rhs)), node.span.merge(rhs.span));
            } else {
                return Ok(node);
            }
        }
    }

    fn relational(&mut self) -> Result<&'a Node<'a>> {
        let mut node = self.add()?;
        loop {
            if self.consume("<") {
                let rhs = self.add()?;
                node = self.alloc(NodeKind::Lt((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume("<=") {
                let rhs = self.add()?;
                node = self.alloc(NodeKind::Le((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume(">") {
                let rhs = self.add()?;
                node = self.alloc(NodeKind::Gt((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume(">=") {
                let rhs = self.add()?;
                node = self.alloc(NodeKind::Ge((node, rhs)), node.span.merge(rhs.span));
            } else {
                return Ok(node);
            }
        }
    }

    fn add(&mut self) -> Result<&'a Node<'a>> {
        let mut node = self.mul()?;
        loop {
            if self.consume("+") {
                let rhs = self.mul()?;
                node = self.alloc(NodeKind::Add((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume("-") {
                let rhs = self.mul()?;
                node = self.alloc(NodeKind::Sub((node, rhs)), node.span.merge(rhs.span));
            } else {
                return Ok(node);
            }
        }
    }

    fn mul(&mut self) -> Result<&'a Node<'a>> {
        let mut node = self.unary()?;
        loop {
            if self.consume("*") {
                let rhs = self.unary()?;
                node = self.alloc(NodeKind::Mul((node, rhs)), node.span.merge(rhs.span));
            } else if self.consume("/") {
                let rhs = self.unary()?;
                node = self.alloc(NodeKind::Div((node, rhs)), node.span.merge(rhs.span));
            } else {
                return Ok(node);
            }
        }
    }

    /// `unary = ("+"|"-"|"*"|"&") unary | postfix`
    fn unary(&mut self) -> Result<&'a Node<'a>> {
        let start = self.current().span;
        if self.consume("+") {
            return self.unary();
        }
        if self.consume("-") {
            let operand = self.unary()?;
            let zero = self.alloc(NodeKind::Num(0), start);
            return Ok(self.alloc(NodeKind::Sub((zero, operand)), start.merge(operand.span)));
        }
        if self.consume("*") {
            let operand = self.unary()?;
            return Ok(self.alloc(NodeKind::Deref(operand), start.merge(operand.span)));
        }
        if self.consume("&") {
            let operand = self.unary()?;
            return Ok(self.alloc(NodeKind::Addr(operand), start.merge(operand.span)));
        }
        self.postfix()
    }

    /// `postfix = primary ("[" expr "]")*` — `x[i]` desugars to `*(x+i)`.
    fn postfix(&mut self) -> Result<&'a Node<'a>> {
        let mut node = self.primary()?;
        while self.consume("[") {
            let index = self.expr()?;
            let end = self.current().span;
            self.expect("]")?;
            let sum = self.alloc(NodeKind::Add((node, index)), node.span.merge(index.span));
            node = self.alloc(NodeKind::Deref(sum), sum.span.merge(end));
        }
        Ok(node)
    }

    /// ```text
    /// primary = "(" "{" stmt+ "}" ")"
    ///         | "(" expr ")"
    ///         | "sizeof" unary
    ///         | ident ("(" args? ")")?
    ///         | str
    ///         | num
    /// ```
    fn primary(&mut self) -> Result<&'a Node<'a>> {
        let start = self.current().span;

        if self.consume("(") {
            if self.consume("{") {
                self.symtab.enter_scope();
                let mut children = Vec::new();
                children.push(self.stmt()?);
                while !self.consume("}") {
                    children.push(self.stmt()?);
                }
                self.symtab.exit_scope();
                self.expect(")")?;
                return Ok(self.alloc(NodeKind::StmtExpr(children), start));
            }
            let e = self.expr()?;
            self.expect(")")?;
            return Ok(e);
        }

        if self.consume("sizeof") {
            let operand = self.unary()?;
            return Ok(self.alloc(NodeKind::Sizeof(operand), start.merge(operand.span)));
        }

        if self.current().kind == TokenKind::Identifier {
            let tok = self.advance();
            let name = self.interner.intern(&tok.text);

            if self.consume("(") {
                let args = self.args()?;
                self.expect(")")?;
                return Ok(self.alloc(NodeKind::FunCall { name, args }, start));
            }

            let var = self
                .symtab
                .find(name)
                .ok_or_else(|| CompileError::new("undefined variable", tok.span))?;
            return Ok(self.alloc(NodeKind::Var(var), tok.span));
        }

        if self.current().kind == TokenKind::String {
            let tok = self.advance();
            let label = self.symtab.next_string_label();
            let label_sym = self.interner.intern(&label);
            let ty = self.types.array(self.types.char(), tok.decoded.len());
            let var = self.vars.alloc(Variable {
                name: label_sym,
                ty,
                locality: Locality::Global,
                offset: Cell::new(0),
                contents: Some(tok.decoded),
            });
            self.symtab.push_anonymous_global(var);
            return Ok(self.alloc(NodeKind::Var(var), tok.span));
        }

        if self.current().kind == TokenKind::Number {
            let tok = self.advance();
            return Ok(self.alloc(NodeKind::Num(tok.value), tok.span));
        }

        Err(CompileError::new("expression required", start))
    }

    /// `args = assign ("," assign)*`
    fn args(&mut self) -> Result<Vec<&'a Node<'a>>> {
        let mut args = Vec::new();
        if self.is(")") {
            return Ok(args);
        }
        loop {
            args.push(self.assign()?);
            if !self.consume(",") {
                break;
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::types::TypeArena;

    // Builds fresh arenas and an interner scoped to this call, parses
    // `source`, and hands the result to `f` — sidesteps having to name the
    // arenas' shared lifetime at the call site.
    fn with<R>(source: &str, f: impl for<'a> FnOnce(Result<Program<'a>>) -> R) -> R {
        let nodes = Arena::new();
        let vars = Arena::new();
        let tys = Arena::new();
        let types = TypeArena::new(&tys);
        let mut interner = Interner::new();

        let tokens = Lexer::new(source).tokenize().expect("lex should succeed");
        let parser = Parser::new(tokens, &nodes, &vars, &types, &mut interner);
        f(parser.parse_program())
    }

    #[test]
    fn parses_minimal_function() {
        with("int main() { return 0; }", |program| {
            let program = program.unwrap();
            assert_eq!(program.functions.len(), 1);
            assert_eq!(program.functions[0].body.len(), 1);
            match &*program.functions[0].body[0].kind.borrow() {
                NodeKind::Return(e) => match &*e.kind.borrow() {
                    NodeKind::Num(0) => {}
                    other => panic!("expected Num(0), got {other:?}"),
                },
                other => panic!("expected Return, got {other:?}"),
            }
        });
    }

    #[test]
    fn global_then_function_disambiguates_correctly() {
        with("int g; int main() { return g; }", |program| {
            let program = program.unwrap();
            assert_eq!(program.globals.len(), 1);
            assert_eq!(program.functions.len(), 1);
        });
    }

    #[test]
    fn undefined_variable_is_an_error() {
        with("int main() { return x; }", |program| {
            assert!(program.is_err());
        });
    }

    #[test]
    fn string_literal_becomes_anonymous_global() {
        with(r#"int main() { char *s; s = "hi"; return 0; }"#, |program| {
            let program = program.unwrap();
            assert_eq!(program.globals.len(), 1);
            assert_eq!(program.globals[0].contents.as_deref(), Some(&b"hi\0"[..]));
        });
    }

    #[test]
    fn nested_scopes_allow_shadowing_without_error() {
        with(
            "int main() { int x; { int x; x = 1; } return x; }",
            |program| {
                assert!(program.is_ok());
            },
        );
    }

    #[test]
    fn for_loop_wraps_init_and_inc_in_expr_stmt() {
        with(
            "int main() { int i; for (i = 0; i < 10; i = i + 1) i; return 0; }",
            |program| {
                let program = program.unwrap();
                let for_node = program.functions[0].body[1];
                match &*for_node.kind.borrow() {
                    NodeKind::For { init, inc, .. } => {
                        assert!(matches!(&*init.unwrap().kind.borrow(), NodeKind::ExprStmt(_)));
                        assert!(matches!(&*inc.unwrap().kind.borrow(), NodeKind::ExprStmt(_)));
                    }
                    other => panic!("expected For, got {other:?}"),
                }
            },
        );
    }

    #[test]
    fn array_subscript_desugars_to_deref_of_add() {
        with("int main() { int a[3]; return a[1]; }", |program| {
            let program = program.unwrap();
            let ret = program.functions[0].body[1];
            match &*ret.kind.borrow() {
                NodeKind::Return(e) => {
                    assert!(matches!(&*e.kind.borrow(), NodeKind::Deref(_)));
                }
                other => panic!("expected Return, got {other:?}"),
            }
        });
    }
}
