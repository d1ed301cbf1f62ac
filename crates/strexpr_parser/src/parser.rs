//! The expression builder.
//!
//! A precedence climber that binds names as it reads them. Every read returns
//! an [`ExprNode`]: the typed expression plus a `closed` flag recording that
//! the bracket (or end of input) terminating the current construct has
//! already been consumed. Brackets are consumed by whatever read meets them,
//! so callers that own a bracket check `closed` and the bracket's text instead
//! of expecting it themselves.

use std::str::FromStr;

use rust_decimal::Decimal;
use strexpr_ast::node::*;
use strexpr_ast::syntax_kind::{is_keyword, is_operator_word, numeric_suffix, QuoteKind, TokenKind};
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::Value;
use strexpr_checker::conversions::{can_convert_explicitly, can_convert_implicitly, standard_implicit};
use strexpr_checker::operators::{binary_result, promoted_operand_type, promotes_operands, unary_result};
use strexpr_checker::overload::{find_best_method, find_constructor};
use strexpr_checker::TypeRegistry;
use strexpr_core::text::TextSpan;
use strexpr_diagnostics::{messages, Diagnostic, DiagnosticMessage, Result};
use strexpr_options::ParseOptions;
use strexpr_scanner::Token;

use crate::cursor::TokenCursor;
use crate::precedence::{precedence_of, OperatorPrecedence};
use crate::type_resolver::TypeResolver;

/// Parameter and return types a lambda is bound against.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub parameters: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
}

impl Signature {
    pub fn new(parameters: Vec<TypeDescriptor>, return_type: TypeDescriptor) -> Self {
        Self { parameters, return_type }
    }

    /// A signature without parameters.
    pub fn returning(return_type: TypeDescriptor) -> Self {
        Self::new(Vec::new(), return_type)
    }
}

/// Build a typed lambda from a token sequence ending in `End`.
pub fn parse_lambda(
    tokens: &[Token],
    signature: &Signature,
    registry: &dyn TypeRegistry,
    options: &ParseOptions,
) -> Result<Lambda> {
    ExpressionBuilder::new(tokens, registry, options).build(signature)
}

/// A typed expression under construction.
#[derive(Debug)]
struct ExprNode {
    expr: Expr,
    /// The terminating bracket or end of input was consumed by this read.
    closed: bool,
}

impl ExprNode {
    fn open(expr: Expr) -> Self {
        Self { expr, closed: false }
    }
}

fn error(token: &Token, message: &DiagnosticMessage, args: &[&str]) -> Diagnostic {
    Diagnostic::at(token.span, token.display_text(), message, args)
}

/// A diagnostic located at a span that is not a single token.
fn spanned(span: TextSpan, message: &DiagnosticMessage, args: &[&str]) -> Diagnostic {
    let mut diagnostic = Diagnostic::new(message, args);
    diagnostic.span = Some(span);
    diagnostic
}

fn unexpected(token: &Token) -> Diagnostic {
    if token.is_end() {
        error(token, &messages::UNEXPECTED_END_OF_EXPRESSION, &[])
    } else {
        error(token, &messages::UNEXPECTED_TOKEN, &[&token.text])
    }
}

fn is_parameter_name(token: &Token) -> bool {
    token.kind == TokenKind::Identifier && !is_operator_word(&token.text) && !is_keyword(&token.text)
}

struct ExpressionBuilder<'a> {
    cursor: TokenCursor<'a>,
    registry: &'a dyn TypeRegistry,
    types: TypeResolver<'a>,
    options: &'a ParseOptions,
    parameters: Vec<Parameter>,
    /// Tracks recursion depth to reject pathologically nested input.
    recursion_depth: u32,
}

impl<'a> ExpressionBuilder<'a> {
    fn new(tokens: &'a [Token], registry: &'a dyn TypeRegistry, options: &'a ParseOptions) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            registry,
            types: TypeResolver::new(registry, &options.namespaces),
            options,
            parameters: Vec::new(),
            recursion_depth: 0,
        }
    }

    fn build(mut self, signature: &Signature) -> Result<Lambda> {
        let header = self.read_lambda_header()?;
        if header.len() != signature.parameters.len() {
            let first = self.cursor.peek_next(1);
            return Err(error(
                first,
                &messages::PARAMETER_COUNT_MISMATCH,
                &[&header.len().to_string(), &signature.parameters.len().to_string()],
            ));
        }
        self.parameters = header
            .into_iter()
            .zip(&signature.parameters)
            .enumerate()
            .map(|(index, (name, ty))| Parameter { name, index, ty: ty.clone() })
            .collect();
        tracing::debug!("Bound {} lambda parameter(s)", self.parameters.len());

        let node = self.read_expression(OperatorPrecedence::Lowest)?;
        if node.closed {
            let stray = self.cursor.current();
            return Err(error(stray, &messages::UNMATCHED_CLOSING_BRACKET, &[&stray.text]));
        }
        let trailing = self.cursor.peek_next(1);
        if !trailing.is_end() {
            return Err(unexpected(trailing));
        }

        let body = self.finalize(node.expr, &signature.return_type)?;
        Ok(Lambda {
            parameters: self.parameters,
            body,
            return_type: signature.return_type.clone(),
        })
    }

    // ========================================================================
    // Lambda header
    // ========================================================================

    /// Read `(a, b) =>` or `a =>`. Input without a confirmed header is left
    /// untouched and binds no names.
    fn read_lambda_header(&mut self) -> Result<Vec<String>> {
        if !self.cursor.tokens().iter().any(|t| t.is("=>")) {
            return Ok(Vec::new());
        }
        let start = self.cursor.index();
        let first = self.cursor.peek_next(1);

        if first.is("(") {
            self.cursor.next();
            let mut names: Vec<String> = Vec::new();
            let mut expect_name = true;
            loop {
                let token = self.cursor.next();
                if token.is(")") && (names.is_empty() || !expect_name) {
                    break;
                }
                if expect_name && is_parameter_name(token) {
                    if names.iter().any(|n| *n == token.text) {
                        return Err(error(token, &messages::INVALID_LAMBDA_PARAMETERS, &[&token.text]));
                    }
                    names.push(token.text.clone());
                    expect_name = false;
                    continue;
                }
                if !expect_name && token.is(",") {
                    expect_name = true;
                    continue;
                }
                return Err(error(token, &messages::INVALID_LAMBDA_PARAMETERS, &[token.display_text()]));
            }
            if self.cursor.peek_next(1).is("=>") {
                self.cursor.next();
                return Ok(names);
            }
            self.cursor.seek(start)?;
            return Ok(Vec::new());
        }

        if is_parameter_name(first) && self.cursor.peek_next(2).is("=>") {
            self.cursor.skip(2)?;
            return Ok(vec![first.text.clone()]);
        }
        Ok(Vec::new())
    }

    // ========================================================================
    // Precedence climbing
    // ========================================================================

    fn read_expression(&mut self, min: OperatorPrecedence) -> Result<ExprNode> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.options.max_depth() {
            let token = self.cursor.peek_next(1);
            return Err(error(token, &messages::NESTING_TOO_DEEP, &[&self.options.max_depth().to_string()]));
        }
        let result = self.read_expression_inner(min);
        self.recursion_depth -= 1;
        result
    }

    fn read_expression_inner(&mut self, min: OperatorPrecedence) -> Result<ExprNode> {
        let mut left = self.read_primary()?;
        while !left.closed {
            let precedence = precedence_of(self.cursor.peek_next(1));
            if !precedence.is_valid() || precedence <= min {
                break;
            }
            left = self.read_infix(precedence, left)?;
        }
        Ok(left)
    }

    fn read_primary(&mut self) -> Result<ExprNode> {
        let token = self.cursor.next();
        match token.kind {
            TokenKind::NumericLiteral => Ok(ExprNode::open(numeric_literal(token)?)),
            TokenKind::QuotedLiteral => Ok(ExprNode::open(quoted_literal(token)?)),
            TokenKind::Identifier => self.read_identifier(token),
            TokenKind::Operator => match token.text.as_str() {
                "!" | "~" | "-" | "+" => self.read_unary(token),
                "(" => self.read_parenthesized(token),
                "," => self.read_expression(OperatorPrecedence::Lowest),
                _ => Err(unexpected(token)),
            },
            TokenKind::End => Err(unexpected(token)),
        }
    }

    fn read_infix(&mut self, level: OperatorPrecedence, left: ExprNode) -> Result<ExprNode> {
        let token = self.cursor.next();
        if token.is_end() || token.is_close_bracket() {
            return Ok(ExprNode { expr: left.expr, closed: true });
        }
        match token.text.as_str() {
            "." => {
                let name = self.expect_identifier()?;
                let ty = left.expr.ty.clone();
                let start = left.expr.span;
                self.read_member(Some(left.expr), ty, name, start)
            }
            "[" => {
                let (args, close) = self.read_arguments(token, "]")?;
                Ok(ExprNode::open(self.make_index(left.expr, args, token, close)?))
            }
            "is" => {
                let target = self.read_type_required()?;
                let span = left.expr.span.union(&self.cursor.current().span);
                let kind = ExprKind::TypeIs { operand: Box::new(left.expr), target };
                Ok(ExprNode::open(Expr::new(kind, TypeDescriptor::bool(), span)))
            }
            "as" => {
                let target = self.read_type_required()?;
                if !self.registry.is_nullable_or_reference(&target) {
                    let name = self.registry.type_name(&target);
                    return Err(error(token, &messages::AS_REQUIRES_REFERENCE_TYPE, &[&name]));
                }
                let span = left.expr.span.union(&self.cursor.current().span);
                let kind = ExprKind::TypeAs { operand: Box::new(left.expr) };
                Ok(ExprNode::open(Expr::new(kind, target, span)))
            }
            "?" => self.read_conditional(token, left.expr),
            "??" => {
                let right = self.read_expression(level)?;
                let expr = self.make_coalesce(token, left.expr, right.expr)?;
                Ok(ExprNode { expr, closed: right.closed })
            }
            text => match BinaryOp::from_symbol(text) {
                Some(op) => {
                    let right = self.read_expression(level)?;
                    let expr = self.make_binary(token, op, left.expr, right.expr)?;
                    Ok(ExprNode { expr, closed: right.closed })
                }
                None => Err(unexpected(token)),
            },
        }
    }

    // ========================================================================
    // Primaries
    // ========================================================================

    fn read_identifier(&mut self, token: &'a Token) -> Result<ExprNode> {
        let expr = match token.text.as_str() {
            "true" => Expr::constant(Value::Bool(true), TypeDescriptor::bool(), token.span),
            "false" => Expr::constant(Value::Bool(false), TypeDescriptor::bool(), token.span),
            "null" => Expr::constant(Value::Null, TypeDescriptor::object(), token.span),
            "sizeof" => {
                let (ty, span) = self.read_type_operand(token)?;
                let size = self.registry.size_of(&ty).ok_or_else(|| {
                    spanned(span, &messages::TYPE_HAS_NO_SIZE, &[&self.registry.type_name(&ty)])
                })?;
                Expr::constant(Value::Int(size as i32), TypeDescriptor::int(), span)
            }
            "typeof" => {
                let (ty, span) = self.read_type_operand(token)?;
                Expr::constant(Value::Type(ty), TypeDescriptor::type_object(), span)
            }
            "new" => return self.read_new(token),
            "is" | "as" => return Err(unexpected(token)),
            name => match self.parameters.iter().find(|p| p.name == name) {
                Some(parameter) => Expr::new(
                    ExprKind::Parameter {
                        name: parameter.name.clone(),
                        index: parameter.index,
                    },
                    parameter.ty.clone(),
                    token.span,
                ),
                None => return self.read_static_member(token),
            },
        };
        Ok(ExprNode::open(expr))
    }

    fn read_unary(&mut self, token: &'a Token) -> Result<ExprNode> {
        let operand = self.read_expression(precedence_of(token))?;
        let op = match token.text.as_str() {
            "-" => UnaryOp::Negate,
            "+" => UnaryOp::UnaryPlus,
            _ => UnaryOp::Not,
        };
        let expr = self.make_unary(token, op, operand.expr)?;
        Ok(ExprNode { expr, closed: operand.closed })
    }

    /// `(T)x` when `T` reads as a type followed by `)`, a parenthesised group
    /// otherwise.
    fn read_parenthesized(&mut self, open: &'a Token) -> Result<ExprNode> {
        let start = self.cursor.index();
        if let Some(target) = self.types.read_type(&mut self.cursor, None, true)? {
            if self.cursor.peek_next(1).is(")") {
                self.cursor.next();
                let operand = self.read_expression(OperatorPrecedence::Lowest)?;
                let expr = self.make_cast(open, target, operand.expr)?;
                return Ok(ExprNode { expr, closed: operand.closed });
            }
            tracing::trace!("'(' at offset {} is not a cast", open.offset());
            self.cursor.seek(start)?;
        }
        let inner = self.read_expression(OperatorPrecedence::Lowest)?;
        self.expect_closed(inner.closed, ")", open)?;
        Ok(ExprNode::open(inner.expr))
    }

    fn read_type_operand(&mut self, keyword: &'a Token) -> Result<(TypeDescriptor, TextSpan)> {
        self.expect("(")?;
        let ty = self.read_type_required()?;
        let close = self.expect(")")?;
        Ok((ty, keyword.span.union(&close.span)))
    }

    /// `Type.Member` or `Type.Method(...)`, with `first` already consumed.
    fn read_static_member(&mut self, first: &'a Token) -> Result<ExprNode> {
        let ty = self
            .types
            .read_type(&mut self.cursor, Some(first), false)?
            .ok_or_else(|| error(first, &messages::TYPE_NOT_FOUND, &[&first.text]))?;
        self.expect(".")?;
        let name = self.expect_identifier()?;
        self.read_member(None, ty, name, first.span)
    }

    /// A call or a field/property read on `ty`. Static members are looked up
    /// when there is no `target`, instance members otherwise.
    fn read_member(
        &mut self,
        target: Option<Expr>,
        ty: TypeDescriptor,
        name: &'a Token,
        start: TextSpan,
    ) -> Result<ExprNode> {
        let registry = self.registry;
        let is_static = target.is_none();
        let generic_args = if self.cursor.is_generic_argument_list() {
            Some(self.read_generic_arguments()?)
        } else {
            None
        };

        if self.cursor.peek_next(1).is("(") {
            let open = self.cursor.next();
            let (args, close) = self.read_arguments(open, ")")?;
            let described = self.describe_args(&args);
            let candidates = registry
                .list_methods(&ty, &name.text)
                .into_iter()
                .filter(|m| m.def.is_static() == is_static)
                .collect();
            let resolved = find_best_method(registry, candidates, generic_args.as_deref(), args).ok_or_else(|| {
                error(name, &messages::METHOD_NOT_FOUND, &[&registry.type_name(&ty), &name.text, &described])
            })?;
            let kind = ExprKind::Call {
                target: target.map(Box::new),
                method: resolved.to_ref(),
                args: resolved.args,
            };
            return Ok(ExprNode::open(Expr::new(kind, resolved.return_type, start.union(&close.span))));
        }
        if generic_args.is_some() {
            return Err(error(self.cursor.peek_next(1), &messages::_0_EXPECTED, &["("]));
        }

        let member = registry
            .list_members(&ty, &name.text)
            .into_iter()
            .find(|m| m.def.is_static() == is_static)
            .ok_or_else(|| error(name, &messages::MEMBER_NOT_FOUND, &[&registry.type_name(&ty), &name.text]))?;
        let kind = ExprKind::MemberAccess {
            target: target.map(Box::new),
            member: member.to_ref(),
        };
        Ok(ExprNode::open(Expr::new(kind, member.ty(), start.union(&name.span))))
    }

    fn read_conditional(&mut self, question: &'a Token, test: Expr) -> Result<ExprNode> {
        let if_true = self.read_expression(OperatorPrecedence::Lowest)?;
        let colon = if if_true.closed { self.cursor.current() } else { self.cursor.next() };
        if if_true.closed || !colon.is(":") {
            return Err(error(colon, &messages::COLON_EXPECTED_IN_CONDITIONAL, &[colon.display_text()]));
        }
        // Nested conditionals in the false branch associate to the right.
        let if_false = self.read_expression(OperatorPrecedence::Lowest)?;
        let closed = if_false.closed;

        if test.ty != TypeDescriptor::bool() {
            let name = self.registry.type_name(&test.ty);
            return Err(error(question, &messages::NO_IMPLICIT_CONVERSION, &[&name, "bool"]));
        }
        let (if_true, if_false) = self.unify_branches(if_true.expr, if_false.expr, colon)?;
        let span = test.span.union(&if_false.span);
        let ty = if_true.ty.clone();
        let kind = ExprKind::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        };
        Ok(ExprNode { expr: Expr::new(kind, ty, span), closed })
    }

    // ========================================================================
    // Object and array creation
    // ========================================================================

    fn read_new(&mut self, keyword: &'a Token) -> Result<ExprNode> {
        let ty = self.read_type_required()?;
        let next = self.cursor.peek_next(1);
        if next.is("(") {
            let open = self.cursor.next();
            let (args, close) = self.read_arguments(open, ")")?;
            let new = self.make_new(keyword, &ty, args, close.span, open)?;
            if self.cursor.peek_next(1).is("{") {
                let brace = self.cursor.next();
                return self.read_initializer(new, brace);
            }
            return Ok(ExprNode::open(new));
        }
        if next.is("{") {
            let brace = self.cursor.next();
            let new = self.make_new(keyword, &ty, Vec::new(), brace.span, brace)?;
            return self.read_initializer(new, brace);
        }
        if next.is("[") {
            return self.read_new_array(keyword, ty);
        }
        let name = self.registry.type_name(&ty);
        Err(error(next, &messages::INVALID_NEW_SYNTAX, &[&name, next.display_text()]))
    }

    fn make_new(
        &self,
        keyword: &Token,
        ty: &TypeDescriptor,
        args: Vec<Expr>,
        end: TextSpan,
        at: &Token,
    ) -> Result<Expr> {
        let registry = self.registry;
        let span = keyword.span.union(&end);
        let constructors = registry.list_constructors(ty);
        if constructors.is_empty() && args.is_empty() && registry.is_value_type(ty) {
            let kind = ExprKind::New { constructor: None, args };
            return Ok(Expr::new(kind, ty.clone(), span));
        }
        let described = self.describe_args(&args);
        let resolved = find_constructor(registry, constructors, args).ok_or_else(|| {
            error(at, &messages::CONSTRUCTOR_NOT_FOUND, &[&registry.type_name(ty), &described])
        })?;
        let kind = ExprKind::New {
            constructor: Some(resolved.handle.to_ref()),
            args: resolved.args,
        };
        Ok(Expr::new(kind, ty.clone(), span))
    }

    /// `{ Name = value, ... }` when the token after the first name is `=`,
    /// `{ element, ... }` otherwise. `brace` is already consumed.
    fn read_initializer(&mut self, new: Expr, brace: &'a Token) -> Result<ExprNode> {
        if self.cursor.peek_next(1).is("}") {
            let close = self.cursor.next();
            let span = new.span.union(&close.span);
            return Ok(ExprNode::open(Expr { span, ..new }));
        }
        if self.cursor.peek_next(2).is("=") {
            self.read_member_initializer(new, brace)
        } else {
            self.read_collection_initializer(new, brace)
        }
    }

    fn read_member_initializer(&mut self, new: Expr, brace: &'a Token) -> Result<ExprNode> {
        let registry = self.registry;
        let ty = new.ty.clone();
        let mut bindings = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect("=")?;
            let value = self.read_expression(OperatorPrecedence::Lowest)?;
            let member = registry
                .list_members(&ty, &name.text)
                .into_iter()
                .find(|m| !m.def.is_static())
                .ok_or_else(|| error(name, &messages::MEMBER_NOT_FOUND, &[&registry.type_name(&ty), &name.text]))?;
            if member.def.setter.is_none() {
                return Err(error(name, &messages::MEMBER_NOT_SETTABLE, &[&registry.type_name(&ty), &name.text]));
            }
            let converted = self.convert_to(value.expr, &member.ty(), name)?;
            bindings.push(MemberBinding {
                member: member.to_ref(),
                value: converted,
            });
            if let Some(close) = self.list_separator(value.closed, brace, "}", true)? {
                let span = new.span.union(&close.span);
                let kind = ExprKind::MemberInit { new: Box::new(new), bindings };
                return Ok(ExprNode::open(Expr::new(kind, ty, span)));
            }
        }
    }

    fn read_collection_initializer(&mut self, new: Expr, brace: &'a Token) -> Result<ExprNode> {
        let registry = self.registry;
        let ty = new.ty.clone();
        let mut initializers = Vec::new();
        loop {
            let at = self.cursor.peek_next(1);
            let element = self.read_expression(OperatorPrecedence::Lowest)?;
            let closed = element.closed;
            let described = self.describe_args(std::slice::from_ref(&element.expr));
            let candidates = registry
                .list_methods(&ty, "Add")
                .into_iter()
                .filter(|m| !m.def.is_static())
                .collect();
            let resolved = find_best_method(registry, candidates, None, vec![element.expr])
                .ok_or_else(|| error(at, &messages::METHOD_NOT_FOUND, &[&registry.type_name(&ty), "Add", &described]))?;
            initializers.push(ElementInit {
                add_method: resolved.to_ref(),
                args: resolved.args,
            });
            if let Some(close) = self.list_separator(closed, brace, "}", true)? {
                let span = new.span.union(&close.span);
                let kind = ExprKind::ListInit {
                    new: Box::new(new),
                    initializers,
                };
                return Ok(ExprNode::open(Expr::new(kind, ty, span)));
            }
        }
    }

    /// `new T[n]`, `new T[] { ... }` or `new T[n] { ... }`; elements win over
    /// the size when both are given.
    fn read_new_array(&mut self, keyword: &'a Token, element: TypeDescriptor) -> Result<ExprNode> {
        let open = self.cursor.next();
        let array = TypeDescriptor::array(element.clone());

        let bound = if self.cursor.peek_next(1).is("]") {
            self.cursor.next();
            None
        } else {
            let size = self.read_expression(OperatorPrecedence::Lowest)?;
            self.expect_closed(size.closed, "]", open)?;
            Some(self.convert_to(size.expr, &TypeDescriptor::int(), open)?)
        };

        if self.cursor.peek_next(1).is("{") {
            let brace = self.cursor.next();
            let (elements, close) = self.read_array_elements(&element, brace)?;
            let kind = ExprKind::NewArray {
                element,
                init: ArrayInit::Elements(elements),
            };
            return Ok(ExprNode::open(Expr::new(kind, array, keyword.span.union(&close.span))));
        }

        match bound {
            Some(bound) => {
                let span = keyword.span.union(&self.cursor.current().span);
                let kind = ExprKind::NewArray {
                    element,
                    init: ArrayInit::Bounds(Box::new(bound)),
                };
                Ok(ExprNode::open(Expr::new(kind, array, span)))
            }
            None => {
                let name = self.registry.type_name(&element);
                Err(error(
                    self.cursor.peek_next(1),
                    &messages::ARRAY_SIZE_OR_INITIALIZER_EXPECTED,
                    &[&name],
                ))
            }
        }
    }

    fn read_array_elements(
        &mut self,
        element: &TypeDescriptor,
        brace: &'a Token,
    ) -> Result<(Vec<Expr>, &'a Token)> {
        let mut elements = Vec::new();
        if self.cursor.peek_next(1).is("}") {
            return Ok((elements, self.cursor.next()));
        }
        loop {
            let at = self.cursor.peek_next(1);
            let value = self.read_expression(OperatorPrecedence::Lowest)?;
            let closed = value.closed;
            elements.push(self.convert_to(value.expr, element, at)?);
            if let Some(close) = self.list_separator(closed, brace, "}", true)? {
                return Ok((elements, close));
            }
        }
    }

    // ========================================================================
    // Lists and token expectations
    // ========================================================================

    /// Comma-separated expressions up to `close`; `open` is already consumed.
    fn read_arguments(&mut self, open: &'a Token, close: &str) -> Result<(Vec<Expr>, &'a Token)> {
        let mut args = Vec::new();
        if self.cursor.peek_next(1).is(close) {
            return Ok((args, self.cursor.next()));
        }
        loop {
            let arg = self.read_expression(OperatorPrecedence::Lowest)?;
            args.push(arg.expr);
            if let Some(token) = self.list_separator(arg.closed, open, close, false)? {
                return Ok((args, token));
            }
        }
    }

    /// After a list item: `Some(closing bracket)` when the list ended, `None`
    /// when a comma was consumed and another item follows.
    fn list_separator(
        &mut self,
        closed: bool,
        open: &Token,
        close: &str,
        allow_trailing_comma: bool,
    ) -> Result<Option<&'a Token>> {
        if closed {
            let current = self.cursor.current();
            if current.is(close) {
                return Ok(Some(current));
            }
            return Err(error(current, &messages::_0_EXPECTED_TO_CLOSE_1, &[close, &open.text]));
        }
        let next = self.cursor.next();
        if next.is(",") {
            if allow_trailing_comma && self.cursor.peek_next(1).is(close) {
                return Ok(Some(self.cursor.next()));
            }
            return Ok(None);
        }
        if next.is_end() {
            return Err(error(next, &messages::_0_EXPECTED_TO_CLOSE_1, &[close, &open.text]));
        }
        Err(unexpected(next))
    }

    /// Check that a read ended by consuming `close`.
    fn expect_closed(&self, closed: bool, close: &str, open: &Token) -> Result<()> {
        let current = self.cursor.current();
        if closed && current.is(close) {
            return Ok(());
        }
        let found = if closed { current } else { self.cursor.peek_next(1) };
        Err(error(found, &messages::_0_EXPECTED_TO_CLOSE_1, &[close, &open.text]))
    }

    fn expect(&mut self, text: &str) -> Result<&'a Token> {
        let token = self.cursor.next();
        if token.is(text) {
            Ok(token)
        } else {
            Err(error(token, &messages::_0_EXPECTED, &[text]))
        }
    }

    fn expect_identifier(&mut self) -> Result<&'a Token> {
        let token = self.cursor.next();
        if is_parameter_name(token) {
            Ok(token)
        } else {
            Err(unexpected(token))
        }
    }

    fn read_type_required(&mut self) -> Result<TypeDescriptor> {
        let next = self.cursor.peek_next(1);
        self.types
            .read_type(&mut self.cursor, None, false)?
            .ok_or_else(|| error(next, &messages::TYPE_NOT_FOUND, &[next.display_text()]))
    }

    /// `<T1, T2>` after a method name.
    fn read_generic_arguments(&mut self) -> Result<Vec<TypeDescriptor>> {
        let open = self.cursor.next();
        let mut args = Vec::new();
        loop {
            args.push(self.read_type_required()?);
            let separator = self.cursor.next();
            if separator.is(",") {
                continue;
            }
            if separator.is(">") {
                return Ok(args);
            }
            return Err(error(separator, &messages::_0_EXPECTED_TO_CLOSE_1, &[">", &open.text]));
        }
    }

    fn describe_args(&self, args: &[Expr]) -> String {
        args.iter()
            .map(|a| self.registry.type_name(&a.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ========================================================================
    // Typing
    // ========================================================================

    /// Implicit conversion in assignment position: initializer values, array
    /// elements, sizes, indices.
    fn convert_to(&self, expr: Expr, target: &TypeDescriptor, at: &Token) -> Result<Expr> {
        if expr.ty == *target {
            return Ok(expr);
        }
        if expr.is_null_literal() && self.registry.is_nullable_or_reference(target) {
            return Ok(Expr::constant(Value::Null, target.clone(), expr.span));
        }
        if can_convert_implicitly(self.registry, &expr.ty, target) {
            return Ok(expr.convert(target.clone()));
        }
        let from = self.registry.type_name(&expr.ty);
        let to = self.registry.type_name(target);
        Err(error(at, &messages::NO_IMPLICIT_CONVERSION, &[&from, &to]))
    }

    fn make_unary(&self, token: &Token, op: UnaryOp, operand: Expr) -> Result<Expr> {
        let promoted = promoted_operand_type(&operand.ty);
        let operand = operand.convert(promoted);
        let ty = unary_result(op, &operand.ty).ok_or_else(|| {
            let name = self.registry.type_name(&operand.ty);
            error(token, &messages::UNARY_OPERATOR_NOT_DEFINED, &[&token.text, &name])
        })?;
        let span = token.span.union(&operand.span);
        let kind = ExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok(Expr::new(kind, ty, span))
    }

    fn make_cast(&self, open: &Token, target: TypeDescriptor, operand: Expr) -> Result<Expr> {
        if !can_convert_explicitly(self.registry, &operand.ty, &target) {
            let from = self.registry.type_name(&operand.ty);
            let to = self.registry.type_name(&target);
            return Err(error(open, &messages::NO_EXPLICIT_CONVERSION, &[&from, &to]));
        }
        if operand.ty == target {
            return Ok(operand);
        }
        let span = open.span.union(&operand.span);
        Ok(Expr::new(ExprKind::Convert { operand: Box::new(operand) }, target, span))
    }

    fn make_binary(&self, token: &Token, op: BinaryOp, left: Expr, right: Expr) -> Result<Expr> {
        let registry = self.registry;
        let span = left.span.union(&right.span);
        let not_defined = |left: &TypeDescriptor, right: &TypeDescriptor| {
            error(
                token,
                &messages::OPERATOR_NOT_DEFINED,
                &[&token.text, &registry.type_name(left), &registry.type_name(right)],
            )
        };

        let string = TypeDescriptor::string();
        if op == BinaryOp::Add && (left.ty == string || right.ty == string) {
            return self.make_concat(token, left, right, span);
        }

        if op.is_shift() {
            let (left_ty, right_ty) = (left.ty.clone(), right.ty.clone());
            let lifted = right_ty.is_nullable();
            let (operand, count) = if lifted {
                (
                    TypeDescriptor::nullable(promoted_operand_type(&left_ty)),
                    TypeDescriptor::nullable(TypeDescriptor::int()),
                )
            } else {
                (promoted_operand_type(&left_ty), TypeDescriptor::int())
            };
            if !can_convert_implicitly(registry, &right_ty, &count) {
                return Err(not_defined(&left_ty, &right_ty));
            }
            let (left, right) = (left.convert(operand), right.convert(count));
            let ty = binary_result(registry, op, &left.ty, &right.ty).ok_or_else(|| not_defined(&left_ty, &right_ty))?;
            return Ok(binary(op, left, right, ty, span));
        }

        let (left, right) = self.adopt_null(left, right);
        let (left_ty, right_ty) = (left.ty.clone(), right.ty.clone());
        let (left, right) = match standard_implicit(&left_ty, &right_ty) {
            Some(common) => {
                let common = if promotes_operands(op) {
                    promoted_operand_type(&common)
                } else {
                    common
                };
                (left.convert(common.clone()), right.convert(common))
            }
            None if op.is_equality()
                && registry.is_nullable_or_reference(&left_ty)
                && registry.is_nullable_or_reference(&right_ty) =>
            {
                (left, right)
            }
            None => return Err(not_defined(&left_ty, &right_ty)),
        };
        let ty = binary_result(registry, op, &left.ty, &right.ty).ok_or_else(|| not_defined(&left_ty, &right_ty))?;
        Ok(binary(op, left, right, ty, span))
    }

    /// A `null` literal on one side takes the other side's type when that
    /// type can hold null.
    fn adopt_null(&self, left: Expr, right: Expr) -> (Expr, Expr) {
        if left.is_null_literal() && !right.is_null_literal() && self.registry.is_nullable_or_reference(&right.ty) {
            let left = Expr::constant(Value::Null, right.ty.clone(), left.span);
            return (left, right);
        }
        if right.is_null_literal() && !left.is_null_literal() && self.registry.is_nullable_or_reference(&left.ty) {
            let right = Expr::constant(Value::Null, left.ty.clone(), right.span);
            return (left, right);
        }
        (left, right)
    }

    /// `a + b` with a string side: `string.Concat(object, object)`.
    fn make_concat(&self, token: &Token, left: Expr, right: Expr, span: TextSpan) -> Result<Expr> {
        let registry = self.registry;
        let string = TypeDescriptor::string();
        let args = vec![left.convert(TypeDescriptor::object()), right.convert(TypeDescriptor::object())];
        let candidates = registry
            .list_methods(&string, "Concat")
            .into_iter()
            .filter(|m| m.def.is_static())
            .collect();
        let resolved = find_best_method(registry, candidates, None, args)
            .ok_or_else(|| error(token, &messages::METHOD_NOT_FOUND, &["string", "Concat", "object, object"]))?;
        let kind = ExprKind::Call {
            target: None,
            method: resolved.to_ref(),
            args: resolved.args,
        };
        Ok(Expr::new(kind, resolved.return_type, span))
    }

    fn make_coalesce(&self, token: &Token, left: Expr, right: Expr) -> Result<Expr> {
        if !self.registry.is_nullable_or_reference(&left.ty) {
            let (l, r) = (self.registry.type_name(&left.ty), self.registry.type_name(&right.ty));
            return Err(error(token, &messages::OPERATOR_NOT_DEFINED, &[&token.text, &l, &r]));
        }
        let right = self.convert_to(right, &left.ty, token)?;
        let span = left.span.union(&right.span);
        let ty = left.ty.clone();
        let kind = ExprKind::Coalesce {
            left: Box::new(left),
            right: Box::new(right),
        };
        Ok(Expr::new(kind, ty, span))
    }

    fn unify_branches(&self, if_true: Expr, if_false: Expr, at: &Token) -> Result<(Expr, Expr)> {
        let registry = self.registry;
        if if_true.ty == if_false.ty {
            return Ok((if_true, if_false));
        }
        let (if_true, if_false) = self.adopt_null(if_true, if_false);
        if if_true.ty == if_false.ty {
            return Ok((if_true, if_false));
        }
        if let Some(common) = standard_implicit(&if_true.ty, &if_false.ty) {
            return Ok((if_true.convert(common.clone()), if_false.convert(common)));
        }
        if can_convert_implicitly(registry, &if_true.ty, &if_false.ty) {
            let ty = if_false.ty.clone();
            return Ok((if_true.convert(ty), if_false));
        }
        if can_convert_implicitly(registry, &if_false.ty, &if_true.ty) {
            let ty = if_true.ty.clone();
            return Ok((if_true, if_false.convert(ty)));
        }
        let (a, b) = (registry.type_name(&if_true.ty), registry.type_name(&if_false.ty));
        Err(error(at, &messages::NO_COMMON_TYPE, &[&a, &b]))
    }

    /// Array element read, or a call to the default indexer's getter.
    fn make_index(&self, target: Expr, mut args: Vec<Expr>, open: &Token, close: &Token) -> Result<Expr> {
        let registry = self.registry;
        let span = target.span.union(&close.span);
        let type_name = registry.type_name(&target.ty);

        if let Some(element) = target.ty.element_type().cloned() {
            if args.len() != 1 {
                let described = self.describe_args(&args);
                return Err(error(open, &messages::METHOD_NOT_FOUND, &[&type_name, "this[]", &described]));
            }
            let index = args.remove(0);
            let index = self.convert_to(index, &TypeDescriptor::int(), open)?;
            let kind = ExprKind::IndexAccess {
                array: Box::new(target),
                index: Box::new(index),
            };
            return Ok(Expr::new(kind, element, span));
        }

        let getter = registry
            .ancestors(&target.ty)
            .iter()
            .find_map(|ty| registry.definition(ty.def_id()?)?.default_member.clone())
            .map(|member| format!("get_{}", member))
            .ok_or_else(|| error(open, &messages::INDEXER_NOT_FOUND, &[&type_name]))?;
        let described = self.describe_args(&args);
        let candidates = registry
            .list_methods(&target.ty, &getter)
            .into_iter()
            .filter(|m| !m.def.is_static())
            .collect();
        let resolved = find_best_method(registry, candidates, None, args)
            .ok_or_else(|| error(open, &messages::METHOD_NOT_FOUND, &[&type_name, &getter, &described]))?;
        let kind = ExprKind::Call {
            target: Some(Box::new(target)),
            method: resolved.to_ref(),
            args: resolved.args,
        };
        Ok(Expr::new(kind, resolved.return_type, span))
    }

    /// Convert the body to the declared return type.
    fn finalize(&self, body: Expr, return_type: &TypeDescriptor) -> Result<Expr> {
        let registry = self.registry;
        if body.ty == *return_type || return_type.is(TypeDefId::VOID) {
            return Ok(body);
        }
        if self.options.implicit_return() {
            if body.is_null_literal() && registry.is_nullable_or_reference(return_type) {
                return Ok(Expr::constant(Value::Null, return_type.clone(), body.span));
            }
            if return_type.is(TypeDefId::OBJECT) || can_convert_implicitly(registry, &body.ty, return_type) {
                return Ok(body.convert(return_type.clone()));
            }
        }
        let from = registry.type_name(&body.ty);
        let to = registry.type_name(return_type);
        Err(spanned(body.span, &messages::NO_IMPLICIT_CONVERSION, &[&from, &to]))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, ty: TypeDescriptor, span: TextSpan) -> Expr {
    let kind = ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    };
    Expr::new(kind, ty, span)
}

// ============================================================================
// Literals
// ============================================================================

/// A numeric literal typed by its suffix. Unsuffixed integers take the first
/// of `int`, `uint`, `long`, `ulong` that holds them; a fraction makes a
/// `double`.
fn numeric_literal(token: &Token) -> Result<Expr> {
    let text = token.text.as_str();
    let suffix = text.chars().last().and_then(numeric_suffix);
    let body = match suffix {
        Some(_) => &text[..text.len() - 1],
        None => text,
    };
    let fractional = body.contains(|c| matches!(c, '.' | 'e' | 'E'));

    let value = match suffix {
        Some(NumericKind::Long) => body.parse::<i64>().ok().map(Value::Long),
        Some(NumericKind::Float) => body.parse::<f32>().ok().filter(|v| v.is_finite()).map(Value::Float),
        Some(NumericKind::Decimal) => parse_decimal(body).map(Value::Decimal),
        Some(_) => body.parse::<f64>().ok().filter(|v| v.is_finite()).map(Value::Double),
        None if fractional => body.parse::<f64>().ok().filter(|v| v.is_finite()).map(Value::Double),
        None => body
            .parse::<i32>()
            .map(Value::Int)
            .or_else(|_| body.parse::<u32>().map(Value::UInt))
            .or_else(|_| body.parse::<i64>().map(Value::Long))
            .or_else(|_| body.parse::<u64>().map(Value::ULong))
            .ok(),
    };

    // Unsuffixed integers have tried every integral type up to `ulong` when
    // parsing fails, so that is the range an error reports.
    let kind = suffix.unwrap_or(if fractional { NumericKind::Double } else { NumericKind::ULong });
    match value {
        Some(value) => {
            let kind = value.numeric_kind().unwrap_or(kind);
            Ok(Expr::constant(value, TypeDescriptor::numeric(kind), token.span))
        }
        None => Err(error(token, &messages::NUMERIC_LITERAL_OUT_OF_RANGE, &[text, kind.keyword()])),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(|c| matches!(c, 'e' | 'E')) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// A string or character literal with its quotes stripped. Escapes are not
/// interpreted.
fn quoted_literal(token: &Token) -> Result<Expr> {
    let text = token.text.as_str();
    let quote = text.chars().next().and_then(QuoteKind::from_char);
    let inner = match (quote, text.len()) {
        (Some(_), len) if len >= 2 => &text[1..len - 1],
        _ => return Err(unexpected(token)),
    };
    match quote {
        Some(QuoteKind::Char) => {
            let mut chars = inner.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(Expr::constant(Value::Char(ch), TypeDescriptor::char(), token.span)),
                _ => Err(error(token, &messages::INVALID_CHAR_LITERAL, &[text])),
            }
        }
        _ => Ok(Expr::constant(Value::string(inner), TypeDescriptor::string(), token.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_checker::Registry;
    use strexpr_diagnostics::ErrorKind;
    use strexpr_scanner::tokenize;

    fn parse(source: &str, signature: &Signature) -> Result<Lambda> {
        let registry = Registry::standard();
        let options = ParseOptions::with_namespaces(["System", "System.Collections.Generic"]);
        let tokens = tokenize(source)?;
        parse_lambda(&tokens, signature, registry.as_ref(), &options)
    }

    fn body(source: &str) -> Expr {
        parse(source, &Signature::returning(TypeDescriptor::object()))
            .unwrap()
            .body
    }

    fn unwrap_convert(expr: &Expr) -> &Expr {
        match &expr.kind {
            ExprKind::Convert { operand } => operand,
            _ => expr,
        }
    }

    #[test]
    fn test_literal_suffixes() {
        let cases = [
            ("123l", TypeDescriptor::long()),
            ("123L", TypeDescriptor::long()),
            ("123f", TypeDescriptor::float()),
            ("123F", TypeDescriptor::float()),
            ("123d", TypeDescriptor::double()),
            ("123D", TypeDescriptor::double()),
            ("123m", TypeDescriptor::decimal()),
            ("123M", TypeDescriptor::decimal()),
            ("123", TypeDescriptor::int()),
            ("1.5", TypeDescriptor::double()),
            ("3000000000", TypeDescriptor::numeric(NumericKind::UInt)),
        ];
        for (source, ty) in cases {
            let lambda = parse(source, &Signature::returning(ty.clone())).unwrap();
            assert_eq!(lambda.body.ty, ty, "{}", source);
            assert!(matches!(lambda.body.kind, ExprKind::Constant(_)), "{}", source);
        }
    }

    #[test]
    fn test_literal_out_of_range() {
        let err = parse("1.0e400", &Signature::returning(TypeDescriptor::double())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedNumber);
        let err = parse("99999999999999999999L", &Signature::returning(TypeDescriptor::long())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedNumber);
        assert!(err.message_text.contains("'long'"), "{}", err.message_text);

        let err = parse("123456789012345678901", &Signature::returning(TypeDescriptor::object())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedNumber);
        assert!(err.message_text.contains("'ulong'"), "{}", err.message_text);
    }

    #[test]
    fn test_char_literal_length() {
        let expr = body("'a'");
        assert_eq!(unwrap_convert(&expr).ty, TypeDescriptor::char());
        let err = parse("'ab'", &Signature::returning(TypeDescriptor::char())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_cast_versus_group() {
        let cast = parse("(int)3.2", &Signature::returning(TypeDescriptor::int())).unwrap();
        assert!(matches!(cast.body.kind, ExprKind::Convert { .. }));
        let group = parse("(3.2)", &Signature::returning(TypeDescriptor::double())).unwrap();
        assert!(matches!(group.body.kind, ExprKind::Constant(Value::Double(_))));
    }

    #[test]
    fn test_header_without_arrow_is_an_expression() {
        let err = parse("(x)", &Signature::returning(TypeDescriptor::int())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeNotFound);
        let sig = Signature::new(vec![TypeDescriptor::int()], TypeDescriptor::int());
        assert_eq!(parse("x => x", &sig).unwrap().parameters.len(), 1);
        assert_eq!(parse("(x) => x", &sig).unwrap().parameters[0].name, "x");
    }

    #[test]
    fn test_duplicate_parameter_names() {
        let sig = Signature::new(vec![TypeDescriptor::int(), TypeDescriptor::int()], TypeDescriptor::int());
        let err = parse("(x, x) => x", &sig).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_depth_guard() {
        let registry = Registry::standard();
        let options = ParseOptions {
            max_nesting_depth: Some(8),
            ..ParseOptions::default()
        };
        let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let tokens = tokenize(&source).unwrap();
        let err = parse_lambda(&tokens, &Signature::returning(TypeDescriptor::int()), registry.as_ref(), &options)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NestingTooDeep);

        let tokens = tokenize("((1))").unwrap();
        assert!(parse_lambda(&tokens, &Signature::returning(TypeDescriptor::int()), registry.as_ref(), &options).is_ok());
    }
}
