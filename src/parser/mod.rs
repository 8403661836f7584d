//! Recursive-descent parser that builds the AST described in `ast`.
//!
//! Two-token lookahead (needed for the `吾有 <COUNT> <…>` dispatch between a
//! declaration and a function definition) falls out of ordinary
//! `Peekable::peek` usage: once the count token is consumed, `peek` already
//! exposes the third token, so no separate lookahead buffer is needed.

#[cfg(test)]
mod tests;

use std::iter::Peekable;

use logos::{Logos, SpannedIter};

use crate::ast::*;
use crate::error::WenyanError;
use crate::macro_expand;
use crate::span::{self, Span};
use crate::token::Token;

type SpannedLexer<'source> = Peekable<SpannedIter<'source, Token>>;

/// Lex, expand macros, and parse a complete source file into a `Program`.
pub fn parse_program(source: &str) -> Result<Program, WenyanError> {
    let tokens: Vec<(Token, Span)> = Token::lexer(source).spanned().collect();
    let tokens = macro_expand::extract_and_expand(tokens)?;
    let mut lexer = tokens.into_iter().peekable();

    let mut statements = Vec::new();
    while lexer.peek().is_some() {
        statements.push(parse_stmt(&mut lexer)?);
    }
    Ok(Program { statements })
}

fn peek_span(lexer: &mut SpannedLexer) -> Span {
    lexer.peek().map(|(_, s)| s.clone()).unwrap_or(0..0)
}

fn next_token(lexer: &mut SpannedLexer, what: &str) -> Result<(Token, Span), WenyanError> {
    lexer
        .next()
        .ok_or_else(|| WenyanError::grammar(format!("unexpected end of input, expected {what}"), peek_span(lexer)))
}

fn expect(lexer: &mut SpannedLexer, expected: &Token, what: &str) -> Result<Span, WenyanError> {
    let (token, span) = next_token(lexer, what)?;
    if &token == expected {
        Ok(span)
    } else {
        Err(WenyanError::grammar(format!("expected {what}, found {token}"), span))
    }
}

fn expect_ident(lexer: &mut SpannedLexer) -> Result<(String, Span), WenyanError> {
    let (token, span) = next_token(lexer, "an identifier")?;
    match token {
        Token::Ident(name) => Ok((name, span)),
        other => Err(WenyanError::grammar(format!("expected an identifier, found {other}"), span)),
    }
}

fn expect_type_tag(lexer: &mut SpannedLexer) -> Result<(TypeTag, Span), WenyanError> {
    let (token, span) = next_token(lexer, "a type")?;
    let tag = match token {
        Token::TypeNum => TypeTag::Num,
        Token::TypeStr => TypeTag::Str,
        Token::TypeBool => TypeTag::Bool,
        Token::TypeArr => TypeTag::Arr,
        Token::TypeObj => TypeTag::Obj,
        Token::TypeUnit => TypeTag::Unit,
        other => return Err(WenyanError::grammar(format!("expected a type, found {other}"), span)),
    };
    Ok((tag, span))
}

fn expect_int(lexer: &mut SpannedLexer, what: &str) -> Result<(i64, Span), WenyanError> {
    let (token, span) = next_token(lexer, what)?;
    match token {
        Token::IntNum(crate::numeral::Numeral::Int(i)) => Ok((i, span)),
        other => Err(WenyanError::grammar(format!("expected {what}, found {other}"), span)),
    }
}

fn parse_value(lexer: &mut SpannedLexer) -> Result<ValueNode, WenyanError> {
    let (token, span) = next_token(lexer, "a value")?;
    let node = match token {
        Token::StringLit(s) => Value::Str(s),
        Token::BoolFalse => Value::Bool(false),
        Token::BoolTrue => Value::Bool(true),
        Token::Ident(name) => Value::Ident(name),
        Token::IntNum(crate::numeral::Numeral::Int(i)) => Value::Int(i),
        Token::IntNum(crate::numeral::Numeral::Float(f)) => Value::Float(f),
        Token::FloatNum(crate::numeral::Numeral::Float(f)) => Value::Float(f),
        Token::FloatNum(crate::numeral::Numeral::Int(i)) => Value::Int(i),
        Token::It => Value::It,
        other => return Err(WenyanError::grammar(format!("expected a value, found {other}"), span)),
    };
    Ok(Spanned::new(node, span))
}

fn peek_is(lexer: &mut SpannedLexer, token: &Token) -> bool {
    matches!(lexer.peek(), Some((t, _)) if t == token)
}

fn parse_logic_op(lexer: &mut SpannedLexer) -> Option<LogicOp> {
    let op = match lexer.peek() {
        Some((Token::Eq, _)) => LogicOp::Eq,
        Some((Token::Neq, _)) => LogicOp::Neq,
        Some((Token::Gt, _)) => LogicOp::Gt,
        Some((Token::Lt, _)) => LogicOp::Lt,
        Some((Token::Ge, _)) => LogicOp::Ge,
        Some((Token::Le, _)) => LogicOp::Le,
        Some((Token::And, _)) => LogicOp::And,
        Some((Token::Or, _)) => LogicOp::Or,
        _ => return None,
    };
    lexer.next();
    Some(op)
}

fn parse_if_atom(lexer: &mut SpannedLexer) -> Result<IfAtom, WenyanError> {
    let mut negated = false;
    while peek_is(lexer, &Token::Not) {
        lexer.next();
        negated = !negated;
    }
    let value = parse_value(lexer)?;
    Ok(IfAtom { negated, value })
}

fn parse_if_expr(lexer: &mut SpannedLexer) -> Result<IfExpr, WenyanError> {
    let first = parse_if_atom(lexer)?;
    let mut rest = Vec::new();
    while let Some(op) = parse_logic_op(lexer) {
        rest.push((op, parse_if_atom(lexer)?));
    }
    Ok(IfExpr { first, rest })
}

fn parse_block_until(lexer: &mut SpannedLexer, terminators: &[Token]) -> Result<Vec<Stmt>, WenyanError> {
    let mut body = Vec::new();
    loop {
        match lexer.peek() {
            Some((t, _)) if terminators.contains(t) => break,
            None => return Err(WenyanError::grammar("unexpected end of input inside a block", peek_span(lexer))),
            _ => body.push(parse_stmt(lexer)?),
        }
    }
    Ok(body)
}

fn parse_stmt(lexer: &mut SpannedLexer) -> Result<Stmt, WenyanError> {
    let start = peek_span(lexer);
    let (token, _) = lexer.peek().cloned().expect("caller checked peek().is_some()");

    match token {
        Token::CommentHead => parse_comment(lexer, start),
        Token::HaveWu | Token::HaveJin => parse_declare_or_function(lexer, start),
        Token::If => parse_if(lexer, start),
        Token::IfTrue => parse_degenerate_if(lexer, start, true),
        Token::IfFalseOrElse => parse_degenerate_if(lexer, start, false),
        Token::ForHead => parse_for(lexer, start),
        Token::LoopForever => parse_for_forever(lexer, start),
        Token::Break => {
            lexer.next();
            Ok(Stmt::Break(start))
        }
        Token::BreakIf => parse_break_if(lexer, start),
        Token::TryHead => parse_try(lexer, start),
        Token::ThrowHead => parse_throw(lexer, start),
        Token::AssignHead => parse_assign(lexer, start),
        Token::ImportHead => parse_import(lexer, start),
        Token::Print => {
            lexer.next();
            Ok(Stmt::Print(start))
        }
        Token::ReturnIt => {
            lexer.next();
            Ok(Stmt::Return(Return::It, start))
        }
        Token::ReturnValue => {
            lexer.next();
            let value = parse_value(lexer)?;
            let span = span::join(&start, &value.span);
            Ok(Stmt::Return(Return::Value(value), span))
        }
        Token::ReturnUnit => {
            lexer.next();
            Ok(Stmt::Return(Return::Unit, start))
        }
        Token::Add | Token::Sub | Token::Mul | Token::Div => parse_math(lexer, start),
        Token::Not => parse_not_stmt(lexer, start),
        Token::Concat => parse_concat(lexer, start),
        Token::Push => parse_push(lexer, start),
        Token::CallHead => parse_call_prefix(lexer, start),
        Token::Prep => parse_call_postfix(lexer, start),
        _ => parse_value_led_stmt(lexer, start),
    }
}

fn parse_comment(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let (_, text_span) = next_token(lexer, "comment text")?;
    Ok(Stmt::Comment(span::join(&start, &text_span)))
}

/// Dispatch on `吾有`/`今有` followed by a count and either `術` (a function
/// definition) or one of the six `TYPE` tokens (a declaration, possibly
/// followed by `名之曰` to become a named definition, and — for `物` — possibly
/// an object body).
fn parse_declare_or_function(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next(); // HaveWu | HaveJin
    let (count, _) = expect_int(lexer, "a count")?;

    if peek_is(lexer, &Token::Shu) {
        lexer.next();
        return parse_function_def(lexer, start);
    }

    let (type_tag, _) = expect_type_tag(lexer)?;

    let mut inits = Vec::new();
    while peek_is(lexer, &Token::Said) {
        lexer.next();
        inits.push(parse_value(lexer)?);
    }
    if inits.len() > count.max(0) as usize {
        return Err(WenyanError::grammar(
            format!("declared {count} but given {} initializers", inits.len()),
            peek_span(lexer),
        ));
    }

    let declare = Declare { count, type_tag, inits, span: start.clone() };

    if !peek_is(lexer, &Token::NameIt) {
        return Ok(Stmt::Declare(declare));
    }
    lexer.next();

    let mut names = vec![expect_ident(lexer)?.0];
    while let Some((Token::Ident(_), _)) = lexer.peek() {
        names.push(expect_ident(lexer)?.0);
    }
    // §3: the name count must equal the declared count, except the
    // single-name shorthand (`init_define`) which may name just one of
    // several declared slots.
    if names.len() != count.max(0) as usize && names.len() != 1 {
        return Err(WenyanError::grammar(
            format!("declared {count} but named {} variables", names.len()),
            peek_span(lexer),
        ));
    }

    if type_tag == TypeTag::Obj && peek_is(lexer, &Token::EndNameHead) {
        return parse_object_body(lexer, start, count, names);
    }

    let end = peek_span(lexer);
    Ok(Stmt::Define(Define { declare, names, span: span::join(&start, &end) }))
}

fn parse_object_body(lexer: &mut SpannedLexer, start: Span, count: i64, names: Vec<String>) -> Result<Stmt, WenyanError> {
    if names.len() != count.max(0) as usize {
        return Err(WenyanError::grammar(
            format!("declared {count} objects but named {} variables", names.len()),
            peek_span(lexer),
        ));
    }
    lexer.next(); // EndNameHead
    let (end_name, _) = expect_ident(lexer)?;

    let mut props = Vec::new();
    while !peek_is(lexer, &Token::EndObjTail) {
        expect(lexer, &Token::HaveWu, "`吾有` to start an object property")?;
        expect_int(lexer, "a count")?;
        let (prop_tag, _) = expect_type_tag(lexer)?;
        expect(lexer, &Token::Said, "`曰` before the property's value")?;
        let value = parse_value(lexer)?;
        expect(lexer, &Token::NameIt, "`名之曰` before the property's name")?;
        let (prop_name, _) = expect_ident(lexer)?;
        props.push((prop_name, prop_tag, value));
    }
    let tail_span = expect(lexer, &Token::EndObjTail, "`之物也`")?;

    Ok(Stmt::Object(ObjectDef {
        count,
        names,
        props,
        end_name,
        span: span::join(&start, &tail_span),
    }))
}

fn parse_function_def(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    expect(lexer, &Token::NameIt, "`名之曰` before the function's name")?;
    let (name, _) = expect_ident(lexer)?;

    let mut param_groups = Vec::new();
    let mut rest_param = None;

    if peek_is(lexer, &Token::WantParams) {
        lexer.next();
        let group_start = peek_span(lexer);
        let first = parse_param_group_or_rest(lexer, group_start.clone())?;
        match first {
            ParamOrRest::Group(g) => param_groups.push(g),
            ParamOrRest::Rest(r) => rest_param = Some(r),
        }
        while peek_is(lexer, &Token::ParamAlso) {
            lexer.next();
            let span = peek_span(lexer);
            match parse_param_group_or_rest(lexer, span)? {
                ParamOrRest::Group(g) => param_groups.push(g),
                ParamOrRest::Rest(r) => rest_param = Some(r),
            }
        }
    }

    expect(lexer, &Token::FuncBodyHead, "`乃行是術曰` before the function body")?;
    let body = parse_block_until(lexer, &[Token::EndNameHead])?;
    expect(lexer, &Token::EndNameHead, "`是謂` before the function's closing name")?;
    let (end_name, end_span) = expect_ident(lexer)?;
    if end_name != name {
        return Err(WenyanError::grammar(
            format!("function closing name `{end_name}` does not match its opening name `{name}`"),
            end_span,
        ));
    }
    let tail_span = expect(lexer, &Token::EndFuncTail, "`之術也`")?;

    Ok(Stmt::FunctionDef(FunctionDef {
        name,
        param_groups,
        rest_param,
        body,
        end_name,
        span: span::join(&start, &tail_span),
    }))
}

enum ParamOrRest {
    Group(ParamGroup),
    Rest(RestParam),
}

fn parse_param_group_or_rest(lexer: &mut SpannedLexer, start: Span) -> Result<ParamOrRest, WenyanError> {
    if peek_is(lexer, &Token::RestOf) {
        lexer.next();
        let (type_tag, _) = expect_type_tag(lexer)?;
        expect(lexer, &Token::NameIt, "`名之曰` before the rest parameter's name")?;
        let (name, end_span) = expect_ident(lexer)?;
        return Ok(ParamOrRest::Rest(RestParam { type_tag, name, span: span::join(&start, &end_span) }));
    }

    expect(lexer, &Token::ParamHead, "`必先得` before a parameter group")?;
    let (count, _) = expect_int(lexer, "a parameter count")?;
    let (type_tag, _) = expect_type_tag(lexer)?;
    expect(lexer, &Token::NameIt, "`名之曰` before the parameter names")?;
    let mut names = vec![expect_ident(lexer)?.0];
    let mut end_span = start.clone();
    while let Some((Token::Ident(_), _)) = lexer.peek() {
        let (n, s) = expect_ident(lexer)?;
        names.push(n);
        end_span = s;
    }
    Ok(ParamOrRest::Group(ParamGroup { count, type_tag, names, span: span::join(&start, &end_span) }))
}

fn parse_if(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next(); // If
    let mut clauses = Vec::new();
    let cond = Cond::Expr(parse_if_expr(lexer)?);
    expect(lexer, &Token::Then, "`者` after the condition")?;
    let body = parse_block_until(lexer, &[Token::ElseIf, Token::IfFalseOrElse, Token::EndYe])?;
    let clause_span = peek_span(lexer);
    clauses.push(Clause { cond, body, span: clause_span });

    while peek_is(lexer, &Token::ElseIf) {
        lexer.next();
        let cond = Cond::Expr(parse_if_expr(lexer)?);
        expect(lexer, &Token::Then, "`者` after the condition")?;
        let body = parse_block_until(lexer, &[Token::ElseIf, Token::IfFalseOrElse, Token::EndYe])?;
        let clause_span = peek_span(lexer);
        clauses.push(Clause { cond, body, span: clause_span });
    }

    let else_body = if peek_is(lexer, &Token::IfFalseOrElse) {
        lexer.next();
        Some(parse_block_until(lexer, &[Token::EndYe])?)
    } else {
        None
    };

    let tail_span = expect(lexer, &Token::EndYe, "`也` to close the conditional")?;
    Ok(Stmt::If(If { clauses, else_body, span: span::join(&start, &tail_span) }))
}

/// The two degenerate constant-condition forms named in §4/§8: `若其然者`
/// always runs its body, `若其不然者` never does.
fn parse_degenerate_if(lexer: &mut SpannedLexer, start: Span, always: bool) -> Result<Stmt, WenyanError> {
    lexer.next();
    let body = parse_block_until(lexer, &[Token::EndYe])?;
    let tail_span = expect(lexer, &Token::EndYe, "`也` to close the conditional")?;
    let span = span::join(&start, &tail_span);
    Ok(Stmt::If(If {
        clauses: vec![Clause { cond: Cond::Const(always), body, span: span.clone() }],
        else_body: None,
        span,
    }))
}

fn parse_for(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next(); // ForHead
    let value = parse_value(lexer)?;

    if peek_is(lexer, &Token::ForArrOf) {
        lexer.next();
        let (name, _) = expect_ident(lexer)?;
        let body = parse_block_until(lexer, &[Token::EndCo])?;
        let tail_span = expect(lexer, &Token::EndCo, "`云云` to close the loop")?;
        return Ok(Stmt::ForArr(ForArr { array: value, name, body, span: span::join(&start, &tail_span) }));
    }

    expect(lexer, &Token::Times, "`遍` after the loop count")?;
    let body = parse_block_until(lexer, &[Token::EndCo])?;
    let tail_span = expect(lexer, &Token::EndCo, "`云云` to close the loop")?;
    Ok(Stmt::ForEnum(ForEnum { count: value, body, span: span::join(&start, &tail_span) }))
}

fn parse_for_forever(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let body = parse_block_until(lexer, &[Token::EndCo])?;
    let tail_span = expect(lexer, &Token::EndCo, "`云云` to close the loop")?;
    Ok(Stmt::ForForever(ForForever { body, span: span::join(&start, &tail_span) }))
}

/// Desugars `如事不諧 <cond> 者` into an `If` wrapping a bare `Break`, so the
/// evaluator never needs a separate conditional-break construct.
fn parse_break_if(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let cond = Cond::Expr(parse_if_expr(lexer)?);
    let then_span = expect(lexer, &Token::Then, "`者` after the condition")?;
    let span = span::join(&start, &then_span);
    Ok(Stmt::If(If {
        clauses: vec![Clause { cond, body: vec![Stmt::Break(span.clone())], span: span.clone() }],
        else_body: None,
        span,
    }))
}

fn parse_try(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let body = parse_block_until(lexer, &[Token::CatchTyped, Token::CatchAll])?;

    let mut catches = Vec::new();
    let mut seen_catch_all = false;
    while matches!(lexer.peek(), Some((Token::CatchTyped, _)) | Some((Token::CatchAll, _))) {
        if seen_catch_all {
            return Err(WenyanError::grammar("a catch-all `不知何禍歟` must be the last catch clause", peek_span(lexer)));
        }
        let catch_start = peek_span(lexer);
        let (head, _) = lexer.next().unwrap();
        let kind = if head == Token::CatchTyped {
            let value = parse_value(lexer)?;
            expect(lexer, &Token::CatchTail, "`之禍歟` after the error type")?;
            CatchKind::Typed(value)
        } else {
            seen_catch_all = true;
            CatchKind::Any
        };
        let bind = if let Some((Token::Ident(_), _)) = lexer.peek() {
            Some(expect_ident(lexer)?.0)
        } else {
            None
        };
        let body = parse_block_until(lexer, &[Token::CatchTyped, Token::CatchAll, Token::EndYe])?;
        let end_span = peek_span(lexer);
        catches.push(Catch { kind, bind, body, span: span::join(&catch_start, &end_span) });
    }

    if catches.is_empty() {
        return Err(WenyanError::grammar("a `如其` block needs at least one catch clause", peek_span(lexer)));
    }

    let tail_span = expect(lexer, &Token::EndYe, "`也` to close the try block")?;
    Ok(Stmt::Try(Try { body, catches, span: span::join(&start, &tail_span) }))
}

fn parse_throw(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let value = parse_value(lexer)?;
    let detail = if peek_is(lexer, &Token::Prep) {
        lexer.next();
        Some(parse_value(lexer)?)
    } else {
        None
    };
    let tail_span = expect(lexer, &Token::ThrowTail, "`之禍` to close the throw")?;
    Ok(Stmt::Throw(Throw { value, detail, span: span::join(&start, &tail_span) }))
}

fn parse_assign(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let (target, _) = expect_ident(lexer)?;

    let target_subscript = if peek_is(lexer, &Token::Subscript) {
        lexer.next();
        Some(parse_value(lexer)?)
    } else {
        None
    };

    if peek_is(lexer, &Token::Delete) {
        let tail_span = expect(lexer, &Token::Delete, "`不復存矣`")?;
        return Ok(Stmt::Assign(Assign {
            target,
            target_subscript,
            rhs: AssignRhs::Delete,
            span: span::join(&start, &tail_span),
        }));
    }

    expect(lexer, &Token::Then, "`者` after the assignment target")?;
    expect(lexer, &Token::AssignNow, "`今` before the new value")?;
    let value = parse_value(lexer)?;
    let subscript = if peek_is(lexer, &Token::Subscript) {
        lexer.next();
        Some(parse_value(lexer)?)
    } else {
        None
    };
    let tail_span = expect(lexer, &Token::AssignEnd, "`是也` to close the assignment")?;

    Ok(Stmt::Assign(Assign {
        target,
        target_subscript,
        rhs: AssignRhs::Value { value, subscript },
        span: span::join(&start, &tail_span),
    }))
}

fn parse_import(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let mut path = vec![parse_import_segment(lexer)?];
    while peek_is(lexer, &Token::ImportSep) {
        lexer.next();
        path.push(parse_import_segment(lexer)?);
    }
    let mut span = expect(lexer, &Token::ImportPathEnd, "`之書` after the import path")?;

    let imported = if peek_is(lexer, &Token::ImportNamesHead) {
        lexer.next();
        let mut names = vec![expect_ident(lexer)?.0];
        while let Some((Token::Ident(_), _)) = lexer.peek() {
            names.push(expect_ident(lexer)?.0);
        }
        span = expect(lexer, &Token::ImportNamesEnd, "`之義` after the imported names")?;
        Some(names)
    } else {
        None
    };

    Ok(Stmt::Import(Import { path, imported, span: span::join(&start, &span) }))
}

fn parse_import_segment(lexer: &mut SpannedLexer) -> Result<ImportSegment, WenyanError> {
    let (token, span) = next_token(lexer, "an import path segment")?;
    match token {
        Token::StringLit(s) => Ok(ImportSegment::Str(s)),
        Token::Ident(s) => Ok(ImportSegment::Ident(s)),
        other => Err(WenyanError::grammar(format!("expected an import path segment, found {other}"), span)),
    }
}

fn parse_math(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    let (op_token, _) = lexer.next().unwrap();
    let op = match op_token {
        Token::Add => MathOp::Add,
        Token::Sub => MathOp::Sub,
        Token::Mul => MathOp::Mul,
        Token::Div => MathOp::Div,
        _ => unreachable!("caller matched an arithmetic token"),
    };
    let lhs = parse_value(lexer)?;
    expect(lexer, &Token::Prep, "`以` between the operands")?;
    let rhs = parse_value(lexer)?;
    let modulo = peek_is(lexer, &Token::Modulo);
    let end_span = if modulo { lexer.next().unwrap().1 } else { rhs.span.clone() };
    Ok(Stmt::Expr(ExprStmt {
        expr: Expr::Math(Math { op, lhs, rhs, modulo }),
        span: span::join(&start, &end_span),
    }))
}

fn parse_not_stmt(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let value = parse_value(lexer)?;
    let span = span::join(&start, &value.span.clone());
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Not(value), span }))
}

fn parse_concat(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let lhs = parse_value(lexer)?;
    expect(lexer, &Token::Prep, "`以` between the operands")?;
    let rhs = parse_value(lexer)?;
    let span = span::join(&start, &rhs.span.clone());
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Concat { lhs, rhs }, span }))
}

fn parse_push(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let value = parse_value(lexer)?;
    expect(lexer, &Token::PrepAt, "`於` before the target array")?;
    let target = parse_value(lexer)?;
    let span = span::join(&start, &target.span.clone());
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Push { target, value }, span }))
}

/// `施 ƒ (於 arg)*`: call `ƒ` with each `於`-prefixed argument in order.
fn parse_call_prefix(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let callee = parse_value(lexer)?;
    let mut args = Vec::new();
    let mut end_span = callee.span.clone();
    while peek_is(lexer, &Token::PrepAt) {
        lexer.next();
        let arg = parse_value(lexer)?;
        end_span = arg.span.clone();
        args.push(arg);
    }
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Call { callee, args }, span: span::join(&start, &end_span) }))
}

/// `以 a ƒ`: call `ƒ` with the single preceding argument `a`.
fn parse_call_postfix(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    lexer.next();
    let arg = parse_value(lexer)?;
    let callee = parse_value(lexer)?;
    let span = span::join(&start, &callee.span.clone());
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Call { callee, args: vec![arg] }, span }))
}

/// Statements that begin with a bare `value`: a plain reference (`Bare`), a
/// subscript (`值之索引`), a length query (`值之長`), or a standalone logic
/// probe (`值等於值`, with no `者` following).
fn parse_value_led_stmt(lexer: &mut SpannedLexer, start: Span) -> Result<Stmt, WenyanError> {
    let value = parse_value(lexer)?;

    if peek_is(lexer, &Token::Length) {
        lexer.next();
        let span = span::join(&start, &value.span.clone());
        return Ok(Stmt::Expr(ExprStmt { expr: Expr::Length { target: value }, span }));
    }

    if peek_is(lexer, &Token::Subscript) {
        lexer.next();
        let index = parse_value(lexer)?;
        let span = span::join(&start, &index.span.clone());
        return Ok(Stmt::Expr(ExprStmt { expr: Expr::Subscript { target: value, index }, span }));
    }

    if matches!(
        lexer.peek(),
        Some((Token::Eq, _))
            | Some((Token::Neq, _))
            | Some((Token::Gt, _))
            | Some((Token::Lt, _))
            | Some((Token::Ge, _))
            | Some((Token::Le, _))
            | Some((Token::And, _))
            | Some((Token::Or, _))
    ) {
        let first = IfAtom { negated: false, value };
        let mut rest = Vec::new();
        while let Some(op) = parse_logic_op(lexer) {
            rest.push((op, parse_if_atom(lexer)?));
        }
        let span = start;
        return Ok(Stmt::Expr(ExprStmt { expr: Expr::LogicProbe(IfExpr { first, rest }), span }));
    }

    let span = value.span.clone();
    Ok(Stmt::Expr(ExprStmt { expr: Expr::Bare(value), span }))
}
