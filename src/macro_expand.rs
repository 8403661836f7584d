//! Token-stream rewriting for `或云 <literal> 蓋謂 <literal>` macro
//! declarations (§4.2).
//!
//! Macros are detected and applied as a second pass over the already
//! lexed, spanned token stream, rather than reaching back into the raw
//! source — this keeps the lexer itself a pure, total function of the
//! input text (§8 property 1) and lets the expander reason about whole
//! tokens instead of characters, which is what makes "do not rewrite
//! inside a `STRING_LITERAL`" (§8 property 4) trivial: a string literal is
//! already a single token by the time this pass runs.
//!
//! An identifier-sourced macro (`或云「X」…`) only ever rewrites `Ident`
//! occurrences of `X` — this is what keeps the non-penetration property
//! (§8 property 4) true for a macro whose name happens to also spell out
//! some unrelated string literal's contents. A string-literal-sourced
//! macro (`或云「「X」」…`) is less restricted: it rewrites both
//! `StringLit` and `Ident` occurrences of `X`, since the worked "Macro"
//! scenario (§8) declares its source and replacement with the
//! double-bracket/string form but then *uses* the rewritten name as a
//! plain, single-bracket identifier (`施「double」於四`) — the replacement
//! is adapted to whichever bracket form the occurrence itself used.

use crate::error::WenyanError;
use crate::span::Span;
use crate::token::Token;

/// What a macro rewrites: either a bare identifier lexeme or a string
/// literal lexeme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum MacroSource {
    Ident(String),
    StringLit(String),
}

/// Adapt a replacement token to the bracket form of the occurrence it is
/// replacing: an `Ident`/`StringLit` replacement takes on the occurrence's
/// own kind, carrying over only its text. Any other replacement token (a
/// keyword produced by an unbracketed replacement, e.g. plain `加`) is
/// emitted verbatim, since it has no bracket form to adapt.
fn adapt_replacement_token(replacement: &Token, occurrence: &Token) -> Token {
    match (replacement, occurrence) {
        (Token::Ident(name), Token::Ident(_)) => Token::Ident(name.clone()),
        (Token::Ident(name), Token::StringLit(_)) => Token::StringLit(name.clone()),
        (Token::StringLit(text), Token::Ident(_)) => Token::Ident(text.clone()),
        (Token::StringLit(text), Token::StringLit(_)) => Token::StringLit(text.clone()),
        (other, _) => other.clone(),
    }
}

struct MacroRule {
    source: MacroSource,
    replacement: Vec<Token>,
}

/// An ordered table of macro rewrite rules. Insertion order is preserved
/// because later macros may reference identifiers introduced by earlier
/// ones (§3 "Macro table").
#[derive(Default)]
pub struct MacroTable {
    rules: Vec<MacroRule>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a new rule. Rejects a macro whose source was already used
    /// as a *source* by an earlier rule, which bounds expansion passes and
    /// prevents runaway rewrite cycles (§9 "reject recursive definitions
    /// at registration").
    fn register(&mut self, source: MacroSource, replacement: Vec<Token>, at: Span) -> Result<(), WenyanError> {
        if self.rules.iter().any(|r| r.source == source) {
            return Err(WenyanError::grammar(
                "a macro may not redefine a source that was already registered as a macro source",
                at,
            ));
        }
        self.rules.push(MacroRule { source, replacement });
        Ok(())
    }

    pub fn register_ident(&mut self, name: String, replacement: Vec<Token>, at: Span) -> Result<(), WenyanError> {
        self.register(MacroSource::Ident(name), replacement, at)
    }

    pub fn register_string(&mut self, text: String, replacement: Vec<Token>, at: Span) -> Result<(), WenyanError> {
        self.register(MacroSource::StringLit(text), replacement, at)
    }

    /// Rewrite a single token if some rule's source matches it. An `Ident`
    /// occurrence matches either an identifier-sourced or a
    /// string-literal-sourced rule with the same text; a `StringLit`
    /// occurrence only matches a string-literal-sourced rule (identifier
    /// sources never penetrate string literals, §8 property 4). Returns
    /// `None` when no rule applies.
    fn rewrite(&self, token: &Token) -> Option<Vec<Token>> {
        let rule = match token {
            Token::Ident(name) => self.rules.iter().find(|r| match &r.source {
                MacroSource::Ident(s) | MacroSource::StringLit(s) => s == name,
            }),
            Token::StringLit(text) => self.rules.iter().find(|r| matches!(&r.source, MacroSource::StringLit(s) if s == text)),
            _ => None,
        }?;
        Some(rule.replacement.iter().map(|t| adapt_replacement_token(t, token)).collect())
    }
}

/// Apply the macro table to a spanned token stream. Tokens produced by a
/// rewrite inherit the span of the token they replaced, so downstream
/// diagnostics still point at a sensible location even though the
/// replacement text never existed at that offset.
pub fn expand(tokens: Vec<(Token, Span)>, table: &MacroTable) -> Vec<(Token, Span)> {
    let mut out = Vec::with_capacity(tokens.len());
    for (token, span) in tokens {
        match table.rewrite(&token) {
            Some(replacement) => {
                out.extend(replacement.into_iter().map(|t| (t, span.clone())));
            }
            None => out.push((token, span)),
        }
    }
    out
}

/// Strip `或云 <source> 蓋謂 <replacement>` macro declarations out of the
/// token stream, registering each one as it is encountered, and rewrite
/// every other token against the table built so far. A single linear pass
/// keeps the rule "a macro only rewrites tokens after its own declaration"
/// (§4.2) without a separate collection pass: by the time token `n` is
/// considered for rewriting, every macro declared at or before `n` is
/// already registered, and any declared later simply hasn't been reached
/// yet.
///
/// The parser never sees `MacroHead`/`MacroAs` — macro declarations are
/// fully consumed here, which is why `ast::Stmt` has no macro-definition
/// variant.
pub fn extract_and_expand(tokens: Vec<(Token, Span)>) -> Result<Vec<(Token, Span)>, WenyanError> {
    let mut table = MacroTable::new();
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some((token, span)) = iter.next() {
        if token != Token::MacroHead {
            match table.rewrite(&token) {
                Some(replacement) => out.extend(replacement.into_iter().map(|t| (t, span.clone()))),
                None => out.push((token, span)),
            }
            continue;
        }

        let (source_token, source_span) = iter
            .next()
            .ok_or_else(|| WenyanError::grammar("expected a macro source after `或云`", span.clone()))?;
        let source_text = match &source_token {
            Token::Ident(name) => MacroSourceText::Ident(name.clone()),
            Token::StringLit(text) => MacroSourceText::StringLit(text.clone()),
            other => {
                return Err(WenyanError::grammar(
                    format!("macro source must be an identifier or string literal, found {other}"),
                    source_span,
                ))
            }
        };

        match iter.next() {
            Some((Token::MacroAs, _)) => {}
            Some((_, bad_span)) => return Err(WenyanError::grammar("expected `蓋謂` in macro declaration", bad_span)),
            None => return Err(WenyanError::grammar("expected `蓋謂` in macro declaration", source_span)),
        }

        let (replacement_token, replacement_span) = iter
            .next()
            .ok_or_else(|| WenyanError::grammar("expected a macro replacement after `蓋謂`", span.clone()))?;

        match source_text {
            MacroSourceText::Ident(name) => table.register_ident(name, vec![replacement_token], replacement_span)?,
            MacroSourceText::StringLit(text) => table.register_string(text, vec![replacement_token], replacement_span)?,
        }
    }

    Ok(out)
}

enum MacroSourceText {
    Ident(String),
    StringLit(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex(source: &str) -> Vec<(Token, Span)> {
        Token::lexer(source).spanned().collect()
    }

    #[test]
    fn identifier_macro_rewrites_later_occurrences() {
        let mut table = MacroTable::new();
        table
            .register_ident("double".to_string(), lex("「加倍」").into_iter().map(|(t, _)| t).collect(), 0..0)
            .unwrap();

        let tokens = lex("「double」");
        let expanded = expand(tokens, &table);
        assert_eq!(expanded[0].0, Token::Ident("加倍".to_string()));
    }

    #[test]
    fn string_macro_also_rewrites_a_matching_identifier_occurrence() {
        let mut table = MacroTable::new();
        table
            .register_string("double".to_string(), lex("「「twice」」").into_iter().map(|(t, _)| t).collect(), 0..0)
            .unwrap();

        let tokens = lex("「double」");
        let expanded = expand(tokens, &table);
        // The worked Macro scenario declares both source and replacement with
        // the double-bracket (string) form, then calls the rewritten name as
        // a plain identifier — the replacement is adapted to the occurrence's
        // own bracket kind (here, Ident).
        assert_eq!(expanded[0].0, Token::Ident("twice".to_string()));
    }

    #[test]
    fn identifier_macro_does_not_rewrite_a_string_literal_occurrence() {
        let mut table = MacroTable::new();
        table
            .register_ident("double".to_string(), lex("「加倍」").into_iter().map(|(t, _)| t).collect(), 0..0)
            .unwrap();

        let tokens = lex("「「double」」");
        let expanded = expand(tokens, &table);
        assert_eq!(expanded[0].0, Token::StringLit("double".to_string()));
    }

    #[test]
    fn macro_does_not_penetrate_string_literal_bodies() {
        let mut table = MacroTable::new();
        table
            .register_ident("甲".to_string(), lex("「乙」").into_iter().map(|(t, _)| t).collect(), 0..0)
            .unwrap();

        // The literal text "甲" lives inside a string literal's body; lexing
        // already turned it into one opaque StringLit token before the
        // macro pass ever runs, so there is nothing for the rule to match.
        let tokens = lex("「「甲」」");
        let expanded = expand(tokens, &table);
        assert_eq!(expanded[0].0, Token::StringLit("甲".to_string()));
    }

    #[test]
    fn extract_and_expand_strips_declarations_and_rewrites_forward_uses() {
        let tokens = lex("或云「甲」蓋謂「乙」「甲」");
        let out = extract_and_expand(tokens).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Token::Ident("乙".to_string()));
    }

    #[test]
    fn extract_and_expand_does_not_rewrite_uses_before_declaration() {
        let tokens = lex("「甲」或云「甲」蓋謂「乙」");
        let out = extract_and_expand(tokens).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Token::Ident("甲".to_string()));
    }

    #[test]
    fn redefining_a_macro_source_is_rejected() {
        let mut table = MacroTable::new();
        table
            .register_ident("甲".to_string(), lex("「乙」").into_iter().map(|(t, _)| t).collect(), 0..0)
            .unwrap();
        let err = table.register_ident("甲".to_string(), lex("「丙」").into_iter().map(|(t, _)| t).collect(), 1..1);
        assert!(err.is_err());
    }
}
