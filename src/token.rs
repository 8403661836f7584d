//! Lexer that recognizes Wenyan's keyword vocabulary and literal forms.
//!
//! `logos`'s generated scanner already performs longest-match token
//! selection, which is exactly the discipline §4.1 requires for keyword
//! prefixes such as `若` / `若其然者` / `若其不然者`: at any position, the
//! longest registered literal wins, with no explicit priority needed
//! because none of the keyword literals share a length with a competing
//! pattern the way the teacher's bare-word opcodes did.

use std::fmt;

use logos::{Lexer, Logos};

use crate::numeral::{self, Numeral};

fn lex_bracketed(lex: &mut Lexer<Token>, close: &str) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find(close)?;
    let inner = rest[..end].to_string();
    lex.bump(end + close.len());
    Some(inner)
}

fn lex_identifier(lex: &mut Lexer<Token>) -> Option<String> {
    lex_bracketed(lex, "」")
}

fn lex_double_bracket_string(lex: &mut Lexer<Token>) -> Option<String> {
    lex_bracketed(lex, "」」")
}

fn lex_guillemet_string(lex: &mut Lexer<Token>) -> Option<String> {
    lex_bracketed(lex, "』")
}

fn lex_numeral(lex: &mut Lexer<Token>) -> Option<Numeral> {
    numeral::decode(lex.slice()).ok()
}

fn lex_numeral_with_fraction(lex: &mut Lexer<Token>) -> Option<Numeral> {
    let slice = lex.slice();
    let mut parts = slice.split('又');
    let head = parts.next()?;
    let mut clauses: Vec<(String, char)> = Vec::new();
    for part in parts {
        let mut chars: Vec<char> = part.chars().collect();
        let unit_char = chars.pop()?;
        clauses.push((chars.into_iter().collect(), unit_char));
    }
    let refs: Vec<(&str, char)> = clauses.iter().map(|(d, c)| (d.as_str(), *c)).collect();
    numeral::decode_with_fraction_clauses(head, &refs).ok()
}

/// The flat token vocabulary. Variants carrying no payload are pure
/// keyword/punctuation matches; the rest carry their decoded value.
#[derive(Clone, Debug, Logos, PartialEq)]
pub enum Token {
    // --- literals -----------------------------------------------------
    #[token("「「", lex_double_bracket_string)]
    #[token("『", lex_guillemet_string)]
    StringLit(String),

    #[token("「", lex_identifier)]
    Ident(String),

    #[regex(r#"[負·零〇一二三四五六七八九十百千萬億兆京垓秭穣溝澗正載極]+(又[負·零〇一二三四五六七八九十百千萬億兆京垓秭穣溝澗正載極]+[分釐毫絲忽微纖沙塵埃渺漠])+"#, lex_numeral_with_fraction)]
    FloatNum(Numeral),

    #[regex(r#"[負·零〇一二三四五六七八九十百千萬億兆京垓秭穣溝澗正載極]+"#, lex_numeral)]
    IntNum(Numeral),

    // --- comments -------------------------------------------------------
    #[token("注曰")]
    #[token("疏曰")]
    #[token("批曰")]
    CommentHead,

    // --- macro ------------------------------------------------------
    #[token("或云")]
    MacroHead,
    #[token("蓋謂")]
    MacroAs,

    // --- declare / define --------------------------------------------
    #[token("吾有")]
    HaveWu,
    #[token("今有")]
    HaveJin,
    #[token("名之曰")]
    NameIt,
    #[token("曰")]
    Said,

    // --- types & literals of type TYPE --------------------------------
    #[token("數")]
    TypeNum,
    #[token("言")]
    TypeStr,
    #[token("爻")]
    TypeBool,
    #[token("列")]
    TypeArr,
    #[token("物")]
    TypeObj,
    #[token("元")]
    TypeUnit,

    #[token("陰")]
    BoolFalse,
    #[token("陽")]
    BoolTrue,

    #[token("其餘之")]
    RestOf,
    #[token("其餘")]
    Rest,
    #[token("其")]
    It,

    #[token("之長")]
    Length,
    #[token("之")]
    Subscript,

    // --- functions -----------------------------------------------------
    #[token("術")]
    Shu,
    #[token("欲行是術")]
    WantParams,
    #[token("亦必先得")]
    ParamAlso,
    #[token("必先得")]
    ParamHead,
    #[token("乃行是術曰")]
    FuncBodyHead,
    #[token("是謂")]
    EndNameHead,
    #[token("之術也")]
    EndFuncTail,
    #[token("之物也")]
    EndObjTail,
    #[token("乃得矣")]
    ReturnIt,
    #[token("乃得")]
    ReturnValue,
    #[token("乃歸空無")]
    ReturnUnit,

    #[token("施")]
    CallHead,
    #[token("以")]
    Prep,
    #[token("於")]
    PrepAt,

    #[token("加")]
    Add,
    #[token("減")]
    Sub,
    #[token("乘")]
    Mul,
    #[token("除")]
    Div,
    #[token("所餘幾何")]
    Modulo,
    #[token("變")]
    Not,
    #[token("併")]
    Concat,
    #[token("充")]
    Push,
    #[token("書之")]
    Print,

    // --- loops -----------------------------------------------------
    #[token("為是")]
    ForHead,
    #[token("中之")]
    ForArrOf,
    #[token("遍")]
    Times,
    #[token("云云")]
    EndCo,
    #[token("也")]
    EndYe,
    #[token("姑妄行此")]
    LoopForever,
    #[token("乃止是遍")]
    Break,
    #[token("如事不諧")]
    BreakIf,

    // --- conditionals -----------------------------------------------------
    #[token("若其不然者")]
    IfFalseOrElse,
    #[token("若其然者")]
    IfTrue,
    #[token("若非")]
    ElseIf,
    #[token("若")]
    If,
    #[token("者")]
    Then,

    #[token("等於")]
    Eq,
    #[token("不等於")]
    Neq,
    #[token("不大於")]
    Le,
    #[token("不小於")]
    Ge,
    #[token("大於")]
    Gt,
    #[token("小於")]
    Lt,
    #[token("且")]
    And,
    #[token("或")]
    Or,

    // --- try / throw -----------------------------------------------------
    #[token("如其")]
    TryHead,
    #[token("不知何禍歟")]
    CatchAll,
    #[token("豈")]
    CatchTyped,
    #[token("之禍歟")]
    CatchTail,
    #[token("嗚呼")]
    ThrowHead,
    #[token("之禍")]
    ThrowTail,

    // --- assignment -----------------------------------------------------
    #[token("昔之")]
    AssignHead,
    #[token("不復存矣")]
    Delete,
    #[token("今")]
    AssignNow,
    #[token("是也")]
    AssignEnd,

    // --- import -----------------------------------------------------
    #[token("吾嘗觀")]
    ImportHead,
    #[token("中")]
    ImportSep,
    #[token("之書")]
    ImportPathEnd,
    #[token("方悟")]
    ImportNamesHead,
    #[token("之義")]
    ImportNamesEnd,

    #[error]
    #[regex(r"[ \t\r\n　。、，矣]", logos::skip)]
    Error,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringLit(s) => write!(f, "string literal `{s}`"),
            Self::Ident(s) => write!(f, "identifier `{s}`"),
            Self::FloatNum(n) => write!(f, "float `{:?}`", n),
            Self::IntNum(n) => write!(f, "integer `{:?}`", n),
            Self::Error => write!(f, "an unrecognized character"),
            other => write!(f, "`{:?}`", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_match_if_true() {
        let source = "若其然者".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::IfTrue));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn longest_match_else() {
        let source = "若其不然者".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::IfFalseOrElse));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn bare_if_does_not_swallow_then() {
        let source = "若".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::If));
    }

    #[test]
    fn identifier_brackets() {
        let source = "「甲」".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::Ident("甲".to_string())));
    }

    #[test]
    fn double_bracket_string() {
        let source = "「「問天地好在。」」".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(
            lexer.next(),
            Some(Token::StringLit("問天地好在。".to_string()))
        );
    }

    #[test]
    fn guillemet_string() {
        let source = "『hi』".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::StringLit("hi".to_string())));
    }

    #[test]
    fn plain_integer() {
        let source = "三".to_string();
        let mut lexer = Token::lexer(&source);
        assert_eq!(lexer.next(), Some(Token::IntNum(Numeral::Int(3))));
    }

    #[test]
    fn punctuation_is_skipped() {
        let source = "吾有一言。曰「「甲」」。".to_string();
        let mut lexer = Token::lexer(&source);
        let kinds: Vec<Token> = lexer.by_ref().collect();
        assert!(!kinds.iter().any(|t| matches!(t, Token::Error)));
    }
}
