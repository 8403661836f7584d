//! Romanization table for `--roman` diagnostics (CLI surface). Looked up
//! only when rendering an already-built diagnostic message — this never
//! touches the token stream, so `--roman` has no effect on lexing, parsing,
//! or evaluation.

use lazy_static::lazy_static;
use phf::phf_map;

static ROMAN: phf::Map<&'static str, &'static str> = phf_map! {
    "吾有" => "wú yǒu",
    "今有" => "jīn yǒu",
    "名之曰" => "míng zhī yuē",
    "曰" => "yuē",
    "數" => "shù",
    "言" => "yán",
    "爻" => "yáo",
    "列" => "liè",
    "物" => "wù",
    "元" => "yuán",
    "陰" => "yīn",
    "陽" => "yáng",
    "若其然者" => "ruò qí rán zhě",
    "若其不然者" => "ruò qí bù rán zhě",
    "若非" => "ruò fēi",
    "若" => "ruò",
    "者" => "zhě",
    "也" => "yě",
    "為是" => "wéi shì",
    "中之" => "zhōng zhī",
    "遍" => "biàn",
    "云云" => "yún yún",
    "姑妄行此" => "gū wàng xíng cǐ",
    "乃止是遍" => "nǎi zhǐ shì biàn",
    "如事不諧" => "rú shì bù xié",
    "如其" => "rú qí",
    "不知何禍歟" => "bù zhī hé huò yú",
    "之禍歟" => "zhī huò yú",
    "豈" => "qǐ",
    "嗚呼" => "wū hū",
    "之禍" => "zhī huò",
    "昔之" => "xī zhī",
    "不復存矣" => "bù fù cún yǐ",
    "是謂" => "shì wèi",
    "之術也" => "zhī shù yě",
    "之物也" => "zhī wù yě",
    "乃得矣" => "nǎi dé yǐ",
    "乃得" => "nǎi dé",
    "乃歸空無" => "nǎi guī kōng wú",
    "施" => "shī",
    "以" => "yǐ",
    "於" => "yú",
    "加" => "jiā",
    "減" => "jiǎn",
    "乘" => "chéng",
    "除" => "chú",
    "所餘幾何" => "suǒ yú jǐ hé",
    "變" => "biàn",
    "併" => "bìng",
    "充" => "chōng",
    "書之" => "shū zhī",
    "其" => "qí",
};

lazy_static! {
    /// Keys sorted longest-first, built once, so matching always prefers a
    /// multi-character keyword over a single-character one it contains
    /// (e.g. `之禍歟` over `之禍`).
    static ref ROMAN_KEYS_BY_LENGTH: Vec<&'static str> = {
        let mut keys: Vec<&'static str> = ROMAN.keys().copied().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
        keys
    };
}

/// Annotate every recognized keyword substring of `message` with its
/// romanization, for `--roman` diagnostics.
pub fn romanize_message(message: &str) -> String {
    let mut out = String::new();
    let mut rest = message;
    'outer: while !rest.is_empty() {
        for key in ROMAN_KEYS_BY_LENGTH.iter() {
            if rest.starts_with(key) {
                out.push_str(key);
                out.push_str(" (");
                out.push_str(ROMAN.get(key).copied().unwrap_or(""));
                out.push(')');
                rest = &rest[key.len()..];
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
            rest = chars.as_str();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn romanizes_known_keyword() {
        let result = romanize_message("expected `吾有` before a declaration");
        assert!(result.contains("wú yǒu"));
    }

    #[test]
    fn prefers_longer_keyword_match() {
        let result = romanize_message("之禍歟");
        assert!(result.contains("zhī huò yú"));
        assert!(!result.contains("zhī huò)"));
    }

    #[test]
    fn leaves_unknown_text_untouched() {
        assert_eq!(romanize_message("hello"), "hello");
    }
}
