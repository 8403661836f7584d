//! Decoder for the compound Chinese numeral system (§4.1 of the design doc).
//!
//! A numeral is a run of digit/multiplier characters, optionally prefixed
//! with the negation character and optionally containing a decimal point
//! character, optionally followed by one or more `又 <digits> <fraction unit>`
//! clauses. Decoding is a pure function of the character sequence, per the
//! "Numeric roundtrip" testable property.

use phf::phf_map;

/// A decoded numeral: either an arbitrary (within `i64` range) integer or a
/// double-precision float, mirroring `Token::IntNum` / `Token::FloatNum`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeral {
    Int(i64),
    Float(f64),
}

const NEGATE: char = '負';
const POINT: char = '·';

static DIGITS: phf::Map<char, i64> = phf_map! {
    '零' => 0, '〇' => 0,
    '一' => 1, '二' => 2, '三' => 3, '四' => 4, '五' => 5,
    '六' => 6, '七' => 7, '八' => 8, '九' => 9,
};

/// Small multipliers: combine additively within one myriad section.
static SMALL_UNITS: phf::Map<char, i64> = phf_map! {
    '十' => 10,
    '百' => 100,
    '千' => 1_000,
};

/// Large (myriad-grouped) multipliers. Each level is `10^4` above the last,
/// per the traditional 萬進 system: `萬=10⁴, 億=10⁸, 兆=10¹², …`.
static LARGE_UNITS: phf::Map<char, i64> = phf_map! {
    '萬' => 10_i64.pow(4),
    '億' => 10_i64.pow(8),
    '兆' => 10_i64.pow(12),
    '京' => 10_i64.pow(16),
    '垓' => 10_i64.pow(20),
    '秭' => 10_i64.pow(24),
    '穣' => 10_i64.pow(28),
    '溝' => 10_i64.pow(32),
    '澗' => 10_i64.pow(36),
    '正' => 10_i64.pow(40),
    '載' => 10_i64.pow(44),
    '極' => 10_i64.pow(48),
};

static FRACTION_UNITS: phf::Map<char, i32> = phf_map! {
    '分' => -1, '釐' => -2, '毫' => -3, '絲' => -4,
    '忽' => -5, '微' => -6, '纖' => -7, '沙' => -8,
    '塵' => -9, '埃' => -10, '渺' => -11, '漠' => -12,
};

/// Error returned when a character run cannot be decoded, or the decoded
/// integer does not fit in `i64` (the chosen overflow policy; see
/// `DESIGN.md`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumeralError(pub String);

/// Decode the integer value of a digit/multiplier run containing no decimal
/// point and no leading negation sign. Empty input decodes to zero, which
/// happens for a dangling trailing run (callers reject that case).
fn decode_unsigned_int(chars: &[char]) -> Result<i64, NumeralError> {
    let mut total: i64 = 0;
    let mut section: i64 = 0;
    let mut pending_digit: Option<i64> = None;

    for &ch in chars {
        if let Some(&d) = DIGITS.get(&ch) {
            pending_digit = Some(d);
        } else if let Some(&unit) = SMALL_UNITS.get(&ch) {
            let d = pending_digit.take().unwrap_or(1);
            section = section
                .checked_add(
                    d.checked_mul(unit)
                        .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?,
                )
                .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?;
        } else if let Some(&unit) = LARGE_UNITS.get(&ch) {
            if let Some(d) = pending_digit.take() {
                section = section
                    .checked_add(d)
                    .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?;
            }
            let multiplier = if section == 0 { 1 } else { section };
            total = total
                .checked_add(
                    multiplier
                        .checked_mul(unit)
                        .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?,
                )
                .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?;
            section = 0;
        } else {
            return Err(NumeralError(format!("`{}` is not a numeral character", ch)));
        }
    }

    if let Some(d) = pending_digit.take() {
        section = section
            .checked_add(d)
            .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))?;
    }

    total
        .checked_add(section)
        .ok_or_else(|| NumeralError("numeral overflows i64".to_string()))
}

/// Decode a run of plain digit characters (no multipliers) as a fractional
/// tail, one character per decimal place: `五` after the point is `0.5`,
/// `五零` is `0.50`.
fn decode_fraction_tail(chars: &[char]) -> Result<f64, NumeralError> {
    let mut value = 0.0;
    for (i, &ch) in chars.iter().enumerate() {
        let d = *DIGITS
            .get(&ch)
            .ok_or_else(|| NumeralError(format!("`{}` is not a digit", ch)))?;
        value += d as f64 * 10f64.powi(-(i as i32 + 1));
    }
    Ok(value)
}

/// Decode a lexeme matched by the `INT_NUM` / head-integer-with-point
/// regex. Handles the leading `負` negation and the inline `·` decimal
/// point form. Does not handle the `又 … <fraction unit>` enumerated form;
/// see [`decode_with_fraction_clauses`].
pub fn decode(lexeme: &str) -> Result<Numeral, NumeralError> {
    let mut chars: Vec<char> = lexeme.chars().collect();

    let negative = chars.first() == Some(&NEGATE);
    if negative {
        chars.remove(0);
    }

    if let Some(point_index) = chars.iter().position(|&c| c == POINT) {
        let head = decode_unsigned_int(&chars[..point_index])?;
        let tail = decode_fraction_tail(&chars[point_index + 1..])?;
        let magnitude = head as f64 + tail;
        return Ok(Numeral::Float(if negative { -magnitude } else { magnitude }));
    }

    let magnitude = decode_unsigned_int(&chars)?;
    Ok(Numeral::Int(if negative { -magnitude } else { magnitude }))
}

/// Decode the full lexeme of the `又 <digits> <fraction unit>` repeated
/// form, where `head` is the run before the first `又` and `clauses` is the
/// already-split sequence of `(digit run, fraction unit char)` pairs
/// following it, in source order.
pub fn decode_with_fraction_clauses(
    head: &str,
    clauses: &[(&str, char)],
) -> Result<Numeral, NumeralError> {
    let head_numeral = decode(head)?;
    let (negative, mut magnitude) = match head_numeral {
        Numeral::Int(i) => (i < 0, i.unsigned_abs() as f64),
        Numeral::Float(f) => (f < 0.0, f.abs()),
    };

    for (digits, unit_char) in clauses {
        let exponent = *FRACTION_UNITS
            .get(unit_char)
            .ok_or_else(|| NumeralError(format!("`{}` is not a fraction unit", unit_char)))?;
        let digit_chars: Vec<char> = digits.chars().collect();
        let place_value = decode_unsigned_int(&digit_chars)? as f64;
        magnitude += place_value * 10f64.powi(exponent);
    }

    Ok(Numeral::Float(if negative { -magnitude } else { magnitude }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_digit_variants() {
        assert_eq!(decode("零").unwrap(), Numeral::Int(0));
        assert_eq!(decode("〇").unwrap(), Numeral::Int(0));
    }

    #[test]
    fn bare_multiplier_is_one_times() {
        assert_eq!(decode("百").unwrap(), Numeral::Int(100));
        assert_eq!(decode("萬").unwrap(), Numeral::Int(10_000));
    }

    #[test]
    fn simple_compound() {
        assert_eq!(decode("一百二十三").unwrap(), Numeral::Int(123));
    }

    #[test]
    fn myriad_sections_combine() {
        assert_eq!(decode("一億二千萬").unwrap(), Numeral::Int(120_000_000));
    }

    #[test]
    fn negation() {
        assert_eq!(decode("負一百二十三").unwrap(), Numeral::Int(-123));
    }

    #[test]
    fn dot_form_float() {
        match decode("一·五").unwrap() {
            Numeral::Float(f) => assert!((f - 1.5).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn fraction_clause_form() {
        // 三又五分 = 3.5
        let decoded = decode_with_fraction_clauses("三", &[("五", '分')]).unwrap();
        match decoded {
            Numeral::Float(f) => assert!((f - 3.5).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn unknown_char_errors() {
        assert!(decode("X").is_err());
    }
}
