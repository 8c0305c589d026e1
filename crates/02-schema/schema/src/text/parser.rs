//! Parses the protobuf text format into a record.
//!
//! Accepted syntax covers what the printer emits plus the usual hand-written
//! conveniences: `,`/`;` separators, `#` comments, `<...>` blocks, list values,
//! either quote style, adjacent string concatenation, hex and octal integers.

use std::collections::HashSet;

use thiserror::Error;

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::record::Record;
use crate::text::escape::unescape;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct TextError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Str(Vec<u8>),
    Symbol(char),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier {name:?}"),
            Token::Number(text) => format!("number {text}"),
            Token::Str(_) => "string".to_owned(),
            Token::Symbol(ch) => format!("'{ch}'"),
            Token::End => "end of input".to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

/// Clears `record` and fills it from `text`.
///
/// On failure the record may be partially filled.
pub fn parse_text(text: &str, record: &mut dyn Record) -> Result<(), TextError> {
    record.clear();
    let result = tokenize(text).and_then(|tokens| {
        let mut parser = Parser { tokens: &tokens, idx: 0 };
        parser.parse_fields(record, None)
    });
    if let Err(err) = &result {
        tracing::warn!(
            type_name = record.type_name(),
            error = %err,
            "error parsing text-format record"
        );
    }
    result
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, TextError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut idx = 0;
    let mut line = 1;
    let mut line_start = 0;

    loop {
        while idx < bytes.len() {
            match bytes[idx] {
                b'\n' => {
                    idx += 1;
                    line += 1;
                    line_start = idx;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => idx += 1,
                b'#' => {
                    while idx < bytes.len() && bytes[idx] != b'\n' {
                        idx += 1;
                    }
                }
                _ => break,
            }
        }

        let column = idx - line_start + 1;
        let error = |message: String| TextError {
            line,
            column,
            message,
        };
        let Some(&first) = bytes.get(idx) else {
            tokens.push(Spanned {
                token: Token::End,
                line,
                column,
            });
            return Ok(tokens);
        };

        let start = idx;
        let token = if first.is_ascii_alphabetic() || first == b'_' {
            while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
                idx += 1;
            }
            Token::Ident(text[start..idx].to_owned())
        } else if first.is_ascii_digit()
            || (first == b'.' && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit))
        {
            let hex = bytes[idx..].starts_with(b"0x") || bytes[idx..].starts_with(b"0X");
            idx += 1;
            while idx < bytes.len() {
                let byte = bytes[idx];
                let exponent_sign = !hex
                    && (byte == b'+' || byte == b'-')
                    && matches!(bytes[idx - 1], b'e' | b'E');
                if byte.is_ascii_alphanumeric() || byte == b'.' || exponent_sign {
                    idx += 1;
                } else {
                    break;
                }
            }
            Token::Number(text[start..idx].to_owned())
        } else if first == b'"' || first == b'\'' {
            idx += 1;
            let body_start = idx;
            loop {
                match bytes.get(idx) {
                    None | Some(b'\n') => return Err(error("unterminated string".to_owned())),
                    Some(b'\\') => idx += 2,
                    Some(&byte) if byte == first => break,
                    Some(_) => idx += 1,
                }
            }
            let body = text
                .get(body_start..idx)
                .ok_or_else(|| error("unterminated string".to_owned()))?;
            idx += 1;
            let value = unescape(body).map_err(|bad| error(format!("invalid escape {bad}")))?;
            Token::Str(value)
        } else {
            let ch = text[idx..].chars().next().unwrap_or('\u{fffd}');
            idx += ch.len_utf8();
            Token::Symbol(ch)
        };

        tokens.push(Spanned {
            token,
            line,
            column,
        });
    }
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    idx: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> &'t Spanned {
        // The token stream always ends with `Token::End`.
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> &'t Spanned {
        let token = self.peek();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> TextError {
        let at = self.peek();
        TextError {
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        self.peek().token == Token::Symbol(symbol)
    }

    fn eat(&mut self, symbol: char) -> bool {
        if self.peek_symbol(symbol) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: char) -> Result<(), TextError> {
        if self.eat(symbol) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{symbol}', found {}",
                self.peek().token.describe()
            )))
        }
    }

    /// Parses `name: value` entries until `close` (or end of input at top level).
    fn parse_fields(&mut self, record: &mut dyn Record, close: Option<char>) -> Result<(), TextError> {
        let descriptor = record.descriptor();
        let mut seen = HashSet::new();
        loop {
            let name = match &self.peek().token {
                Token::End => {
                    return match close {
                        None => Ok(()),
                        Some(close) => Err(self.error(format!(
                            "unexpected end of input, expected '{close}'"
                        ))),
                    };
                }
                Token::Symbol(symbol) if Some(*symbol) == close => {
                    self.bump();
                    return Ok(());
                }
                Token::Ident(name) => name,
                other => {
                    return Err(self.error(format!(
                        "expected field name, found {}",
                        other.describe()
                    )))
                }
            };

            let field = descriptor.field_by_name(name).ok_or_else(|| {
                self.error(format!(
                    "{} has no field named {name:?}",
                    descriptor.full_name
                ))
            })?;
            if !field.is_repeated() && !seen.insert(field.number) {
                return Err(self.error(format!(
                    "non-repeated field {name:?} is specified multiple times"
                )));
            }
            self.bump();

            if let FieldKind::Message(_) = field.kind {
                let had_colon = self.eat(':');
                if had_colon && self.peek_symbol('[') {
                    self.parse_list(record, field)?;
                } else {
                    self.parse_nested(record, field)?;
                }
            } else {
                self.expect(':')?;
                if self.peek_symbol('[') {
                    self.parse_list(record, field)?;
                } else {
                    self.parse_scalar_into(record, field)?;
                }
            }

            if !self.eat(',') {
                self.eat(';');
            }
        }
    }

    fn parse_list(&mut self, record: &mut dyn Record, field: &FieldDescriptor) -> Result<(), TextError> {
        if !field.is_repeated() {
            return Err(self.error(format!(
                "field {:?} is not repeated and cannot take a list",
                field.name
            )));
        }
        self.expect('[')?;
        if self.eat(']') {
            return Ok(());
        }
        loop {
            if let FieldKind::Message(_) = field.kind {
                self.parse_nested(record, field)?;
            } else {
                self.parse_scalar_into(record, field)?;
            }
            if !self.eat(',') {
                break;
            }
        }
        self.expect(']')
    }

    fn parse_nested(&mut self, record: &mut dyn Record, field: &FieldDescriptor) -> Result<(), TextError> {
        let close = if self.eat('{') {
            '}'
        } else if self.eat('<') {
            '>'
        } else {
            return Err(self.error(format!(
                "expected '{{' or '<', found {}",
                self.peek().token.describe()
            )));
        };
        let nested = record
            .message_mut(field.number)
            .map_err(|err| self.error(err.to_string()))?;
        self.parse_fields(nested, Some(close))
    }

    fn parse_scalar_into(&mut self, record: &mut dyn Record, field: &FieldDescriptor) -> Result<(), TextError> {
        let value = self.parse_scalar(field)?;
        record
            .set_field(field.number, value)
            .map_err(|err| self.error(err.to_string()))
    }

    fn parse_scalar(&mut self, field: &FieldDescriptor) -> Result<Value, TextError> {
        match field.kind {
            FieldKind::String => {
                let bytes = self.parse_strings()?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| self.error(format!("field {:?} expects valid UTF-8", field.name)))
            }
            FieldKind::Bytes => self.parse_strings().map(Value::Bytes),
            _ => {
                let negative = self.eat('-');
                let at = self.peek();
                let value = match &at.token {
                    Token::Number(text) => number_value(&field.kind, negative, text),
                    Token::Ident(text) => ident_value(&field.kind, negative, text),
                    other => Err(format!("expected a value, found {}", other.describe())),
                };
                let value = value.map_err(|message| self.error(message))?;
                self.bump();
                Ok(value)
            }
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_strings(&mut self) -> Result<Vec<u8>, TextError> {
        let mut out = match &self.peek().token {
            Token::Str(bytes) => bytes.clone(),
            other => {
                return Err(self.error(format!("expected a string, found {}", other.describe())));
            }
        };
        self.bump();
        while let Token::Str(bytes) = &self.peek().token {
            out.extend_from_slice(bytes);
            self.bump();
        }
        Ok(out)
    }
}

fn parse_unsigned(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

fn number_value(kind: &FieldKind, negative: bool, text: &str) -> Result<Value, String> {
    let integer = || {
        parse_unsigned(text)
            .map(|magnitude| {
                let magnitude = i128::from(magnitude);
                if negative {
                    -magnitude
                } else {
                    magnitude
                }
            })
            .ok_or_else(|| format!("expected an integer, found {text}"))
    };
    let out_of_range = || format!("integer {}{text} out of range for {}", if negative { "-" } else { "" }, kind.name());

    match kind {
        FieldKind::Int64 | FieldKind::SInt64 | FieldKind::SFixed64 => {
            i64::try_from(integer()?).map(Value::I64).map_err(|_| out_of_range())
        }
        FieldKind::Int32 | FieldKind::SInt32 | FieldKind::SFixed32 => {
            i32::try_from(integer()?).map(Value::I32).map_err(|_| out_of_range())
        }
        FieldKind::UInt64 | FieldKind::Fixed64 => {
            u64::try_from(integer()?).map(Value::U64).map_err(|_| out_of_range())
        }
        FieldKind::UInt32 | FieldKind::Fixed32 => {
            u32::try_from(integer()?).map(Value::U32).map_err(|_| out_of_range())
        }
        FieldKind::Enum(_) => i32::try_from(integer()?).map(Value::Enum).map_err(|_| out_of_range()),
        FieldKind::Bool => match (negative, text) {
            (false, "1") => Ok(Value::Bool(true)),
            (false, "0") => Ok(Value::Bool(false)),
            _ => Err(format!("invalid bool {text}")),
        },
        FieldKind::Double | FieldKind::Float => {
            let magnitude = if text.starts_with("0x") || text.starts_with("0X") {
                parse_unsigned(text).map(|v| v as f64)
            } else {
                text.trim_end_matches(['f', 'F']).parse::<f64>().ok()
            }
            .ok_or_else(|| format!("expected a number, found {text}"))?;
            let value = if negative { -magnitude } else { magnitude };
            Ok(float_value(kind, value))
        }
        FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) => {
            Err(format!("unexpected number {text}"))
        }
    }
}

fn ident_value(kind: &FieldKind, negative: bool, text: &str) -> Result<Value, String> {
    match kind {
        FieldKind::Double | FieldKind::Float => {
            let magnitude = match text.to_ascii_lowercase().as_str() {
                "inf" | "infinity" => f64::INFINITY,
                "nan" => f64::NAN,
                _ => return Err(format!("invalid floating point value {text}")),
            };
            let value = if negative { -magnitude } else { magnitude };
            Ok(float_value(kind, value))
        }
        FieldKind::Bool if !negative => match text {
            "true" | "True" | "t" => Ok(Value::Bool(true)),
            "false" | "False" | "f" => Ok(Value::Bool(false)),
            _ => Err(format!("invalid bool {text}")),
        },
        FieldKind::Enum(descriptor) if !negative => descriptor
            .number_of(text)
            .map(Value::Enum)
            .ok_or_else(|| format!("unknown value {text:?} for enum {}", descriptor.full_name)),
        _ => Err(format!("unexpected identifier {text:?}")),
    }
}

fn float_value(kind: &FieldKind, value: f64) -> Value {
    match kind {
        FieldKind::Float => Value::F32(value as f32),
        _ => Value::F64(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        tokenize(text)
            .expect("tokenize")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn tokenizes_fields_and_comments() {
        assert_eq!(
            kinds("field_a: 3, # trailing\n msg { x: 'a\\'b' \"c\" }"),
            vec![
                Token::Ident("field_a".into()),
                Token::Symbol(':'),
                Token::Number("3".into()),
                Token::Symbol(','),
                Token::Ident("msg".into()),
                Token::Symbol('{'),
                Token::Ident("x".into()),
                Token::Symbol(':'),
                Token::Str(b"a'b".to_vec()),
                Token::Str(b"c".to_vec()),
                Token::Symbol('}'),
                Token::End,
            ]
        );
    }

    #[test]
    fn tokenizes_numbers() {
        assert_eq!(
            kinds("1.5e-3 0x1F .25f"),
            vec![
                Token::Number("1.5e-3".into()),
                Token::Number("0x1F".into()),
                Token::Number(".25f".into()),
                Token::End,
            ]
        );
    }

    #[test]
    fn reports_positions() {
        let err = tokenize("a: 1\n  b: \"open").unwrap_err();
        assert_eq!((err.line, err.column), (2, 6));
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn integer_bases_and_ranges() {
        assert_eq!(parse_unsigned("0x10"), Some(16));
        assert_eq!(parse_unsigned("010"), Some(8));
        assert_eq!(parse_unsigned("0"), Some(0));
        assert_eq!(number_value(&FieldKind::Int32, true, "2147483648"), Ok(Value::I32(i32::MIN)));
        assert!(number_value(&FieldKind::Int32, false, "2147483648").is_err());
        assert!(number_value(&FieldKind::UInt64, true, "1").is_err());
        assert_eq!(number_value(&FieldKind::Float, false, "1.5f"), Ok(Value::F32(1.5)));
    }

    #[test]
    fn identifiers_for_floats_and_bools() {
        assert_eq!(ident_value(&FieldKind::Double, true, "inf"), Ok(Value::F64(f64::NEG_INFINITY)));
        assert_eq!(ident_value(&FieldKind::Bool, false, "t"), Ok(Value::Bool(true)));
        assert!(ident_value(&FieldKind::UInt32, false, "x").is_err());
    }
}
