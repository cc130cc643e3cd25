//! The dynamic `Any` decoder: turns a run of tokens into
//! a [`Value`] tree with no destination shape to guide it.

use std::collections::HashMap;

use crate::error::{DecodeError, ErrorKind};
use crate::numeric::{parse_f64, NumericError};
use crate::token::{Token, TokenKind};
use crate::unescape;
use crate::value::Value;

pub(crate) fn decode_any(input: &[u8], tokens: &[Token], pos: &mut usize) -> Result<Value, DecodeError> {
    let tok = tokens[*pos];
    *pos += 1;
    match tok.kind {
        TokenKind::Null => Ok(Value::Null),
        TokenKind::True => Ok(Value::Bool(true)),
        TokenKind::False => Ok(Value::Bool(false)),
        TokenKind::Integer | TokenKind::Number => {
            let text = std::str::from_utf8(&input[tok.index..tok.end]).expect("tokenizer emits ascii numerals");
            let n = parse_f64(text).map_err(|err| match err {
                NumericError::Overflow => DecodeError::new(tok.index, ErrorKind::IntegerOverflow),
                NumericError::Invalid => DecodeError::new(tok.index, ErrorKind::InvalidNumber(text.to_string())),
            })?;
            Ok(Value::Number(n))
        }
        TokenKind::Str => {
            let raw = std::str::from_utf8(&input[tok.index..tok.end])
                .map_err(|_| DecodeError::new(tok.index, ErrorKind::UnexpectedValue))?;
            let text = unescape::unescape(raw).map_err(|e| DecodeError::new(tok.index + e.at, ErrorKind::UnexpectedValue))?;
            Ok(Value::String(text.into_owned()))
        }
        TokenKind::Array => {
            let mut items = Vec::with_capacity(tok.elements as usize);
            for _ in 0..tok.elements {
                items.push(decode_any(input, tokens, pos)?);
            }
            *pos += 1; // ArrayEnd
            Ok(Value::Array(items))
        }
        TokenKind::Object => {
            let mut map = HashMap::with_capacity(tok.elements as usize);
            for _ in 0..tok.elements {
                let key_tok = tokens[*pos];
                *pos += 1;
                let raw = std::str::from_utf8(&input[key_tok.index..key_tok.end])
                    .map_err(|_| DecodeError::new(key_tok.index, ErrorKind::UnexpectedValue))?;
                let key = unescape::unescape(raw)
                    .map_err(|e| DecodeError::new(key_tok.index + e.at, ErrorKind::UnexpectedValue))?
                    .into_owned();
                let value = decode_any(input, tokens, pos)?;
                map.insert(key, value);
            }
            *pos += 1; // ObjectEnd
            Ok(Value::Object(map))
        }
        TokenKind::Key | TokenKind::ArrayEnd | TokenKind::ObjectEnd => {
            Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue))
        }
    }
}
