//! The bundled JSON tokenizer, the default token-stream producer.
//!
//! A small recursive-descent scanner: each `{`/`[` is scanned by recursing
//! into its members/elements, and the opening token is patched with its
//! matching close and child count once the recursion returns. `max_depth`
//! guards against stack overflow on adversarially nested input, the same
//! concern the interpreter's own depth counter addresses on the decode
//! side.

use crate::error::{DecodeError, ErrorKind};
use crate::token::{Token, TokenKind};

/// Default recursion ceiling; deep enough for any realistic document,
/// shallow enough that scanning never risks overflowing the call stack.
pub const DEFAULT_MAX_DEPTH: u32 = 10_000;

pub fn tokenize(input: &[u8]) -> Result<Vec<Token>, DecodeError> {
    tokenize_with_depth(input, DEFAULT_MAX_DEPTH)
}

pub fn tokenize_with_depth(input: &[u8], max_depth: u32) -> Result<Vec<Token>, DecodeError> {
    let mut scanner = Scanner { input, tokens: Vec::new(), max_depth };
    let mut pos = skip_ws(input, 0);
    pos = scanner.scan_value(pos, 0)?;
    pos = skip_ws(input, pos);
    if pos != input.len() {
        return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue));
    }
    Ok(scanner.tokens)
}

struct Scanner<'a> {
    input: &'a [u8],
    tokens: Vec<Token>,
    max_depth: u32,
}

impl<'a> Scanner<'a> {
    fn scan_value(&mut self, pos: usize, depth: u32) -> Result<usize, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::new(pos, ErrorKind::NestingTooDeep));
        }
        let pos = skip_ws(self.input, pos);
        match self.input.get(pos) {
            Some(b'{') => self.scan_object(pos, depth),
            Some(b'[') => self.scan_array(pos, depth),
            Some(b'"') => self.scan_string(pos, TokenKind::Str),
            Some(b't') => self.scan_literal(pos, b"true", TokenKind::True),
            Some(b'f') => self.scan_literal(pos, b"false", TokenKind::False),
            Some(b'n') => self.scan_literal(pos, b"null", TokenKind::Null),
            Some(b) if *b == b'-' || b.is_ascii_digit() => self.scan_number(pos),
            _ => Err(DecodeError::new(pos, ErrorKind::UnexpectedValue)),
        }
    }

    fn scan_object(&mut self, start: usize, depth: u32) -> Result<usize, DecodeError> {
        let placeholder = self.tokens.len();
        self.tokens.push(Token::new(TokenKind::Object, start, 0));
        let mut pos = start + 1;
        let mut count = 0u32;
        pos = skip_ws(self.input, pos);
        if self.input.get(pos) == Some(&b'}') {
            pos += 1;
        } else {
            loop {
                pos = skip_ws(self.input, pos);
                if self.input.get(pos) != Some(&b'"') {
                    return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue));
                }
                pos = self.scan_string(pos, TokenKind::Key)?;
                pos = skip_ws(self.input, pos);
                if self.input.get(pos) != Some(&b':') {
                    return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue));
                }
                pos += 1;
                pos = self.scan_value(pos, depth + 1)?;
                count += 1;
                pos = skip_ws(self.input, pos);
                match self.input.get(pos) {
                    Some(b',') => {
                        pos += 1;
                        continue;
                    }
                    Some(b'}') => {
                        pos += 1;
                        break;
                    }
                    _ => return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue)),
                }
            }
        }
        self.tokens[placeholder].end = pos;
        self.tokens[placeholder].elements = count;
        self.tokens.push(Token::new(TokenKind::ObjectEnd, pos - 1, pos));
        Ok(pos)
    }

    fn scan_array(&mut self, start: usize, depth: u32) -> Result<usize, DecodeError> {
        let placeholder = self.tokens.len();
        self.tokens.push(Token::new(TokenKind::Array, start, 0));
        let mut pos = start + 1;
        let mut count = 0u32;
        pos = skip_ws(self.input, pos);
        if self.input.get(pos) == Some(&b']') {
            pos += 1;
        } else {
            loop {
                pos = self.scan_value(pos, depth + 1)?;
                count += 1;
                pos = skip_ws(self.input, pos);
                match self.input.get(pos) {
                    Some(b',') => {
                        pos += 1;
                        continue;
                    }
                    Some(b']') => {
                        pos += 1;
                        break;
                    }
                    _ => return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue)),
                }
            }
        }
        self.tokens[placeholder].end = pos;
        self.tokens[placeholder].elements = count;
        self.tokens.push(Token::new(TokenKind::ArrayEnd, pos - 1, pos));
        Ok(pos)
    }

    fn scan_string(&mut self, start: usize, kind: TokenKind) -> Result<usize, DecodeError> {
        let mut pos = start + 1;
        loop {
            match self.input.get(pos) {
                None => return Err(DecodeError::new(pos, ErrorKind::UnexpectedValue)),
                Some(b'"') => {
                    pos += 1;
                    break;
                }
                Some(b'\\') => {
                    pos += 2;
                }
                Some(_) => {
                    pos += 1;
                }
            }
        }
        self.tokens.push(Token::new(kind, start + 1, pos - 1));
        Ok(pos)
    }

    fn scan_literal(&mut self, start: usize, text: &[u8], kind: TokenKind) -> Result<usize, DecodeError> {
        let end = start + text.len();
        if self.input.get(start..end) != Some(text) {
            return Err(DecodeError::new(start, ErrorKind::UnexpectedValue));
        }
        self.tokens.push(Token::new(kind, start, end));
        Ok(end)
    }

    fn scan_number(&mut self, start: usize) -> Result<usize, DecodeError> {
        let mut pos = start;
        let mut is_float = false;
        if self.input.get(pos) == Some(&b'-') {
            pos += 1;
        }
        if !matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
            return Err(DecodeError::new(start, ErrorKind::UnexpectedValue));
        }
        while matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
            pos += 1;
        }
        if self.input.get(pos) == Some(&b'.') {
            is_float = true;
            pos += 1;
            if !matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
                return Err(DecodeError::new(start, ErrorKind::UnexpectedValue));
            }
            while matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
                pos += 1;
            }
        }
        if matches!(self.input.get(pos), Some(b'e') | Some(b'E')) {
            is_float = true;
            pos += 1;
            if matches!(self.input.get(pos), Some(b'+') | Some(b'-')) {
                pos += 1;
            }
            if !matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
                return Err(DecodeError::new(start, ErrorKind::UnexpectedValue));
            }
            while matches!(self.input.get(pos), Some(b) if b.is_ascii_digit()) {
                pos += 1;
            }
        }
        let kind = if is_float { TokenKind::Number } else { TokenKind::Integer };
        self.tokens.push(Token::new(kind, start, pos));
        Ok(pos)
    }
}

fn skip_ws(input: &[u8], mut pos: usize) -> usize {
    while matches!(input.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
        pos += 1;
    }
    pos
}
