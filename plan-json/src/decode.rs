//! The decoding interpreter — the stack machine that joins a token stream
//! to a compiled [`Plan`] and writes directly into the destination's
//! memory.
//!
//! Unlike a flat bytecode loop, this interpreter recurses: a frame that
//! owns children (`Struct`, `Array`, `Slice*`, `Map*`, `Ptr*`) calls back
//! into [`decode_frame`] for each of them. A self-referential `*Recur`
//! frame is simply a frame reused at a different call depth — the
//! recursion is realized on Rust's own call stack instead of an explicit
//! per-frame save/restore stack, which is what the call stack is for. A
//! depth counter still guards against adversarial nesting, the same way
//! [`crate::tokenizer`] guards its own recursive scan.

use std::collections::HashSet;

use crate::any::decode_any;
use crate::error::{DecodeError, ErrorKind};
use crate::numeric::{integer_text_to_f32, integer_text_to_f64, parse_f32, parse_f64, BoundedInt, NumericError};
use crate::options::DecodeOptions;
use crate::plan::{FrameIndex, FrameKind, FrameOps, Plan, ScalarKind};
use crate::token::{Token, TokenKind};
use crate::trace::{self, Trace};
use crate::unescape;
use crate::value::Value;

pub const DEFAULT_MAX_DEPTH: u32 = 10_000;

pub(crate) struct Context<'a> {
    pub plan: &'a Plan,
    pub input: &'a [u8],
    pub tokens: &'a [Token],
    pub options: &'a DecodeOptions,
    pub trace: Trace,
    pub borrow_strings: bool,
}

pub(crate) fn run(ctx: &Context<'_>, dest: *mut u8) -> Result<(), DecodeError> {
    let mut pos = 0usize;
    if ctx.tokens.is_empty() {
        return Err(DecodeError::new(0, ErrorKind::UnexpectedValue));
    }
    decode_frame(ctx, ctx.plan.root(), dest, &mut pos, 0)?;
    Ok(())
}

fn decode_frame(ctx: &Context<'_>, frame_idx: FrameIndex, dest: *mut u8, pos: &mut usize, depth: u32) -> Result<(), DecodeError> {
    if depth > DEFAULT_MAX_DEPTH {
        return Err(DecodeError::new(*pos, ErrorKind::NestingTooDeep));
    }
    if dest.is_null() {
        return Err(DecodeError::new(*pos, ErrorKind::NilDest));
    }
    let frame = ctx.plan.frame(frame_idx);
    trace::frame(ctx.trace, frame_idx, &frame.kind);
    let tok = *ctx
        .tokens
        .get(*pos)
        .ok_or_else(|| DecodeError::new(ctx.input.len(), ErrorKind::UnexpectedValue))?;
    trace::token(ctx.trace, tok.index, &tok.kind);

    if tok.kind == TokenKind::Null {
        *pos += 1;
        // Structs are left untouched by `null` — only scalars, pointers, and
        // other composites reset to their zero value.
        if !matches!(frame.kind, FrameKind::Struct | FrameKind::StructRecur | FrameKind::EmptyStruct) {
            unsafe { (frame.reset)(dest) };
        }
        return Ok(());
    }

    match frame.kind {
        FrameKind::Scalar(kind) => {
            *pos += 1;
            decode_scalar(kind, ctx.input, tok, dest)
        }
        FrameKind::ScalarString(kind) => {
            *pos += 1;
            if tok.kind != TokenKind::Str {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            let text = token_str(ctx, tok)?;
            decode_scalar_text(kind, &text, tok.index, dest)
        }
        FrameKind::Any => {
            let value = decode_any(ctx.input, ctx.tokens, pos)?;
            unsafe { std::ptr::write(dest as *mut Value, value) };
            Ok(())
        }
        FrameKind::Ptr | FrameKind::PtrRecur => {
            let FrameOps::Ptr { ensure } = frame.ops else { unreachable!("Ptr frame without Ptr ops") };
            let inner = unsafe { ensure(dest) };
            let elem = frame.elem.expect("Ptr frame always has an element frame");
            decode_frame(ctx, elem, inner, pos, depth + 1)
        }
        FrameKind::Array => {
            if tok.kind != TokenKind::Array {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            let elem = frame.elem.expect("Array frame always has an element frame");
            let elem_frame = ctx.plan.frame(elem);
            let n = frame.array_len;
            let decoded = (tok.elements as usize).min(n);
            for i in 0..decoded {
                let slot = unsafe { dest.add(i * elem_frame.size) };
                decode_frame(ctx, elem, slot, pos, depth + 1)?;
            }
            for _ in decoded..(tok.elements as usize) {
                skip_value(ctx.tokens, pos);
            }
            for i in decoded..n {
                let slot = unsafe { dest.add(i * elem_frame.size) };
                unsafe { (elem_frame.reset)(slot) };
            }
            expect_close(ctx, pos, TokenKind::ArrayEnd)
        }
        FrameKind::Slice | FrameKind::SliceRecur | FrameKind::SliceScalar(_) => {
            if tok.kind != TokenKind::Array {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            let FrameOps::Slice { resize, base_ptr } = frame.ops else { unreachable!("Slice frame without Slice ops") };
            let elem = frame.elem.expect("Slice frame always has an element frame");
            let elem_frame = ctx.plan.frame(elem);
            let n = tok.elements as usize;
            unsafe { resize(dest, n) };
            let base = unsafe { base_ptr(dest) };
            for i in 0..n {
                let slot = unsafe { base.add(i * elem_frame.size) };
                decode_frame(ctx, elem, slot, pos, depth + 1)?;
            }
            expect_close(ctx, pos, TokenKind::ArrayEnd)
        }
        FrameKind::Map | FrameKind::MapRecur | FrameKind::MapStringString => {
            if tok.kind != TokenKind::Object {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            let FrameOps::Map { insert, reserve } = frame.ops else { unreachable!("Map frame without Map ops") };
            let elem = frame.elem.expect("Map frame always has an element frame");
            unsafe { reserve(dest, tok.elements as usize) };
            let mut seen = ctx.options.disallow_duplicate_names.then(HashSet::<String>::new);
            for _ in 0..tok.elements {
                let key_tok = next_key(ctx, pos)?;
                let key_text = token_str(ctx, key_tok)?;
                if let Some(seen) = seen.as_mut() {
                    if !seen.insert(key_text.clone().into_owned()) {
                        return Err(DecodeError::new(key_tok.index, ErrorKind::DuplicateField(key_text.into_owned())));
                    }
                }
                let slot = unsafe { insert(dest, &key_text) }.map_err(|kind| DecodeError::new(key_tok.index, kind))?;
                decode_frame(ctx, elem, slot, pos, depth + 1)?;
            }
            expect_close(ctx, pos, TokenKind::ObjectEnd)
        }
        FrameKind::Struct | FrameKind::StructRecur => {
            if tok.kind != TokenKind::Object {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            let index = frame.field_index.clone().expect("Struct frame always has a field index");
            let mut seen = ctx.options.disallow_duplicate_names.then(HashSet::<String>::new);
            for _ in 0..tok.elements {
                let key_tok = next_key(ctx, pos)?;
                let key_text = field_name_str(ctx, key_tok)?;
                if let Some(seen) = seen.as_mut() {
                    if !seen.insert(key_text.clone().into_owned()) {
                        return Err(DecodeError::new(key_tok.index, ErrorKind::DuplicateField(key_text.into_owned())));
                    }
                }
                let allow_ci = !ctx.options.disable_case_insensitive_matching;
                match index.lookup(&key_text, allow_ci) {
                    Some(field_i) => {
                        let field = &frame.fields[field_i];
                        let field_frame = ctx.plan.frame(field.frame);
                        let slot = unsafe { dest.add(field_frame.offset) };
                        decode_frame(ctx, field.frame, slot, pos, depth + 1)?;
                    }
                    None => {
                        if ctx.options.disallow_unknown_fields {
                            return Err(DecodeError::new(key_tok.index, ErrorKind::UnknownField(key_text.into_owned())));
                        }
                        skip_value(ctx.tokens, pos);
                    }
                }
            }
            expect_close(ctx, pos, TokenKind::ObjectEnd)
        }
        FrameKind::EmptyStruct => {
            if tok.kind != TokenKind::Object {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            for _ in 0..tok.elements {
                *pos += 1; // the member's Key token
                skip_value(ctx.tokens, pos);
            }
            expect_close(ctx, pos, TokenKind::ObjectEnd)
        }
        FrameKind::JsonUnmarshaler => {
            let FrameOps::JsonUnmarshaler { call } = frame.ops else { unreachable!("JsonUnmarshaler frame without ops") };
            let (start, end) = raw_span(tok);
            skip_value(ctx.tokens, pos);
            unsafe { call(dest, &ctx.input[start..end]) }.map_err(|kind| DecodeError::new(tok.index, kind))
        }
        FrameKind::TextUnmarshaler => {
            if tok.kind != TokenKind::Str {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            *pos += 1;
            let FrameOps::TextUnmarshaler { call } = frame.ops else { unreachable!("TextUnmarshaler frame without ops") };
            let text = token_str(ctx, tok)?;
            unsafe { call(dest, &text) }.map_err(|kind| DecodeError::new(tok.index, kind))
        }
    }
}

fn next_key(ctx: &Context<'_>, pos: &mut usize) -> Result<Token, DecodeError> {
    let tok = *ctx
        .tokens
        .get(*pos)
        .ok_or_else(|| DecodeError::new(ctx.input.len(), ErrorKind::UnexpectedValue))?;
    if tok.kind != TokenKind::Key {
        return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
    }
    *pos += 1;
    Ok(tok)
}

fn expect_close(ctx: &Context<'_>, pos: &mut usize, kind: TokenKind) -> Result<(), DecodeError> {
    let tok = *ctx
        .tokens
        .get(*pos)
        .ok_or_else(|| DecodeError::new(ctx.input.len(), ErrorKind::UnexpectedValue))?;
    if tok.kind != kind {
        return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
    }
    *pos += 1;
    Ok(())
}

/// Advances `pos` past one full value's worth of tokens without decoding it
/// anywhere — used for unknown struct fields, an empty-struct destination,
/// and excess fixed-array elements.
fn skip_value(tokens: &[Token], pos: &mut usize) {
    let tok = tokens[*pos];
    *pos += 1;
    match tok.kind {
        TokenKind::Array => {
            for _ in 0..tok.elements {
                skip_value(tokens, pos);
            }
            *pos += 1; // ArrayEnd
        }
        TokenKind::Object => {
            for _ in 0..tok.elements {
                *pos += 1; // Key
                skip_value(tokens, pos);
            }
            *pos += 1; // ObjectEnd
        }
        _ => {}
    }
}

/// The raw JSON byte span of a value's token, quotes included for strings —
/// what a `JsonUnmarshaler` expects to receive (still escaped, untouched).
fn raw_span(tok: Token) -> (usize, usize) {
    match tok.kind {
        TokenKind::Str => (tok.index - 1, tok.end + 1),
        _ => (tok.index, tok.end),
    }
}

/// A struct member name's matching text: skips the unescape pass entirely
/// when `disable_field_name_unescaping` is set, trading correctness on
/// field names containing JSON escapes for avoiding the scan on the common
/// case where none do — field names are compared byte-for-byte or
/// case-insensitively, never written into the destination, so a raw,
/// still-escaped slice is a valid (if unescaped-miss-prone) comparison key.
fn field_name_str<'i>(ctx: &Context<'i>, tok: Token) -> Result<std::borrow::Cow<'i, str>, DecodeError> {
    if ctx.options.disable_field_name_unescaping {
        let raw = std::str::from_utf8(&ctx.input[tok.index..tok.end])
            .map_err(|_| DecodeError::new(tok.index, ErrorKind::UnexpectedValue))?;
        return Ok(std::borrow::Cow::Borrowed(raw));
    }
    token_str(ctx, tok)
}

fn token_str<'i>(ctx: &Context<'i>, tok: Token) -> Result<std::borrow::Cow<'i, str>, DecodeError> {
    let raw = std::str::from_utf8(&ctx.input[tok.index..tok.end])
        .map_err(|_| DecodeError::new(tok.index, ErrorKind::UnexpectedValue))?;
    if !ctx.borrow_strings {
        return unescape::unescape(raw)
            .map(|cow| std::borrow::Cow::Owned(cow.into_owned()))
            .map_err(|e| DecodeError::new(tok.index + e.at, ErrorKind::UnexpectedValue));
    }
    unescape::unescape(raw).map_err(|e| DecodeError::new(tok.index + e.at, ErrorKind::UnexpectedValue))
}

fn decode_scalar(kind: ScalarKind, input: &[u8], tok: Token, dest: *mut u8) -> Result<(), DecodeError> {
    match kind {
        ScalarKind::Bool => match tok.kind {
            TokenKind::True => Ok(write(dest, true)),
            TokenKind::False => Ok(write(dest, false)),
            _ => Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue)),
        },
        ScalarKind::Str => {
            if tok.kind != TokenKind::Str {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            let raw = std::str::from_utf8(&input[tok.index..tok.end])
                .map_err(|_| DecodeError::new(tok.index, ErrorKind::UnexpectedValue))?;
            let text = unescape::unescape(raw).map_err(|e| DecodeError::new(tok.index + e.at, ErrorKind::UnexpectedValue))?;
            write(dest, text.into_owned());
            Ok(())
        }
        ScalarKind::F32 | ScalarKind::F64 => {
            let text = numeral_text(input, tok)?;
            match tok.kind {
                TokenKind::Integer => decode_float_fast(kind, text, tok.index, dest),
                TokenKind::Number => decode_float_generic(kind, text, tok.index, dest),
                _ => Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue)),
            }
        }
        _ => {
            if tok.kind != TokenKind::Integer {
                return Err(DecodeError::new(tok.index, ErrorKind::UnexpectedValue));
            }
            let text = numeral_text(input, tok)?;
            decode_int(kind, text, tok.index, dest)
        }
    }
}

fn decode_scalar_text(kind: ScalarKind, text: &str, index: usize, dest: *mut u8) -> Result<(), DecodeError> {
    match kind {
        ScalarKind::Bool => match text {
            "true" => {
                write(dest, true);
                Ok(())
            }
            "false" => {
                write(dest, false);
                Ok(())
            }
            _ => Err(DecodeError::new(index, ErrorKind::UnexpectedValue)),
        },
        ScalarKind::F32 => {
            let v = parse_f32(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
            Ok(())
        }
        ScalarKind::F64 => {
            let v = parse_f64(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
            Ok(())
        }
        ScalarKind::Str => {
            // `,string`-tagged `String` fields need the JSON string's
            // contents to themselves be a quoted string with no inner
            // backslash escapes — e.g. `"\"value\""`, not plain `"value"`.
            let inner = text
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .filter(|body| !body.contains('\\'));
            match inner {
                Some(body) => {
                    write(dest, body.to_string());
                    Ok(())
                }
                None => Err(DecodeError::new(index, ErrorKind::UnexpectedValue)),
            }
        }
        _ => decode_int(kind, text, index, dest),
    }
}

fn numeral_text(input: &[u8], tok: Token) -> Result<&str, DecodeError> {
    std::str::from_utf8(&input[tok.index..tok.end]).map_err(|_| DecodeError::new(tok.index, ErrorKind::UnexpectedValue))
}

fn decode_float_fast(kind: ScalarKind, text: &str, index: usize, dest: *mut u8) -> Result<(), DecodeError> {
    match kind {
        ScalarKind::F32 => {
            let v = integer_text_to_f32(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
        }
        ScalarKind::F64 => {
            let v = integer_text_to_f64(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn decode_float_generic(kind: ScalarKind, text: &str, index: usize, dest: *mut u8) -> Result<(), DecodeError> {
    match kind {
        ScalarKind::F32 => {
            let v = parse_f32(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
        }
        ScalarKind::F64 => {
            let v = parse_f64(text).map_err(|_| DecodeError::new(index, ErrorKind::InvalidNumber(text.to_string())))?;
            write(dest, v);
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn decode_int(kind: ScalarKind, text: &str, index: usize, dest: *mut u8) -> Result<(), DecodeError> {
    macro_rules! go {
        ($t:ty) => {{
            let v = <$t as BoundedInt>::parse_bounded(text).map_err(|err| match err {
                NumericError::Overflow => DecodeError::new(index, ErrorKind::IntegerOverflow),
                NumericError::Invalid => DecodeError::new(index, ErrorKind::UnexpectedValue),
            })?;
            write(dest, v);
        }};
    }
    match kind {
        ScalarKind::I8 => go!(i8),
        ScalarKind::I16 => go!(i16),
        ScalarKind::I32 => go!(i32),
        ScalarKind::I64 => go!(i64),
        ScalarKind::Isize => go!(isize),
        ScalarKind::U8 => go!(u8),
        ScalarKind::U16 => go!(u16),
        ScalarKind::U32 => go!(u32),
        ScalarKind::U64 => go!(u64),
        ScalarKind::Usize => go!(usize),
        ScalarKind::Bool | ScalarKind::Str | ScalarKind::F32 | ScalarKind::F64 => unreachable!(),
    }
    Ok(())
}

fn write<T>(dest: *mut u8, value: T) {
    unsafe { std::ptr::write(dest as *mut T, value) };
}
