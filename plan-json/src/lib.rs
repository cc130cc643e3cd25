//! A reflection-driven JSON decoder.
//!
//! A [`Shape`] description of a destination type is compiled once into a
//! [`plan::Plan`] — a flat, index-addressable description of that type's
//! layout — and a [`Decoder`] then replays any number of JSON documents
//! against that one compiled plan, writing straight into the caller's
//! memory instead of building up an intermediate value and copying it in.
//!
//! ```
//! use plan_json::Decoder;
//!
//! #[derive(Default, plan_json::Decode)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! let mut decoder = Decoder::<Point>::new(Default::default()).unwrap();
//! let mut point = Point::default();
//! decoder.decode(plan_json::Source::Str(r#"{"x":1,"y":2}"#), &mut point, Default::default()).unwrap();
//! assert_eq!(point.x, 1.0);
//! ```

pub mod any;
mod decode;
pub mod error;
pub mod field_index;
pub mod numeric;
pub mod options;
pub mod plan;
mod shape;
pub mod token;
pub mod tokenizer;
pub mod trace;
mod unescape;
pub mod value;

pub use error::{DecodeError, ErrorKind, PlanError};
pub use options::{DecodeOptions, InitOptions};
pub use plan::Plan;
pub use shape::{FromJsonRaw, FromJsonText, MapKeyShape, Shape};
pub use token::{Token, TokenKind};
pub use trace::Trace;
pub use value::Value;

/// Re-exported so `#[derive(plan_json::Decode)]` resolves without a direct
/// dependency on `plan-json-derive`.
pub use plan_json_derive::Decode;

/// The input a [`Decoder`] reads tokens and scalar content from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'s> {
    /// An already-validated UTF-8 document. String destinations with no
    /// escape sequences borrow directly from this buffer instead of
    /// allocating.
    Str(&'s str),
    /// An arbitrary byte buffer; string destinations always allocate their
    /// own copy, since the buffer's own UTF-8 validity is not assumed.
    Bytes(&'s [u8]),
}

impl<'s> Source<'s> {
    fn bytes(&self) -> &'s [u8] {
        match self {
            Source::Str(s) => s.as_bytes(),
            Source::Bytes(b) => b,
        }
    }

    fn borrows_strings(&self) -> bool {
        matches!(self, Source::Str(_))
    }
}

/// Compiles a [`Shape`] into a [`plan::Plan`] once, then decodes any number
/// of documents of that shape against it.
pub struct Decoder<T: Shape> {
    plan: plan::Plan,
    trace: Trace,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Shape> Decoder<T> {
    pub fn new(options: InitOptions) -> Result<Self, PlanError> {
        let plan = plan::Compiler::compile::<T>(options)?;
        Ok(Self { plan, trace: Trace::None, _marker: std::marker::PhantomData })
    }

    /// Sets the tracing verbosity used by subsequent `decode` calls
    /// (debug builds only; a no-op in release builds).
    pub fn set_trace(&mut self, trace: Trace) {
        self.trace = trace;
    }

    pub fn plan(&self) -> &plan::Plan {
        &self.plan
    }

    pub fn decode(&self, source: Source<'_>, dest: &mut T, options: DecodeOptions) -> Result<(), DecodeError> {
        let input = source.bytes();
        let tokens = tokenizer::tokenize(input)?;
        let ctx = decode::Context {
            plan: &self.plan,
            input,
            tokens: &tokens,
            options: &options,
            trace: self.trace,
            borrow_strings: source.borrows_strings(),
        };
        decode::run(&ctx, dest as *mut T as *mut u8)
    }
}

/// One-shot convenience wrapping [`Decoder::new`] and [`Decoder::decode`]
/// for a single call — most callers decoding the same type repeatedly
/// should build a [`Decoder`] once and reuse it instead.
pub fn unmarshal<T: Shape>(source: Source<'_>, dest: &mut T) -> Result<(), DecodeError> {
    let decoder = Decoder::<T>::new(InitOptions::default())
        .map_err(|e| DecodeError::new(0, ErrorKind::Custom(Box::new(e))))?;
    decoder.decode(source, dest, DecodeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Point {
        x: f64,
        y: f64,
    }

    impl Shape for Point {
        fn build(compiler: &mut plan::Compiler, frame: plan::FrameIndex) {
            let x = compiler.describe::<f64>();
            let y = compiler.describe::<f64>();
            compiler.set_field_offset(x, std::mem::offset_of!(Point, x));
            compiler.set_field_offset(y, std::mem::offset_of!(Point, y));
            compiler.set_struct(
                frame,
                std::mem::size_of::<Point>(),
                std::mem::align_of::<Point>(),
                vec![
                    plan::StructField { name: "x", frame: x },
                    plan::StructField { name: "y", frame: y },
                ],
            );
        }

        unsafe fn reset(dest: *mut u8) {
            unsafe { std::ptr::write(dest as *mut Point, Point::default()) };
        }
    }

    #[test]
    fn decodes_a_struct() {
        let decoder = Decoder::<Point>::new(InitOptions::default()).unwrap();
        let mut point = Point::default();
        decoder
            .decode(Source::Str(r#"{"x":1,"y":2.5}"#), &mut point, DecodeOptions::default())
            .unwrap();
        assert_eq!(point, Point { x: 1.0, y: 2.5 });
    }

    #[test]
    fn unmarshal_one_shot() {
        let mut point = Point::default();
        unmarshal(Source::Str(r#"{"x":3,"y":4}"#), &mut point).unwrap();
        assert_eq!(point, Point { x: 3.0, y: 4.0 });
    }

    #[test]
    fn reuses_capacity_on_repeated_decode() {
        let decoder = Decoder::<Vec<i32>>::new(InitOptions::default()).unwrap();
        let mut v = Vec::with_capacity(8);
        decoder.decode(Source::Str("[1,2,3]"), &mut v, DecodeOptions::default()).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
        decoder.decode(Source::Str("[9]"), &mut v, DecodeOptions::default()).unwrap();
        assert_eq!(v, vec![9]);
    }

    #[test]
    fn null_resets_to_zero_value() {
        let decoder = Decoder::<Vec<i32>>::new(InitOptions::default()).unwrap();
        let mut v = vec![1, 2, 3];
        decoder.decode(Source::Str("null"), &mut v, DecodeOptions::default()).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn integer_overflow_is_reported() {
        let decoder = Decoder::<u8>::new(InitOptions::default()).unwrap();
        let mut n = 0u8;
        let err = decoder.decode(Source::Str("256"), &mut n, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IntegerOverflow));
    }
}
