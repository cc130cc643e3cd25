//! The compiled plan frame.
//!
//! A [`PlanFrame`] carries only facts fixed at compile time. Per-call
//! mutable state (destination pointers, the token cursor) is threaded
//! through [`crate::decode`] as plain function arguments rather than stored
//! on the frame — the recursive interpreter's own call stack plays the role
//! an explicit per-frame save/restore array would otherwise need to.
//! See DESIGN.md for the grounding of this design.

use std::rc::Rc;

use crate::error::ErrorKind;
use crate::field_index::FieldIndex;

/// Index of a frame within a [`super::Plan`]'s flat frame table.
pub type FrameIndex = usize;

/// The closed set of scalar element kinds: one kind plus a width tag rather
/// than a separate tag per integer/float width, so the interpreter still
/// dispatches on a single enum match without 15 near-identical variants
/// (documented in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Str,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

/// The closed frame-kind tag set the interpreter switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Scalar(ScalarKind),
    /// A scalar wrapped in JSON's `,string` tag option: the token must be a
    /// `Str` whose unescaped contents are then parsed as the wrapped kind.
    ScalarString(ScalarKind),
    Any,
    Ptr,
    PtrRecur,
    /// Fixed-size `[T; N]`.
    Array,
    Slice,
    SliceRecur,
    /// `Vec<T>` where `T` is a plain scalar, consolidated under one kind
    /// instead of a separate tag per width.
    SliceScalar(ScalarKind),
    Map,
    MapRecur,
    /// `HashMap<String, String>`, specialized since both key and value
    /// decode with no further indirection.
    MapStringString,
    Struct,
    StructRecur,
    /// A struct with no decodable fields: tokens are skipped, nothing written.
    EmptyStruct,
    JsonUnmarshaler,
    TextUnmarshaler,
}

/// One struct member: its matched name and the frame describing its value.
#[derive(Debug, Clone)]
pub struct StructField {
    pub name: &'static str,
    pub frame: FrameIndex,
}

/// Per-kind operations that cannot be expressed as plain data because they
/// close over a concrete, compile-time-only type parameter. Each function
/// pointer here is a monomorphized, non-capturing generic function
/// instantiation — plain `fn` pointers, not `dyn` trait objects, so there is
/// no allocation or dynamic dispatch beyond an ordinary indirect call.
#[derive(Clone, Copy)]
pub enum FrameOps {
    None,
    Ptr {
        /// Ensures the `Option<Box<T>>` at `dest` is `Some`, allocating
        /// `Box::new(T::default())` only if it was `None`, and returns the
        /// address of the (possibly pre-existing, reused) boxed payload.
        ensure: unsafe fn(dest: *mut u8) -> *mut u8,
    },
    Slice {
        /// Resizes the `Vec<T>` at `dest` to exactly `len` elements,
        /// default-constructing any new ones and truncating surplus ones —
        /// reusing existing backing capacity either way.
        resize: unsafe fn(dest: *mut u8, len: usize),
        /// Raw address of the `Vec<T>`'s first element.
        base_ptr: unsafe fn(dest: *mut u8) -> *mut u8,
    },
    Map {
        /// Parses `key_text` as this map's key type and returns a pointer
        /// to the (possibly freshly inserted) value slot.
        insert: unsafe fn(dest: *mut u8, key_text: &str) -> Result<*mut u8, ErrorKind>,
        reserve: unsafe fn(dest: *mut u8, additional: usize),
    },
    JsonUnmarshaler {
        call: unsafe fn(dest: *mut u8, raw: &[u8]) -> Result<(), ErrorKind>,
    },
    TextUnmarshaler {
        call: unsafe fn(dest: *mut u8, text: &str) -> Result<(), ErrorKind>,
    },
}

/// One node of the compiled plan.
#[derive(Clone)]
pub struct PlanFrame {
    pub kind: FrameKind,
    pub size: usize,
    pub align: usize,
    /// Byte offset of this frame's value within its parent struct frame;
    /// `0` and unused for frames that are not struct fields.
    pub offset: usize,
    pub parent: Option<FrameIndex>,
    /// Element/value/pointee frame for Array, Slice*, Ptr*, Map*.
    pub elem: Option<FrameIndex>,
    /// `N` for a fixed-size `Array` frame.
    pub array_len: usize,
    /// Struct/StructRecur fields.
    pub fields: Vec<StructField>,
    /// Precomputed exact/case-insensitive name lookup over `fields`;
    /// `None` for non-struct frames.
    pub field_index: Option<Rc<FieldIndex>>,
    pub ops: FrameOps,
    /// Resets the destination in place to this type's zero value —
    /// consulted whenever a `null` token lands on this frame, except for
    /// `Struct`/`StructRecur`/`EmptyStruct`, which `null` leaves untouched.
    pub reset: unsafe fn(*mut u8),
    /// Set once a back-edge to this frame is discovered during compilation;
    /// `StructRecur`/`SliceRecur`/`MapRecur`/`PtrRecur` frames are exactly
    /// the frames with this flag set.
    pub recursive: bool,
}

impl PlanFrame {
    pub(crate) fn placeholder(reset: unsafe fn(*mut u8)) -> Self {
        Self {
            kind: FrameKind::EmptyStruct,
            size: 0,
            align: 1,
            offset: 0,
            parent: None,
            elem: None,
            array_len: 0,
            fields: Vec::new(),
            field_index: None,
            ops: FrameOps::None,
            reset,
            recursive: false,
        }
    }

    /// Flips this frame's kind to its `*Recur` counterpart, idempotently.
    pub(crate) fn mark_recursive(&mut self) {
        self.recursive = true;
        self.kind = match self.kind {
            FrameKind::Struct => FrameKind::StructRecur,
            FrameKind::Slice | FrameKind::SliceScalar(_) => FrameKind::SliceRecur,
            FrameKind::Map => FrameKind::MapRecur,
            FrameKind::Ptr => FrameKind::PtrRecur,
            other => other,
        };
    }
}
