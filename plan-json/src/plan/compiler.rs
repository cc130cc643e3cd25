//! The type-plan compiler.

use std::any::TypeId;

use crate::error::{ErrorKind, PlanError};
use crate::options::InitOptions;
use crate::shape::Shape;

use super::frame::{FrameIndex, FrameKind, FrameOps, PlanFrame, ScalarKind, StructField};
use super::Plan;

/// Walks a [`Shape`] exactly once, turning it into a flat [`Plan`].
///
/// Self-reference is handled by tracking the types currently being
/// described on a stack: a type encountered while it is still its own
/// ancestor closes a back edge instead of recursing forever — the
/// ancestor's frame is rewritten in place to its `*Recur` kind and its
/// index is handed back as-is, so every other caller of [`Compiler::describe`]
/// receives a single, uniform `FrameIndex` regardless of whether the frame
/// turns out to be self-referential.
pub struct Compiler {
    frames: Vec<PlanFrame>,
    building: Vec<(TypeId, FrameIndex)>,
    options: InitOptions,
    error: Option<PlanError>,
}

impl Compiler {
    fn new(options: InitOptions) -> Self {
        Self { frames: Vec::new(), building: Vec::new(), options, error: None }
    }

    pub fn init_options(&self) -> InitOptions {
        self.options
    }

    /// Applies a field's `,string` tag option: a `Scalar` frame is rewritten
    /// to decode from a JSON string containing the scalar's usual text form
    /// instead of its usual token kind. Applied to anything else, the tag
    /// is a no-op unless `disallow_string_tag_on_unsupported_types` is set,
    /// in which case it becomes a compile error.
    pub fn apply_string_tag(&mut self, frame: FrameIndex, field: &str) {
        if let FrameKind::Scalar(kind) = self.frames[frame].kind {
            self.frames[frame].kind = FrameKind::ScalarString(kind);
            return;
        }
        if self.options.disallow_string_tag_on_unsupported_types && self.error.is_none() {
            self.error = Some(PlanError::string_tag_on_unsupported_type(field));
        }
    }

    /// Compiles `T` into a complete [`Plan`] rooted at frame `0`.
    pub fn compile<T: Shape>(options: InitOptions) -> Result<Plan, PlanError> {
        let mut compiler = Self::new(options);
        let root = compiler.describe::<T>();
        debug_assert_eq!(root, 0);
        match compiler.error {
            Some(err) => Err(err),
            None => Ok(Plan { frames: compiler.frames }),
        }
    }

    /// Returns the frame index describing `T`, building it on first
    /// encounter and reusing the ancestor frame on a self-referential
    /// repeat.
    pub fn describe<T: Shape>(&mut self) -> FrameIndex {
        let tid = TypeId::of::<T>();
        if let Some(&(_, ancestor)) = self.building.iter().rev().find(|(t, _)| *t == tid) {
            self.frames[ancestor].mark_recursive();
            return ancestor;
        }
        let idx = self.frames.len();
        self.frames.push(PlanFrame::placeholder(T::reset));
        self.building.push((tid, idx));
        T::build(self, idx);
        self.building.pop();
        idx
    }

    pub fn set_scalar(&mut self, frame: FrameIndex, kind: ScalarKind, size: usize, align: usize) {
        self.frames[frame].kind = FrameKind::Scalar(kind);
        self.frames[frame].size = size;
        self.frames[frame].align = align;
    }

    pub fn set_scalar_string(&mut self, frame: FrameIndex, kind: ScalarKind, size: usize, align: usize) {
        self.frames[frame].kind = FrameKind::ScalarString(kind);
        self.frames[frame].size = size;
        self.frames[frame].align = align;
    }

    pub fn set_any(&mut self, frame: FrameIndex, size: usize, align: usize) {
        self.frames[frame].kind = FrameKind::Any;
        self.frames[frame].size = size;
        self.frames[frame].align = align;
    }

    pub fn set_ptr(
        &mut self,
        frame: FrameIndex,
        size: usize,
        align: usize,
        elem: FrameIndex,
        ensure: unsafe fn(*mut u8) -> *mut u8,
    ) {
        self.frames[frame].kind = FrameKind::Ptr;
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].elem = Some(elem);
        self.frames[frame].ops = FrameOps::Ptr { ensure };
        self.frames[elem].parent = Some(frame);
    }

    pub fn set_array(&mut self, frame: FrameIndex, size: usize, align: usize, len: usize, elem: FrameIndex) {
        self.frames[frame].kind = FrameKind::Array;
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].array_len = len;
        self.frames[frame].elem = Some(elem);
        self.frames[elem].parent = Some(frame);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_slice(
        &mut self,
        frame: FrameIndex,
        size: usize,
        align: usize,
        elem: FrameIndex,
        scalar: Option<ScalarKind>,
        resize: unsafe fn(*mut u8, usize),
        base_ptr: unsafe fn(*mut u8) -> *mut u8,
    ) {
        self.frames[frame].kind = match scalar {
            Some(k) => FrameKind::SliceScalar(k),
            None => FrameKind::Slice,
        };
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].elem = Some(elem);
        self.frames[frame].ops = FrameOps::Slice { resize, base_ptr };
        self.frames[elem].parent = Some(frame);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_map(
        &mut self,
        frame: FrameIndex,
        size: usize,
        align: usize,
        elem: FrameIndex,
        string_string: bool,
        insert: unsafe fn(*mut u8, &str) -> Result<*mut u8, ErrorKind>,
        reserve: unsafe fn(*mut u8, usize),
    ) {
        self.frames[frame].kind = if string_string { FrameKind::MapStringString } else { FrameKind::Map };
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].elem = Some(elem);
        self.frames[frame].ops = FrameOps::Map { insert, reserve };
        self.frames[elem].parent = Some(frame);
    }

    pub fn set_struct(&mut self, frame: FrameIndex, size: usize, align: usize, fields: Vec<StructField>) {
        if fields.is_empty() {
            self.frames[frame].kind = FrameKind::EmptyStruct;
        } else {
            self.frames[frame].kind = FrameKind::Struct;
        }
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        for field in &fields {
            self.frames[field.frame].parent = Some(frame);
        }
        self.frames[frame].field_index = Some(std::rc::Rc::new(crate::field_index::FieldIndex::build(&fields)));
        self.frames[frame].fields = fields;
    }

    pub fn set_json_unmarshaler(
        &mut self,
        frame: FrameIndex,
        size: usize,
        align: usize,
        call: unsafe fn(*mut u8, &[u8]) -> Result<(), ErrorKind>,
    ) {
        self.frames[frame].kind = FrameKind::JsonUnmarshaler;
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].ops = FrameOps::JsonUnmarshaler { call };
    }

    pub fn set_text_unmarshaler(
        &mut self,
        frame: FrameIndex,
        size: usize,
        align: usize,
        call: unsafe fn(*mut u8, &str) -> Result<(), ErrorKind>,
    ) {
        self.frames[frame].kind = FrameKind::TextUnmarshaler;
        self.frames[frame].size = size;
        self.frames[frame].align = align;
        self.frames[frame].ops = FrameOps::TextUnmarshaler { call };
    }

    /// Records the byte offset of a struct field's value frame within its
    /// parent struct, computed by generated code with `core::mem::offset_of!`.
    pub fn set_field_offset(&mut self, frame: FrameIndex, offset: usize) {
        self.frames[frame].offset = offset;
    }

    /// Reads back the kind already assigned to a frame — used by a parent
    /// container (e.g. `Vec<T>`) to decide whether its element qualifies
    /// for a specialized scalar fast path.
    pub fn peek(&self, frame: FrameIndex) -> FrameKind {
        self.frames[frame].kind
    }
}
