//! The runtime type description the compiler consumes.
//!
//! A [`Shape`] exposes only the static facts the compiler needs about a
//! type — its kind, size, field offsets, child shapes — and carries no
//! per-decode state: a plan is immutable once built. Implemented here by
//! hand for primitives and the standard containers this crate supports;
//! user structs normally get an impl generated by `#[derive(plan_json::Decode)]`
//! instead of writing one.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::ErrorKind;
use crate::numeric::BoundedInt;
use crate::plan::{Compiler, FrameIndex, ScalarKind};
use crate::value::Value;

/// Implemented by every type this crate can decode into.
///
/// An earlier revision required `Self: Default` as a supertrait so the
/// compiler could build each frame's reset function generically from
/// `T::default`. That doesn't work for `[T; N]`: the standard library has
/// no blanket `impl<T: Default, const N: usize> Default for [T; N]`, only
/// concrete impls up to length 32, so the bound made `impl Shape for
/// [T; N]` fail to compile for any `N`. `reset` is now a required method
/// instead, so each impl supplies its own — `[T; N]` builds its zero value
/// with `std::array::from_fn`, which needs only `T: Default`.
pub trait Shape: 'static {
    /// Fills in the frame already reserved for this type by the compiler.
    fn build(compiler: &mut Compiler, frame: FrameIndex);

    /// Writes this type's zero value at `dest` in place — what a `null`
    /// token resets a destination to.
    unsafe fn reset(dest: *mut u8);
}

macro_rules! impl_scalar {
    ($t:ty, $kind:expr) => {
        impl Shape for $t {
            fn build(compiler: &mut Compiler, frame: FrameIndex) {
                compiler.set_scalar(frame, $kind, std::mem::size_of::<$t>(), std::mem::align_of::<$t>());
            }

            unsafe fn reset(dest: *mut u8) {
                unsafe { std::ptr::write(dest as *mut $t, <$t>::default()) };
            }
        }
    };
}

impl_scalar!(bool, ScalarKind::Bool);
impl_scalar!(i8, ScalarKind::I8);
impl_scalar!(i16, ScalarKind::I16);
impl_scalar!(i32, ScalarKind::I32);
impl_scalar!(i64, ScalarKind::I64);
impl_scalar!(isize, ScalarKind::Isize);
impl_scalar!(u8, ScalarKind::U8);
impl_scalar!(u16, ScalarKind::U16);
impl_scalar!(u32, ScalarKind::U32);
impl_scalar!(u64, ScalarKind::U64);
impl_scalar!(usize, ScalarKind::Usize);
impl_scalar!(f32, ScalarKind::F32);
impl_scalar!(f64, ScalarKind::F64);

impl Shape for String {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        compiler.set_scalar(frame, ScalarKind::Str, std::mem::size_of::<String>(), std::mem::align_of::<String>());
    }

    unsafe fn reset(dest: *mut u8) {
        unsafe { std::ptr::write(dest as *mut String, String::new()) };
    }
}

/// The dynamic decode target for fields typed `plan_json::Value`.
impl Shape for Value {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        compiler.set_any(frame, std::mem::size_of::<Value>(), std::mem::align_of::<Value>());
    }

    unsafe fn reset(dest: *mut u8) {
        unsafe { std::ptr::write(dest as *mut Value, Value::default()) };
    }
}

/// Go's nilable pointer `*T` becomes `Option<Box<T>>`: `None` is the zero
/// value and doubles as JSON `null`; `Some` owns a heap slot whose address
/// is stable for the call, which is what lets self-referential aggregates
/// (linked structures) terminate without infinite frame expansion.
impl<T: Shape + Default> Shape for Option<Box<T>> {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        let elem = compiler.describe::<T>();
        compiler.set_ptr(
            frame,
            std::mem::size_of::<Self>(),
            std::mem::align_of::<Self>(),
            elem,
            ensure_ptr::<T>,
        );
    }

    unsafe fn reset(dest: *mut u8) {
        unsafe { std::ptr::write(dest as *mut Self, None) };
    }
}

unsafe fn ensure_ptr<T: Default>(dest: *mut u8) -> *mut u8 {
    let opt = unsafe { &mut *(dest as *mut Option<Box<T>>) };
    if opt.is_none() {
        *opt = Some(Box::new(T::default()));
    }
    opt.as_deref_mut().expect("just ensured Some") as *mut T as *mut u8
}

impl<T: Shape + Default, const N: usize> Shape for [T; N] {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        let elem = compiler.describe::<T>();
        compiler.set_array(frame, std::mem::size_of::<Self>(), std::mem::align_of::<Self>(), N, elem);
    }

    unsafe fn reset(dest: *mut u8) {
        let zero: [T; N] = std::array::from_fn(|_| T::default());
        unsafe { std::ptr::write(dest as *mut [T; N], zero) };
    }
}

impl<T: Shape + Default> Shape for Vec<T> {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        let elem = compiler.describe::<T>();
        let scalar = compiler_scalar_kind_of(&elem, compiler);
        compiler.set_slice(
            frame,
            std::mem::size_of::<Self>(),
            std::mem::align_of::<Self>(),
            elem,
            scalar,
            resize_vec::<T>,
            base_ptr_vec::<T>,
        );
    }

    unsafe fn reset(dest: *mut u8) {
        unsafe { std::ptr::write(dest as *mut Vec<T>, Vec::new()) };
    }
}

/// Reports the element's scalar kind so the compiler can pick the
/// `SliceScalar` fast-path frame kind instead of the generic `Slice` one.
fn compiler_scalar_kind_of(elem: &FrameIndex, compiler: &Compiler) -> Option<ScalarKind> {
    match compiler.peek(*elem) {
        crate::plan::FrameKind::Scalar(k) => Some(k),
        _ => None,
    }
}

unsafe fn resize_vec<T: Default>(dest: *mut u8, len: usize) {
    let v = unsafe { &mut *(dest as *mut Vec<T>) };
    v.resize_with(len, T::default);
}

unsafe fn base_ptr_vec<T>(dest: *mut u8) -> *mut u8 {
    let v = unsafe { &mut *(dest as *mut Vec<T>) };
    v.as_mut_ptr() as *mut u8
}

/// A type that can appear as a JSON object key, parsed from the member
/// name's unescaped text.
pub trait MapKeyShape: Eq + Hash + 'static {
    fn from_key_text(text: &str) -> Result<Self, ErrorKind>
    where
        Self: Sized;
}

impl MapKeyShape for String {
    fn from_key_text(text: &str) -> Result<Self, ErrorKind> {
        Ok(text.to_string())
    }
}

macro_rules! impl_map_key_int {
    ($($t:ty),+ $(,)?) => {
        $(impl MapKeyShape for $t {
            fn from_key_text(text: &str) -> Result<Self, ErrorKind> {
                <$t as BoundedInt>::parse_bounded(text).map_err(|err| match err {
                    crate::numeric::NumericError::Overflow => ErrorKind::IntegerOverflow,
                    crate::numeric::NumericError::Invalid => ErrorKind::UnexpectedValue,
                })
            }
        })+
    };
}

impl_map_key_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<K: MapKeyShape + Shape, V: Shape + Default> Shape for HashMap<K, V> {
    fn build(compiler: &mut Compiler, frame: FrameIndex) {
        let elem = compiler.describe::<V>();
        let string_string = std::any::TypeId::of::<K>() == std::any::TypeId::of::<String>()
            && std::any::TypeId::of::<V>() == std::any::TypeId::of::<String>();
        let insert: unsafe fn(*mut u8, &str) -> Result<*mut u8, ErrorKind> =
            if value_is_struct_kind(elem, compiler) { insert_map_zeroing::<K, V> } else { insert_map::<K, V> };
        compiler.set_map(
            frame,
            std::mem::size_of::<Self>(),
            std::mem::align_of::<Self>(),
            elem,
            string_string,
            insert,
            reserve_map::<K, V>,
        );
    }

    unsafe fn reset(dest: *mut u8) {
        unsafe { std::ptr::write(dest as *mut HashMap<K, V>, HashMap::new()) };
    }
}

/// Whether the map's value frame is a struct — the case where a duplicate
/// key landing on an already-populated slot must be zeroed before reuse
/// instead of merged field-by-field, mirroring how `Vec<T>`'s element frame
/// is checked to pick its specialized scalar kind.
fn value_is_struct_kind(elem: FrameIndex, compiler: &Compiler) -> bool {
    matches!(compiler.peek(elem), crate::plan::FrameKind::Struct | crate::plan::FrameKind::StructRecur)
}

unsafe fn insert_map<K: MapKeyShape, V: Default>(dest: *mut u8, key_text: &str) -> Result<*mut u8, ErrorKind> {
    let key = K::from_key_text(key_text)?;
    let map = unsafe { &mut *(dest as *mut HashMap<K, V>) };
    Ok(map.entry(key).or_insert_with(V::default) as *mut V as *mut u8)
}

/// As [`insert_map`], but a key that already has a slot gets it zeroed
/// before the caller decodes into it — a duplicate key's struct value must
/// fully replace the previous occurrence, not merge with it field-by-field.
unsafe fn insert_map_zeroing<K: MapKeyShape, V: Shape + Default>(dest: *mut u8, key_text: &str) -> Result<*mut u8, ErrorKind> {
    let key = K::from_key_text(key_text)?;
    let map = unsafe { &mut *(dest as *mut HashMap<K, V>) };
    match map.entry(key) {
        std::collections::hash_map::Entry::Occupied(entry) => {
            let slot = entry.into_mut() as *mut V as *mut u8;
            unsafe { V::reset(slot) };
            Ok(slot)
        }
        std::collections::hash_map::Entry::Vacant(entry) => Ok(entry.insert(V::default()) as *mut V as *mut u8),
    }
}

unsafe fn reserve_map<K: Eq + Hash, V>(dest: *mut u8, additional: usize) {
    let map = unsafe { &mut *(dest as *mut HashMap<K, V>) };
    map.reserve(additional);
}

/// Implemented by a type that decodes itself from the raw, still-escaped
/// bytes of a single JSON value (analogous to Go's `json.Unmarshaler`).
pub trait FromJsonRaw: Sized {
    fn from_json_raw(raw: &[u8]) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>;
}

/// Implemented by a type that decodes itself from the unescaped text of a
/// JSON string (analogous to `encoding.TextUnmarshaler`).
pub trait FromJsonText: Sized {
    fn from_json_text(text: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>;
}

/// Generates a [`Shape`] impl that routes through [`FromJsonRaw`] instead of
/// field-by-field decoding. `plan-json-derive` emits a call to this macro
/// for `#[plan_json(raw)]`-annotated types.
#[macro_export]
macro_rules! shape_from_json_raw {
    ($t:ty) => {
        impl $crate::Shape for $t
        where
            $t: ::core::default::Default,
        {
            fn build(compiler: &mut $crate::plan::Compiler, frame: $crate::plan::FrameIndex) {
                unsafe fn call(dest: *mut u8, raw: &[u8]) -> Result<(), $crate::ErrorKind> {
                    let value = <$t as $crate::FromJsonRaw>::from_json_raw(raw).map_err($crate::ErrorKind::Custom)?;
                    unsafe { std::ptr::write(dest as *mut $t, value) };
                    Ok(())
                }
                compiler.set_json_unmarshaler(frame, std::mem::size_of::<$t>(), std::mem::align_of::<$t>(), call);
            }

            unsafe fn reset(dest: *mut u8) {
                unsafe { std::ptr::write(dest as *mut $t, <$t as ::core::default::Default>::default()) };
            }
        }
    };
}

/// Generates a [`Shape`] impl that routes through [`FromJsonText`] instead
/// of field-by-field decoding. `plan-json-derive` emits a call to this
/// macro for `#[plan_json(text)]`-annotated types.
#[macro_export]
macro_rules! shape_from_json_text {
    ($t:ty) => {
        impl $crate::Shape for $t
        where
            $t: ::core::default::Default,
        {
            fn build(compiler: &mut $crate::plan::Compiler, frame: $crate::plan::FrameIndex) {
                unsafe fn call(dest: *mut u8, text: &str) -> Result<(), $crate::ErrorKind> {
                    let value = <$t as $crate::FromJsonText>::from_json_text(text).map_err($crate::ErrorKind::Custom)?;
                    unsafe { std::ptr::write(dest as *mut $t, value) };
                    Ok(())
                }
                compiler.set_text_unmarshaler(frame, std::mem::size_of::<$t>(), std::mem::align_of::<$t>(), call);
            }

            unsafe fn reset(dest: *mut u8) {
                unsafe { std::ptr::write(dest as *mut $t, <$t as ::core::default::Default>::default()) };
            }
        }
    };
}
