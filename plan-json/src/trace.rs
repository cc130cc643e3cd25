//! Opt-in debug tracing, gated at compile time.
//!
//! No logging crate is introduced here: `println!` sits behind
//! `cfg(debug_assertions)` and a verbosity enum instead, `Trace`, consulted
//! only while decoding in a debug build.

/// Verbosity for [`crate::Decoder::decode`]'s internal tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trace {
    #[default]
    None,
    /// Print a line per frame entered.
    Frames,
    /// Print a line per frame entered and per token consumed.
    Tokens,
}

#[cfg(debug_assertions)]
pub(crate) fn frame(trace: Trace, frame_idx: usize, kind: &crate::plan::FrameKind) {
    if !matches!(trace, Trace::None) {
        println!("plan_json: frame #{frame_idx} {kind:?}");
    }
}

#[cfg(not(debug_assertions))]
pub(crate) fn frame(_trace: Trace, _frame_idx: usize, _kind: &crate::plan::FrameKind) {}

#[cfg(debug_assertions)]
pub(crate) fn token(trace: Trace, index: usize, kind: &crate::token::TokenKind) {
    if matches!(trace, Trace::Tokens) {
        println!("plan_json: token @{index} {kind:?}");
    }
}

#[cfg(not(debug_assertions))]
pub(crate) fn token(_trace: Trace, _index: usize, _kind: &crate::token::TokenKind) {}
