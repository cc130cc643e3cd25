//! Per-call configuration.
//!
//! Both structs are plain flag bags with no builder ceremony — the only
//! configuration surface this crate needs is a handful of booleans passed
//! at construction and at each decode call.

/// Flags consulted once, while a [`crate::Decoder`] compiles a [`crate::plan::Plan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Reject the `,string` tag option applied to a field whose shape cannot
    /// carry it (anything but a scalar). Off by default — `ErrStringTagOnUnsupportedType`
    /// is the compiler's only possible failure, so callers opt into it deliberately.
    pub disallow_string_tag_on_unsupported_types: bool,
}

/// Flags consulted on every [`crate::Decoder::decode`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Reject object members with no matching struct field instead of
    /// skipping them.
    pub disallow_unknown_fields: bool,
    /// Skip the JSON-escape-aware comparison pass and match field names as
    /// raw bytes only.
    pub disable_field_name_unescaping: bool,
    /// Skip the case-insensitive fallback pass of the two-pass field lookup;
    /// unmatched-by-exact-match members are always treated as unknown.
    pub disable_case_insensitive_matching: bool,
    /// Strict-mode extension: reject a second occurrence of the same
    /// object key instead of letting the later one overwrite the former.
    pub disallow_duplicate_names: bool,
}
