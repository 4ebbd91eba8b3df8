//! The input buffer: the single owner of the markup being edited.
//!
//! Provides a rope-backed text buffer with cursor management. Whole-document
//! replacement goes through [`InputBuffer::set_text`]; keystrokes use the
//! finer-grained editing operations. Both bump the revision that drives
//! re-validation.

mod buffer;

pub use buffer::{Cursor, Direction, InputBuffer};
