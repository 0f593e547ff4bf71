//! Code formatting for exx output.

pub mod lua;

pub use lua::{print_chunk, quote};
