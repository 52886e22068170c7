//! Cross-unit linking: merging translation units into one program

pub mod merger;

pub use merger::{MergeStats, Merger, Program};
