//! Strongly typed identifiers and column codecs shared across the crate.

#[macro_use]
mod text_enum;
pub mod id;

pub use id::*;
pub use text_enum::UnknownVariant;
