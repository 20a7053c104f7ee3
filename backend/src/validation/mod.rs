//! Request payload validation.
//!
//! Payload structs derive [`Validate`]; field rules that the derive cannot
//! express live in [`rules`].

pub mod rules;

pub use validator::Validate;
