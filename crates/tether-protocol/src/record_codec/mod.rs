//! Record serialization and deserialization.
//!
//! Pure, stateless conversion between application values and the byte
//! layouts described in [`crate::record`]. No allocation policy or slot
//! ownership lives here.
//!
//! # Module Organization
//!
//! - [`encoder`] - Values to fixed and variable records
//! - [`decoder`] - Validation and decoding of fixed and variable records

pub mod decoder;
pub mod encoder;

#[cfg(test)]
mod tests;

pub use decoder::RecordDecoder;
pub use encoder::RecordEncoder;
