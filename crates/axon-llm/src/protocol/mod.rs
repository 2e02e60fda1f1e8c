//! Vendor wire-format types
//!
//! Serde definitions for each provider's native request, response, and
//! streaming shapes. Conversion to and from the unified types lives in
//! [`crate::convert`].

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;
