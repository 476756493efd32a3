//! Specialized SIMD kernels
//!
//! Each module holds the encode/decode logic for one instruction set
//! extension.

pub mod base64;
pub mod sve;
