//! QR payload parsing and the image-decoder collaborator boundary.
//!
//! A device QR code encodes a JSON record with two string fields,
//! `macAddress` and `encryptedData`. This crate turns raw scanned text into
//! a [`qrgate_core::ScannedAccessRequest`] and defines the seam to the
//! external library that locates and decodes QR symbols in uploaded images.

pub mod decoder;
pub mod mock;
pub mod payload;

pub use decoder::{ImageDecoder, decode_scan};
pub use mock::MockImageDecoder;
pub use payload::parse;
