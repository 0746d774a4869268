//! Image decoder collaborator boundary.
//!
//! Locating and decoding a QR symbol inside an uploaded raster image is the
//! job of an external barcode library; the workflow only consumes its
//! result. This module defines that seam as a trait so the workflow can be
//! driven by a real decoder in the application and by
//! [`crate::MockImageDecoder`] in tests.

use crate::payload;
use qrgate_core::{Error, Result, ScannedAccessRequest};

/// A decoder that extracts the text of an embedded QR symbol from image
/// bytes.
///
/// Returns `Some(text)` when exactly one symbol is found and decodable,
/// `None` otherwise. Implementations must not fail: an unreadable image is
/// simply an image with no symbol in it.
pub trait ImageDecoder {
    fn decode(&self, image: &[u8]) -> Option<String>;
}

/// Decode an uploaded image and parse the embedded payload.
///
/// A missing symbol is reported as `Error::NoCodeFound`, distinct from the
/// `InvalidPayloadFormat` raised when a symbol decodes to malformed text.
///
/// # Errors
///
/// - `Error::NoCodeFound` when the decoder finds no QR symbol.
/// - `Error::InvalidPayloadFormat` when the symbol's text is not a
///   decodable record.
pub fn decode_scan<D: ImageDecoder + ?Sized>(
    decoder: &D,
    image: &[u8],
) -> Result<ScannedAccessRequest> {
    let text = decoder.decode(image).ok_or(Error::NoCodeFound)?;
    payload::parse(&text)
}
