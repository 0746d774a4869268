//! Mock image decoder for testing and development.

use crate::decoder::ImageDecoder;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Queue-driven [`ImageDecoder`] that returns scripted results.
///
/// Each call to `decode` consumes the next queued outcome; an empty queue
/// reads as an image with no symbol in it.
///
/// # Examples
///
/// ```
/// use qrgate_qr::{ImageDecoder, MockImageDecoder};
///
/// let decoder = MockImageDecoder::new();
/// decoder.push_symbol(r#"{"macAddress":"AA","encryptedData":"x"}"#);
/// decoder.push_no_symbol();
///
/// assert!(decoder.decode(b"first").is_some());
/// assert!(decoder.decode(b"second").is_none());
/// ```
#[derive(Debug, Default)]
pub struct MockImageDecoder {
    outcomes: Mutex<VecDeque<Option<String>>>,
}

impl MockImageDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successfully decoded symbol.
    pub fn push_symbol(&self, text: impl Into<String>) {
        self.lock().push_back(Some(text.into()));
    }

    /// Queue an image in which no symbol is found.
    pub fn push_no_symbol(&self) {
        self.lock().push_back(None);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Option<String>>> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageDecoder for MockImageDecoder {
    fn decode(&self, _image: &[u8]) -> Option<String> {
        self.lock().pop_front().flatten()
    }
}
