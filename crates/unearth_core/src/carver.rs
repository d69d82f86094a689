//! The scanning driver.
//!
//! [`Carver`] walks a borrowed byte view one candidate position at a time:
//! it skips ahead to the next byte that could begin a signature, hands a
//! bounded window to the matching validator, and yields a
//! [`RecoveredObject`] on success. The cursor advances exactly one byte
//! after every dispatched candidate, match or not, so an object beginning
//! inside another candidate's rejected window is still found; pathological
//! data can therefore be re-scanned, which is accepted.

use memchr::memchr3;

use crate::types::{ImageFormat, RecoveredObject};
use crate::{gif, jpeg, png, tiff, webp};

/// Default cap on how many bytes a single candidate may span.
pub const DEFAULT_MAX_WINDOW: usize = 1024 * 1024 * 1024; // 1 GiB

pub const LEAD_JPEG: u8 = 0xFF;
pub const LEAD_PNG: u8 = 0x89;
pub const LEAD_GIF: u8 = 0x47; // 'G'
pub const LEAD_TIFF_LE: u8 = 0x49; // 'I'
pub const LEAD_TIFF_BE: u8 = 0x4D; // 'M'
pub const LEAD_WEBP: u8 = 0x52; // 'R'

/// Scanner configuration.
#[derive(Debug, Clone, Copy)]
pub struct CarverConfig {
    /// Maximum candidate window size in bytes. Bounds the worst-case work
    /// a single validator call can do.
    pub max_window: usize,
}

impl Default for CarverConfig {
    fn default() -> Self {
        Self {
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

/// First position of any signature lead byte, or `None`.
#[inline]
fn find_lead_byte(haystack: &[u8]) -> Option<usize> {
    let a = memchr3(LEAD_JPEG, LEAD_PNG, LEAD_GIF, haystack);
    let b = memchr3(LEAD_TIFF_LE, LEAD_TIFF_BE, LEAD_WEBP, haystack);
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

/// Sequential signature scanner over a source view.
///
/// Yields recovered objects in strictly increasing start-offset order.
pub struct Carver<'a> {
    data: &'a [u8],
    pos: usize,
    max_window: usize,
}

impl<'a> Carver<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, CarverConfig::default())
    }

    #[must_use]
    pub fn with_config(data: &'a [u8], config: CarverConfig) -> Self {
        Self {
            data,
            pos: 0,
            // a window below the largest signature is useless
            max_window: config.max_window.max(16),
        }
    }

    /// Current cursor position, for progress reporting.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Total length of the source view.
    #[inline]
    #[must_use]
    pub fn source_len(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    fn window_at(&self, pos: usize) -> &'a [u8] {
        let end = pos.saturating_add(self.max_window).min(self.data.len());
        &self.data[pos..end]
    }

    /// Dispatches on the lead byte; `window` starts at the candidate.
    fn validate_at(window: &[u8]) -> Option<(ImageFormat, usize)> {
        match window[0] {
            LEAD_JPEG => jpeg::validate(window).map(|n| (ImageFormat::Jpeg, n)),
            LEAD_PNG => png::validate(window).map(|n| (ImageFormat::Png, n)),
            LEAD_GIF => gif::validate(window).map(|n| (ImageFormat::Gif, n)),
            LEAD_TIFF_LE | LEAD_TIFF_BE => tiff::validate(window).map(|n| (ImageFormat::Tiff, n)),
            LEAD_WEBP => webp::validate(window).map(|n| (ImageFormat::Webp, n)),
            _ => None,
        }
    }
}

impl Iterator for Carver<'_> {
    type Item = RecoveredObject;

    fn next(&mut self) -> Option<RecoveredObject> {
        while self.pos < self.data.len() {
            // quick skip to the next possible signature within this window
            let window = self.window_at(self.pos);
            match find_lead_byte(window) {
                None => {
                    self.pos += window.len();
                    continue;
                }
                Some(delta) => self.pos += delta,
            }

            let start = self.pos;
            let result = Self::validate_at(self.window_at(start));
            // one byte forward regardless of outcome
            self.pos = start + 1;

            if let Some((format, length)) = result {
                return Some(RecoveredObject {
                    format,
                    start_offset: start as u64,
                    length: length as u64,
                });
            }
        }
        None
    }
}
