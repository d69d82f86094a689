//! JPEG structural validation.
//!
//! Walks the marker stream from SOI, skipping length-prefixed segments and
//! tracking which of DQT/DHT/DAC/SOS have appeared, until an EOI whose
//! preconditions hold. Inside entropy-coded data (after SOS) an
//! unrecognized two-byte read backs up to one byte past where it started
//! and resumes byte-by-byte; long runs of 0xFF that never form a marker
//! therefore rescan with overlap, which is accepted as the cost of never
//! missing a real marker.

use crate::bytes::{peek_u16, Cursor, Endian};

pub const SOI: u16 = 0xFFD8;
pub const EOI: u16 = 0xFFD9;
pub const SOS: u16 = 0xFFDA;
pub const DQT: u16 = 0xFFDB;
pub const DHT: u16 = 0xFFC4;
pub const DAC: u16 = 0xFFCC;
pub const DRI: u16 = 0xFFDD;
pub const COM: u16 = 0xFFFE;
pub const STUFFED: u16 = 0xFF00;

/// APP0..APP15, the SOF family (and the reserved JPG marker), and COM all
/// carry a big-endian length that counts its own two bytes.
#[inline]
const fn is_length_prefixed(marker: u16) -> bool {
    matches!(
        marker,
        0xFFE0..=0xFFEF // APP0..APP15
        | 0xFFC0..=0xFFC3 // SOF0..SOF3
        | 0xFFC5..=0xFFCB // SOF5..SOF7, JPG, SOF9..SOF11
        | 0xFFCD..=0xFFCF // SOF13..SOF15
        | COM
    )
}

#[inline]
const fn is_restart(marker: u16) -> bool {
    matches!(marker, 0xFFD0..=0xFFD7)
}

/// Validates one JPEG starting at `window[0]`.
///
/// Returns the exact byte length through EOI, or `None`.
pub fn validate(window: &[u8]) -> Option<usize> {
    if peek_u16(window, 0, Endian::Big) != SOI {
        return None;
    }

    let mut cur = Cursor::new(window);

    let mut found_soi = false;
    let mut found_dht = false;
    let mut found_dqt = false;
    let mut found_dac = false;
    let mut found_sos = false;
    let mut found_eoi = false;

    while !found_eoi && !cur.is_empty() {
        let before_read = cur.pos();
        let marker = cur.read_u16(Endian::Big);
        match marker {
            STUFFED => {
                // stuffed 0xFF only occurs inside entropy-coded data
                if !found_sos {
                    return None;
                }
            }
            m if is_length_prefixed(m) => {
                let len = cur.peek_u16(Endian::Big);
                cur.skip(len as usize);
            }
            DRI => {
                cur.skip(2);
            }
            m if is_restart(m) => {
                if !found_sos {
                    return None;
                }
            }
            SOI => {
                if found_soi {
                    return None;
                }
                found_soi = true;
            }
            DHT => {
                found_dht = true;
                let len = cur.peek_u16(Endian::Big);
                cur.skip(len as usize);
            }
            DQT => {
                found_dqt = true;
                let len = cur.peek_u16(Endian::Big);
                cur.skip(len as usize);
            }
            DAC => {
                found_dac = true;
                let len = cur.peek_u16(Endian::Big);
                cur.skip(len as usize);
            }
            EOI => {
                if !found_sos || !(found_dht || found_dac) || !found_dqt {
                    return None;
                }
                found_eoi = true;
            }
            SOS => {
                if found_sos {
                    return None;
                }
                found_sos = true;
            }
            _ => {
                if !found_sos {
                    return None;
                }
                // entropy-coded data: resume one byte past where this
                // read started
                cur.seek(before_read + 1);
            }
        }
    }

    if !found_eoi {
        return None;
    }

    Some(cur.pos())
}
