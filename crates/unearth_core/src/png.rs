//! PNG structural validation.
//!
//! Walks the chunk stream after the 8-byte signature, enforcing chunk
//! ordering (IHDR first and once, IDAT/PLTE after IHDR, IEND terminal,
//! unknown types must be ancillary) and verifying each chunk's CRC32 over
//! type plus payload.

use crate::bytes::{peek_u32, subrange, Cursor, Endian};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const IHDR: u32 = 0x4948_4452;
const IDAT: u32 = 0x4944_4154;
const IEND: u32 = 0x4945_4E44;
const PLTE: u32 = 0x504C_5445;

const CRC_TABLE: [u32; 256] = generate_crc_table();

const fn generate_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let poly: u32 = 0xEDB88320;

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ poly;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// IEEE CRC32 as used by PNG, computed over chunk type + payload.
#[inline]
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFFFFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

/// Validates one PNG starting at `window[0]`.
///
/// Returns the byte length through IEND's CRC, or `None`.
pub fn validate(window: &[u8]) -> Option<usize> {
    if !window.starts_with(&PNG_SIGNATURE) {
        return None;
    }

    let mut cur = Cursor::new(window);
    cur.skip(PNG_SIGNATURE.len());

    let mut found_ihdr = false;
    let mut found_idat = false;
    let mut found_iend = false;

    while !found_iend && !cur.is_empty() {
        let length = cur.read_u32(Endian::Big) as usize;
        let chunk_type = cur.peek_u32(Endian::Big);
        // CRC covers the type code and the payload
        let crc_data = subrange(window, cur.pos(), 4 + length);
        cur.skip(4 + length);
        let stored_crc = cur.read_u32(Endian::Big);

        match chunk_type {
            IHDR => {
                if found_ihdr {
                    return None;
                }
                found_ihdr = true;
            }
            IDAT => {
                if !found_ihdr {
                    return None;
                }
                found_idat = true;
            }
            IEND => {
                if !found_ihdr || !found_idat {
                    return None;
                }
                found_iend = true;
            }
            PLTE => {
                // not always required, but never before IHDR
                if !found_ihdr {
                    return None;
                }
            }
            other => {
                if !found_ihdr {
                    return None;
                }
                // anything unrecognized must carry the ancillary bit
                if !((other >> 24) as u8).is_ascii_lowercase() {
                    return None;
                }
            }
        }

        if stored_crc != crc32(crc_data) {
            return None;
        }
    }

    if !found_iend {
        return None;
    }

    Some(cur.pos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(payload);
        let mut crc_data = chunk_type.to_vec();
        crc_data.extend_from_slice(payload);
        out.extend_from_slice(&crc32(&crc_data).to_be_bytes());
    }

    fn minimal_png() -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        let ihdr = [
            0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x10, 0x08, 0x02, 0x00, 0x00, 0x00,
        ];
        push_chunk(&mut data, b"IHDR", &ihdr);
        let idat = [0x08, 0xD7, 0x63, 0x60, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01];
        push_chunk(&mut data, b"IDAT", &idat);
        push_chunk(&mut data, b"IEND", &[]);
        data
    }

    #[test]
    fn accepts_minimal_png_exact_length() {
        let png = minimal_png();
        assert_eq!(validate(&png), Some(png.len()));
    }

    #[test]
    fn trailing_garbage_not_included() {
        let mut png = minimal_png();
        let len = png.len();
        png.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(validate(&png), Some(len));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut png = minimal_png();
        png[1] = 0x51;
        assert_eq!(validate(&png), None);
    }

    #[test]
    fn rejects_payload_byte_flip() {
        let png = minimal_png();
        // flip every payload byte of the IHDR chunk in turn; the stored CRC
        // no longer matches, so each variant must be rejected
        for i in 16..16 + 13 {
            let mut bad = png.clone();
            bad[i] ^= 0x01;
            assert_eq!(validate(&bad), None, "flip at {} accepted", i);
        }
    }

    #[test]
    fn rejects_second_ihdr() {
        let mut data = PNG_SIGNATURE.to_vec();
        let ihdr = [0u8; 13];
        push_chunk(&mut data, b"IHDR", &ihdr);
        push_chunk(&mut data, b"IHDR", &ihdr);
        push_chunk(&mut data, b"IEND", &[]);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_chunk_before_ihdr() {
        let mut data = PNG_SIGNATURE.to_vec();
        push_chunk(&mut data, b"IDAT", &[0x00]);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_iend_without_idat() {
        let mut data = PNG_SIGNATURE.to_vec();
        push_chunk(&mut data, b"IHDR", &[0u8; 13]);
        push_chunk(&mut data, b"IEND", &[]);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn accepts_ancillary_chunk() {
        let mut data = PNG_SIGNATURE.to_vec();
        push_chunk(&mut data, b"IHDR", &[0u8; 13]);
        push_chunk(&mut data, b"tEXt", b"Comment\0hello");
        push_chunk(&mut data, b"IDAT", &[0x00, 0x01]);
        push_chunk(&mut data, b"IEND", &[]);
        assert_eq!(validate(&data), Some(data.len()));
    }

    #[test]
    fn rejects_unknown_critical_chunk() {
        let mut data = PNG_SIGNATURE.to_vec();
        push_chunk(&mut data, b"IHDR", &[0u8; 13]);
        // uppercase first byte: critical per the naming convention
        push_chunk(&mut data, b"XXXX", &[0x00]);
        push_chunk(&mut data, b"IDAT", &[0x00]);
        push_chunk(&mut data, b"IEND", &[]);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_every_truncation() {
        let png = minimal_png();
        for len in 0..png.len() {
            assert_eq!(validate(&png[..len]), None, "prefix of {} accepted", len);
        }
    }
}
