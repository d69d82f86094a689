//! GIF structural validation.
//!
//! After the header and logical screen descriptor (plus optional global
//! color table), the stream is a sequence of blocks introduced by a single
//! byte: extensions (0x21), image descriptors (0x2C), and the trailer
//! (0x3B). Sub-block chains are size-prefixed and end at a zero-size
//! terminator.
//!
//! The global color table holds `2^(n+1)` entries while a local color
//! table holds `2^n`; the asymmetry is kept as-is.

use crate::bytes::Cursor;

const EXTENSION: u8 = 0x21;
const IMAGE_DESCRIPTOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const LABEL_PLAIN_TEXT: u8 = 0x01;
const LABEL_GRAPHIC_CONTROL: u8 = 0xF9;
const LABEL_COMMENT: u8 = 0xFE;
const LABEL_APPLICATION: u8 = 0xFF;

/// Consumes size-prefixed sub-blocks until a zero-size terminator.
fn skip_sub_blocks(cur: &mut Cursor<'_>) {
    loop {
        let size = cur.read_u8();
        if size == 0 {
            break;
        }
        cur.skip(size as usize);
    }
}

/// Validates one GIF starting at `window[0]`.
///
/// Returns the byte length through the trailer, or `None`.
pub fn validate(window: &[u8]) -> Option<usize> {
    if !window.starts_with(b"GIF87a") && !window.starts_with(b"GIF89a") {
        return None;
    }

    let mut cur = Cursor::new(window);
    cur.skip(6);

    // logical screen descriptor: width, height, flags, background color
    // index, pixel aspect ratio
    cur.skip(4);
    let flags = cur.read_u8();
    cur.skip(2);

    if flags & 0x80 != 0 {
        let entries = 1usize << ((flags & 0x07) + 1);
        cur.skip(3 * entries);
    }

    let mut found_trailer = false;
    let mut found_image_descriptor = false;

    while !found_trailer && !cur.is_empty() {
        let introducer = cur.read_u8();
        match introducer {
            EXTENSION => {
                let label = cur.read_u8();
                match label {
                    LABEL_PLAIN_TEXT | LABEL_APPLICATION => {
                        let size = cur.read_u8();
                        cur.skip(size as usize);
                        skip_sub_blocks(&mut cur);
                    }
                    LABEL_GRAPHIC_CONTROL => {
                        let size = cur.read_u8();
                        cur.skip(size as usize);
                        if cur.read_u8() != 0x00 {
                            // wrong block terminator
                            return None;
                        }
                    }
                    LABEL_COMMENT => {
                        skip_sub_blocks(&mut cur);
                    }
                    _ => return None,
                }
            }
            IMAGE_DESCRIPTOR => {
                found_image_descriptor = true;
                // left, top, width, height
                cur.skip(8);
                let flags = cur.read_u8();
                if flags & 0x80 != 0 {
                    // no +1 on the exponent here, unlike the global table
                    let entries = 1usize << (flags & 0x07);
                    cur.skip(3 * entries);
                }
                // LZW minimum code size, then the compressed data chain
                cur.skip(1);
                skip_sub_blocks(&mut cur);
            }
            TRAILER => {
                if !found_image_descriptor {
                    return None;
                }
                found_trailer = true;
            }
            _ => return None,
        }
    }

    if !found_trailer {
        return None;
    }

    Some(cur.pos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_gif() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        // 2x2 screen, no global color table
        data.extend_from_slice(&[0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00]);
        // image descriptor, no local color table
        data.push(0x2C);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00]);
        // LZW minimum code size + one data sub-block + terminator
        data.push(0x02);
        data.extend_from_slice(&[0x03, 0x44, 0x01, 0x05]);
        data.push(0x00);
        // trailer
        data.push(0x3B);
        data
    }

    fn gif_with_global_color_table() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF87a");
        // flags 0x80: global color table present, size exponent 0 -> 2
        // entries of 3 bytes each
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
        data.push(0x2C);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        data.push(0x02);
        data.extend_from_slice(&[0x02, 0x44, 0x01]);
        data.push(0x00);
        data.push(0x3B);
        data
    }

    #[test]
    fn accepts_minimal_gif_exact_length() {
        let gif = minimal_gif();
        assert_eq!(validate(&gif), Some(gif.len()));
    }

    #[test]
    fn accepts_global_color_table() {
        let gif = gif_with_global_color_table();
        assert_eq!(validate(&gif), Some(gif.len()));
    }

    #[test]
    fn accepts_local_color_table_sizing() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        data.push(0x2C);
        // local color table flag set, exponent 1 -> 2 entries (no +1)
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x81]);
        data.extend_from_slice(&[0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
        data.push(0x02);
        data.extend_from_slice(&[0x01, 0x44]);
        data.push(0x00);
        data.push(0x3B);
        assert_eq!(validate(&data), Some(data.len()));
    }

    #[test]
    fn accepts_extensions() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        // graphic control extension
        data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]);
        // comment extension
        data.extend_from_slice(&[0x21, 0xFE, 0x05, b'h', b'e', b'l', b'l', b'o', 0x00]);
        // application extension: 11-byte block then a data chain
        data.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        data.extend_from_slice(b"NETSCAPE2.0");
        data.extend_from_slice(&[0x03, 0x01, 0x00, 0x00, 0x00]);
        data.push(0x2C);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        data.push(0x02);
        data.extend_from_slice(&[0x01, 0x44]);
        data.push(0x00);
        data.push(0x3B);
        assert_eq!(validate(&data), Some(data.len()));
    }

    #[test]
    fn rejects_trailer_before_image_descriptor() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        data.push(0x3B);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_bad_version() {
        let mut gif = minimal_gif();
        gif[4] = b'6';
        assert_eq!(validate(&gif), None);
    }

    #[test]
    fn rejects_unknown_introducer() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        data.push(0x99);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_unknown_extension_label() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x21, 0x42]);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_bad_graphic_control_terminator() {
        let mut data = Vec::new();
        data.extend_from_slice(b"GIF89a");
        data.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x77]);
        data.push(0x3B);
        assert_eq!(validate(&data), None);
    }

    #[test]
    fn rejects_every_truncation() {
        let gif = minimal_gif();
        for len in 0..gif.len() {
            assert_eq!(validate(&gif[..len]), None, "prefix of {} accepted", len);
        }
    }
}
