//! TIFF structural validation.
//!
//! A TIFF is a header plus a chain of image file directories (IFDs), each
//! a table of 12-byte tag entries that may reference out-of-line payloads,
//! sub-IFDs (SubIFDs, GlobalParametersIFD, Exif, GPS, Interoperability)
//! and the strip/tile tables locating the actual pixel data. The walk
//! validates every entry against a table of allowed types and mandated
//! counts, tracks the furthest byte any payload or strip reaches, and
//! accepts only if the chain terminates cleanly, pixel data exists, and
//! the computed extent fits the window.
//!
//! Private IFDs (Exif and friends) relax the ascending-tag-id rule and the
//! known-tag requirement. Directory offsets are recorded in a visited set
//! and recursion is depth-capped, so cyclic or adversarial offset graphs
//! reject instead of recursing forever.

use std::collections::HashSet;

use crate::bytes::{peek_u16, peek_u32, Endian};

const MAX_IFD_DEPTH: usize = 32;

// Field type bitmask, indexed by the on-disk type id (1..=13).
const BYTE: u16 = 1 << 1;
const ASCII: u16 = 1 << 2;
const SHORT: u16 = 1 << 3;
const LONG: u16 = 1 << 4;
const RATIONAL: u16 = 1 << 5;
#[allow(dead_code)]
const SBYTE: u16 = 1 << 6;
const UNDEFINED: u16 = 1 << 7;
#[allow(dead_code)]
const SSHORT: u16 = 1 << 8;
#[allow(dead_code)]
const SLONG: u16 = 1 << 9;
const SRATIONAL: u16 = 1 << 10;
#[allow(dead_code)]
const FLOAT: u16 = 1 << 11;
const DOUBLE: u16 = 1 << 12;
const IFD: u16 = 1 << 13;

const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
const TAG_TILE_OFFSETS: u16 = 0x0144;
const TAG_TILE_BYTE_COUNTS: u16 = 0x0145;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubIfd {
    No,
    /// SubIFDs / GlobalParametersIFD: walked under the current rules.
    Public,
    /// Exif / GPS / Interoperability: tag rules are relaxed inside.
    Private,
}

#[derive(Debug, Clone, Copy)]
struct TagRule {
    /// Bitmask of acceptable field types; 0 means unconstrained.
    types: u16,
    /// Mandated element count; 0 means any.
    count: u32,
    sub_ifd: SubIfd,
}

const fn rule(types: u16, count: u32) -> TagRule {
    TagRule {
        types,
        count,
        sub_ifd: SubIfd::No,
    }
}

const fn sub(types: u16, count: u32, sub_ifd: SubIfd) -> TagRule {
    TagRule {
        types,
        count,
        sub_ifd,
    }
}

/// Allowed type/count per tag id, baseline and extension tags.
///
/// `None` for an id below 0x8000 means the tag is unknown and the
/// directory is rejected; ids at or above 0x8000 without an entry are
/// tolerated unconstrained. Several tags accept SHORT or LONG per the
/// TIFF tolerance rule for unsigned integer fields.
fn tag_rule(tag: u16) -> Option<TagRule> {
    let r = match tag {
        // baseline
        0x00FE => rule(LONG, 1),                 // NewSubfileType
        0x00FF => rule(SHORT, 1),                // SubfileType
        0x0100 => rule(SHORT | LONG, 1),         // ImageWidth
        0x0101 => rule(SHORT | LONG, 1),         // ImageLength
        0x0102 => rule(SHORT, 0),                // BitsPerSample
        0x0103 => rule(SHORT, 1),                // Compression
        0x0106 => rule(SHORT, 1),                // PhotometricInterpretation
        0x0107 => rule(SHORT, 1),                // Threshholding
        0x0108 => rule(SHORT, 1),                // CellWidth
        0x0109 => rule(SHORT, 1),                // CellLength
        0x010A => rule(SHORT, 1),                // FillOrder
        0x010E => rule(ASCII, 0),                // ImageDescription
        0x010F => rule(ASCII, 0),                // Make
        0x0110 => rule(ASCII, 0),                // Model
        0x0111 => rule(SHORT | LONG, 0),         // StripOffsets
        0x0112 => rule(SHORT, 1),                // Orientation
        0x0115 => rule(SHORT, 1),                // SamplesPerPixel
        0x0116 => rule(SHORT | LONG, 1),         // RowsPerStrip
        0x0117 => rule(SHORT | LONG, 0),         // StripByteCounts
        0x0118 => rule(SHORT, 0),                // MinSampleValue
        0x0119 => rule(SHORT, 0),                // MaxSampleValue
        0x011A => rule(RATIONAL, 1),             // XResolution
        0x011B => rule(RATIONAL, 1),             // YResolution
        0x011C => rule(SHORT, 1),                // PlanarConfiguration
        0x0120 => rule(LONG, 0),                 // FreeOffsets
        0x0121 => rule(LONG, 0),                 // FreeByteCounts
        0x0122 => rule(SHORT, 1),                // GrayResponseUnit
        0x0123 => rule(SHORT, 0),                // GrayResponseCurve
        0x0128 => rule(SHORT, 1),                // ResolutionUnit
        0x0131 => rule(ASCII, 0),                // Software
        0x0132 => rule(ASCII, 20),               // DateTime
        0x013B => rule(ASCII, 0),                // Artist
        0x013C => rule(ASCII, 0),                // HostComputer
        0x0140 => rule(SHORT, 0),                // ColorMap
        0x0152 => rule(SHORT, 0),                // ExtraSamples
        0x8298 => rule(ASCII, 0),                // Copyright
        // extension
        0x010D => rule(ASCII, 0),                // DocumentName
        0x011D => rule(ASCII, 0),                // PageName
        0x011E => rule(RATIONAL, 1),             // XPosition
        0x011F => rule(RATIONAL, 1),             // YPosition
        0x0124 => rule(LONG, 1),                 // T4Options
        0x0125 => rule(LONG, 1),                 // T6Options
        0x0129 => rule(SHORT, 2),                // PageNumber
        0x012D => rule(SHORT, 0),                // TransferFunction
        0x013D => rule(SHORT, 1),                // Predictor
        0x013E => rule(RATIONAL, 2),             // WhitePoint
        0x013F => rule(RATIONAL, 6),             // PrimaryChromaticities
        0x0141 => rule(SHORT, 2),                // HalftoneHints
        0x0142 => rule(SHORT | LONG, 1),         // TileWidth
        0x0143 => rule(SHORT | LONG, 1),         // TileLength
        0x0144 => rule(LONG, 0),                 // TileOffsets
        0x0145 => rule(SHORT | LONG, 0),         // TileByteCounts
        0x0146 => rule(SHORT | LONG, 1),         // BadFaxLines
        0x0147 => rule(SHORT, 1),                // CleanFaxData
        0x0148 => rule(SHORT | LONG, 1),         // ConsecutiveBadFaxLines
        0x014A => sub(LONG | IFD, 0, SubIfd::Public), // SubIFDs
        0x014C => rule(SHORT, 1),                // InkSet
        0x014D => rule(ASCII, 0),                // InkNames
        0x014E => rule(SHORT, 1),                // NumberOfInks
        0x0150 => rule(BYTE | SHORT, 0),         // DotRange
        0x0151 => rule(ASCII, 0),                // TargetPrinter
        0x0153 => rule(SHORT, 0),                // SampleFormat
        0x0154 => rule(BYTE | SHORT | LONG | RATIONAL | DOUBLE, 0), // SMinSampleValue
        0x0155 => rule(BYTE | SHORT | LONG | RATIONAL | DOUBLE, 0), // SMaxSampleValue
        0x0156 => rule(SHORT, 6),                // TransferRange
        0x0157 => rule(BYTE, 0),                 // ClipPath
        0x0158 => rule(LONG, 1),                 // XClipPathUnits
        0x0159 => rule(LONG, 1),                 // YClipPathUnits
        0x015A => rule(SHORT, 1),                // Indexed
        0x015B => rule(UNDEFINED, 0),            // JPEGTables
        0x015F => rule(SHORT, 1),                // OPIProxy
        0x0190 => sub(LONG | IFD, 1, SubIfd::Public), // GlobalParametersIFD
        0x0191 => rule(LONG, 1),                 // ProfileType
        0x0192 => rule(BYTE, 1),                 // FaxProfile
        0x0193 => rule(LONG, 1),                 // CodingMethods
        0x0194 => rule(BYTE, 4),                 // VersionYear
        0x0195 => rule(BYTE, 1),                 // ModeNumber
        0x01B1 => rule(SRATIONAL, 0),            // Decode
        0x01B2 => rule(SHORT, 0),                // DefaultImageColor
        0x0200 => rule(SHORT, 1),                // JPEGProc
        0x0201 => rule(LONG, 1),                 // JPEGInterchangeFormat
        0x0202 => rule(LONG, 1),                 // JPEGInterchangeFormatLength
        0x0203 => rule(SHORT, 1),                // JPEGRestartInterval
        0x0205 => rule(SHORT, 0),                // JPEGLosslessPredictors
        0x0206 => rule(SHORT, 0),                // JPEGPointTransforms
        0x0207 => rule(LONG, 0),                 // JPEGQTables
        0x0208 => rule(LONG, 0),                 // JPEGDCTables
        0x0209 => rule(LONG, 0),                 // JPEGACTables
        0x0211 => rule(RATIONAL, 3),             // YCbCrCoefficients
        0x0212 => rule(SHORT, 2),                // YCbCrSubSampling
        0x0213 => rule(SHORT, 1),                // YCbCrPositioning
        0x0214 => rule(RATIONAL, 6),             // ReferenceBlackWhite
        0x022F => rule(LONG, 0),                 // StripRowCounts
        0x02BC => rule(BYTE, 0),                 // XMP
        0x800D => rule(ASCII, 0),                // ImageID
        0x87AC => rule(SHORT | LONG, 2),         // ImageLayer
        // private IFD pointers
        0x8769 => sub(LONG | IFD, 1, SubIfd::Private), // Exif IFD
        0x8825 => sub(LONG | IFD, 1, SubIfd::Private), // GPS IFD
        0xA005 => sub(LONG | IFD, 1, SubIfd::Private), // Interoperability IFD
        _ => return None,
    };
    Some(r)
}

/// On-disk size of one element of a field type; 0 for unknown types,
/// which then contribute nothing to the extent.
const fn element_size(field_type: u16) -> u64 {
    match field_type {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 | 13 => 4, // LONG, SLONG, FLOAT, IFD
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 0,
    }
}

struct IfdWalker<'a> {
    window: &'a [u8],
    endian: Endian,
    /// Furthest byte any directory, payload or strip reaches.
    extent: u64,
    has_pixel_data: bool,
    visited: HashSet<u32>,
}

impl IfdWalker<'_> {
    /// Reads a StripOffsets/StripByteCounts style array: `count` elements,
    /// SHORT or LONG, inline in the value field or out-of-line at `value`.
    fn read_value_array(
        &self,
        value_field_at: usize,
        value: u32,
        count: u32,
        field_type: u16,
        payload_len: u64,
    ) -> Vec<u32> {
        let src = if payload_len > 4 {
            value as usize
        } else {
            value_field_at
        };
        let step = if field_type == 3 { 2 } else { 4 };
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let at = src + i * step;
            let v = if field_type == 3 {
                peek_u16(self.window, at, self.endian) as u32
            } else {
                peek_u32(self.window, at, self.endian)
            };
            out.push(v);
        }
        out
    }

    /// Walks the directory chain whose "next IFD" link sits at `link_at`.
    ///
    /// Returns true only if the chain ends with a zero link; every
    /// structural violation along the way is false.
    fn walk_chain(&mut self, mut link_at: usize, private: bool, depth: usize) -> bool {
        if depth > MAX_IFD_DEPTH {
            return false;
        }

        loop {
            let dir_offset = peek_u32(self.window, link_at, self.endian);
            if dir_offset == 0 {
                // nothing left to read
                return true;
            }
            if dir_offset % 2 != 0 {
                // directories begin on a word boundary
                return false;
            }
            if !self.visited.insert(dir_offset) {
                return false;
            }

            let dir = dir_offset as usize;
            let entry_count = peek_u16(self.window, dir, self.endian);
            if entry_count == 0 {
                return false;
            }
            self.extent = self
                .extent
                .max(dir_offset as u64 + entry_count as u64 * 12 + 4);

            let mut data_offsets: Vec<u32> = Vec::new();
            let mut data_byte_counts: Vec<u32> = Vec::new();

            let mut last_tag = 0u16;
            for i in 0..entry_count as usize {
                let entry = dir + 2 + i * 12;
                let tag = peek_u16(self.window, entry, self.endian);
                if !private && tag <= last_tag {
                    // entries must be sorted ascending by tag id
                    return false;
                }
                last_tag = tag;

                let field_type = peek_u16(self.window, entry + 2, self.endian);
                let count = peek_u32(self.window, entry + 4, self.endian);
                let value = peek_u32(self.window, entry + 8, self.endian);

                let mut sub_ifd = SubIfd::No;
                if !private {
                    match tag_rule(tag) {
                        Some(r) => {
                            if r.types != 0
                                && (field_type >= 16 || r.types & (1 << field_type) == 0)
                            {
                                return false;
                            }
                            if r.count != 0 && count != r.count {
                                return false;
                            }
                            sub_ifd = r.sub_ifd;
                        }
                        None => {
                            if tag < 0x8000 {
                                return false;
                            }
                        }
                    }
                }

                let payload_len = count as u64 * element_size(field_type);
                if payload_len > 4 {
                    // the value field is an offset to an out-of-line payload
                    let end = value as u64 + payload_len;
                    if end > self.window.len() as u64 {
                        // cannot fit no matter what follows
                        return false;
                    }
                    self.extent = self.extent.max(end);
                }

                if sub_ifd != SubIfd::No {
                    let sub_private = private || sub_ifd == SubIfd::Private;
                    if !self.walk_chain(entry + 8, sub_private, depth + 1) {
                        return false;
                    }
                }

                if !private {
                    match tag {
                        TAG_STRIP_OFFSETS | TAG_TILE_OFFSETS => {
                            data_offsets = self.read_value_array(
                                entry + 8,
                                value,
                                count,
                                field_type,
                                payload_len,
                            );
                        }
                        TAG_STRIP_BYTE_COUNTS | TAG_TILE_BYTE_COUNTS => {
                            data_byte_counts = self.read_value_array(
                                entry + 8,
                                value,
                                count,
                                field_type,
                                payload_len,
                            );
                        }
                        _ => {}
                    }
                }
            }

            // each IFD defines a subfile; its strip/tile tables must pair up
            if !data_offsets.is_empty() || !data_byte_counts.is_empty() {
                if data_offsets.len() != data_byte_counts.len() {
                    return false;
                }
                for (&off, &len) in data_offsets.iter().zip(&data_byte_counts) {
                    self.extent = self.extent.max(off as u64 + len as u64);
                }
                self.has_pixel_data = true;
            }

            link_at = dir + 2 + entry_count as usize * 12;
        }
    }
}

/// Validates one TIFF starting at `window[0]`.
///
/// Returns the byte length of the full data extent, or `None`.
pub fn validate(window: &[u8]) -> Option<usize> {
    let endian = if window.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        Endian::Big
    } else if window.starts_with(&[0x49, 0x49, 0x2A, 0x00]) {
        Endian::Little
    } else {
        return None;
    };

    let mut walker = IfdWalker {
        window,
        endian,
        extent: 0,
        has_pixel_data: false,
        visited: HashSet::new(),
    };

    // the header's last 4 bytes link to the first directory
    if !walker.walk_chain(4, false, 0) {
        return None;
    }
    if !walker.has_pixel_data {
        return None;
    }
    if walker.extent > window.len() as u64 {
        return None;
    }

    Some(walker.extent as usize)
}
