/// The image formats the carver can recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Webp,
}

impl ImageFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Tiff => "tif",
            Self::Webp => "webp",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
            Self::Webp => "WebP",
        }
    }

    pub const ALL: [ImageFormat; 5] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Tiff,
        Self::Webp,
    ];
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One complete, structurally validated file found in the source view.
///
/// `start_offset + length` never exceeds the source length, and `length`
/// is always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveredObject {
    pub format: ImageFormat,
    pub start_offset: u64,
    pub length: u64,
}

impl RecoveredObject {
    #[inline]
    #[must_use]
    pub const fn end_offset(&self) -> u64 {
        self.start_offset + self.length
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_offset as usize..self.end_offset() as usize
    }
}
