use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use unearth_core::{CoreError, Result};

/// A disk image mapped read-only into memory.
///
/// The whole scan works on one contiguous `&[u8]`, so the source is
/// mapped rather than read chunk by chunk. The kernel pages the image
/// in as the scan advances.
pub struct MappedSource {
    file: File,
    mmap: Mmap,
}

impl MappedSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();

        if size == 0 {
            return Err(CoreError::InvalidSource(
                "cannot map an empty file".to_string(),
            ));
        }

        let mmap =
            unsafe { Mmap::map(&file) }.map_err(|e| CoreError::Io(std::io::Error::other(e)))?;

        if mmap.len() == 0 {
            return Err(CoreError::InvalidSource(
                "mapping came back empty (block device not supported)".to_string(),
            ));
        }

        #[cfg(target_os = "linux")]
        {
            use memmap2::Advice;
            let _ = mmap.advise(Advice::Sequential);
            let _ = mmap.advise(Advice::DontDump);
        }

        tracing::debug!(size = mmap.len(), "mapped source image");

        Ok(Self { file, mmap })
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The underlying file handle, for zero-copy extraction paths.
    #[inline]
    pub fn file(&self) -> &File {
        &self.file
    }
}
