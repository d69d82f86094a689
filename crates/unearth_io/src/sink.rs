use crate::MappedSource;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use unearth_core::{CoreError, RecoveredObject, Result};

/// Files per shard directory under the output root.
const FILES_PER_SHARD: u64 = 4096;

/// How recovered bytes get from the source image into the output file.
///
/// Extraction starts with `copy_file_range` and degrades one step at a
/// time when the kernel or the filesystem refuses (cross-device output,
/// old kernels, non-regular files). Once a mode fails it is never tried
/// again for this sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    CopyFileRange,
    Sendfile,
    Write,
}

#[cfg(target_os = "linux")]
const INITIAL_MODE: CopyMode = CopyMode::CopyFileRange;
#[cfg(not(target_os = "linux"))]
const INITIAL_MODE: CopyMode = CopyMode::Write;

/// Writes recovered objects into a sharded directory tree.
///
/// Output paths look like `<out>/00000000/00000000000000001234.png`:
/// one shard directory per [`FILES_PER_SHARD`] files, named after the
/// running file count, and one file per object, named after its source
/// offset so a recovered file can always be traced back.
pub struct DirectorySink {
    out_dir: PathBuf,
    mode: CopyMode,
    count: u64,
}

impl DirectorySink {
    pub fn new(out_dir: impl AsRef<Path>) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            mode: INITIAL_MODE,
            count: 0,
        })
    }

    /// Copies one recovered object out of `source` and returns the path
    /// it was written to.
    pub fn persist(&mut self, source: &MappedSource, obj: &RecoveredObject) -> Result<PathBuf> {
        let shard = self.out_dir.join(format!("{:08}", self.count / FILES_PER_SHARD));
        fs::create_dir_all(&shard)?;

        let name = format!("{:020}.{}", obj.start_offset, obj.format.extension());
        let path = shard.join(name);
        let mut dest = File::create(&path)?;

        self.copy_object(source, obj, &mut dest)?;
        self.count += 1;
        Ok(path)
    }

    #[inline]
    pub fn files_written(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn copy_mode(&self) -> CopyMode {
        self.mode
    }

    fn copy_object(
        &mut self,
        source: &MappedSource,
        obj: &RecoveredObject,
        dest: &mut File,
    ) -> Result<()> {
        loop {
            match self.mode {
                #[cfg(target_os = "linux")]
                CopyMode::CopyFileRange => match copy_file_range_all(source, obj, dest) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::debug!(error = %e, "copy_file_range refused, trying sendfile");
                        self.mode = CopyMode::Sendfile;
                        rewind(dest)?;
                    }
                },
                #[cfg(target_os = "linux")]
                CopyMode::Sendfile => match sendfile_all(source, obj, dest) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::debug!(error = %e, "sendfile refused, falling back to write");
                        self.mode = CopyMode::Write;
                        rewind(dest)?;
                    }
                },
                #[cfg(not(target_os = "linux"))]
                CopyMode::CopyFileRange | CopyMode::Sendfile => {
                    self.mode = CopyMode::Write;
                }
                CopyMode::Write => return write_all_of(source, obj, dest),
            }
        }
    }
}

/// Discards anything a failed zero-copy attempt may have written.
fn rewind(dest: &mut File) -> Result<()> {
    dest.set_len(0)?;
    dest.seek(SeekFrom::Start(0))?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_file_range_all(
    source: &MappedSource,
    obj: &RecoveredObject,
    dest: &File,
) -> std::io::Result<()> {
    let mut off = obj.start_offset;
    let end = obj.end_offset();
    while off < end {
        let remaining = (end - off) as usize;
        let n = rustix::fs::copy_file_range(source.file(), Some(&mut off), dest, None, remaining)?;
        if n == 0 {
            return Err(std::io::Error::other("copy_file_range made no progress"));
        }
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn sendfile_all(source: &MappedSource, obj: &RecoveredObject, dest: &File) -> std::io::Result<()> {
    let mut off = obj.start_offset;
    let end = obj.end_offset();
    while off < end {
        let remaining = (end - off) as usize;
        let n = rustix::fs::sendfile(dest, source.file(), Some(&mut off), remaining)?;
        if n == 0 {
            return Err(std::io::Error::other("sendfile made no progress"));
        }
    }
    Ok(())
}

fn write_all_of(source: &MappedSource, obj: &RecoveredObject, dest: &mut File) -> Result<()> {
    let data = source.bytes().get(obj.range()).ok_or_else(|| {
        CoreError::InvalidSource(format!(
            "object at offset {} runs past the mapped image",
            obj.start_offset
        ))
    })?;
    dest.write_all(data)?;
    Ok(())
}
