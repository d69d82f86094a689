use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use unearth_core::RecoveredObject;

/// One manifest line per recovered file.
#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub file: PathBuf,
    pub format: String,
    pub offset: u64,
    pub length: u64,
}

impl ManifestEntry {
    pub fn new(path: PathBuf, obj: &RecoveredObject) -> Self {
        Self {
            file: path,
            format: obj.format.name().to_string(),
            offset: obj.start_offset,
            length: obj.length,
        }
    }
}

/// Writes `manifest.json` into the output directory.
pub fn write_manifest(out_dir: &Path, entries: &[ManifestEntry]) -> anyhow::Result<PathBuf> {
    let path = out_dir.join("manifest.json");
    let file = File::create(&path)
        .with_context(|| format!("failed to create manifest at {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, entries).context("failed to serialize manifest")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use unearth_core::ImageFormat;

    #[test]
    fn manifest_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let obj = RecoveredObject {
            format: ImageFormat::Png,
            start_offset: 4096,
            length: 1234,
        };
        let entries = vec![ManifestEntry::new(
            dir.path().join("00000000/00000000000000004096.png"),
            &obj,
        )];

        let path = write_manifest(dir.path(), &entries).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed[0]["format"], "PNG");
        assert_eq!(parsed[0]["offset"], 4096);
        assert_eq!(parsed[0]["length"], 1234);
    }

    #[test]
    fn empty_manifest_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(dir.path(), &[]).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 0);
    }
}
