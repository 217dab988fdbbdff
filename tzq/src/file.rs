//! Filesystem-backed data sources.

use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;
use tracing::trace;

use crate::error::{Result, TzError};
use crate::index::{Compression, IndexDocument};
use crate::source::{range_bounds, GeometrySource, IndexSource};

/// Reads the index document from a JSON file (optionally `.gz`).
#[derive(Debug, Clone)]
pub struct FileIndexSource {
    path: PathBuf,
    compression: Compression,
}

impl FileIndexSource {
    /// Compression is detected from the file extension.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let compression = Compression::from_location(&path.to_string_lossy());
        Self { path, compression }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexSource for FileIndexSource {
    async fn fetch_index(&self) -> Result<IndexDocument> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(TzError::transport)?;
        IndexDocument::from_compressed(&bytes, self.compression)
    }
}

/// Serves geometry ranges from a memory-mapped geometry store.
pub struct FileGeometrySource {
    path: PathBuf,
    /// Memory-mapped store data
    data: Mmap,
}

impl FileGeometrySource {
    /// Open and memory-map the geometry store.
    ///
    /// # Errors
    ///
    /// Returns [`TzError::Transport`] if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path).map_err(TzError::transport)?;

        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and don't expose the mapping.
        let data = unsafe { Mmap::map(&file) }.map_err(TzError::transport)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the geometry store in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl GeometrySource for FileGeometrySource {
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes> {
        trace!(path = %self.path.display(), start, end, "Reading geometry range");

        let range = range_bounds(start, end, self.len())?;
        Ok(Bytes::copy_from_slice(&self.data[range]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_geometry_ranges() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abcdefghij").unwrap();

        let source = FileGeometrySource::open(file.path()).unwrap();
        assert_eq!(source.len(), 10);
        assert_eq!(&source.fetch_range(0, 2).await.unwrap()[..], b"abc");
        assert_eq!(&source.fetch_range(7, 9).await.unwrap()[..], b"hij");
        assert!(matches!(
            source.fetch_range(8, 10).await,
            Err(TzError::Transport(_))
        ));
        assert!(matches!(
            source.fetch_range(5, 4).await,
            Err(TzError::Transport(_))
        ));
    }

    #[test]
    fn test_missing_geometry_file() {
        let dir = TempDir::new().unwrap();
        let result = FileGeometrySource::open(dir.path().join("missing.dat"));
        assert!(matches!(result, Err(TzError::Transport(_))));
    }

    #[tokio::test]
    async fn test_index_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timezones.json");
        std::fs::write(&path, r#"{"lookup": {"a": [0]}, "timezones": ["Europe/London"]}"#)
            .unwrap();

        let source = FileIndexSource::new(&path);
        let doc = source.fetch_index().await.unwrap();
        assert_eq!(doc.timezones, vec!["Europe/London"]);
    }

    #[tokio::test]
    async fn test_gzip_index_file() {
        use flate2::write::GzEncoder;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timezones.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder
            .write_all(br#"{"lookup": {"b": [0]}, "timezones": ["Asia/Tokyo"]}"#)
            .unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let doc = FileIndexSource::new(&path).fetch_index().await.unwrap();
        assert_eq!(doc.timezones, vec!["Asia/Tokyo"]);
    }

    #[tokio::test]
    async fn test_missing_index_file_is_transport_error() {
        let source = FileIndexSource::new("/nonexistent/timezones.json");
        assert!(matches!(
            source.fetch_index().await,
            Err(TzError::Transport(_))
        ));
    }
}
