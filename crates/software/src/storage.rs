//! Flat-file persistence, as provided by the platform.

/// Why a storage operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No file exists at the path.
    #[error("file not found")]
    NotFound,
    /// The file is larger than the buffer it was read into.
    #[error("file does not fit in the buffer")]
    BufferTooSmall,
    /// The medium reported a failure.
    #[error("storage I/O failed")]
    Io,
}

/// A store of named flat files, such as a flash filesystem.
pub trait Storage {
    /// Returns `true` if a file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Reads the whole file at `path` into `buffer`, returning the number of bytes read.
    fn read(&self, path: &str, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Replaces the file at `path` with `contents`.
    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StorageError>;
}
