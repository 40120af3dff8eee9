use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{DeleteError, OpenReadError, OpenWriteError};

/// Sink returned by [`Directory::open_write`].
///
/// Data written through it becomes visible to readers only once
/// [`TerminatingWrite::terminate`] succeeds; the codec calls it after the
/// artefact's checksum footer has been written.
pub trait TerminatingWrite: Write + Send {
    /// Flushes and publishes the file.
    fn terminate(&mut self) -> io::Result<()>;
}

/// Write object for a [`Directory`] file.
pub type WritePtr = BufWriter<Box<dyn TerminatingWrite>>;

/// Finishes a [`WritePtr`]: flush the buffer, then terminate the underlying
/// writer.
pub fn terminate_write(mut wrt: WritePtr) -> io::Result<()> {
    wrt.flush()?;
    wrt.get_mut().terminate()
}

/// Byte-addressable store the codec writes segment artefacts into.
///
/// Filenames are opaque; the codec chooses them. Files are written once and
/// never mutated, so implementations may hand out shared buffers from
/// `open_read` without locking.
pub trait Directory: fmt::Debug + Send + Sync + 'static {
    /// Opens a file and returns its full content.
    fn open_read(&self, path: &Path) -> Result<Arc<[u8]>, OpenReadError>;

    /// Creates a new file and returns a buffered writer for it.
    fn open_write(&self, path: &Path) -> Result<WritePtr, OpenWriteError>;

    /// Reads the whole file in one atomic operation.
    fn atomic_read(&self, path: &Path) -> Result<Vec<u8>, OpenReadError>;

    /// Replaces the content of `path` in one atomic operation.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    fn delete(&self, path: &Path) -> Result<(), DeleteError>;

    fn exists(&self, path: &Path) -> Result<bool, OpenReadError>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Every file currently in the directory, in no particular order.
    fn list_files(&self) -> io::Result<Vec<PathBuf>>;

    fn file_length(&self, path: &Path) -> Result<u64, OpenReadError>;

    /// Syncs directory-level metadata, where the implementation has any.
    fn sync_directory(&self) -> io::Result<()>;
}
