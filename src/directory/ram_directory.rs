use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::directory::{Directory, TerminatingWrite, WritePtr};
use super::error::{DeleteError, OpenReadError, OpenWriteError};

/// Directory storing every file in anonymous memory.
///
/// Writes are buffered in the writer and only published into the shared map
/// on `terminate`, so a reader can never observe a half-written artefact.
#[derive(Clone, Default)]
pub struct RamDirectory {
    fs: Arc<RwLock<HashMap<PathBuf, Arc<[u8]>>>>,
}

impl RamDirectory {
    pub fn create() -> RamDirectory {
        RamDirectory::default()
    }

    /// Sum of the lengths of all files, for tests and diagnostics.
    pub fn total_mem_usage(&self) -> usize {
        self.fs.read().values().map(|data| data.len()).sum()
    }
}

impl fmt::Debug for RamDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RamDirectory({} files)", self.fs.read().len())
    }
}

struct VecWriter {
    path: PathBuf,
    fs: Arc<RwLock<HashMap<PathBuf, Arc<[u8]>>>>,
    data: Vec<u8>,
    is_terminated: bool,
}

impl Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TerminatingWrite for VecWriter {
    fn terminate(&mut self) -> io::Result<()> {
        self.is_terminated = true;
        let data: Arc<[u8]> = std::mem::take(&mut self.data).into();
        self.fs.write().insert(self.path.clone(), data);
        Ok(())
    }
}

impl Drop for VecWriter {
    fn drop(&mut self) {
        if !self.is_terminated {
            log::warn!("writer for {:?} dropped without terminate, file discarded", self.path);
        }
    }
}

impl Directory for RamDirectory {
    fn open_read(&self, path: &Path) -> Result<Arc<[u8]>, OpenReadError> {
        self.fs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| OpenReadError::FileDoesNotExist(path.to_path_buf()))
    }

    fn open_write(&self, path: &Path) -> Result<WritePtr, OpenWriteError> {
        if self.fs.read().contains_key(path) {
            return Err(OpenWriteError::FileAlreadyExists(path.to_path_buf()));
        }
        let writer = VecWriter {
            path: path.to_path_buf(),
            fs: Arc::clone(&self.fs),
            data: Vec::new(),
            is_terminated: false,
        };
        Ok(BufWriter::new(Box::new(writer)))
    }

    fn atomic_read(&self, path: &Path) -> Result<Vec<u8>, OpenReadError> {
        self.open_read(path).map(|data| data.to_vec())
    }

    fn atomic_write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.fs.write().insert(path.to_path_buf(), data.to_vec().into());
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), DeleteError> {
        match self.fs.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(DeleteError::FileDoesNotExist(path.to_path_buf())),
        }
    }

    fn exists(&self, path: &Path) -> Result<bool, OpenReadError> {
        Ok(self.fs.read().contains_key(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut fs = self.fs.write();
        match fs.remove(from) {
            Some(data) => {
                fs.insert(to.to_path_buf(), data);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("rename source does not exist: {from:?}"),
            )),
        }
    }

    fn list_files(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self.fs.read().keys().cloned().collect())
    }

    fn file_length(&self, path: &Path) -> Result<u64, OpenReadError> {
        self.fs
            .read()
            .get(path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| OpenReadError::FileDoesNotExist(path.to_path_buf()))
    }

    fn sync_directory(&self) -> io::Result<()> {
        Ok(())
    }
}
