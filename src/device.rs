//! Block device adapter (component A): opens a host image file and
//! transfers fixed-size blocks by index. Grounded on `io-at`'s
//! `LockedSeek` adaptor (offset-based I/O over a `Seek + Read/Write`).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use io_at::{ReadAt, WriteAt};

use crate::error::{FsError, Result};
use crate::BLOCK_SIZE;

/// A host file, opened read-write, accessed in whole `BLOCK_SIZE` units.
///
/// Exactly one `BlockDevice` corresponds to one mounted image; ownership of
/// the `File` handle is what guarantees "one image open at a time" (there is
/// simply nothing else holding the descriptor).
pub struct BlockDevice {
    file: Mutex<File>,
    block_count: u64,
}

impl BlockDevice {
    /// Opens `path` and derives the block count from the file length.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(FsError::InvalidImage(format!(
                "image length {len} is not a multiple of the block size"
            )));
        }
        let block_count = len / BLOCK_SIZE as u64;
        log::debug!("opened block device {:?}: {block_count} blocks", path);
        Ok(BlockDevice {
            file: Mutex::new(file),
            block_count,
        })
    }

    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Reads exactly one block into `buf`.
    pub fn read_block(&self, index: u64, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        if index >= self.block_count {
            return Err(FsError::InvalidArgument(format!(
                "block index {index} out of range"
            )));
        }
        log::debug!("read block {index}");
        let n = self.read_at(buf, index * BLOCK_SIZE as u64)?;
        if n != BLOCK_SIZE {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short block read",
            )));
        }
        Ok(())
    }

    /// Writes exactly one block from `buf`.
    pub fn write_block(&mut self, index: u64, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        if index >= self.block_count {
            return Err(FsError::InvalidArgument(format!(
                "block index {index} out of range"
            )));
        }
        log::debug!("write block {index}");
        let n = self.write_at(buf, index * BLOCK_SIZE as u64)?;
        if n != BLOCK_SIZE {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "short block write",
            )));
        }
        Ok(())
    }
}

impl ReadAt for BlockDevice {
    fn read_at(&self, buf: &mut [u8], offs: u64) -> std::io::Result<usize> {
        let mut f = self.file.lock().unwrap();
        f.seek(SeekFrom::Start(offs))?;
        f.read(buf)
    }
}

impl WriteAt for BlockDevice {
    fn write_at(&mut self, buf: &[u8], offs: u64) -> std::io::Result<usize> {
        let mut f = self.file.lock().unwrap();
        f.seek(SeekFrom::Start(offs))?;
        f.write(buf)
    }
}
