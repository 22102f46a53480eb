//! A small user-space FAT-style file system core.
//!
//! An application [`FileSystem::mount`]s a virtual disk image (a host file
//! formatted by [`format::format_image`] or the `mkfs` binary) and can then
//! create, delete, list, open, read, write, seek, and stat files backed by
//! fixed-size blocks on that image. See `SPEC_FULL.md` for the full design.

mod device;
mod directory;
mod error;
mod fat;
mod file;
pub mod format;
mod superblock;

use std::path::Path;

pub use error::{FsError, Result};

use device::BlockDevice;
use directory::Directory;
use fat::Fat;
use file::OpenFile;
use superblock::Superblock;

/// Bytes transferred in a single block I/O operation.
pub const BLOCK_SIZE: usize = 4096;
/// Length of a filename field, including its NUL terminator.
pub const FS_FILENAME_LEN: usize = 16;
/// Number of entries in the (single, flat) root directory.
pub const FS_FILE_MAX_COUNT: usize = 128;
/// Size of the open-file table.
pub const FS_OPEN_MAX_COUNT: usize = 32;

/// A report of a mounted image's geometry and utilization, as produced by
/// [`FileSystem::info`].
#[derive(Debug, Clone)]
pub struct FsInfo {
    pub total_blocks: u16,
    pub fat_block_count: u8,
    pub root_dir_block: u16,
    pub data_start_block: u16,
    pub data_block_count: u16,
    pub free_data_blocks: usize,
    pub free_dir_slots: usize,
}

impl std::fmt::Display for FsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_block_count)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start_block)?;
        writeln!(f, "data_blk_count={}", self.data_block_count)?;
        writeln!(
            f,
            "fat_free_ratio={}/{}",
            self.free_data_blocks, self.data_block_count
        )?;
        write!(
            f,
            "rdir_free_ratio={}/{}",
            self.free_dir_slots, FS_FILE_MAX_COUNT
        )
    }
}

/// A single entry as reported by [`FileSystem::ls`].
#[derive(Debug, Clone)]
pub struct DirListing {
    pub name: String,
    pub size: u32,
    pub first_block: u16,
}

/// A mounted disk image and all of its in-memory state (component B).
///
/// Every operation is a method on this handle rather than on hidden
/// process-wide state (spec.md §9's preferred redesign): constructing one
/// is "mount", dropping it (after [`FileSystem::unmount`] flushes it) tears
/// the mount down, and re-mounting before that just means constructing a
/// second, independent handle.
pub struct FileSystem {
    device: BlockDevice,
    superblock: Superblock,
    fat: Fat,
    directory: Directory,
    fds: [Option<OpenFile>; FS_OPEN_MAX_COUNT],
}

fn validate_filename(name: &str) -> Result<&str> {
    if name.is_empty() || name.len() > FS_FILENAME_LEN - 1 || name.contains('\0') {
        return Err(FsError::InvalidArgument(format!("invalid filename {name:?}")));
    }
    Ok(name)
}

impl FileSystem {
    /// Mounts the disk image at `path`.
    ///
    /// Validates the superblock (signature, block-count relations per the
    /// data model's invariants 1-3), loads the FAT and root directory, and
    /// initializes an empty open-file table. Any failure releases whatever
    /// was already opened/allocated, by ordinary `Result`/`Drop` unwinding.
    pub fn mount(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = BlockDevice::open(path)?;

        let mut raw = [0u8; BLOCK_SIZE];
        device.read_block(0, &mut raw)?;
        let superblock = Superblock::decode(&raw)?;
        superblock.validate(device.block_count())?;

        let fat = Fat::load(
            &device,
            1,
            superblock.fat_block_count,
            superblock.data_block_count,
        )?;
        let directory = Directory::load(&device, superblock.root_dir_block)?;

        log::info!("mounted {:?}", path);
        Ok(FileSystem {
            device,
            superblock,
            fat,
            directory,
            fds: [None; FS_OPEN_MAX_COUNT],
        })
    }

    /// Flushes the superblock, FAT and root directory back to disk, then
    /// closes the image. Fails if any descriptor is still open; still
    /// attempts every flush step, surfacing the first failure, so
    /// in-memory resources are released (by consuming `self`) even on a
    /// failed flush.
    pub fn unmount(mut self) -> Result<()> {
        if self.fds.iter().any(Option::is_some) {
            return Err(FsError::Busy);
        }

        let raw = self.superblock.encode();
        self.device.write_block(0, &raw)?;
        self.fat.flush(&mut self.device, 1)?;
        self.directory
            .flush(&mut self.device, self.superblock.root_dir_block)?;

        log::info!("unmounted");
        Ok(())
    }

    /// Superblock fields plus free FAT-entry and directory-slot counts.
    pub fn info(&self) -> FsInfo {
        FsInfo {
            total_blocks: self.superblock.total_blocks,
            fat_block_count: self.superblock.fat_block_count,
            root_dir_block: self.superblock.root_dir_block,
            data_start_block: self.superblock.data_start_block,
            data_block_count: self.superblock.data_block_count,
            free_data_blocks: self.fat.free_count(),
            free_dir_slots: self.directory.free_count(),
        }
    }

    /// Creates an empty file named `name`.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let name = validate_filename(name)?;
        self.directory.create(name)?;
        log::info!("created {name}");
        Ok(())
    }

    /// Deletes `name`, reclaiming every block in its chain. Fails if the
    /// file is currently open in any descriptor.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let name = validate_filename(name)?;
        let index = self.directory.find(name).ok_or(FsError::NotFound)?;
        if self.fds.iter().flatten().any(|fd| fd.dir_index == index) {
            return Err(FsError::Busy);
        }
        let head = self.directory.get(index).first_block;
        self.fat.truncate(head);
        self.directory.clear(index);
        log::info!("deleted {name}");
        Ok(())
    }

    /// Lists every non-empty directory entry in slot order.
    pub fn ls(&self) -> Vec<DirListing> {
        self.directory
            .ls()
            .map(|e| DirListing {
                name: e.name().to_string(),
                size: e.size,
                first_block: e.first_block,
            })
            .collect()
    }

    /// Opens `name`, returning a descriptor in `[0, FS_OPEN_MAX_COUNT)`.
    pub fn open(&mut self, name: &str) -> Result<usize> {
        let name = validate_filename(name)?;
        let dir_index = self.directory.find(name).ok_or(FsError::NotFound)?;
        let slot = self.fds.iter().position(Option::is_none).ok_or(FsError::TableFull)?;
        self.fds[slot] = Some(OpenFile { dir_index, offset: 0 });
        Ok(slot)
    }

    fn fd_slot(&self, fd: usize) -> Result<&OpenFile> {
        self.fds
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(FsError::InvalidArgument(format!("fd {fd} is not open")))
    }

    fn fd_slot_mut(&mut self, fd: usize) -> Result<&mut OpenFile> {
        self.fds
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(FsError::InvalidArgument(format!("fd {fd} is not open")))
    }

    /// Closes `fd`, emptying its slot.
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.fd_slot(fd)?;
        self.fds[fd] = None;
        Ok(())
    }

    /// The bound file's current size in bytes.
    pub fn stat(&self, fd: usize) -> Result<u32> {
        let slot = self.fd_slot(fd)?;
        Ok(self.directory.get(slot.dir_index).size)
    }

    /// Repositions `fd`'s offset. `offset` must not exceed the file's size.
    pub fn lseek(&mut self, fd: usize, offset: u64) -> Result<()> {
        let dir_index = self.fd_slot(fd)?.dir_index;
        let size = self.directory.get(dir_index).size as u64;
        if offset > size {
            return Err(FsError::InvalidArgument(format!(
                "seek offset {offset} exceeds file size {size}"
            )));
        }
        self.fd_slot_mut(fd)?.offset = offset;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes starting at `fd`'s offset, advancing
    /// it by the number of bytes actually copied. A short read (including
    /// zero at end-of-file) is not an error.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let slot = *self.fd_slot(fd)?;
        let entry = self.directory.get(slot.dir_index).clone();
        let size = entry.size as u64;

        let n = (buf.len() as u64).min(size.saturating_sub(slot.offset));
        if n == 0 {
            return Ok(0);
        }
        let n = n as usize;

        let offset = slot.offset;
        let first_logical = (offset / BLOCK_SIZE as u64) as usize;
        let last_logical = ((offset + n as u64 - 1) / BLOCK_SIZE as u64) as usize;

        let (mut block, out_of_chain) = self.fat.walk(entry.first_block, first_logical);
        if out_of_chain {
            // size/chain invariant guarantees this can't happen for n > 0.
            return Ok(0);
        }

        let mut delivered = 0usize;
        let mut bounce = [0u8; BLOCK_SIZE];
        for logical in first_logical..=last_logical {
            self.device.read_block(
                self.superblock.data_start_block as u64 + block as u64,
                &mut bounce,
            )?;

            let block_start = logical as u64 * BLOCK_SIZE as u64;
            let lo = offset.max(block_start) - block_start;
            let hi = (offset + n as u64).min(block_start + BLOCK_SIZE as u64) - block_start;
            let chunk = &bounce[lo as usize..hi as usize];
            buf[delivered..delivered + chunk.len()].copy_from_slice(chunk);
            delivered += chunk.len();

            if logical < last_logical {
                let next = self.fat.walk(block, 1);
                block = next.0;
            }
        }

        self.fd_slot_mut(fd)?.offset += delivered as u64;
        Ok(delivered)
    }

    /// Writes `buf` starting at `fd`'s offset, extending the file and
    /// allocating new blocks on demand. If the disk fills up mid-write the
    /// write is truncated rather than failed; returns the number of bytes
    /// actually stored and advances the offset by exactly that many.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize> {
        let slot = *self.fd_slot(fd)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let dir_index = slot.dir_index;
        let offset = slot.offset;
        let size = self.directory.get(dir_index).size as u64;

        let mut target_end = offset + buf.len() as u64;
        let mut n = buf.len();

        if target_end > size {
            let mut head = self.directory.get(dir_index).first_block;
            let needed_blocks = target_end.div_ceil(BLOCK_SIZE as u64) as usize;
            while self.fat.chain_len(head) < needed_blocks {
                match self.fat.extend(head) {
                    Ok((new_block, became_head)) => {
                        if became_head {
                            head = new_block;
                        }
                    }
                    Err(FsError::DiskFull) => {
                        log::warn!("disk full while extending fd {fd}, truncating write");
                        let capacity = self.fat.chain_len(head) as u64 * BLOCK_SIZE as u64;
                        target_end = capacity.min(target_end);
                        if target_end <= offset {
                            return Ok(0);
                        }
                        n = (target_end - offset) as usize;
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            self.directory.get_mut(dir_index).first_block = head;
        }

        let head = self.directory.get(dir_index).first_block;
        let first_logical = (offset / BLOCK_SIZE as u64) as usize;
        let last_logical = ((offset + n as u64 - 1) / BLOCK_SIZE as u64) as usize;
        let (mut block, _) = self.fat.walk(head, first_logical);

        let mut written = 0usize;
        let mut bounce = [0u8; BLOCK_SIZE];
        for logical in first_logical..=last_logical {
            let block_start = logical as u64 * BLOCK_SIZE as u64;
            let lo = offset.max(block_start) - block_start;
            let hi = (offset + n as u64).min(block_start + BLOCK_SIZE as u64) - block_start;
            let full_block = lo == 0 && hi == BLOCK_SIZE as u64;

            let abs_block = self.superblock.data_start_block as u64 + block as u64;
            if !full_block {
                self.device.read_block(abs_block, &mut bounce)?;
            }
            let chunk = &buf[written..written + (hi - lo) as usize];
            bounce[lo as usize..hi as usize].copy_from_slice(chunk);
            self.device.write_block(abs_block, &bounce)?;
            written += chunk.len();

            if logical < last_logical {
                let next = self.fat.walk(block, 1);
                block = next.0;
            }
        }

        let new_end = offset + written as u64;
        if new_end > size {
            self.directory.get_mut(dir_index).size = new_end as u32;
        }
        self.fd_slot_mut(fd)?.offset += written as u64;
        Ok(written)
    }
}
