//! Disk-image formatter. Spec.md treats `mkfs` as an external collaborator;
//! this module is the crate-local realization of it (see SPEC_FULL.md §6),
//! used by the `mkfs` binary and by tests that need a valid image to mount.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{FsError, Result};
use crate::superblock::Superblock;
use crate::BLOCK_SIZE;

/// Creates a new disk image at `path` with `total_blocks` blocks total
/// (including the superblock), formatted with an empty root directory and
/// an all-free FAT.
pub fn format_image(path: &Path, total_blocks: u16) -> Result<()> {
    if total_blocks < 3 {
        return Err(FsError::InvalidArgument(
            "need at least a superblock, one FAT block and a root directory block".into(),
        ));
    }

    let (fat_block_count, data_block_count) = solve_layout(total_blocks)?;
    let root_dir_block = fat_block_count as u16 + 1;
    let data_start_block = root_dir_block + 1;

    let superblock = Superblock {
        total_blocks,
        root_dir_block,
        data_start_block,
        data_block_count,
        fat_block_count,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    file.write_all(&superblock.encode())?;

    // FAT: entry 0 reserved as EOC, the rest free.
    let mut fat_block = [0u8; BLOCK_SIZE];
    fat_block[0..2].copy_from_slice(&0xFFFFu16.to_le_bytes());
    file.write_all(&fat_block)?;
    let zero_block = [0u8; BLOCK_SIZE];
    for _ in 1..fat_block_count {
        file.write_all(&zero_block)?;
    }

    // Root directory: all-zero entries (filename[0] == 0 marks unused).
    file.write_all(&zero_block)?;

    for _ in 0..data_block_count {
        file.write_all(&zero_block)?;
    }

    file.flush()?;
    Ok(())
}

/// `fat_block_count` must be large enough to hold one 16-bit entry per data
/// block, but the data block count itself shrinks as the FAT grows to fit
/// inside the same fixed `total_blocks` budget. Converges in a handful of
/// iterations since both sides are monotonic in `total_blocks`.
fn solve_layout(total_blocks: u16) -> Result<(u8, u16)> {
    let entries_per_block = (BLOCK_SIZE / 2) as u16;
    let mut fat_block_count: u16 = 1;
    loop {
        let overhead = 2 + fat_block_count; // superblock + root dir + FAT
        if overhead >= total_blocks {
            return Err(FsError::InvalidArgument(
                "too few blocks to hold the superblock, FAT and root directory".into(),
            ));
        }
        let data_block_count = total_blocks - overhead;
        let needed = data_block_count.div_ceil(entries_per_block).max(1);
        if needed == fat_block_count {
            return Ok((fat_block_count as u8, data_block_count));
        }
        fat_block_count = needed;
        if fat_block_count as usize > u8::MAX as usize {
            return Err(FsError::InvalidArgument("disk image too large".into()));
        }
    }
}
