//! Superblock (component B, on-disk block 0). Packed layout decoded with
//! `index_fixed!`, the same fixed-width-slicing idiom the teacher crate uses
//! to pull typed fields out of a raw sector.

use fmt_extra::AsciiStr;
use index_fixed::index_fixed;

use crate::error::{FsError, Result};
use crate::BLOCK_SIZE;

pub const SIGNATURE: &[u8; 8] = b"ECS150FS";

#[derive(Debug, Clone, Copy)]
pub struct Superblock {
    pub total_blocks: u16,
    pub root_dir_block: u16,
    pub data_start_block: u16,
    pub data_block_count: u16,
    pub fat_block_count: u8,
}

impl Superblock {
    pub fn decode(raw: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let signature: &[u8; 8] = index_fixed!(&raw; 0, .. 8);
        if signature != SIGNATURE {
            return Err(FsError::InvalidImage(format!(
                "bad signature: {}",
                AsciiStr(&signature[..])
            )));
        }

        let total_blocks = u16::from_le_bytes(*index_fixed!(&raw; 8, .. 10));
        let root_dir_block = u16::from_le_bytes(*index_fixed!(&raw; 10, .. 12));
        let data_start_block = u16::from_le_bytes(*index_fixed!(&raw; 12, .. 14));
        let data_block_count = u16::from_le_bytes(*index_fixed!(&raw; 14, .. 16));
        let fat_block_count = raw[16];

        Ok(Superblock {
            total_blocks,
            root_dir_block,
            data_start_block,
            data_block_count,
            fat_block_count,
        })
    }

    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut raw = [0u8; BLOCK_SIZE];
        raw[0..8].copy_from_slice(SIGNATURE);
        raw[8..10].copy_from_slice(&self.total_blocks.to_le_bytes());
        raw[10..12].copy_from_slice(&self.root_dir_block.to_le_bytes());
        raw[12..14].copy_from_slice(&self.data_start_block.to_le_bytes());
        raw[14..16].copy_from_slice(&self.data_block_count.to_le_bytes());
        raw[16] = self.fat_block_count;
        raw
    }

    /// Invariants 2, 3 and "data_block_count != 0" from the data model.
    pub fn validate(&self, device_block_count: u64) -> Result<()> {
        if self.total_blocks as u64 != device_block_count {
            return Err(FsError::InvalidImage(format!(
                "superblock claims {} blocks, image has {}",
                self.total_blocks, device_block_count
            )));
        }
        if self.root_dir_block != self.fat_block_count as u16 + 1 {
            return Err(FsError::InvalidImage(
                "root directory block is not immediately after the FAT".into(),
            ));
        }
        if self.data_start_block != self.root_dir_block + 1 {
            return Err(FsError::InvalidImage(
                "data region does not immediately follow the root directory".into(),
            ));
        }
        if self.data_block_count == 0 {
            return Err(FsError::InvalidImage("no data blocks".into()));
        }
        Ok(())
    }
}
