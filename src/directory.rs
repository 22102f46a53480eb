//! Root directory (component C): a single block of 128 fixed-size entries.

use crate::device::BlockDevice;
use crate::error::{FsError, Result};
use crate::fat::FAT_EOC;
use crate::{BLOCK_SIZE, FS_FILENAME_LEN, FS_FILE_MAX_COUNT};

const ENTRY_SIZE: usize = BLOCK_SIZE / FS_FILE_MAX_COUNT;

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub filename: [u8; FS_FILENAME_LEN],
    pub size: u32,
    pub first_block: u16,
}

impl DirEntry {
    fn empty() -> Self {
        DirEntry {
            filename: [0; FS_FILENAME_LEN],
            size: 0,
            first_block: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filename[0] == 0
    }

    /// The filename up to its NUL terminator, as a `&str`.
    pub fn name(&self) -> &str {
        let len = self.filename.iter().position(|&b| b == 0).unwrap_or(self.filename.len());
        std::str::from_utf8(&self.filename[..len]).unwrap_or("")
    }

    fn decode(raw: &[u8]) -> Self {
        let mut filename = [0u8; FS_FILENAME_LEN];
        filename.copy_from_slice(&raw[0..FS_FILENAME_LEN]);
        let size = u32::from_le_bytes(raw[16..20].try_into().unwrap());
        let first_block = u16::from_le_bytes(raw[20..22].try_into().unwrap());
        DirEntry {
            filename,
            size,
            first_block,
        }
    }

    fn encode(&self, out: &mut [u8]) {
        out[0..FS_FILENAME_LEN].copy_from_slice(&self.filename);
        out[16..20].copy_from_slice(&self.size.to_le_bytes());
        out[20..22].copy_from_slice(&self.first_block.to_le_bytes());
    }
}

pub struct Directory {
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn load(device: &BlockDevice, block: u16) -> Result<Self> {
        let mut raw = [0u8; BLOCK_SIZE];
        device.read_block(block as u64, &mut raw)?;
        let entries = raw
            .chunks_exact(ENTRY_SIZE)
            .map(DirEntry::decode)
            .collect();
        Ok(Directory { entries })
    }

    pub fn flush(&self, device: &mut BlockDevice, block: u16) -> Result<()> {
        let mut raw = [0u8; BLOCK_SIZE];
        for (i, entry) in self.entries.iter().enumerate() {
            entry.encode(&mut raw[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
        }
        device.write_block(block as u64, &raw)
    }

    pub fn get(&self, index: usize) -> &DirEntry {
        &self.entries[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut DirEntry {
        &mut self.entries[index]
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.is_empty() && e.name() == name)
    }

    fn find_free_slot(&self) -> Option<usize> {
        self.entries.iter().position(DirEntry::is_empty)
    }

    pub fn create(&mut self, name: &str) -> Result<usize> {
        if self.find(name).is_some() {
            return Err(FsError::NameCollision);
        }
        let index = self.find_free_slot().ok_or(FsError::TableFull)?;
        let mut filename = [0u8; FS_FILENAME_LEN];
        filename[..name.len()].copy_from_slice(name.as_bytes());
        self.entries[index] = DirEntry {
            filename,
            size: 0,
            first_block: FAT_EOC,
        };
        Ok(index)
    }

    pub fn clear(&mut self, index: usize) {
        self.entries[index] = DirEntry::empty();
    }

    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_empty()).count()
    }

    pub fn ls(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Directory {
        Directory {
            entries: (0..FS_FILE_MAX_COUNT).map(|_| DirEntry::empty()).collect(),
        }
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let mut dir = fresh();
        dir.create("a").unwrap();
        assert!(matches!(dir.create("a"), Err(FsError::NameCollision)));
    }

    #[test]
    fn create_fails_once_full() {
        let mut dir = fresh();
        for i in 0..FS_FILE_MAX_COUNT {
            dir.create(&format!("f{i}")).unwrap();
        }
        assert!(matches!(dir.create("overflow"), Err(FsError::TableFull)));
    }

    #[test]
    fn clear_makes_a_slot_reusable() {
        let mut dir = fresh();
        let idx = dir.create("a").unwrap();
        dir.clear(idx);
        assert!(dir.find("a").is_none());
        assert_eq!(dir.free_count(), FS_FILE_MAX_COUNT);
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let mut dir = fresh();
        let idx = dir.create("round").unwrap();
        dir.get_mut(idx).size = 1234;
        dir.get_mut(idx).first_block = 7;

        let mut raw = [0u8; BLOCK_SIZE];
        for (i, entry) in dir.entries.iter().enumerate() {
            entry.encode(&mut raw[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
        }
        let decoded: Vec<DirEntry> = raw.chunks_exact(ENTRY_SIZE).map(DirEntry::decode).collect();
        assert_eq!(decoded[idx].name(), "round");
        assert_eq!(decoded[idx].size, 1234);
        assert_eq!(decoded[idx].first_block, 7);
    }
}
