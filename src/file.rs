//! Open-file table (component D): fixed capacity, each slot holding a
//! stable reference to a directory slot plus a byte offset. Descriptors
//! hold an index into the directory array, not a pointer to an entry, so
//! they stay valid across any directory-array manipulation (spec.md §9).

#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
    pub dir_index: usize,
    pub offset: u64,
}
