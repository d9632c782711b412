use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{CellError, CellSlice, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};

/// An immutable ordinary cell
///
/// The representation hash and depth are computed once on construction,
/// so hashing a large tree never walks it twice.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Create a cell from packed data bits and child references.
    ///
    /// Bits past `bit_len` in the last byte are cleared.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, CellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::BitOverflow { requested: bit_len });
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(CellError::RefOverflow);
        }

        let byte_len = (bit_len + 7) / 8;
        if data.len() < byte_len {
            return Err(CellError::BitUnderflow {
                wanted: bit_len,
                available: data.len() * 8,
            });
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            let mask = 0xFFu8 << (8 - bit_len % 8);
            data[byte_len - 1] &= mask;
        }

        let depth = match refs.iter().map(|r| r.depth).max() {
            Some(max) => max + 1,
            None => 0,
        };
        if depth > MAX_CELL_DEPTH {
            return Err(CellError::DepthOverflow(MAX_CELL_DEPTH));
        }

        let mut cell = Self {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    /// The empty cell (no bits, no references)
    pub fn empty() -> Self {
        let mut cell = Self {
            data: Vec::new(),
            bit_len: 0,
            refs: Vec::new(),
            hash: [0u8; 32],
            depth: 0,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Representation hash (SHA-256 of the standard cell representation)
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Bit at `index` (0 = most significant bit of the first byte), `None`
    /// past the end of the data
    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        self.data
            .get(index / 8)
            .map(|byte| (byte >> (7 - index % 8)) & 1 == 1)
    }

    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// First descriptor byte: reference count (ordinary cell, level 0)
    pub(crate) fn refs_descriptor(&self) -> u8 {
        self.refs.len() as u8
    }

    /// Second descriptor byte: floor(bits / 8) + ceil(bits / 8)
    pub(crate) fn bits_descriptor(&self) -> u8 {
        (self.bit_len / 8 + (self.bit_len + 7) / 8) as u8
    }

    /// Data padded with a completion tag when not byte aligned
    pub(crate) fn augmented_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.bit_len % 8 != 0 {
            let last = out.len() - 1;
            out[last] |= 0x80 >> (self.bit_len % 8);
        }
        out
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.refs_descriptor(), self.bits_descriptor()]);
        hasher.update(self.augmented_data());
        for child in &self.refs {
            hasher.update(child.depth.to_be_bytes());
        }
        for child in &self.refs {
            hasher.update(child.hash);
        }
        hasher.finalize().into()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.refs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_hash() {
        assert_eq!(
            Cell::empty().hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn test_trailing_bits_are_cleared() {
        let a = Cell::new(vec![0b1011_1111], 3, vec![]).unwrap();
        let b = Cell::new(vec![0b1010_0000], 3, vec![]).unwrap();
        assert_eq!(a.data(), &[0b1010_0000]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_bit_outside_data_is_none() {
        let cell = Cell::new(vec![0b1010_0000], 3, vec![]).unwrap();
        assert_eq!(cell.bit(0), Some(true));
        assert_eq!(cell.bit(1), Some(false));
        assert_eq!(cell.bit(3), None);
        assert_eq!(cell.bit(4096), None);
        assert_eq!(Cell::empty().bit(0), None);
    }

    #[test]
    fn test_augmented_data_sets_completion_tag() {
        let cell = Cell::new(vec![0b1010_0000], 3, vec![]).unwrap();
        assert_eq!(cell.augmented_data(), vec![0b1011_0000]);
        assert_eq!(cell.bits_descriptor(), 1);
    }

    #[test]
    fn test_depth_follows_children() {
        let leaf = Arc::new(Cell::empty());
        let mid = Arc::new(Cell::new(vec![], 0, vec![leaf.clone()]).unwrap());
        let root = Cell::new(vec![], 0, vec![mid, leaf]).unwrap();
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_rejects_oversized_cell() {
        let err = Cell::new(vec![0u8; 128], 1024, vec![]).unwrap_err();
        assert_eq!(err, CellError::BitOverflow { requested: 1024 });
    }
}
