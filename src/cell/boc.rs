//! Bag-of-Cells serialization
//!
//! Layout (generic `b5ee9c72` variant):
//! `magic | flags:size | off_bytes | cells | roots | absent | tot_size |
//!  root_idx | cell* | crc32c?`
//!
//! Exports always carry a CRC32-C trailer and no index table.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Cell, CellError, MAX_CELL_REFS};

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;
const FLAG_SIZE_MASK: u8 = 0x07;

/// Serialize a single-root cell tree to BOC bytes
pub fn to_boc(root: &Cell) -> Result<Vec<u8>, CellError> {
    let order = topological_order(root);
    let index: HashMap<[u8; 32], usize> = order
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.hash(), i))
        .collect();

    let size_bytes = bytes_needed(order.len() as u64);
    let mut payload = Vec::new();
    for cell in &order {
        payload.push(cell.refs_descriptor());
        payload.push(cell.bits_descriptor());
        payload.extend_from_slice(&cell.augmented_data());
        for child in cell.refs() {
            let child_idx = index
                .get(&child.hash())
                .ok_or_else(|| CellError::InvalidBoc("dangling reference".into()))?;
            write_be(&mut payload, *child_idx as u64, size_bytes);
        }
    }
    let off_bytes = bytes_needed(payload.len() as u64);

    let mut out = Vec::with_capacity(payload.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(FLAG_HAS_CRC | size_bytes as u8);
    out.push(off_bytes as u8);
    write_be(&mut out, order.len() as u64, size_bytes);
    write_be(&mut out, 1, size_bytes); // roots
    write_be(&mut out, 0, size_bytes); // absent
    write_be(&mut out, payload.len() as u64, off_bytes);
    write_be(&mut out, 0, size_bytes); // root index
    out.extend_from_slice(&payload);

    let crc = crc32c::crc32c(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Parse BOC bytes and return the first root cell
pub fn from_boc(bytes: &[u8]) -> Result<Cell, CellError> {
    let mut reader = Reader::new(bytes);
    if reader.take(4)? != BOC_MAGIC {
        return Err(CellError::InvalidBoc("unknown magic".into()));
    }

    let flags = reader.byte()?;
    let has_index = flags & FLAG_HAS_INDEX != 0;
    let has_crc = flags & FLAG_HAS_CRC != 0;
    let size_bytes = (flags & FLAG_SIZE_MASK) as usize;
    if !(1..=4).contains(&size_bytes) {
        return Err(CellError::InvalidBoc(format!("invalid size field {}", size_bytes)));
    }
    let off_bytes = reader.byte()? as usize;
    if !(1..=8).contains(&off_bytes) {
        return Err(CellError::InvalidBoc(format!("invalid offset field {}", off_bytes)));
    }

    if has_crc {
        if bytes.len() < 4 {
            return Err(CellError::InvalidBoc("truncated".into()));
        }
        let (body, tail) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let actual = crc32c::crc32c(body);
        if expected != actual {
            return Err(CellError::ChecksumMismatch { expected, actual });
        }
    }

    let cell_count = reader.uint(size_bytes)? as usize;
    let root_count = reader.uint(size_bytes)? as usize;
    let _absent = reader.uint(size_bytes)?;
    let _total_size = reader.uint(off_bytes)?;
    if root_count == 0 || cell_count == 0 {
        return Err(CellError::InvalidBoc("no root cell".into()));
    }
    if root_count > cell_count {
        return Err(CellError::InvalidBoc(format!(
            "{} roots for {} cells",
            root_count, cell_count
        )));
    }
    // Each root takes an index and each cell at least its two descriptor bytes
    let min_len = root_count
        .checked_mul(size_bytes)
        .zip(cell_count.checked_mul(2))
        .and_then(|(roots, cells)| roots.checked_add(cells));
    if min_len.map_or(true, |len| len > reader.remaining()) {
        return Err(CellError::InvalidBoc(format!(
            "{} cells and {} roots do not fit in {} bytes",
            cell_count,
            root_count,
            reader.remaining()
        )));
    }

    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        roots.push(reader.uint(size_bytes)? as usize);
    }
    if has_index {
        let index_len = cell_count
            .checked_mul(off_bytes)
            .ok_or_else(|| CellError::InvalidBoc("index table too large".into()))?;
        reader.take(index_len)?;
    }

    let mut raw = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        raw.push(RawCell::read(&mut reader, size_bytes)?);
    }

    // Children always follow their parents, so build from the tail
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for idx in (0..cell_count).rev() {
        let entry = &raw[idx];
        let mut refs = Vec::with_capacity(entry.refs.len());
        for child in &entry.refs {
            if *child <= idx || *child >= cell_count {
                return Err(CellError::InvalidBoc(format!(
                    "cell {} references {} out of order",
                    idx, child
                )));
            }
            let child_cell = built[*child]
                .clone()
                .ok_or_else(|| CellError::InvalidBoc("missing child".into()))?;
            refs.push(child_cell);
        }
        built[idx] = Some(Arc::new(Cell::new(entry.data.clone(), entry.bit_len, refs)?));
    }

    let root = roots[0];
    built
        .get(root)
        .cloned()
        .flatten()
        .map(|cell| Arc::unwrap_or_clone(cell))
        .ok_or_else(|| CellError::InvalidBoc(format!("root index {} out of range", root)))
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

impl RawCell {
    fn read(reader: &mut Reader<'_>, size_bytes: usize) -> Result<Self, CellError> {
        let d1 = reader.byte()?;
        let d2 = reader.byte()?;
        let ref_count = (d1 & 0x07) as usize;
        if d1 & 0x08 != 0 {
            return Err(CellError::Unsupported("exotic cell".into()));
        }
        if ref_count > MAX_CELL_REFS {
            return Err(CellError::InvalidBoc(format!("{} references", ref_count)));
        }

        let byte_len = (d2 as usize + 1) / 2;
        let mut data = reader.take(byte_len)?.to_vec();
        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            let last = data
                .last_mut()
                .ok_or_else(|| CellError::InvalidBoc("empty augmented data".into()))?;
            if *last == 0 {
                return Err(CellError::InvalidBoc("missing completion tag".into()));
            }
            let tag = last.trailing_zeros() as usize;
            *last &= !(1u8 << tag);
            byte_len * 8 - tag - 1
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            refs.push(reader.uint(size_bytes)? as usize);
        }
        Ok(Self { data, bit_len, refs })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CellError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CellError::InvalidBoc("unexpected end of data".into()))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn byte(&mut self) -> Result<u8, CellError> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, width: usize) -> Result<u64, CellError> {
        Ok(self
            .take(width)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }
}

/// Pre-order walk with duplicates removed; parents precede children
fn topological_order(root: &Cell) -> Vec<&Cell> {
    fn visit<'c>(cell: &'c Cell, seen: &mut HashMap<[u8; 32], ()>, post: &mut Vec<&'c Cell>) {
        if seen.insert(cell.hash(), ()).is_some() {
            return;
        }
        for child in cell.refs().iter().rev() {
            visit(child, seen, post);
        }
        post.push(cell);
    }

    let mut seen = HashMap::new();
    let mut post = Vec::new();
    visit(root, &mut seen, &mut post);
    post.reverse();
    post
}

fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

fn write_be(out: &mut Vec<u8>, value: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((value >> (i * 8)) as u8);
    }
}
