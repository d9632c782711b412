use std::sync::Arc;

use super::{Cell, CellBuilder, CellError};

/// Sequential reader over the bits and references of a cell
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        let bit = self.bit_at(self.bit_pos)?;
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::Unsupported(format!("{}-bit integer", bits)));
        }
        self.ensure_bits(bits)?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | self.bit_at(self.bit_pos)? as u64;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    pub fn load_int(&mut self, bits: usize) -> Result<i64, CellError> {
        let raw = self.load_uint(bits)?;
        if bits == 0 || bits == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>, CellError> {
        self.ensure_bits(len * 8)?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.load_uint(8)? as u8);
        }
        Ok(out)
    }

    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>, CellError> {
        let cell: &'a Cell = self.cell;
        let child = cell.refs().get(self.ref_pos).ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(child)
    }

    /// Unread bits, packed from the most significant bit
    pub(crate) fn remaining_data(&self) -> (Vec<u8>, usize) {
        let bits = self.remaining_bits();
        let mut out = vec![0u8; (bits + 7) / 8];
        for i in 0..bits {
            if self.cell.bit(self.bit_pos + i) == Some(true) {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        (out, bits)
    }

    pub(crate) fn remaining_ref_cells(&self) -> &'a [Arc<Cell>] {
        let cell: &'a Cell = self.cell;
        &cell.refs()[self.ref_pos..]
    }

    /// Materialize the unread part as a standalone cell
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut builder = CellBuilder::new();
        builder.store_slice(self)?;
        builder.build()
    }

    fn bit_at(&self, pos: usize) -> Result<bool, CellError> {
        self.cell.bit(pos).ok_or(CellError::BitUnderflow {
            wanted: 1,
            available: 0,
        })
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(CellError::BitUnderflow {
                wanted: bits,
                available,
            });
        }
        Ok(())
    }
}
