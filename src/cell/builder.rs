use std::sync::Arc;

use super::{Cell, CellError, CellSlice, MAX_CELL_BITS, MAX_CELL_REFS};

/// Incremental cell writer
///
/// All `store_*` methods return `&mut Self` so calls chain with `?`.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    pub fn refs_left(&self) -> usize {
        MAX_CELL_REFS - self.refs.len()
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store `value` as an unsigned big-endian integer of `bits` width
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(CellError::ValueTooLarge { value, bits });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store `value` as a two's complement integer of `bits` width
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::ValueTooLarge { value: value as u64, bits });
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::ValueTooLarge { value: value as u64, bits });
            }
        }
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self.store_uint(value as u64 & mask, bits)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Store the first `bit_len` bits of `data`
    pub fn store_bits(&mut self, data: &[u8], bit_len: usize) -> Result<&mut Self, CellError> {
        if data.len() * 8 < bit_len {
            return Err(CellError::BitUnderflow {
                wanted: bit_len,
                available: data.len() * 8,
            });
        }
        self.ensure_bits(bit_len)?;
        if self.bit_len % 8 == 0 && bit_len % 8 == 0 {
            self.data.extend_from_slice(&data[..bit_len / 8]);
            self.bit_len += bit_len;
            return Ok(self);
        }
        for i in 0..bit_len {
            self.push_bit((data[i / 8] >> (7 - i % 8)) & 1 == 1);
        }
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::RefOverflow);
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Append the unread bits and references of `slice`
    pub fn store_slice(&mut self, slice: &CellSlice<'_>) -> Result<&mut Self, CellError> {
        let refs = slice.remaining_ref_cells();
        if self.refs.len() + refs.len() > MAX_CELL_REFS {
            return Err(CellError::RefOverflow);
        }
        self.ensure_bits(slice.remaining_bits())?;
        let (data, bits) = slice.remaining_data();
        self.store_bits(&data, bits)?;
        self.refs.extend(refs.iter().cloned());
        Ok(self)
    }

    /// Append the full contents (bits and references) of `cell`
    pub fn store_cell(&mut self, cell: &Cell) -> Result<&mut Self, CellError> {
        self.store_slice(&cell.parse())
    }

    pub fn build(&self) -> Result<Cell, CellError> {
        Cell::new(self.data.clone(), self.bit_len, self.refs.clone())
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        let requested = self.bit_len + bits;
        if requested > MAX_CELL_BITS {
            return Err(CellError::BitOverflow { requested });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let byte = self.bit_len / 8;
            self.data[byte] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }
}
