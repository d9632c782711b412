//! Cell Container
//!
//! Minimal implementation of the TON cell model used by the multisig
//! authorization encoder:
//!
//! - `CellBuilder`: append bits, integers, byte strings and references
//! - `Cell`: immutable node with a representation hash and depth
//! - `CellSlice`: sequential reader over a cell
//! - `boc`: bag-of-cells export and parsing (CRC32-C checked)
//!
//! Only ordinary cells are supported. Exotic cells (pruned branches,
//! library references, Merkle proofs) are rejected on parse.

mod builder;
#[allow(clippy::module_inception)]
mod cell;
mod slice;
pub mod boc;

pub use builder::CellBuilder;
pub use cell::Cell;
pub use slice::CellSlice;

/// Maximum number of data bits in one cell
pub const MAX_CELL_BITS: usize = 1023;
/// Maximum number of child references in one cell
pub const MAX_CELL_REFS: usize = 4;
/// Maximum depth of a cell tree
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Errors raised while building, reading or (de)serializing cells
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("Cell data overflow: {requested} bits exceed the 1023-bit limit")]
    BitOverflow { requested: usize },

    #[error("Cell reference overflow: more than 4 references")]
    RefOverflow,

    #[error("Value {value} does not fit in {bits} bits")]
    ValueTooLarge { value: u64, bits: usize },

    #[error("Cell depth exceeds {0}")]
    DepthOverflow(u16),

    #[error("Read past end of cell: wanted {wanted} bits, {available} left")]
    BitUnderflow { wanted: usize, available: usize },

    #[error("No more references in cell")]
    RefUnderflow,

    #[error("Invalid BOC: {0}")]
    InvalidBoc(String),

    #[error("BOC checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Unsupported cell: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    // bag-of-cells trailers use the Castagnoli polynomial
    #[test]
    fn test_crc32c_check_value() {
        assert_eq!(crc32c::crc32c(b"123456789"), 0xE306_9283);
        assert_eq!(crc32c::crc32c(&[]), 0);
    }
}
