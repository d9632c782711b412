//! Inbound external message envelope
//!
//! ```text
//! message$_ info:CommonMsgInfo init:(Maybe (Either StateInit ^StateInit))
//!           body:(Either X ^X)
//! ext_in_msg_info$10 src:MsgAddressExt dest:MsgAddressInt import_fee:Grams
//! ```

use std::sync::Arc;

use super::address::TonAddress;
use crate::cell::{Cell, CellBuilder, CellError};

/// Wrap `body` in an external message addressed to `destination`.
///
/// The body is stored inline when it fits, otherwise by reference.
pub fn external_message(destination: &TonAddress, body: &Cell) -> Result<Cell, CellError> {
    let mut builder = CellBuilder::new();
    builder
        .store_uint(0b10, 2)? // ext_in_msg_info
        .store_uint(0b00, 2)?; // src: addr_none
    store_std_address(&mut builder, destination)?;
    builder
        .store_uint(0, 4)? // import_fee: zero grams
        .store_bit(false)?; // no state init

    let fits_inline = builder.bits_left() > body.bit_len()
        && builder.refs_left() >= body.refs().len();
    if fits_inline {
        builder.store_bit(false)?.store_cell(body)?;
    } else {
        builder.store_bit(true)?.store_ref(Arc::new(body.clone()))?;
    }
    builder.build()
}

/// addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
fn store_std_address(builder: &mut CellBuilder, address: &TonAddress) -> Result<(), CellError> {
    builder
        .store_uint(0b10, 2)?
        .store_bit(false)?
        .store_int(address.workchain as i64, 8)?
        .store_bytes(&address.hash)?;
    Ok(())
}
