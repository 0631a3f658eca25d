//! Appends trade events, reduce events, L2 snapshot records and the packed
//! trailing result word to a [`ResponseWriter`]. Every layout here is part
//! of the wire contract; field order and widths must not change.

use crate::buffer::ResponseWriter;
use crate::constants::{self, ResultCode, ResultFlags};
use crate::error::CodecError;
use crate::model::TradeFill;

/// One maker consumed by a match, 49 bytes:
/// `maker_order_id:8 | maker_uid:8 | price:8 | reserve_bid_price:8 | trade_volume:8 | maker_order_completed:1`.
pub fn write_trade_event(writer: &mut ResponseWriter, fill: &TradeFill) -> Result<(), CodecError> {
    writer.append_u64(fill.maker_order_id)?;
    writer.append_u64(fill.maker_uid)?;
    writer.append_i64(fill.price)?;
    writer.append_i64(fill.reserve_bid_price)?;
    writer.append_u64(fill.traded_volume)?;
    writer.append_bool(fill.maker_completed)?;
    Ok(())
}

/// A removed-without-execution notification, 24 bytes:
/// `price:8 | reserve_bid_price:8 | reduced_volume:8`. At most one per command.
pub fn write_reduce_event(
    writer: &mut ResponseWriter,
    price: i64,
    reserve_bid_price: i64,
    reduced_volume: u64,
) -> Result<(), CodecError> {
    writer.append_i64(price)?;
    writer.append_i64(reserve_bid_price)?;
    writer.append_u64(reduced_volume)?;
    Ok(())
}

/// One aggregated depth row, 20 bytes: `price:8 | volume:8 | num_orders:4`.
pub fn write_l2_record(
    writer: &mut ResponseWriter,
    price: i64,
    volume: u64,
    num_orders: u32,
) -> Result<(), CodecError> {
    writer.append_i64(price)?;
    writer.append_u64(volume)?;
    writer.append_u32(num_orders)?;
    Ok(())
}

/// The 16-bit trailing word every response ends with.
pub fn write_result_word(
    writer: &mut ResponseWriter,
    code: ResultCode,
    flags: ResultFlags,
) -> Result<(), CodecError> {
    writer.append_u16(constants::pack_result(code, flags))
}

/// `opcode:1 | uid:8 | order_id:8`, the header shared by PLACE/CANCEL/REDUCE/MOVE.
pub fn write_response_header(
    writer: &mut ResponseWriter,
    opcode: u8,
    uid: u64,
    order_id: u64,
) -> Result<(), CodecError> {
    writer.append_u8(opcode)?;
    writer.append_u64(uid)?;
    writer.append_u64(order_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RequestReader;

    #[test]
    fn trade_event_layout_is_49_bytes() {
        let mut backing = [0u8; 49];
        let mut writer = ResponseWriter::new(&mut backing, 0);
        let fill = TradeFill {
            maker_order_id: 100,
            maker_uid: 1,
            price: 1000,
            reserve_bid_price: 0,
            traded_volume: 4,
            maker_completed: false,
        };
        write_trade_event(&mut writer, &fill).unwrap();
        assert_eq!(writer.position(), 49);

        let mut reader = RequestReader::new(&backing, 0);
        assert_eq!(reader.read_u64().unwrap(), 100);
        assert_eq!(reader.read_u64().unwrap(), 1);
        assert_eq!(reader.read_i64().unwrap(), 1000);
        assert_eq!(reader.read_i64().unwrap(), 0);
        assert_eq!(reader.read_u64().unwrap(), 4);
        assert_eq!(reader.read_u8().unwrap(), 0);
    }

    #[test]
    fn reduce_event_layout_is_24_bytes() {
        let mut backing = [0u8; 24];
        let mut writer = ResponseWriter::new(&mut backing, 0);
        write_reduce_event(&mut writer, 999, 0, 5).unwrap();
        assert_eq!(writer.position(), 24);
    }

    #[test]
    fn l2_record_layout_is_20_bytes() {
        let mut backing = [0u8; 20];
        let mut writer = ResponseWriter::new(&mut backing, 0);
        write_l2_record(&mut writer, 1000, 6, 1).unwrap();
        assert_eq!(writer.position(), 20);
    }
}
