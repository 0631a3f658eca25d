//! Parses a request opcode and its fixed field layout, routes to the
//! matching core, and writes the response header plus trailing result word.
//! This is the only module that knows how wire bytes map onto the matching
//! primitives in [`crate::matching`] and [`crate::book`].

use crate::book::MatchingEngine;
use crate::buffer::{RequestReader, ResponseWriter};
use crate::constants::{request_len, Action, CommandOpcode, OrderKind, ResultCode, ResultFlags};
use crate::error::EngineError;
use crate::events::{write_l2_record, write_reduce_event, write_response_header, write_result_word, write_trade_event};
use crate::matching::{place_fok, place_fok_budget, place_gtc, place_ioc, place_ioc_budget, PlaceOutcome};

fn action_flag(action: Action) -> ResultFlags {
    match action {
        Action::Bid => ResultFlags::TAKER_IS_BID,
        Action::Ask => ResultFlags::empty(),
    }
}

/// Parses and executes one command starting at `offset` in `input`, writing
/// the response starting at `out_offset` in `output`. Returns the absolute
/// end position of the response on success.
pub fn dispatch(
    engine: &MatchingEngine,
    input: &[u8],
    offset: usize,
    timestamp: i64,
    output: &mut [u8],
    out_offset: usize,
) -> Result<usize, EngineError> {
    let mut reader = RequestReader::new(input, offset);
    let opcode_byte = reader.read_u8()?;
    let mut writer = ResponseWriter::new(output, out_offset);

    let Ok(opcode) = CommandOpcode::try_from(opcode_byte) else {
        writer.append_u8(opcode_byte)?;
        write_result_word(&mut writer, ResultCode::UnsupportedCommand, ResultFlags::empty())?;
        return Ok(writer.position());
    };

    let expected_len = match opcode {
        CommandOpcode::Place => request_len::PLACE,
        CommandOpcode::Cancel => request_len::CANCEL,
        CommandOpcode::Reduce => request_len::REDUCE,
        CommandOpcode::Move => request_len::MOVE,
        CommandOpcode::QueryOrderBook => request_len::QUERY_ORDER_BOOK,
    };
    debug_assert!(
        input.len().saturating_sub(reader.position()) >= expected_len,
        "request buffer shorter than the fixed layout for this opcode"
    );

    match opcode {
        CommandOpcode::Place => handle_place(engine, &mut reader, &mut writer, timestamp)?,
        CommandOpcode::Cancel => handle_cancel(engine, &mut reader, &mut writer)?,
        CommandOpcode::Reduce => handle_reduce(engine, &mut reader, &mut writer)?,
        CommandOpcode::Move => handle_move(engine, &mut reader, &mut writer)?,
        CommandOpcode::QueryOrderBook => handle_query_order_book(engine, &mut reader, &mut writer)?,
    }
    Ok(writer.position())
}

fn handle_place(
    engine: &MatchingEngine,
    reader: &mut RequestReader,
    writer: &mut ResponseWriter,
    timestamp: i64,
) -> Result<(), EngineError> {
    let uid = reader.read_u64()?;
    let order_id = reader.read_u64()?;
    let price = reader.read_i64()?;
    let reserve_bid_price = reader.read_i64()?;
    let raw_size = reader.read_i64()?;
    let user_cookie = reader.read_u32()?;
    let action_byte = reader.read_u8()?;
    let type_byte = reader.read_u8()?;

    write_response_header(writer, CommandOpcode::Place as u8, uid, order_id)?;
    writer.append_u32(user_cookie)?;

    if raw_size <= 0 {
        write_result_word(writer, ResultCode::IncorrectOrderSize, ResultFlags::empty())?;
        return Ok(());
    }
    let size = raw_size as u64;

    let action = Action::try_from(action_byte).map_err(EngineError::InvalidActionByte)?;
    if !engine.symbol().size_is_valid(size) || !engine.symbol().price_is_valid(price) {
        write_result_word(writer, ResultCode::IncorrectOrderSize, action_flag(action))?;
        return Ok(());
    }

    let kind = OrderKind::try_from(type_byte).map_err(EngineError::UnsupportedOrderType)?;

    let outcome = match kind {
        OrderKind::Gtc => place_gtc(engine, order_id, uid, action, price, reserve_bid_price, size, timestamp),
        OrderKind::Ioc => place_ioc(engine, action, price, reserve_bid_price, size),
        OrderKind::IocBudget => place_ioc_budget(engine, action, price, reserve_bid_price, size),
        OrderKind::Fok => place_fok(engine, action, price, reserve_bid_price, size),
        OrderKind::FokBudget => place_fok_budget(engine, order_id, action, price, reserve_bid_price, size)?,
    };

    match outcome {
        PlaceOutcome::FullyFilled { fills } => {
            for fill in &fills {
                write_trade_event(writer, fill)?;
            }
            write_result_word(
                writer,
                ResultCode::Success,
                ResultFlags::TAKER_COMPLETED | action_flag(action),
            )?;
        }
        PlaceOutcome::Resting { fills, order } => {
            for fill in &fills {
                write_trade_event(writer, fill)?;
            }
            writer.append_u64(order.remaining())?;
            write_result_word(writer, ResultCode::Success, action_flag(action))?;
        }
        PlaceOutcome::Reduced {
            fills,
            remainder,
            price,
            reserve_bid_price,
        } => {
            for fill in &fills {
                write_trade_event(writer, fill)?;
            }
            write_reduce_event(writer, price, reserve_bid_price, remainder)?;
            write_result_word(
                writer,
                ResultCode::Success,
                ResultFlags::TAKER_COMPLETED | ResultFlags::REDUCE_PRESENT | action_flag(action),
            )?;
        }
        PlaceOutcome::DuplicateId {
            fills,
            remainder,
            price,
            reserve_bid_price,
        } => {
            for fill in &fills {
                write_trade_event(writer, fill)?;
            }
            write_reduce_event(writer, price, reserve_bid_price, remainder)?;
            write_result_word(
                writer,
                ResultCode::Success,
                ResultFlags::TAKER_COMPLETED | ResultFlags::REDUCE_PRESENT | action_flag(action),
            )?;
        }
    }
    Ok(())
}

fn handle_cancel(
    engine: &MatchingEngine,
    reader: &mut RequestReader,
    writer: &mut ResponseWriter,
) -> Result<(), EngineError> {
    let uid = reader.read_u64()?;
    let order_id = reader.read_u64()?;
    write_response_header(writer, CommandOpcode::Cancel as u8, uid, order_id)?;

    match engine.remove_resting(order_id, uid) {
        None => {
            write_result_word(writer, ResultCode::UnknownOrderId, ResultFlags::TAKER_COMPLETED)?;
        }
        Some(removed) => {
            write_reduce_event(writer, removed.price, removed.reserve_bid_price, removed.remaining())?;
            write_result_word(
                writer,
                ResultCode::Success,
                ResultFlags::TAKER_COMPLETED | ResultFlags::REDUCE_PRESENT | action_flag(removed.action),
            )?;
        }
    }
    Ok(())
}

fn handle_reduce(
    engine: &MatchingEngine,
    reader: &mut RequestReader,
    writer: &mut ResponseWriter,
) -> Result<(), EngineError> {
    let uid = reader.read_u64()?;
    let order_id = reader.read_u64()?;
    let requested = reader.read_i64()?;
    write_response_header(writer, CommandOpcode::Reduce as u8, uid, order_id)?;

    let order = match engine.get_order(order_id) {
        Some(order) if order.uid == uid => order,
        _ => {
            write_result_word(writer, ResultCode::UnknownOrderId, ResultFlags::empty())?;
            return Ok(());
        }
    };

    if requested <= 0 {
        write_result_word(writer, ResultCode::IncorrectReduceSize, action_flag(order.action))?;
        return Ok(());
    }

    let remaining = order.remaining();
    let actual = remaining.min(requested as u64);
    write_reduce_event(writer, order.price, order.reserve_bid_price, actual)?;

    if actual == remaining {
        engine.remove_resting(order_id, uid);
        write_result_word(
            writer,
            ResultCode::Success,
            ResultFlags::TAKER_COMPLETED | ResultFlags::REDUCE_PRESENT | action_flag(order.action),
        )?;
    } else {
        let new_remaining = engine
            .reduce_resting(order_id, uid, actual)
            .expect("order looked up above still resides in its bucket");
        writer.append_u64(new_remaining)?;
        write_result_word(
            writer,
            ResultCode::Success,
            ResultFlags::REDUCE_PRESENT | action_flag(order.action),
        )?;
    }
    Ok(())
}

fn handle_move(
    engine: &MatchingEngine,
    reader: &mut RequestReader,
    writer: &mut ResponseWriter,
) -> Result<(), EngineError> {
    let uid = reader.read_u64()?;
    let order_id = reader.read_u64()?;
    let new_price = reader.read_i64()?;
    write_response_header(writer, CommandOpcode::Move as u8, uid, order_id)?;

    let order = match engine.get_order(order_id) {
        Some(order) if order.uid == uid => order,
        _ => {
            write_result_word(writer, ResultCode::UnknownOrderId, ResultFlags::empty())?;
            return Ok(());
        }
    };

    if order.action == Action::Bid && engine.symbol().is_exchange_type() && new_price > order.reserve_bid_price {
        writer.append_u64(order.remaining())?;
        write_result_word(
            writer,
            ResultCode::MoveFailedPriceOverRiskLimit,
            action_flag(order.action),
        )?;
        return Ok(());
    }

    let removed = engine
        .remove_resting(order_id, uid)
        .expect("order looked up above still resides in its bucket");
    let taker_remaining = removed.remaining();
    let (matched, fills) =
        engine.try_match_instantly(removed.action, Some(new_price), taker_remaining, removed.reserve_bid_price);
    for fill in &fills {
        write_trade_event(writer, fill)?;
    }

    let filled_after = removed.filled + matched;
    if filled_after == removed.size {
        write_result_word(
            writer,
            ResultCode::Success,
            ResultFlags::TAKER_COMPLETED | action_flag(removed.action),
        )?;
    } else {
        let moved = crate::model::RestingOrder::new(
            removed.order_id,
            removed.uid,
            removed.action,
            new_price,
            removed.reserve_bid_price,
            removed.size,
            filled_after,
            removed.timestamp,
        );
        let remaining = moved.remaining();
        engine.insert_resting(moved);
        writer.append_u64(remaining)?;
        write_result_word(writer, ResultCode::Success, action_flag(removed.action))?;
    }
    Ok(())
}

fn handle_query_order_book(
    engine: &MatchingEngine,
    reader: &mut RequestReader,
    writer: &mut ResponseWriter,
) -> Result<(), EngineError> {
    let raw_limit = reader.read_i16()?;
    let limit = if raw_limit <= 0 { None } else { Some(raw_limit as usize) };

    let asks = engine.fill_asks(limit);
    let bids = engine.fill_bids(limit);

    let needed = 20 * (asks.len() + bids.len()) + 1 + 4 + 4 + 2;
    if writer.remaining() < needed {
        writer.append_u8(CommandOpcode::QueryOrderBook as u8)?;
        writer.append_u32(0)?;
        writer.append_u32(0)?;
        write_result_word(writer, ResultCode::IncorrectL2SizeLimit, ResultFlags::empty())?;
        return Ok(());
    }

    for (price, volume, num_orders) in &asks {
        write_l2_record(writer, *price, *volume, *num_orders)?;
    }
    for (price, volume, num_orders) in &bids {
        write_l2_record(writer, *price, *volume, *num_orders)?;
    }
    writer.append_u8(CommandOpcode::QueryOrderBook as u8)?;
    writer.append_u32(asks.len() as u32)?;
    writer.append_u32(bids.len() as u32)?;
    write_result_word(writer, ResultCode::Success, ResultFlags::empty())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolSpec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(SymbolSpec::new("TEST", true))
    }

    fn place_request(uid: u64, order_id: u64, price: i64, reserve: i64, size: i64, action: u8, kind: u8) -> Vec<u8> {
        let mut buf = vec![CommandOpcode::Place as u8];
        buf.extend(uid.to_be_bytes());
        buf.extend(order_id.to_be_bytes());
        buf.extend(price.to_be_bytes());
        buf.extend(reserve.to_be_bytes());
        buf.extend(size.to_be_bytes());
        buf.extend(7u32.to_be_bytes());
        buf.push(action);
        buf.push(kind);
        buf
    }

    #[test]
    fn place_gtc_then_query_order_book() {
        let engine = engine();
        let req = place_request(1, 100, 1000, 0, 10, Action::Ask as u8, OrderKind::Gtc as u8);
        let mut out = [0u8; 128];
        let end = dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap();
        assert!(end > 0);
        let result = u16::from_be_bytes([out[end - 2], out[end - 1]]);
        assert_eq!(result & 0xFFF, ResultCode::Success.code());

        let mut query = vec![CommandOpcode::QueryOrderBook as u8];
        query.extend(0i16.to_be_bytes());
        let mut out2 = [0u8; 64];
        let end2 = dispatch(&engine, &query, 0, 0, &mut out2, 0).unwrap();
        assert_eq!(out2[0], CommandOpcode::QueryOrderBook as u8);
        let _ = end2;
    }

    #[test]
    fn place_with_zero_size_is_incorrect_order_size() {
        let engine = engine();
        let req = place_request(1, 100, 1000, 0, 0, Action::Ask as u8, OrderKind::Gtc as u8);
        let mut out = [0u8; 64];
        let end = dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap();
        let result = u16::from_be_bytes([out[end - 2], out[end - 1]]);
        assert_eq!(result & 0xFFF, ResultCode::IncorrectOrderSize.code());
    }

    #[test]
    fn cancel_unknown_order_reports_unknown_id() {
        let engine = engine();
        let mut req = vec![CommandOpcode::Cancel as u8];
        req.extend(1u64.to_be_bytes());
        req.extend(999u64.to_be_bytes());
        let mut out = [0u8; 64];
        let end = dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap();
        let result = u16::from_be_bytes([out[end - 2], out[end - 1]]);
        assert_eq!(result & 0xFFF, ResultCode::UnknownOrderId.code());
    }

    #[test]
    fn unsupported_command_opcode_is_recoverable() {
        let engine = engine();
        let req = vec![99u8];
        let mut out = [0u8; 16];
        let end = dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap();
        let result = u16::from_be_bytes([out[end - 2], out[end - 1]]);
        assert_eq!(result & 0xFFF, ResultCode::UnsupportedCommand.code());
    }

    #[test]
    fn ioc_budget_opcode_partially_fills_then_reduces_remainder() {
        let engine = engine();
        let rest_a = place_request(1, 1, 100, 0, 5, Action::Ask as u8, OrderKind::Gtc as u8);
        let rest_b = place_request(1, 2, 200, 0, 5, Action::Ask as u8, OrderKind::Gtc as u8);
        let mut out = [0u8; 128];
        dispatch(&engine, &rest_a, 0, 0, &mut out, 0).unwrap();
        dispatch(&engine, &rest_b, 0, 0, &mut out, 0).unwrap();

        // budget 1200 over size 10 -> per-unit limit 120, only the 100-priced level clears it.
        let req = place_request(2, 3, 1200, 0, 10, Action::Bid as u8, OrderKind::IocBudget as u8);
        let mut out2 = [0u8; 128];
        let end = dispatch(&engine, &req, 0, 1, &mut out2, 0).unwrap();
        let result = u16::from_be_bytes([out2[end - 2], out2[end - 1]]);
        assert_eq!(result & 0xFFF, ResultCode::Success.code());
        assert_ne!(result & (ResultFlags::REDUCE_PRESENT.bits()), 0);
        assert_eq!(engine.get_order(2).unwrap().remaining(), 5);
        assert!(engine.get_order(3).is_none(), "IOC_BUDGET never rests a remainder");
    }

    #[test]
    fn unsupported_order_type_is_fatal() {
        let engine = engine();
        let req = place_request(1, 100, 1000, 0, 10, Action::Ask as u8, 99);
        let mut out = [0u8; 64];
        let err = dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOrderType(99)));
    }
}
