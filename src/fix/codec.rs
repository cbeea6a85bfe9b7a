//! Tag=value wire format: framing, BodyLength and CheckSum.
//!
//! Frame layout:
//! - `8=<BeginString>` SOH
//! - `9=<BodyLength>` SOH (bytes from the MsgType field up to the trailer)
//! - `35=<MsgType>` SOH, standard header, body fields
//! - `10=<CheckSum>` SOH (byte sum of everything before it, mod 256, three digits)

use bytes::{Buf, BufMut, BytesMut};
use std::fmt::Write;

use super::message::FixMessage;
use super::tags;
use crate::error::{BenchError, Result};

pub const SOH: u8 = 0x01;

/// `10=NNN` plus SOH
const TRAILER_LEN: usize = 7;

/// Upper bound on BodyLength accepted from a counterpart
const MAX_BODY_LENGTH: usize = 1 << 20;

/// Standard header values written in front of every outbound body
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    pub begin_string: &'a str,
    pub sender_comp_id: &'a str,
    pub target_comp_id: &'a str,
    pub msg_seq_num: u64,
    pub sending_time: &'a str,
}

/// Encoder with a reusable scratch buffer for the body
#[derive(Debug, Default)]
pub struct Encoder {
    body: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            body: BytesMut::with_capacity(512),
        }
    }

    /// Append one complete frame for `message` to `dst`
    pub fn encode(&mut self, header: &Header<'_>, message: &FixMessage, dst: &mut BytesMut) {
        self.body.clear();
        put_str_field(&mut self.body, tags::MSG_TYPE, message.msg_type());
        put_str_field(&mut self.body, tags::SENDER_COMP_ID, header.sender_comp_id);
        put_str_field(&mut self.body, tags::TARGET_COMP_ID, header.target_comp_id);
        put_int_field(&mut self.body, tags::MSG_SEQ_NUM, header.msg_seq_num);
        put_str_field(&mut self.body, tags::SENDING_TIME, header.sending_time);
        for (tag, value) in message.fields() {
            put_field(&mut self.body, tag, value.as_bytes());
        }

        let start = dst.len();
        put_str_field(dst, tags::BEGIN_STRING, header.begin_string);
        put_int_field(dst, tags::BODY_LENGTH, self.body.len() as u64);
        dst.put_slice(&self.body);

        let sum = checksum(&dst[start..]);
        let _ = write!(dst, "{}={:03}", tags::CHECK_SUM, sum);
        dst.put_u8(SOH);
    }
}

fn put_field(dst: &mut BytesMut, tag: u32, value: &[u8]) {
    // BytesMut grows on demand, so formatting cannot fail
    let _ = write!(dst, "{}=", tag);
    dst.put_slice(value);
    dst.put_u8(SOH);
}

fn put_str_field(dst: &mut BytesMut, tag: u32, value: &str) {
    put_field(dst, tag, value.as_bytes());
}

fn put_int_field(dst: &mut BytesMut, tag: u32, value: u64) {
    let _ = write!(dst, "{}={}", tag, value);
    dst.put_u8(SOH);
}

/// Byte sum modulo 256
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Decode one frame from the front of `src` into `message`.
///
/// Returns `Ok(false)` when `src` does not yet hold a complete frame; nothing
/// is consumed in that case. On success the frame is removed from `src`.
pub fn decode(src: &mut BytesMut, message: &mut FixMessage) -> Result<bool> {
    let Some(begin_end) = find_soh(src, 0) else {
        return Ok(false);
    };
    if !src.starts_with(b"8=") {
        return Err(BenchError::Protocol(
            "frame does not start with BeginString".to_string(),
        ));
    }

    let Some(length_end) = find_soh(src, begin_end + 1) else {
        return Ok(false);
    };
    let length_field = &src[begin_end + 1..length_end];
    let body_length = length_field
        .strip_prefix(b"9=")
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| BenchError::Protocol("missing or invalid BodyLength".to_string()))?;
    if body_length > MAX_BODY_LENGTH {
        return Err(BenchError::Protocol(format!(
            "BodyLength {} exceeds limit",
            body_length
        )));
    }

    let body_start = length_end + 1;
    let body_end = body_start + body_length;
    let frame_end = body_end + TRAILER_LEN;
    if src.len() < frame_end {
        return Ok(false);
    }

    let trailer = &src[body_end..frame_end];
    if !trailer.starts_with(b"10=") || trailer[TRAILER_LEN - 1] != SOH {
        return Err(BenchError::Protocol(
            "BodyLength does not point at CheckSum".to_string(),
        ));
    }
    let expected = std::str::from_utf8(&trailer[3..6])
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .ok_or_else(|| BenchError::Protocol("invalid CheckSum".to_string()))?;
    let actual = checksum(&src[..body_end]);
    if expected != actual as u16 {
        return Err(BenchError::Protocol(format!(
            "CheckSum mismatch: expected {:03}, computed {:03}",
            expected, actual
        )));
    }

    parse_body(&src[body_start..body_end], message)?;
    src.advance(frame_end);
    Ok(true)
}

fn parse_body(body: &[u8], message: &mut FixMessage) -> Result<()> {
    message.reset();

    let mut fields = body
        .split(|b| *b == SOH)
        .filter(|f| !f.is_empty())
        .map(split_field);

    match fields.next() {
        Some(Ok((tags::MSG_TYPE, value))) => {
            let msg_type = std::str::from_utf8(value)
                .map_err(|_| BenchError::Protocol("MsgType is not ASCII".to_string()))?;
            message.set_msg_type(msg_type);
        }
        Some(Err(e)) => return Err(e),
        _ => {
            return Err(BenchError::Protocol(
                "MsgType must be the first body field".to_string(),
            ))
        }
    }

    for field in fields {
        let (tag, value) = field?;
        message.push(tag).set_bytes(value);
    }
    Ok(())
}

fn split_field(field: &[u8]) -> Result<(u32, &[u8])> {
    let eq = field
        .iter()
        .position(|b| *b == b'=')
        .ok_or_else(|| BenchError::Protocol("field without '='".to_string()))?;
    let tag = std::str::from_utf8(&field[..eq])
        .ok()
        .and_then(|t| t.parse::<u32>().ok())
        .ok_or_else(|| BenchError::Protocol("invalid tag".to_string()))?;
    Ok((tag, &field[eq + 1..]))
}

fn find_soh(src: &[u8], from: usize) -> Option<usize> {
    src.get(from..)?
        .iter()
        .position(|b| *b == SOH)
        .map(|pos| from + pos)
}
