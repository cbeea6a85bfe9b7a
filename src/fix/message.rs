//! Ordered tag=value message model.
//!
//! A `FixMessage` owns its field buffers. Setting a value rewrites the
//! existing buffer in place, so a message that is built once and then only
//! re-set does not allocate after its first encode. `reset` keeps the field
//! buffers too, so decoding replies into one message reuses them.

use std::io::Write;
use std::ops::{Index, IndexMut};

/// Value of a single field, stored as its wire representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixValue {
    buf: Vec<u8>,
}

impl FixValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an integer value
    pub fn set_int(&mut self, value: i64) -> &mut Self {
        self.buf.clear();
        // Writing into a Vec cannot fail
        let _ = write!(self.buf, "{}", value);
        self
    }

    pub fn set_uint(&mut self, value: u64) -> &mut Self {
        self.buf.clear();
        let _ = write!(self.buf, "{}", value);
        self
    }

    /// Set a single-character enumeration value
    pub fn set_char(&mut self, value: u8) -> &mut Self {
        self.buf.clear();
        self.buf.push(value);
        self
    }

    pub fn set_string(&mut self, value: &str) -> &mut Self {
        self.buf.clear();
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Set a decimal value with a fixed number of fraction digits
    pub fn set_float(&mut self, value: f64, decimals: usize) -> &mut Self {
        self.buf.clear();
        let _ = write!(self.buf, "{:.*}", decimals, value);
        self
    }

    pub(crate) fn set_bytes(&mut self, value: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(value);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.buf).ok()
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_str()?.parse().ok()
    }

    pub fn as_char(&self) -> Option<u8> {
        match self.buf.as_slice() {
            [c] => Some(*c),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_str()?.parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Handle to a field added with [`FixMessage::add_field`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    tag: u32,
    value: FixValue,
}

/// A FIX message without its framing fields (BeginString, BodyLength, CheckSum).
///
/// Only the first `len` entries of `fields` are live. Entries past it keep
/// their buffers for reuse after a reset.
#[derive(Debug, Clone, Default)]
pub struct FixMessage {
    msg_type: String,
    fields: Vec<Field>,
    len: usize,
}

impl FixMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message of the given type with no fields
    pub fn with_type(msg_type: &str) -> Self {
        let mut message = Self::new();
        message.set_msg_type(msg_type);
        message
    }

    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    pub fn set_msg_type(&mut self, msg_type: &str) {
        self.msg_type.clear();
        self.msg_type.push_str(msg_type);
    }

    /// Append an empty field and return a handle for setting it later
    pub fn add_field(&mut self, tag: u32) -> FieldSlot {
        match self.fields.get_mut(self.len) {
            Some(field) => {
                field.tag = tag;
                field.value.buf.clear();
            }
            None => self.fields.push(Field {
                tag,
                value: FixValue::new(),
            }),
        }
        self.len += 1;
        FieldSlot(self.len - 1)
    }

    /// Append a field and return its value for immediate setting
    pub fn push(&mut self, tag: u32) -> &mut FixValue {
        let slot = self.add_field(tag);
        &mut self[slot]
    }

    /// First value carrying `tag`
    pub fn get(&self, tag: u32) -> Option<&FixValue> {
        self.live().iter().find(|f| f.tag == tag).map(|f| &f.value)
    }

    pub fn get_str(&self, tag: u32) -> Option<&str> {
        self.get(tag).and_then(FixValue::as_str)
    }

    pub fn get_int(&self, tag: u32) -> Option<i64> {
        self.get(tag).and_then(FixValue::as_int)
    }

    pub fn fields(&self) -> impl Iterator<Item = (u32, &FixValue)> {
        self.live().iter().map(|f| (f.tag, &f.value))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop all fields and the message type, keeping allocations
    pub fn reset(&mut self) {
        self.msg_type.clear();
        self.len = 0;
    }

    fn live(&self) -> &[Field] {
        &self.fields[..self.len]
    }
}

impl PartialEq for FixMessage {
    fn eq(&self, other: &Self) -> bool {
        self.msg_type == other.msg_type && self.live() == other.live()
    }
}

impl Eq for FixMessage {}

impl Index<FieldSlot> for FixMessage {
    type Output = FixValue;

    fn index(&self, slot: FieldSlot) -> &FixValue {
        &self.live()[slot.0].value
    }
}

impl IndexMut<FieldSlot> for FixMessage {
    fn index_mut(&mut self, slot: FieldSlot) -> &mut FixValue {
        &mut self.fields[..self.len][slot.0].value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::tags;

    #[test]
    fn test_value_setters() {
        let mut value = FixValue::new();
        assert_eq!(value.set_int(42).as_bytes(), b"42");
        assert_eq!(value.set_uint(u64::MAX).as_bytes(), b"18446744073709551615");
        assert_eq!(value.set_char(b'2').as_bytes(), b"2");
        assert_eq!(value.set_string("FOO").as_bytes(), b"FOO");
        assert_eq!(value.set_float(25.5, 2).as_bytes(), b"25.50");
        assert_eq!(value.set_float(100.0, 2).as_bytes(), b"100.00");
    }

    #[test]
    fn test_value_accessors() {
        let mut value = FixValue::new();
        value.set_int(-7);
        assert_eq!(value.as_int(), Some(-7));
        assert_eq!(value.as_char(), None);

        value.set_char(b'A');
        assert_eq!(value.as_char(), Some(b'A'));
        assert_eq!(value.as_int(), None);

        value.set_float(0.25, 3);
        assert_eq!(value.as_float(), Some(0.25));
    }

    #[test]
    fn test_resetting_a_slot_keeps_position() {
        let mut message = FixMessage::with_type(tags::msg_types::NEW_ORDER_SINGLE);
        let id = message.add_field(tags::CL_ORD_ID);
        message.push(tags::SYMBOL).set_string("FOO");

        message[id].set_int(1);
        message[id].set_int(12345);

        let fields: Vec<(u32, &[u8])> = message.fields().map(|(t, v)| (t, v.as_bytes())).collect();
        assert_eq!(
            fields,
            vec![(tags::CL_ORD_ID, &b"12345"[..]), (tags::SYMBOL, &b"FOO"[..])]
        );
    }

    #[test]
    fn test_get_returns_first_match() {
        let mut message = FixMessage::new();
        message.push(tags::TEXT).set_string("first");
        message.push(tags::TEXT).set_string("second");

        assert_eq!(message.get_str(tags::TEXT), Some("first"));
        assert_eq!(message.get(tags::SYMBOL), None);
    }

    #[test]
    fn test_reset_clears_fields() {
        let mut message = FixMessage::with_type("8");
        message.push(tags::ORDER_ID).set_int(1);
        message.reset();

        assert!(message.is_empty());
        assert_eq!(message.msg_type(), "");
        assert_eq!(message.get(tags::ORDER_ID), None);
        assert_eq!(message.fields().count(), 0);
    }

    #[test]
    fn test_reset_reuses_field_buffers() {
        let mut message = FixMessage::with_type("8");
        message.push(tags::SYMBOL).set_string("ABCDEFGH");
        let before = message.get(tags::SYMBOL).unwrap().as_bytes().as_ptr();

        message.reset();
        message.set_msg_type("8");
        message.push(tags::CL_ORD_ID).set_string("XY");

        let after = message.get(tags::CL_ORD_ID).unwrap().as_bytes().as_ptr();
        assert_eq!(before, after);
        assert_eq!(message.get(tags::SYMBOL), None);
        assert_eq!(message.len(), 1);
    }

    #[test]
    fn test_equality_ignores_spare_fields() {
        let mut reused = FixMessage::with_type("0");
        reused.push(tags::TEXT).set_string("stale");
        reused.reset();
        reused.set_msg_type("0");

        assert_eq!(reused, FixMessage::with_type("0"));
    }
}
