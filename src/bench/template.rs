//! The single reusable NewOrderSingle sent by every iteration.
//!
//! Static fields are set once. Only ClOrdID is rewritten per order, in place,
//! so the timed path never builds a message.

use crate::fix::tags::{self, handl_inst, msg_types, ord_type, side};
use crate::fix::{FieldSlot, FixMessage};
use crate::transport::Transport;

pub const SYMBOL: &str = "FOO";
pub const ORDER_QTY: f64 = 100.00;
pub const PRICE: f64 = 25.50;
const DECIMALS: usize = 2;

/// Buy limit order template owned by the driver
#[derive(Debug)]
pub struct OrderTemplate {
    message: FixMessage,
    cl_ord_id: FieldSlot,
}

impl OrderTemplate {
    /// Build the template through the transport's message factory.
    ///
    /// TransactTime is stamped here once and is not refreshed per order, so
    /// every order in a run carries the same TransactTime.
    pub fn build<T: Transport + ?Sized>(transport: &T) -> Self {
        let mut message = transport.create_message();
        transport.prepare(&mut message, msg_types::NEW_ORDER_SINGLE);

        let cl_ord_id = message.add_field(tags::CL_ORD_ID);
        message
            .push(tags::HANDL_INST)
            .set_char(handl_inst::AUTOMATED_EXECUTION_NO_INTERVENTION);
        message.push(tags::SYMBOL).set_string(SYMBOL);
        message.push(tags::SIDE).set_char(side::BUY);
        message
            .push(tags::TRANSACT_TIME)
            .set_string(&transport.current_timestamp());
        message.push(tags::ORDER_QTY).set_float(ORDER_QTY, DECIMALS);
        message.push(tags::ORD_TYPE).set_char(ord_type::LIMIT);
        message.push(tags::PRICE).set_float(PRICE, DECIMALS);

        Self { message, cl_ord_id }
    }

    pub fn set_cl_ord_id(&mut self, id: u64) {
        self.message[self.cl_ord_id].set_uint(id);
    }

    /// Read-only view handed to the transport on send
    pub fn message(&self) -> &FixMessage {
        &self.message
    }
}
