//! FIX 4.2 tags, message types and enumeration values used by the initiator.
//!
//! Constants rather than enums keep encoding a plain integer write.

pub const BEGIN_STRING: u32 = 8;
pub const BODY_LENGTH: u32 = 9;
pub const CHECK_SUM: u32 = 10;
pub const CL_ORD_ID: u32 = 11;
pub const CUM_QTY: u32 = 14;
pub const EXEC_ID: u32 = 17;
pub const HANDL_INST: u32 = 21;
pub const MSG_SEQ_NUM: u32 = 34;
pub const MSG_TYPE: u32 = 35;
pub const ORDER_ID: u32 = 37;
pub const ORDER_QTY: u32 = 38;
pub const ORD_STATUS: u32 = 39;
pub const ORD_TYPE: u32 = 40;
pub const PRICE: u32 = 44;
pub const SENDER_COMP_ID: u32 = 49;
pub const SENDING_TIME: u32 = 52;
pub const SIDE: u32 = 54;
pub const SYMBOL: u32 = 55;
pub const TARGET_COMP_ID: u32 = 56;
pub const TEXT: u32 = 58;
pub const TRANSACT_TIME: u32 = 60;
pub const AVG_PX: u32 = 6;
pub const ENCRYPT_METHOD: u32 = 98;
pub const HEART_BT_INT: u32 = 108;
pub const TEST_REQ_ID: u32 = 112;
pub const EXEC_TYPE: u32 = 150;
pub const LEAVES_QTY: u32 = 151;

pub const BEGIN_STRING_FIX42: &str = "FIX.4.2";

/// MsgType (35) values
pub mod msg_types {
    pub const HEARTBEAT: &str = "0";
    pub const TEST_REQUEST: &str = "1";
    pub const RESEND_REQUEST: &str = "2";
    pub const REJECT: &str = "3";
    pub const SEQUENCE_RESET: &str = "4";
    pub const LOGOUT: &str = "5";
    pub const EXECUTION_REPORT: &str = "8";
    pub const LOGON: &str = "A";
    pub const NEW_ORDER_SINGLE: &str = "D";

    /// Session-level messages never reach the benchmark driver
    pub fn is_admin(msg_type: &str) -> bool {
        matches!(
            msg_type,
            HEARTBEAT | TEST_REQUEST | RESEND_REQUEST | SEQUENCE_RESET | LOGOUT | LOGON
        )
    }
}

/// HandlInst (21) values
pub mod handl_inst {
    pub const AUTOMATED_EXECUTION_NO_INTERVENTION: u8 = b'1';
}

/// Side (54) values
pub mod side {
    pub const BUY: u8 = b'1';
}

/// OrdType (40) values
pub mod ord_type {
    pub const LIMIT: u8 = b'2';
}

/// ExecType (150) and OrdStatus (39) values
pub mod exec_type {
    pub const NEW: u8 = b'0';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_message_types() {
        assert!(msg_types::is_admin(msg_types::HEARTBEAT));
        assert!(msg_types::is_admin(msg_types::LOGON));
        assert!(msg_types::is_admin(msg_types::LOGOUT));
        assert!(msg_types::is_admin(msg_types::RESEND_REQUEST));
        assert!(msg_types::is_admin(msg_types::SEQUENCE_RESET));
        assert!(!msg_types::is_admin(msg_types::EXECUTION_REPORT));
        assert!(!msg_types::is_admin(msg_types::REJECT));
        assert!(!msg_types::is_admin(msg_types::NEW_ORDER_SINGLE));
    }
}
