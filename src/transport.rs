//! Session transport abstraction used by the benchmark driver.

use crate::error::Result;
use crate::fix::FixMessage;

/// Capability the driver needs from an order-entry session.
///
/// `send` and `receive` block. Implementations correlate replies with
/// requests; the driver only relies on strict one-request-one-reply pairing.
pub trait Transport {
    /// Create an empty message
    fn create_message(&self) -> FixMessage {
        FixMessage::new()
    }

    /// Clear `message` and set its message type
    fn prepare(&self, message: &mut FixMessage, msg_type: &str) {
        message.reset();
        message.set_msg_type(msg_type);
    }

    /// Wall-clock timestamp in the session's timestamp format
    fn current_timestamp(&self) -> String;

    /// Monotonic time in nanoseconds from an arbitrary origin
    fn now_nanos(&self) -> u64;

    fn send(&mut self, message: &FixMessage) -> Result<()>;

    /// Block until the next application-level message arrives
    fn receive(&mut self) -> Result<&FixMessage>;

    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory transport with a simulated clock.

    use std::cell::Cell;

    use super::Transport;
    use crate::error::{BenchError, Result};
    use crate::fix::{tags, FixMessage};

    type LatencySource = Box<dyn FnMut() -> u64>;

    pub struct StubTransport {
        clock: Cell<u64>,
        latency: LatencySource,
        reply: FixMessage,
        outstanding: bool,
        pub sent_cl_ord_ids: Vec<i64>,
        pub sent_transact_times: Vec<String>,
        pub sends: usize,
        pub receives: usize,
        pub closed: bool,
        pub fail_on_send: Option<usize>,
        pub fail_on_receive: Option<usize>,
    }

    impl StubTransport {
        /// Every reply arrives `latency_ns` after its request
        pub fn constant(latency_ns: u64) -> Self {
            Self::with_latency(move || latency_ns)
        }

        pub fn with_latency(latency: impl FnMut() -> u64 + 'static) -> Self {
            Self {
                clock: Cell::new(1_000_000),
                latency: Box::new(latency),
                reply: FixMessage::with_type(tags::msg_types::EXECUTION_REPORT),
                outstanding: false,
                sent_cl_ord_ids: Vec::new(),
                sent_transact_times: Vec::new(),
                sends: 0,
                receives: 0,
                closed: false,
                fail_on_send: None,
                fail_on_receive: None,
            }
        }

        /// Fail the `n`th send (1-based)
        pub fn failing_on_send(mut self, n: usize) -> Self {
            self.fail_on_send = Some(n);
            self
        }

        /// Fail the `n`th receive (1-based)
        pub fn failing_on_receive(mut self, n: usize) -> Self {
            self.fail_on_receive = Some(n);
            self
        }
    }

    impl Transport for StubTransport {
        fn current_timestamp(&self) -> String {
            "20240101-00:00:00.000".to_string()
        }

        fn now_nanos(&self) -> u64 {
            self.clock.get()
        }

        fn send(&mut self, message: &FixMessage) -> Result<()> {
            assert!(!self.closed, "send after close");
            assert!(!self.outstanding, "send issued with a reply outstanding");

            self.sends += 1;
            if self.fail_on_send == Some(self.sends) {
                return Err(BenchError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "simulated send failure",
                )));
            }

            if let Some(id) = message.get_int(tags::CL_ORD_ID) {
                self.sent_cl_ord_ids.push(id);
            }
            if let Some(time) = message.get_str(tags::TRANSACT_TIME) {
                self.sent_transact_times.push(time.to_string());
            }
            self.outstanding = true;
            Ok(())
        }

        fn receive(&mut self) -> Result<&FixMessage> {
            assert!(self.outstanding, "receive without a matching send");
            self.receives += 1;
            self.outstanding = false;
            if self.fail_on_receive == Some(self.receives) {
                return Err(BenchError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "simulated receive failure",
                )));
            }
            let latency = (self.latency)();
            self.clock.set(self.clock.get() + latency);
            Ok(&self.reply)
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }
}
