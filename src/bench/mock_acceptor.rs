//! Mock FIX acceptor that fills every order with an immediate ExecutionReport.

use bytes::BytesMut;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::config::MockAcceptorConfig;
use crate::fix::codec::{self, Encoder, Header};
use crate::fix::session::utc_timestamp;
use crate::fix::tags::{self, exec_type, msg_types};
use crate::fix::FixMessage;

const REF_SEQ_NUM: u32 = 45;
const EXEC_TRANS_TYPE: u32 = 20;

/// Mock acceptor for benchmarking and tests
pub struct MockAcceptor {
    config: MockAcceptorConfig,
    shutdown_tx: Option<oneshot::Sender<()>>,
    accept_task: Option<JoinHandle<()>>,
    port: u16,
}

impl MockAcceptor {
    /// Create a new mock acceptor with the given configuration
    pub fn new(config: MockAcceptorConfig) -> Self {
        Self {
            config,
            shutdown_tx: None,
            accept_task: None,
            port: 0,
        }
    }

    /// Start accepting connections and return the actual port
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("127.0.0.1:{}", self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        self.port = port;

        let config = Arc::new(self.config.clone());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            debug!("Mock acceptor: connection from {}", peer);
                            let config = config.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, config).await {
                                    warn!("Mock acceptor: connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            warn!("Mock acceptor: accept failed: {}", e);
                            break;
                        }
                    },
                }
            }
        });
        self.accept_task = Some(accept_task);

        Ok(port)
    }

    /// Get the acceptor's port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting new connections
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stop and wait until the listening socket is closed
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.accept_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MockAcceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-connection session state
struct Connection {
    stream: TcpStream,
    config: Arc<MockAcceptorConfig>,
    rx: BytesMut,
    tx: BytesMut,
    encoder: Encoder,
    inbound: FixMessage,
    outbound: FixMessage,
    target_comp_id: String,
    next_seq_num: u64,
    next_order_id: u64,
}

async fn handle_connection(
    stream: TcpStream,
    config: Arc<MockAcceptorConfig>,
) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let mut conn = Connection {
        stream,
        config,
        rx: BytesMut::with_capacity(4096),
        tx: BytesMut::with_capacity(1024),
        encoder: Encoder::new(),
        inbound: FixMessage::new(),
        outbound: FixMessage::new(),
        target_comp_id: String::new(),
        next_seq_num: 1,
        next_order_id: 1,
    };

    loop {
        while codec::decode(&mut conn.rx, &mut conn.inbound)? {
            if !conn.respond().await? {
                return Ok(());
            }
        }
        if conn.stream.read_buf(&mut conn.rx).await? == 0 {
            return Ok(());
        }
    }
}

impl Connection {
    /// Answer the message in `self.inbound`; `false` ends the connection
    async fn respond(&mut self) -> anyhow::Result<bool> {
        let msg_type = self.inbound.msg_type().to_string();
        self.outbound.reset();

        match msg_type.as_str() {
            msg_types::LOGON => {
                if let Some(sender) = self.inbound.get_str(tags::SENDER_COMP_ID) {
                    self.target_comp_id = sender.to_string();
                }
                let heartbeat = self.inbound.get_int(tags::HEART_BT_INT).unwrap_or(30);
                self.outbound.set_msg_type(msg_types::LOGON);
                self.outbound.push(tags::ENCRYPT_METHOD).set_int(0);
                self.outbound.push(tags::HEART_BT_INT).set_int(heartbeat);
            }
            msg_types::NEW_ORDER_SINGLE => {
                self.delay().await;
                self.fill_execution_report();
            }
            msg_types::TEST_REQUEST => {
                self.outbound.set_msg_type(msg_types::HEARTBEAT);
                if let Some(id) = self.inbound.get_str(tags::TEST_REQ_ID) {
                    self.outbound.push(tags::TEST_REQ_ID).set_string(id);
                }
            }
            msg_types::LOGOUT => {
                self.outbound.set_msg_type(msg_types::LOGOUT);
                self.send().await?;
                return Ok(false);
            }
            msg_types::HEARTBEAT => return Ok(true),
            other => {
                self.outbound.set_msg_type(msg_types::REJECT);
                if let Some(seq) = self.inbound.get_int(tags::MSG_SEQ_NUM) {
                    self.outbound.push(REF_SEQ_NUM).set_int(seq);
                }
                self.outbound
                    .push(tags::TEXT)
                    .set_string(&format!("Unsupported MsgType {}", other));
            }
        }

        self.send().await?;
        Ok(true)
    }

    async fn delay(&self) {
        let mut delay_us = self.config.response_delay_us;
        if self.config.response_jitter_us > 0 {
            delay_us += rand::thread_rng().gen_range(0..=self.config.response_jitter_us);
        }
        if delay_us > 0 {
            tokio::time::sleep(Duration::from_micros(delay_us)).await;
        }
    }

    fn fill_execution_report(&mut self) {
        let order_id = self.next_order_id;
        self.next_order_id += 1;

        let order = &self.inbound;
        let report = &mut self.outbound;
        report.set_msg_type(msg_types::EXECUTION_REPORT);
        report.push(tags::ORDER_ID).set_uint(order_id);
        report.push(tags::EXEC_ID).set_uint(order_id);
        report.push(EXEC_TRANS_TYPE).set_char(b'0');
        report.push(tags::EXEC_TYPE).set_char(exec_type::NEW);
        report.push(tags::ORD_STATUS).set_char(exec_type::NEW);
        for tag in [tags::CL_ORD_ID, tags::SYMBOL, tags::SIDE, tags::ORDER_QTY] {
            if let Some(value) = order.get(tag) {
                report.push(tag).set_bytes(value.as_bytes());
            }
        }
        let qty = order.get_str(tags::ORDER_QTY).unwrap_or("0");
        report.push(tags::LEAVES_QTY).set_string(qty);
        report.push(tags::CUM_QTY).set_int(0);
        report.push(tags::AVG_PX).set_int(0);
    }

    async fn send(&mut self) -> anyhow::Result<()> {
        let sending_time = utc_timestamp();
        let header = Header {
            begin_string: tags::BEGIN_STRING_FIX42,
            sender_comp_id: &self.config.sender_comp_id,
            target_comp_id: &self.target_comp_id,
            msg_seq_num: self.next_seq_num,
            sending_time: &sending_time,
        };

        self.tx.clear();
        self.encoder.encode(&header, &self.outbound, &mut self.tx);
        self.stream.write_all(&self.tx).await?;
        self.next_seq_num += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_message(stream: &mut TcpStream, rx: &mut BytesMut) -> FixMessage {
        let mut message = FixMessage::new();
        while !codec::decode(rx, &mut message).unwrap() {
            let n = stream.read_buf(rx).await.unwrap();
            assert!(n > 0, "acceptor closed the connection");
        }
        message
    }

    async fn write_message(stream: &mut TcpStream, message: &FixMessage, seq: u64) {
        let header = Header {
            begin_string: tags::BEGIN_STRING_FIX42,
            sender_comp_id: "initiator",
            target_comp_id: "acceptor",
            msg_seq_num: seq,
            sending_time: "20240101-00:00:00.000",
        };
        let mut buf = BytesMut::new();
        Encoder::new().encode(&header, message, &mut buf);
        stream.write_all(&buf).await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_acceptor_fills_orders() {
        let mut acceptor = MockAcceptor::new(MockAcceptorConfig::default());
        let port = acceptor.start().await.unwrap();
        assert!(port > 0);
        assert_eq!(acceptor.port(), port);

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut rx = BytesMut::new();

        let mut logon = FixMessage::with_type(msg_types::LOGON);
        logon.push(tags::HEART_BT_INT).set_int(15);
        write_message(&mut stream, &logon, 1).await;

        let reply = read_message(&mut stream, &mut rx).await;
        assert_eq!(reply.msg_type(), msg_types::LOGON);
        assert_eq!(reply.get_int(tags::HEART_BT_INT), Some(15));
        assert_eq!(reply.get_str(tags::TARGET_COMP_ID), Some("initiator"));
        assert_eq!(reply.get_int(tags::MSG_SEQ_NUM), Some(1));

        let mut order = FixMessage::with_type(msg_types::NEW_ORDER_SINGLE);
        order.push(tags::CL_ORD_ID).set_int(42);
        order.push(tags::SYMBOL).set_string("FOO");
        order.push(tags::ORDER_QTY).set_float(100.0, 2);
        write_message(&mut stream, &order, 2).await;

        let report = read_message(&mut stream, &mut rx).await;
        assert_eq!(report.msg_type(), msg_types::EXECUTION_REPORT);
        assert_eq!(report.get_int(tags::CL_ORD_ID), Some(42));
        assert_eq!(report.get_str(tags::SYMBOL), Some("FOO"));
        assert_eq!(report.get_str(tags::LEAVES_QTY), Some("100.00"));
        assert_eq!(report.get_int(tags::ORDER_ID), Some(1));
        assert_eq!(report.get_int(tags::MSG_SEQ_NUM), Some(2));

        write_message(&mut stream, &FixMessage::with_type(msg_types::LOGOUT), 3).await;
        let logout = read_message(&mut stream, &mut rx).await;
        assert_eq!(logout.msg_type(), msg_types::LOGOUT);

        acceptor.stop();
    }

    #[tokio::test]
    async fn test_mock_acceptor_rejects_unknown_messages() {
        let mut acceptor = MockAcceptor::new(MockAcceptorConfig::default());
        let port = acceptor.start().await.unwrap();

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut rx = BytesMut::new();
        write_message(&mut stream, &FixMessage::with_type("F"), 1).await;

        let reject = read_message(&mut stream, &mut rx).await;
        assert_eq!(reject.msg_type(), msg_types::REJECT);
        assert_eq!(reject.get_int(REF_SEQ_NUM), Some(1));
        assert!(reject.get_str(tags::TEXT).unwrap().contains("Unsupported"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_listener() {
        let mut acceptor = MockAcceptor::new(MockAcceptorConfig::default());
        let port = acceptor.start().await.unwrap();
        acceptor.shutdown().await;

        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }
}
