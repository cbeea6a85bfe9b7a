//! Blocking FIX 4.2 initiator session over TCP.

use bytes::BytesMut;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::codec::{self, Encoder, Header};
use super::message::FixMessage;
use super::tags::{self, msg_types};
use crate::error::{BenchError, Result};
use crate::transport::Transport;

const READ_CHUNK: usize = 4096;

/// UTCTimestamp with milliseconds
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

/// How long `close` waits for the counterpart's Logout
const LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and identity settings for one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    /// HeartBtInt sent on Logon; zero disables heartbeats
    pub heartbeat_interval: Duration,
}

impl SessionConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// UTC timestamp in `YYYYMMDD-HH:MM:SS.sss` form
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Outbound half: header state, encoder and write buffer
struct Outbound {
    stream: TcpStream,
    encoder: Encoder,
    buf: BytesMut,
    sender_comp_id: String,
    target_comp_id: String,
    next_seq_num: u64,
    sending_time: String,
}

impl Outbound {
    fn write(&mut self, message: &FixMessage) -> Result<()> {
        use std::fmt::Write as _;

        self.sending_time.clear();
        let _ = write!(
            self.sending_time,
            "{}",
            chrono::Utc::now().format(TIMESTAMP_FORMAT)
        );

        let header = Header {
            begin_string: tags::BEGIN_STRING_FIX42,
            sender_comp_id: &self.sender_comp_id,
            target_comp_id: &self.target_comp_id,
            msg_seq_num: self.next_seq_num,
            sending_time: &self.sending_time,
        };

        self.buf.clear();
        self.encoder.encode(&header, message, &mut self.buf);
        self.stream.write_all(&self.buf)?;
        self.next_seq_num += 1;
        Ok(())
    }
}

/// Single FIX session acting as the initiator
pub struct FixSession {
    reader: TcpStream,
    out: Outbound,
    rx: BytesMut,
    inbound: FixMessage,
    admin: FixMessage,
    next_inbound_seq: u64,
    heartbeat_interval: Duration,
    epoch: Instant,
    logging_out: bool,
    closed: bool,
}

impl FixSession {
    /// Connect and complete the Logon handshake
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let addr = config.address();
        info!("Connecting to {}", addr);

        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .map_err(|source| BenchError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        if !config.heartbeat_interval.is_zero() {
            stream.set_read_timeout(Some(config.heartbeat_interval))?;
        }
        let reader = stream.try_clone()?;

        let mut session = Self {
            reader,
            out: Outbound {
                stream,
                encoder: Encoder::new(),
                buf: BytesMut::with_capacity(1024),
                sender_comp_id: config.sender_comp_id.clone(),
                target_comp_id: config.target_comp_id.clone(),
                next_seq_num: 1,
                sending_time: String::with_capacity(32),
            },
            rx: BytesMut::with_capacity(READ_CHUNK * 4),
            inbound: FixMessage::new(),
            admin: FixMessage::new(),
            next_inbound_seq: 1,
            heartbeat_interval: config.heartbeat_interval,
            epoch: Instant::now(),
            logging_out: false,
            closed: false,
        };

        session.logon()?;
        info!(
            "Logged on as {} to {}",
            config.sender_comp_id, config.target_comp_id
        );
        Ok(session)
    }

    fn logon(&mut self) -> Result<()> {
        self.admin.reset();
        self.admin.set_msg_type(msg_types::LOGON);
        self.admin.push(tags::ENCRYPT_METHOD).set_int(0);
        self.admin
            .push(tags::HEART_BT_INT)
            .set_uint(self.heartbeat_interval.as_secs());
        self.out.write(&self.admin)?;

        match self.read_frame() {
            Ok(()) if self.inbound.msg_type() == msg_types::LOGON => Ok(()),
            Ok(()) => {
                let text = self.inbound.get_str(tags::TEXT).unwrap_or_default();
                Err(BenchError::Logon(format!(
                    "expected Logon, received MsgType {} {}",
                    self.inbound.msg_type(),
                    text
                )))
            }
            Err(BenchError::SessionClosed) => Err(BenchError::Logon(
                "connection closed during logon".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    fn send_heartbeat(&mut self, test_req_id: Option<&[u8]>) -> Result<()> {
        self.admin.reset();
        self.admin.set_msg_type(msg_types::HEARTBEAT);
        if let Some(id) = test_req_id {
            self.admin.push(tags::TEST_REQ_ID).set_bytes(id);
        }
        self.out.write(&self.admin)
    }

    /// Read the next frame of any type into `self.inbound`
    fn read_frame(&mut self) -> Result<()> {
        loop {
            if codec::decode(&mut self.rx, &mut self.inbound)? {
                return self.check_sequence();
            }
            self.read_more()?;
        }
    }

    fn check_sequence(&mut self) -> Result<()> {
        let seq = self.inbound.get_int(tags::MSG_SEQ_NUM).ok_or_else(|| {
            BenchError::Protocol(format!(
                "MsgType {} without MsgSeqNum",
                self.inbound.msg_type()
            ))
        })?;
        if u64::try_from(seq) != Ok(self.next_inbound_seq) {
            return Err(BenchError::Protocol(format!(
                "MsgSeqNum mismatch: expected {}, received {}",
                self.next_inbound_seq, seq
            )));
        }
        self.next_inbound_seq += 1;
        Ok(())
    }

    fn read_more(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => return Err(BenchError::SessionClosed),
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if self.logging_out {
                        return Err(e.into());
                    }
                    debug!("Idle for a heartbeat interval, sending Heartbeat");
                    self.send_heartbeat(None)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn wait_for_logout(&mut self) -> Result<()> {
        loop {
            self.read_frame()?;
            if self.inbound.msg_type() == msg_types::LOGOUT {
                return Ok(());
            }
            debug!(
                "Discarding MsgType {} while logging out",
                self.inbound.msg_type()
            );
        }
    }
}

impl Transport for FixSession {
    fn current_timestamp(&self) -> String {
        utc_timestamp()
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn send(&mut self, message: &FixMessage) -> Result<()> {
        if self.closed {
            return Err(BenchError::SessionClosed);
        }
        self.out.write(message)
    }

    fn receive(&mut self) -> Result<&FixMessage> {
        loop {
            self.read_frame()?;

            match self.inbound.msg_type() {
                msg_types::HEARTBEAT => continue,
                msg_types::TEST_REQUEST => {
                    let id = self
                        .inbound
                        .get(tags::TEST_REQ_ID)
                        .map(|v| v.as_bytes().to_vec())
                        .unwrap_or_default();
                    self.send_heartbeat(Some(id.as_slice()))?;
                }
                msg_types::LOGOUT => {
                    warn!("Counterpart sent Logout");
                    self.closed = true;
                    return Err(BenchError::SessionClosed);
                }
                t if msg_types::is_admin(t) => {
                    warn!("Ignoring session message MsgType {}", t);
                }
                _ => return Ok(&self.inbound),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.admin.reset();
        self.admin.set_msg_type(msg_types::LOGOUT);
        self.out.write(&self.admin)?;

        self.logging_out = true;
        self.reader.set_read_timeout(Some(LOGOUT_TIMEOUT))?;
        match self.wait_for_logout() {
            Ok(()) | Err(BenchError::SessionClosed) => {}
            Err(BenchError::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                warn!("No Logout from counterpart within {:?}", LOGOUT_TIMEOUT);
            }
            Err(e) => return Err(e),
        }

        match self.out.stream.shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        info!("Session closed");
        Ok(())
    }
}
