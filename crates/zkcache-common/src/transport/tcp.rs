use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::protocol::error::{Result, ZkCacheError};
use crate::protocol::{Request, Response};
use crate::transport::codec::JsonCodec;

/// Maximum size of a framed message (16 MB). Node payloads and child
/// listings are small; anything larger is a protocol violation.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Maximum size of the connect acknowledgement block.
const MAX_ACK_SIZE: usize = 1024;

/// Synchronous TCP transport for the zkcache RPC conversation.
///
/// The conversation starts with a route preamble: after the TCP connect the
/// client sends `CONNECT <route> HTTP/1.0` followed by a blank line, and the
/// server answers with an acknowledgement block terminated by a blank line.
/// From then on both sides exchange length-prefixed messages:
///
/// ```text
/// [4-byte length as u32 big-endian] [JSON data]
/// ```
///
/// The caller-supplied timeout applies to the connect as well as to every
/// read and write on the stream.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use zkcache_common::transport::TcpTransport;
/// use zkcache_common::protocol::{methods, Request};
/// use serde_json::json;
///
/// let transport = TcpTransport::new(Duration::from_secs(5));
/// let mut stream = transport.connect("127.0.0.1:14850", "/_zkcache_rpc_").unwrap();
///
/// let request = Request::new(methods::GET, json!({"Path": "/zk/nj/vt"}));
/// let response = transport.send_request(&mut stream, &request).unwrap();
/// ```
#[derive(Debug)]
pub struct TcpTransport {
    timeout: Duration,
}

impl TcpTransport {
    /// Creates a transport with the given connect/call timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured connect/call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connects to a remote endpoint and performs the route preamble.
    ///
    /// The address (which may resolve to multiple socket addresses) is tried
    /// until one connect succeeds. The returned stream has read and write
    /// timeouts configured and the preamble already acknowledged.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed, no resolved address
    /// accepts the connection, or the preamble exchange fails.
    pub fn connect(&self, addr: &str, route: &str) -> Result<TcpStream> {
        let socket_addrs = addr
            .to_socket_addrs()
            .map_err(|e| ZkCacheError::Connection(format!("Invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(mut stream) => {
                    stream.set_read_timeout(Some(self.timeout)).map_err(|e| {
                        ZkCacheError::Connection(format!("Failed to set read timeout: {}", e))
                    })?;
                    stream.set_write_timeout(Some(self.timeout)).map_err(|e| {
                        ZkCacheError::Connection(format!("Failed to set write timeout: {}", e))
                    })?;

                    self.exchange_preamble(&mut stream, route)?;
                    return Ok(stream);
                }
                Err(e) => {
                    last_err = Some(e);
                }
            }
        }

        Err(ZkCacheError::Connection(format!(
            "Failed to connect to {}: {}",
            addr,
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string())
        )))
    }

    /// Sends the route preamble and waits for the server acknowledgement.
    ///
    /// The acknowledgement is any block of bytes terminated by a blank line;
    /// its content is not interpreted.
    fn exchange_preamble(&self, stream: &mut TcpStream, route: &str) -> Result<()> {
        stream
            .write_all(format!("CONNECT {} HTTP/1.0\n\n", route).as_bytes())
            .map_err(|e| self.map_io_error(e, "writing connect preamble"))?;

        let mut ack = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            let n = stream
                .read(&mut buf)
                .map_err(|e| self.map_io_error(e, "reading connect ack"))?;
            if n == 0 {
                return Err(ZkCacheError::Connection(
                    "Unexpected EOF in connect handshake".to_string(),
                ));
            }
            ack.extend_from_slice(&buf[..n]);
            if ack.windows(2).any(|w| w == b"\n\n") {
                return Ok(());
            }
            if ack.len() > MAX_ACK_SIZE {
                return Err(ZkCacheError::InvalidResponse(
                    "Connect ack exceeds maximum size".to_string(),
                ));
            }
        }
    }

    /// Sends a request and waits for its response.
    ///
    /// Verifies that the reply's sequence number matches the request;
    /// a mismatch means the conversation is out of sync and the connection
    /// cannot be trusted any further.
    pub fn send_request(&self, stream: &mut TcpStream, request: &Request) -> Result<Response> {
        let encoded = JsonCodec::encode_request(request)?;
        self.send_message(stream, &encoded)?;

        let response_data = self.receive_message(stream)?;
        let response = JsonCodec::decode_response(&response_data)?;

        if response.seq != request.seq {
            return Err(ZkCacheError::InvalidResponse(format!(
                "Out of sequence response: got {}, want {}",
                response.seq, request.seq
            )));
        }

        Ok(response)
    }

    /// Sends one length-prefixed message.
    pub fn send_message(&self, stream: &mut TcpStream, data: &[u8]) -> Result<()> {
        let len = data.len() as u32;

        stream
            .write_all(&len.to_be_bytes())
            .map_err(|e| self.map_io_error(e, "writing length prefix"))?;
        stream
            .write_all(data)
            .map_err(|e| self.map_io_error(e, "writing data"))?;
        stream
            .flush()
            .map_err(|e| self.map_io_error(e, "flushing stream"))?;

        Ok(())
    }

    /// Receives one length-prefixed message.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the declared length exceeds
    /// the maximum message size.
    pub fn receive_message(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .map_err(|e| self.map_io_error(e, "reading length prefix"))?;

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(ZkCacheError::InvalidResponse(format!(
                "Message too large: {} bytes (max {} bytes)",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .map_err(|e| self.map_io_error(e, "reading data"))?;

        Ok(buf)
    }

    /// Map IO errors to typed transport errors: timeouts to `Timeout`,
    /// connection loss to `Connection`, everything else to `Io`.
    fn map_io_error(&self, err: std::io::Error, context: &str) -> ZkCacheError {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                ZkCacheError::Timeout(self.timeout.as_millis() as u64)
            }
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::NotConnected => {
                ZkCacheError::Connection(format!("{}: Connection lost", context))
            }
            _ => ZkCacheError::Io(err),
        }
    }
}
