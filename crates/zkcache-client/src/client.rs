use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use zkcache_common::auth::{cram_md5_proof, AuthConfig};
use zkcache_common::protocol::{methods, ChallengeReply, Request, Result, ZkCacheError, ZkNode};
use zkcache_common::transport::TcpTransport;

/// Route for plain access.
const RPC_ROUTE: &str = "/_zkcache_rpc_";
/// Route for authenticated access.
const RPC_AUTH_ROUTE: &str = "/_zkcache_rpc_/auth";

/// A direct client for a single zkcache endpoint. Doesn't retry.
///
/// Owns at most one transport connection to one `host:port` address. When
/// credentials are configured, [`dial`](Self::dial) performs the CRAM-MD5
/// handshake right after the connect; the route announced at connect time is
/// selected by whether authentication is enabled.
///
/// You probably want [`ZkCacheClient`](crate::ZkCacheClient) instead, which
/// adds failover across a pool of endpoints.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use zkcache_client::EndpointClient;
///
/// let mut client =
///     EndpointClient::new("127.0.0.1:14850", Duration::from_secs(5), None, None).unwrap();
/// client.dial().unwrap();
///
/// let node = client.get("/zk/nj/vt").unwrap();
/// println!("{} (cached: {})", node.path, node.cached);
/// client.close();
/// ```
#[derive(Debug)]
pub struct EndpointClient {
    addr: String,
    auth: AuthConfig,
    transport: TcpTransport,
    stream: Option<TcpStream>,
}

impl EndpointClient {
    /// Creates a client for one endpoint.
    ///
    /// The timeout applies to the connect as well as to every call. Fails
    /// with a configuration error if exactly one of username/password is
    /// supplied.
    pub fn new(
        addr: impl Into<String>,
        timeout: Duration,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let auth = AuthConfig::from_parts(username, password)?;
        Ok(Self::with_auth(addr, timeout, auth))
    }

    /// Creates a client from an already-validated [`AuthConfig`].
    pub fn with_auth(addr: impl Into<String>, timeout: Duration, auth: AuthConfig) -> Self {
        Self {
            addr: addr.into(),
            auth,
            transport: TcpTransport::new(timeout),
            stream: None,
        }
    }

    /// The endpoint address this client talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether a transport connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn route(&self) -> &'static str {
        if self.auth.requires_auth() {
            RPC_AUTH_ROUTE
        } else {
            RPC_ROUTE
        }
    }

    /// Opens a fresh connection, closing any existing one first.
    ///
    /// When credentials are configured, the CRAM-MD5 handshake runs before
    /// this returns; a handshake failure propagates as the underlying
    /// transport or server error.
    pub fn dial(&mut self) -> Result<()> {
        self.close();

        debug!(addr = %self.addr, auth = %self.auth, "dialing endpoint");
        let stream = self.transport.connect(&self.addr, self.route())?;
        self.stream = Some(stream);

        if self.auth.requires_auth() {
            self.authenticate()?;
        }
        Ok(())
    }

    /// CRAM-MD5 challenge–response: fetch a fresh challenge, answer with
    /// the proof.
    fn authenticate(&mut self) -> Result<()> {
        let (username, password) = match self.auth.credentials() {
            Some(creds) => (creds.username.clone(), creds.password.clone()),
            None => return Ok(()),
        };

        let reply = self.call(methods::GET_NEW_CHALLENGE, json!({}))?;
        let challenge: ChallengeReply = serde_json::from_value(reply)?;

        let proof = cram_md5_proof(&username, &password, &challenge.challenge);
        self.call(methods::AUTHENTICATE, json!({"Proof": proof}))?;
        Ok(())
    }

    /// Issues one RPC call, dialing lazily if no connection exists.
    ///
    /// A populated error field in the reply is surfaced as a server error;
    /// a missing reply value is a protocol violation.
    fn call(&mut self, method: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        if self.stream.is_none() {
            self.dial()?;
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ZkCacheError::Connection("Not connected".to_string()))?;

        let request = Request::new(method, body);
        let response = self.transport.send_request(stream, &request)?;

        match response.error {
            Some(error) => Err(ZkCacheError::Server(error)),
            None => response.reply.ok_or_else(|| {
                ZkCacheError::InvalidResponse("Missing reply in response".to_string())
            }),
        }
    }

    fn call_decode<T: DeserializeOwned>(
        &mut self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let reply = self.call(method, body)?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Reads one node.
    pub fn get(&mut self, path: &str) -> Result<ZkNode> {
        self.call_decode(methods::GET, json!({"Path": path}))
            .map_err(|e| ZkCacheError::Call {
                op: "get",
                source: Box::new(e),
            })
    }

    /// Reads several nodes in one round trip; the reply preserves the
    /// order of `paths`.
    pub fn getv(&mut self, paths: &[&str]) -> Result<Vec<ZkNode>> {
        self.call_decode(methods::GETV, json!({"Paths": paths}))
            .map_err(|e| ZkCacheError::Call {
                op: "getv",
                source: Box::new(e),
            })
    }

    /// Reads one node with its children populated.
    pub fn children(&mut self, path: &str) -> Result<ZkNode> {
        self.call_decode(methods::CHILDREN, json!({"Path": path}))
            .map_err(|e| ZkCacheError::Call {
                op: "children",
                source: Box::new(e),
            })
    }

    /// Shuts down and drops the connection. Idempotent.
    ///
    /// Explicit close is the primary contract; the `Drop` impl is only a
    /// backstop.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for EndpointClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_credentials_are_rejected() {
        let err = EndpointClient::new(
            "127.0.0.1:14850",
            Duration::from_secs(1),
            Some("reader".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ZkCacheError::Config(_)));

        let err = EndpointClient::new(
            "127.0.0.1:14850",
            Duration::from_secs(1),
            None,
            Some("pw".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ZkCacheError::Config(_)));
    }

    #[test]
    fn test_route_follows_auth_mode() {
        let plain = EndpointClient::new("h:1", Duration::from_secs(1), None, None).unwrap();
        assert_eq!(plain.route(), "/_zkcache_rpc_");

        let authed = EndpointClient::new(
            "h:1",
            Duration::from_secs(1),
            Some("reader".to_string()),
            Some("pw".to_string()),
        )
        .unwrap();
        assert_eq!(authed.route(), "/_zkcache_rpc_/auth");
    }

    #[test]
    fn test_construction_does_not_connect() {
        let client = EndpointClient::new("h:1", Duration::from_secs(1), None, None).unwrap();
        assert!(!client.is_connected());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut client = EndpointClient::new("h:1", Duration::from_secs(1), None, None).unwrap();
        client.close();
        client.close();
        assert!(!client.is_connected());
    }

    #[test]
    fn test_call_failure_is_wrapped_with_operation_name() {
        // Bind then drop to get a port that refuses connections.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut client =
            EndpointClient::new(addr, Duration::from_millis(200), None, None).unwrap();
        let err = client.get("/zk/nj/vt").unwrap_err();
        match err {
            ZkCacheError::Call { op, source } => {
                assert_eq!(op, "get");
                assert!(matches!(*source, ZkCacheError::Connection(_)));
            }
            other => panic!("expected Call error, got {:?}", other),
        }
    }
}
