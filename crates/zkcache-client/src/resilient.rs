use std::time::Duration;

use tracing::{debug, warn};

use zkcache_common::auth::AuthConfig;
use zkcache_common::protocol::{Result, ZkCacheError, ZkNode};

use crate::client::EndpointClient;
use crate::ring::AddressRing;

/// Total attempts per operation, including the first.
const MAX_ATTEMPTS: u32 = 2;

/// A failover-capable client over a pool of zkcache endpoints.
///
/// Presents a single logical client across a fixed, cyclically-consumed
/// address list, hiding per-endpoint failures from the caller up to a
/// bounded number of attempts. Calling [`dial`](Self::dial) before the read
/// methods is optional; reads connect lazily.
///
/// Paths may be cell-relative: the symbolic segment `local` in the third
/// position (`/zk/local/...`) is rewritten to this client's local cell
/// before dispatch, so callers can use cell-agnostic paths.
///
/// A `ZkCacheClient` is not safe for concurrent use from multiple threads
/// without external synchronization: the address cursor and the active
/// endpoint client are mutated in place.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use zkcache_client::ZkCacheClient;
///
/// let mut client = ZkCacheClient::new(
///     "zk1.nj:14850,zk2.nj:14850",
///     "nj",
///     Duration::from_secs(5),
///     None,
///     None,
/// )
/// .unwrap();
///
/// let topo = client.children("/zk/local/vt/ns").unwrap();
/// for name in &topo.children {
///     println!("{}", name);
/// }
/// ```
#[derive(Debug)]
pub struct ZkCacheClient {
    ring: AddressRing,
    local_cell: String,
    timeout: Duration,
    auth: AuthConfig,
    conn: Option<EndpointClient>,
}

impl ZkCacheClient {
    /// Creates a client over a comma-separated `host:port` list.
    ///
    /// No connection is opened yet. Fails with a configuration error if the
    /// address list is empty or exactly one of username/password is
    /// supplied.
    pub fn new(
        addrs: &str,
        local_cell: impl Into<String>,
        timeout: Duration,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let auth = AuthConfig::from_parts(username, password)?;

        Ok(Self {
            ring: AddressRing::parse(addrs)?,
            local_cell: local_cell.into(),
            timeout,
            auth,
            conn: None,
        })
    }

    /// The cell that `local` resolves to.
    pub fn local_cell(&self) -> &str {
        &self.local_cell
    }

    /// Whether an endpoint connection is currently active.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Maps a cell-relative path to a concrete one:
    /// `/zk/local/vt` becomes `/zk/nj/vt` for a client in cell `nj`.
    fn resolve_path(&self, path: &str) -> String {
        let mut parts: Vec<&str> = path.split('/').collect();

        if parts.len() < 3 || parts[2] != "local" {
            return path.to_string();
        }

        parts[2] = &self.local_cell;
        parts.join("/")
    }

    /// Connects to the first reachable endpoint.
    ///
    /// Closes any active connection, then tries each configured address
    /// exactly once in cyclic order from the cursor. If every address fails
    /// the client is left unconnected and the pool-exhaustion error is
    /// raised.
    pub fn dial(&mut self) -> Result<()> {
        self.close();

        for _ in 0..self.ring.len() {
            let Some(addr) = self.ring.next_addr() else {
                break;
            };
            let mut conn = EndpointClient::with_auth(addr.as_str(), self.timeout, self.auth.clone());
            match conn.dial() {
                Ok(()) => {
                    self.conn = Some(conn);
                    return Ok(());
                }
                Err(e) => debug!(addr = %addr, error = %e, "dial attempt failed"),
            }
        }

        self.conn = None;
        Err(ZkCacheError::AllServersFailed)
    }

    /// Closes the active endpoint connection, if any.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }

    /// Reads one node.
    pub fn get(&mut self, path: &str) -> Result<ZkNode> {
        let path = self.resolve_path(path);
        self.attempt("get", |conn| conn.get(&path))
    }

    /// Reads several nodes in one round trip; the reply preserves the
    /// order of `paths`.
    pub fn getv(&mut self, paths: &[&str]) -> Result<Vec<ZkNode>> {
        let resolved: Vec<String> = paths.iter().map(|p| self.resolve_path(p)).collect();
        let resolved: Vec<&str> = resolved.iter().map(String::as_str).collect();
        self.attempt("getv", |conn| conn.getv(&resolved))
    }

    /// Reads one node with its children populated.
    pub fn children(&mut self, path: &str) -> Result<ZkNode> {
        let path = self.resolve_path(path);
        self.attempt("children", |conn| conn.children(&path))
    }

    /// Bounded retry loop shared by the read operations.
    ///
    /// Dials lazily when unconnected (that dial's failure propagates
    /// directly). Each failed call counts one attempt; at the bound the
    /// typed error carrying the attempt count and last cause is raised.
    /// Between attempts the client fails over to the next endpoint when
    /// more than one is configured, and retries the same endpoint when
    /// only one is.
    fn attempt<T>(
        &mut self,
        op: &'static str,
        mut call: impl FnMut(&mut EndpointClient) -> Result<T>,
    ) -> Result<T> {
        if self.conn.is_none() {
            self.dial()?;
        }

        let mut attempt = 0u32;
        loop {
            let conn = self
                .conn
                .as_mut()
                .ok_or(ZkCacheError::AllServersFailed)?;

            match call(conn) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        warn!(op, attempts = attempt, error = %e, "command failed, giving up");
                        return Err(ZkCacheError::RetriesExhausted {
                            op,
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }

                    // Fail over when there is an alternate server to try.
                    if self.ring.len() > 1 {
                        self.dial()?;
                    }
                }
            }
        }
    }
}
