//! ZkCache Client
//!
//! Read-only client for the zkcache caching proxy tier, which fronts a
//! hierarchical coordination store and serves cheap reads of cluster
//! metadata (topology, locks, config).
//!
//! # Components
//!
//! - [`EndpointClient`]: a direct client for one endpoint — one transport
//!   connection, optional CRAM-MD5 authentication, no retries
//! - [`ZkCacheClient`]: the client most callers want — a pool of endpoints
//!   consumed cyclically, cell-relative path resolution, and bounded
//!   retry-with-failover
//!
//! # Reads
//!
//! Three operations, all read-only: `get` (one node), `getv` (several nodes
//! in one round trip), `children` (one node with its child names). Replies
//! carry the proxy's `cached`/`stale` flags untouched so callers can judge
//! freshness.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use zkcache_client::ZkCacheClient;
//!
//! let mut client = ZkCacheClient::new(
//!     "zk1.nj:14850,zk2.nj:14850",
//!     "nj",
//!     Duration::from_secs(5),
//!     None,
//!     None,
//! )
//! .unwrap();
//!
//! // `local` resolves to this client's cell ("nj")
//! let node = client.get("/zk/local/vt/ns/lookup").unwrap();
//! if node.stale {
//!     eprintln!("warning: proxy is disconnected from the store");
//! }
//! ```

pub mod client;
pub mod resilient;
pub mod ring;

pub use client::EndpointClient;
pub use resilient::ZkCacheClient;
pub use ring::AddressRing;

// Re-export the shared types callers handle directly.
pub use zkcache_common::auth::{AuthConfig, Credentials};
pub use zkcache_common::protocol::{Result, ZkCacheError, ZkNode, ZkStat};
