//! ZkCache Common Types and Transport
//!
//! This crate provides the protocol definitions, the blocking TCP transport,
//! and the authentication primitives shared by the zkcache client crates.
//!
//! # Overview
//!
//! zkcache is a caching proxy tier that fronts a hierarchical coordination
//! store and serves cheap, read-only access to cluster metadata (topology,
//! locks, config). This crate contains everything a client needs to speak to
//! one proxy endpoint:
//!
//! - **Protocol layer**: node/stat data model, request and response
//!   envelopes, typed errors
//! - **Transport layer**: blocking TCP with a route preamble and
//!   length-prefixed JSON messages
//! - **Authentication**: optional CRAM-MD5 credentials and proof computation
//!
//! The failover client that pools several endpoints lives in the
//! `zkcache-client` crate.
//!
//! # Wire protocol
//!
//! - **Transport**: TCP, one connection per client, replaced on redial
//! - **Serialization**: JSON
//! - **Message format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//! - **Sequencing**: replies echo the request sequence number
//!
//! # Example
//!
//! ```
//! use zkcache_common::protocol::{methods, Request, Response};
//! use serde_json::json;
//!
//! // Build a read request
//! let request = Request::new(methods::GET, json!({"Path": "/zk/nj/vt"}));
//!
//! // A server would answer with a matching sequence number
//! let response = Response::success(request.seq, json!({"Path": "/zk/nj/vt"}));
//! assert_eq!(response.seq, request.seq);
//! ```

pub mod auth;
pub mod protocol;
pub mod transport;

pub use protocol::*;
