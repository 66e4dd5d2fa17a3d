//! Transport layer: the synchronous TCP conversation with a zkcache server.
//!
//! The conversation is a Go-style RPC exchange:
//! - a connect-time route preamble selecting authenticated or plain access,
//! - length-prefixed JSON messages: `[4-byte length as u32 big-endian] + [JSON data]`,
//! - request/response envelopes matched by sequence number.
//!
//! # Components
//!
//! - [`JsonCodec`]: encode/decode the protocol envelopes
//! - [`TcpTransport`]: blocking TCP transport with uniform connect/call timeouts

pub mod codec;
pub mod tcp;

pub use codec::JsonCodec;
pub use tcp::TcpTransport;
