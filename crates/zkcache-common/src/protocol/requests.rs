use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub type RequestId = u64;
pub type MethodName = String;
pub type RpcBody = serde_json::Value;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// RPC method names served by the zkcache proxy.
pub mod methods {
    pub const GET: &str = "Reader.Get";
    pub const GETV: &str = "Reader.GetV";
    pub const CHILDREN: &str = "Reader.Children";
    pub const GET_NEW_CHALLENGE: &str = "Authenticator.GetNewChallenge";
    pub const AUTHENTICATE: &str = "Authenticator.Authenticate";
}

/// An RPC request envelope.
///
/// The sequence number is assigned at construction and echoed back by the
/// server; a reply carrying a different sequence number indicates the
/// conversation is out of sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    #[serde(rename = "Seq")]
    pub seq: RequestId,
    #[serde(rename = "ServiceMethod")]
    pub method: MethodName,
    #[serde(rename = "Body")]
    pub body: RpcBody,
}

impl Request {
    pub fn new(method: impl Into<String>, body: RpcBody) -> Self {
        Request {
            seq: next_sequence_id(),
            method: method.into(),
            body,
        }
    }
}

fn next_sequence_id() -> RequestId {
    REQUEST_SEQ.fetch_add(1, Ordering::Relaxed)
}
