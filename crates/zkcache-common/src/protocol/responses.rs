//! RPC response envelope and fixed reply records.

use serde::{Deserialize, Serialize};

use super::RequestId;

/// An RPC response returned by the zkcache proxy.
///
/// The sequence number echoes the request it answers. Exactly one of
/// `reply` and `error` is populated: a populated `error` is an
/// application-level failure raised by the server, everything else is a
/// decoded reply value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Sequence number of the request this response answers
    #[serde(rename = "Seq")]
    pub seq: RequestId,
    /// Reply value (present on success)
    #[serde(rename = "Reply")]
    pub reply: Option<serde_json::Value>,
    /// Error message (present on failure)
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl Response {
    /// Creates a successful response.
    pub fn success(seq: RequestId, reply: serde_json::Value) -> Self {
        Response {
            seq,
            reply: Some(reply),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(seq: RequestId, error: impl Into<String>) -> Self {
        Response {
            seq,
            reply: None,
            error: Some(error.into()),
        }
    }
}

/// Reply to `Authenticator.GetNewChallenge`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeReply {
    #[serde(rename = "Challenge")]
    pub challenge: String,
}
