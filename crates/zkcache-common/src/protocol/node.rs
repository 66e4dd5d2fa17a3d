//! Node and stat records returned by the read methods.

use serde::{Deserialize, Serialize};

/// Metadata of a coordination-store node.
///
/// Zxids are 64-bit transaction identifiers assigned by the authoritative
/// store; timestamps are epoch milliseconds. `ephemeral_owner` is the owning
/// session id, zero for persistent nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZkStat {
    #[serde(rename = "czxid")]
    pub created_zxid: i64,
    #[serde(rename = "mzxid")]
    pub modified_zxid: i64,
    #[serde(rename = "cTime")]
    pub created_time: i64,
    #[serde(rename = "mTime")]
    pub modified_time: i64,
    #[serde(rename = "version")]
    pub version: i32,
    #[serde(rename = "cVersion")]
    pub child_version: i32,
    #[serde(rename = "aVersion")]
    pub acl_version: i32,
    #[serde(rename = "ephemeralOwner")]
    pub ephemeral_owner: i64,
    #[serde(rename = "dataLength")]
    pub data_length: i32,
    #[serde(rename = "numChildren")]
    pub num_children: i32,
    #[serde(rename = "pzxid")]
    pub pzxid: i64,
}

/// Snapshot of a coordination-store node as served by the zkcache proxy.
///
/// `path` is the resolved path that was queried. `children` is only
/// populated by `Reader.Children`. The two flags are set by the proxy:
/// `cached` means the reply was served from its cache rather than a fresh
/// upstream read, `stale` means the proxy is currently disconnected from
/// the upstream store and the value may be outdated. The flags are
/// independent; the client surfaces them untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ZkNode {
    pub path: String,
    #[serde(default)]
    pub data: String,
    pub stat: ZkStat,
    #[serde(default)]
    pub children: Vec<String>,
    pub cached: bool,
    pub stale: bool,
}
