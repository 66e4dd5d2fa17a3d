pub mod error;
pub mod node;
pub mod requests;
pub mod responses;


pub use error::{Result, ZkCacheError};
pub use node::{ZkNode, ZkStat};
pub use requests::{methods, MethodName, Request, RequestId, RpcBody};
pub use responses::{ChallengeReply, Response};
