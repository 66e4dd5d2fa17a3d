//! Loopback zkcache test server speaking the real wire protocol:
//! connect preamble with route check, then length-prefixed JSON envelopes.
//!
//! Each server counts accepted connections and served read requests so
//! tests can assert exactly where dials and retries landed.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use zkcache_common::auth::cram_md5_proof;
use zkcache_common::protocol::{methods, Request, Response, ZkNode, ZkStat};
use zkcache_common::transport::{JsonCodec, TcpTransport};

const PLAIN_ROUTE: &str = "/_zkcache_rpc_";
const AUTH_ROUTE: &str = "/_zkcache_rpc_/auth";

/// How the server answers read requests.
#[derive(Clone, Copy)]
pub enum Behavior {
    /// Serve a node for any path.
    Healthy,
    /// Answer every read with a server error.
    FailReads,
}

pub struct TestServer {
    pub addr: String,
    reads: Arc<AtomicUsize>,
    connections: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start(behavior: Behavior) -> Self {
        Self::start_with_auth(behavior, None)
    }

    /// Starts a server requiring the CRAM-MD5 handshake when credentials
    /// are given. The connect route must match the auth mode or the
    /// connection is dropped.
    pub fn start_with_auth(behavior: Behavior, credentials: Option<(String, String)>) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let reads = Arc::new(AtomicUsize::new(0));
        let connections = Arc::new(AtomicUsize::new(0));

        {
            let reads = Arc::clone(&reads);
            let connections = Arc::clone(&connections);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    connections.fetch_add(1, Ordering::SeqCst);

                    let credentials = credentials.clone();
                    let reads = Arc::clone(&reads);
                    thread::spawn(move || {
                        let _ = serve_connection(stream, behavior, credentials, reads);
                    });
                }
            });
        }

        TestServer {
            addr,
            reads,
            connections,
        }
    }

    /// Number of `Reader.*` requests served (the auth handshake is not
    /// counted).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of accepted TCP connections.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Makes client logs visible under `--nocapture`; repeated calls are a
/// no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Returns an address nothing listens on.
pub fn unreachable_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

fn serve_connection(
    mut stream: TcpStream,
    behavior: Behavior,
    credentials: Option<(String, String)>,
    reads: Arc<AtomicUsize>,
) -> zkcache_common::protocol::Result<()> {
    let transport = TcpTransport::new(Duration::from_secs(5));

    let route = read_preamble(&mut stream)?;
    let expected_route = if credentials.is_some() {
        AUTH_ROUTE
    } else {
        PLAIN_ROUTE
    };
    if route != expected_route {
        // Wrong route for this auth mode: hang up without an ack.
        return Ok(());
    }
    stream.write_all(b"HTTP/1.0 200 Connected to ZkCache RPC\n\n")?;

    let mut challenge: Option<String> = None;
    loop {
        let data = match transport.receive_message(&mut stream) {
            Ok(data) => data,
            Err(_) => return Ok(()), // client hung up
        };
        let request = JsonCodec::decode_request(&data)?;
        let response = dispatch(&request, behavior, &credentials, &mut challenge, &reads);
        let encoded = JsonCodec::encode_response(&response)?;
        transport.send_message(&mut stream, &encoded)?;
    }
}

/// Reads the `CONNECT <route> HTTP/1.0` preamble and returns the route.
fn read_preamble(stream: &mut TcpStream) -> zkcache_common::protocol::Result<String> {
    let mut preamble = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Ok(String::new());
        }
        preamble.extend_from_slice(&buf[..n]);
        if preamble.windows(2).any(|w| w == b"\n\n") {
            break;
        }
    }

    let text = String::from_utf8_lossy(&preamble);
    let route = text
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("CONNECT "))
        .and_then(|rest| rest.strip_suffix(" HTTP/1.0"))
        .unwrap_or("");
    Ok(route.to_string())
}

fn dispatch(
    request: &Request,
    behavior: Behavior,
    credentials: &Option<(String, String)>,
    challenge: &mut Option<String>,
    reads: &AtomicUsize,
) -> Response {
    match request.method.as_str() {
        methods::GET_NEW_CHALLENGE => {
            let fresh = format!("<{}.testserver@zkcache>", request.seq);
            *challenge = Some(fresh.clone());
            Response::success(request.seq, json!({ "Challenge": fresh }))
        }
        methods::AUTHENTICATE => {
            let Some((username, password)) = credentials else {
                return Response::error(request.seq, "authentication not enabled");
            };
            let Some(issued) = challenge.take() else {
                return Response::error(request.seq, "no challenge outstanding");
            };
            let expected = cram_md5_proof(username, password, &issued);
            let proof = request
                .body
                .get("Proof")
                .and_then(Value::as_str)
                .unwrap_or("");
            if proof == expected {
                Response::success(request.seq, json!("ok"))
            } else {
                Response::error(request.seq, "invalid proof")
            }
        }
        methods::GET => {
            reads.fetch_add(1, Ordering::SeqCst);
            match behavior {
                Behavior::Healthy => {
                    let path = request_path(request);
                    Response::success(request.seq, node_doc(&path, &[]))
                }
                Behavior::FailReads => Response::error(request.seq, "injected read failure"),
            }
        }
        methods::GETV => {
            reads.fetch_add(1, Ordering::SeqCst);
            match behavior {
                Behavior::Healthy => {
                    let paths: Vec<String> = request
                        .body
                        .get("Paths")
                        .and_then(Value::as_array)
                        .map(|arr| {
                            arr.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    let nodes: Vec<Value> = paths.iter().map(|p| node_doc(p, &[])).collect();
                    Response::success(request.seq, Value::Array(nodes))
                }
                Behavior::FailReads => Response::error(request.seq, "injected read failure"),
            }
        }
        methods::CHILDREN => {
            reads.fetch_add(1, Ordering::SeqCst);
            match behavior {
                Behavior::Healthy => {
                    let path = request_path(request);
                    Response::success(request.seq, node_doc(&path, &["shard-0", "shard-1"]))
                }
                Behavior::FailReads => Response::error(request.seq, "injected read failure"),
            }
        }
        other => Response::error(request.seq, format!("unknown method {}", other)),
    }
}

fn request_path(request: &Request) -> String {
    request
        .body
        .get("Path")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn node_doc(path: &str, children: &[&str]) -> Value {
    let node = ZkNode {
        path: path.to_string(),
        data: format!("data for {}", path),
        stat: ZkStat {
            version: 1,
            num_children: children.len() as i32,
            ..ZkStat::default()
        },
        children: children.iter().map(|c| c.to_string()).collect(),
        cached: true,
        stale: false,
    };
    serde_json::to_value(node).unwrap()
}
