use crate::core::{Engine, PeerChainProvider, Transaction};
use crate::error::{BlockchainError, Result};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 30;
const MAX_HEADER_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// HTTP front end of a ledger node
pub struct Server {
    engine: Arc<Engine>,
    peer_client: Arc<dyn PeerChainProvider>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json(status: u16, body: Value) -> Response {
        Response {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn text(status: u16, body: &str) -> Response {
        Response {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

impl Server {
    pub fn new(engine: Arc<Engine>, peer_client: Arc<dyn PeerChainProvider>) -> Self {
        Self {
            engine,
            peer_client,
        }
    }

    /// Bind `addr` and serve until the listener fails
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        info!("Server listening on {addr}");
        self.serve(listener)
    }

    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let engine = Arc::clone(&self.engine);
                    let peer_client = Arc::clone(&self.peer_client);

                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&engine, peer_client, stream) {
                            error!("Error handling connection: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(
        engine: &Engine,
        peer_client: Arc<dyn PeerChainProvider>,
        mut stream: TcpStream,
    ) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        let response = match read_request(&mut stream) {
            Ok(request) => {
                debug!("{} {}", request.method, request.path);
                route(engine, peer_client, &request)
            }
            Err(e) => {
                warn!("Rejecting malformed request: {e}");
                Response::json(400, json!({"error": "bad request"}))
            }
        };

        write_response(&mut stream, &response)?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }
}

/// Dispatch one request against the engine
pub fn route(
    engine: &Engine,
    peer_client: Arc<dyn PeerChainProvider>,
    request: &Request,
) -> Response {
    let path = request.path.split('?').next().unwrap_or_default();

    match (request.method.as_str(), path) {
        ("GET", "/mine") => mine(engine),
        ("POST", "/transactions/new") => new_transaction(engine, &request.body),
        ("GET", "/chain") => full_chain(engine),
        ("POST", "/nodes/register") => register_nodes(engine, &request.body),
        ("GET", "/nodes/resolve") => consensus(engine, peer_client),
        _ => Response::json(404, json!({"error": "not found"})),
    }
}

fn mine(engine: &Engine) -> Response {
    match engine.mine() {
        Ok(block) => Response::json(
            200,
            json!({
                "message": "New Block Forged",
                "index": block.get_index(),
                "transactions": block.get_transactions(),
                "proof": block.get_proof(),
                "previous_hash": block.get_previous_hash(),
            }),
        ),
        Err(e) if e.is_retryable() => {
            warn!("Mine request rejected: {e}");
            Response::json(409, json!({"error": e.to_string()}))
        }
        Err(e) => {
            error!("Mining failed: {e}");
            Response::json(500, json!({"error": e.to_string()}))
        }
    }
}

fn new_transaction(engine: &Engine, body: &[u8]) -> Response {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => return Response::text(400, "Invalid JSON"),
    };

    match Transaction::from_payload(&payload) {
        Ok(tx) => {
            let index = engine.submit_transaction(tx);
            Response::json(
                201,
                json!({
                    "message": format!("Transaction will be added to Block {index}"),
                    "index": index,
                }),
            )
        }
        Err(e) => {
            debug!("{e}");
            Response::text(400, "Missing values")
        }
    }
}

fn full_chain(engine: &Engine) -> Response {
    let (chain, length) = engine.list_chain();
    Response::json(200, json!({"chain": chain, "length": length}))
}

fn register_nodes(engine: &Engine, body: &[u8]) -> Response {
    let nodes: Option<Vec<String>> = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| payload.get("nodes").cloned())
        .and_then(|nodes| serde_json::from_value(nodes).ok());

    let Some(nodes) = nodes else {
        return Response::text(400, "Error: Please supply a valid list of nodes");
    };

    for node in &nodes {
        engine.register_peer(node);
    }

    Response::json(
        201,
        json!({
            "message": "New node added.",
            "connected_nodes": engine.peers(),
        }),
    )
}

fn consensus(engine: &Engine, peer_client: Arc<dyn PeerChainProvider>) -> Response {
    let (replaced, chain) = engine.resolve(peer_client);
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Response::json(200, json!({"message": message, "new_chain": chain}))
}

/// Read one HTTP/1.1 request: request line, headers, `Content-Length` body
pub fn read_request<R: Read>(stream: &mut R) -> Result<Request> {
    let mut buf = [0u8; 4096];
    let mut data = Vec::new();
    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err(BlockchainError::Network("headers too large".to_string()));
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(BlockchainError::Network(
                "connection closed before end of headers".to_string(),
            ));
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| BlockchainError::Network("missing request line".to_string()))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| BlockchainError::Network("missing method".to_string()))?
        .to_string();
    let path = parts
        .next()
        .ok_or_else(|| BlockchainError::Network("missing path".to_string()))?
        .to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().map_err(|_| {
                    BlockchainError::Network(format!("bad Content-Length: {}", value.trim()))
                })?;
            }
        }
    }
    if content_length > MAX_BODY_BYTES {
        return Err(BlockchainError::Network("body too large".to_string()));
    }

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    Ok(Request { method, path, body })
}

pub fn write_response<W: Write>(stream: &mut W, response: &Response) -> Result<()> {
    let reason = match response.status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(response.body.as_bytes())?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::testnet::{build_chain, MockPeers};
    use std::io::Cursor;

    fn test_engine() -> Engine {
        Engine::new(EngineConfig {
            difficulty: 2,
            mining_reward: 1,
            node_id: "node-a".to_string(),
            peer_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    fn request(method: &str, path: &str, body: &str) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn no_peers() -> Arc<dyn PeerChainProvider> {
        Arc::new(MockPeers::new())
    }

    fn body_json(response: &Response) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_read_request_with_body() {
        let raw = "POST /transactions/new HTTP/1.1\r\nHost: x\r\ncontent-length: 11\r\n\r\n{\"a\": true}";
        let parsed = read_request(&mut Cursor::new(raw.as_bytes())).unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/transactions/new");
        assert_eq!(parsed.body, b"{\"a\": true}");
    }

    #[test]
    fn test_read_request_truncated_headers() {
        let raw = "GET /chain HTTP/1.1\r\nHost: x\r\n";
        assert!(read_request(&mut Cursor::new(raw.as_bytes())).is_err());
    }

    #[test]
    fn test_write_response_format() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::text(201, "ok")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nok"));
    }

    #[test]
    fn test_chain_endpoint_matches_peer_contract() {
        let engine = test_engine();
        let response = route(&engine, no_peers(), &request("GET", "/chain", ""));
        assert_eq!(response.status, 200);

        let body = body_json(&response);
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["previous_hash"], "1");
        assert_eq!(body["chain"][0]["proof"], 100);
    }

    #[test]
    fn test_transaction_then_mine() {
        let engine = test_engine();
        let submitted = route(
            &engine,
            no_peers(),
            &request(
                "POST",
                "/transactions/new",
                r#"{"sender":"bob","recipient":"alice","amount":5}"#,
            ),
        );
        assert_eq!(submitted.status, 201);
        assert_eq!(body_json(&submitted)["index"], 2);

        let mined = route(&engine, no_peers(), &request("GET", "/mine", ""));
        assert_eq!(mined.status, 200);
        let body = body_json(&mined);
        assert_eq!(body["message"], "New Block Forged");
        assert_eq!(body["index"], 2);
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
        assert_eq!(body["transactions"][1]["recipient"], "node-a");
    }

    #[test]
    fn test_transaction_missing_values() {
        let engine = test_engine();
        let response = route(
            &engine,
            no_peers(),
            &request("POST", "/transactions/new", r#"{"sender":"bob"}"#),
        );
        assert_eq!(response, Response::text(400, "Missing values"));
        assert!(engine.pending_transactions().is_empty());
    }

    #[test]
    fn test_transaction_values_are_not_checked() {
        let engine = test_engine();
        let response = route(
            &engine,
            no_peers(),
            &request(
                "POST",
                "/transactions/new",
                r#"{"sender":"bob","recipient":"alice","amount":0.5}"#,
            ),
        );
        assert_eq!(response.status, 201);
        assert_eq!(engine.pending_transactions()[0].get_amount(), &json!(0.5));
    }

    #[test]
    fn test_register_nodes() {
        let engine = test_engine();
        let response = route(
            &engine,
            no_peers(),
            &request(
                "POST",
                "/nodes/register",
                r#"{"nodes":["10.0.0.1:5000","10.0.0.1:5000","10.0.0.2:5000"]}"#,
            ),
        );
        assert_eq!(response.status, 201);
        assert_eq!(
            body_json(&response)["connected_nodes"],
            json!(["10.0.0.1:5000", "10.0.0.2:5000"])
        );

        let missing = route(&engine, no_peers(), &request("POST", "/nodes/register", "{}"));
        assert_eq!(missing.status, 400);
    }

    #[test]
    fn test_resolve_endpoint() {
        let engine = test_engine();
        engine.register_peer("peer-b");
        let longer = build_chain(3, engine.proof_of_work());
        let provider: Arc<dyn PeerChainProvider> =
            Arc::new(MockPeers::new().with_chain("peer-b", longer));

        let response = route(&engine, Arc::clone(&provider), &request("GET", "/nodes/resolve", ""));
        let body = body_json(&response);
        assert_eq!(body["message"], "Our chain was replaced");
        assert_eq!(body["new_chain"].as_array().unwrap().len(), 3);

        let again = route(&engine, provider, &request("GET", "/nodes/resolve", ""));
        assert_eq!(body_json(&again)["message"], "Our chain is authoritative");
    }

    #[test]
    fn test_unknown_route() {
        let engine = test_engine();
        let response = route(&engine, no_peers(), &request("DELETE", "/chain", ""));
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_query_string_ignored() {
        let engine = test_engine();
        let response = route(&engine, no_peers(), &request("GET", "/chain?pretty=1", ""));
        assert_eq!(response.status, 200);
    }
}
