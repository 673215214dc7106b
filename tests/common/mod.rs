use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

/// API key the fake upstream expects as a bearer token
pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test/model";

/// Reserve a free local port
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    listener.local_addr().expect("No local address")
}

/// Wait until something accepts connections on `addr`
pub async fn wait_until_listening(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Server on {} never started", addr);
}

/// What the fake chat-completion endpoint answers with
#[derive(Debug, Clone)]
pub enum UpstreamScript {
    /// Successful completion made of these deltas
    Deltas(Vec<&'static str>),
    /// Deltas followed by an in-band error object
    ErrorAfter(Vec<&'static str>, &'static str),
    /// Non-success status with an OpenAI-style error body
    Status(u16, &'static str),
    /// Streaming body sent exactly as given
    RawStream(&'static str),
}

impl UpstreamScript {
    fn respond(&self, body: &Value) -> Response {
        let streaming = body["stream"].as_bool().unwrap_or(false);

        match self {
            UpstreamScript::Status(status, message) => error_response(*status, message),
            UpstreamScript::RawStream(body) => {
                warp::reply::with_header(body.to_string(), "content-type", "text/event-stream")
                    .into_response()
            }
            UpstreamScript::Deltas(deltas) if streaming => sse_response(deltas, None),
            UpstreamScript::ErrorAfter(deltas, message) if streaming => {
                sse_response(deltas, Some(*message))
            }
            UpstreamScript::Deltas(deltas) | UpstreamScript::ErrorAfter(deltas, _) => {
                warp::reply::json(&json!({
                    "choices": [{
                        "index": 0,
                        "message": { "role": "assistant", "content": deltas.concat() },
                        "finish_reason": "stop"
                    }]
                }))
                .into_response()
            }
        }
    }
}

fn error_response(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(
        warp::reply::json(&json!({
            "error": { "message": message, "type": "server_error", "code": status.as_u16() }
        })),
        status,
    )
    .into_response()
}

/// Build an OpenAI-style event stream, with the role-only opening chunk and
/// empty keep-alive deltas real providers send
fn sse_response(deltas: &[&str], error: Option<&str>) -> Response {
    let mut body = String::new();

    push_frame(&mut body, json!({ "choices": [{ "index": 0, "delta": { "role": "assistant", "content": "" } }] }));
    for delta in deltas {
        push_frame(&mut body, json!({ "choices": [{ "index": 0, "delta": { "content": delta } }] }));
        push_frame(&mut body, json!({ "choices": [{ "index": 0, "delta": {} }] }));
    }

    match error {
        Some(message) => push_frame(&mut body, json!({ "error": { "message": message, "type": "server_error" } })),
        None => {
            push_frame(&mut body, json!({ "choices": [{ "index": 0, "delta": {}, "finish_reason": "stop" }] }));
            body.push_str("data: [DONE]\n\n");
        }
    }

    warp::reply::with_header(body, "content-type", "text/event-stream").into_response()
}

fn push_frame(body: &mut String, payload: Value) {
    body.push_str(&format!("data: {}\n\n", payload));
}

/// `POST /v1/chat/completions` answering per `script`; a wrong bearer token is a 401
pub fn fake_upstream(
    script: UpstreamScript,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    warp::path!("v1" / "chat" / "completions")
        .and(warp::post())
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .map(move |authorization: String, body: Value| {
            if authorization != format!("Bearer {}", TEST_API_KEY) {
                return error_response(401, "invalid api key");
            }
            if body["model"] != TEST_MODEL {
                return error_response(404, "model not found");
            }
            script.respond(&body)
        })
}
