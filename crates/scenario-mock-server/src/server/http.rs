//! hyper binding for [`MockServer`].

use super::engine::{MockServer, Session};
use crate::error::RequestError;
use crate::request::{parse_query_string, MockRequest, RequestBody};
use crate::response::{HttpResponseBuilder, MockResult};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const ALLOW_METHODS: &str = "GET, HEAD, PUT, PATCH, POST, DELETE";

/// HTTP/1 listener serving a [`MockServer`]
pub struct MockHttpServer {
    listener: TcpListener,
    server: Arc<MockServer>,
}

impl MockHttpServer {
    /// Bind to the server's configured host and port. Port 0 picks an
    /// ephemeral port, see [`MockHttpServer::local_addr`].
    pub async fn bind(server: MockServer) -> anyhow::Result<Self> {
        let address = server.options().bind_address();
        let listener = TcpListener::bind(&address).await?;
        Ok(Self {
            listener,
            server: Arc::new(server),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the listener fails
    pub async fn serve(self) -> anyhow::Result<()> {
        self.serve_with_shutdown(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` completes. Connections already accepted run to
    /// completion on their own tasks.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Scenario mock server listening on http://{}",
            self.local_addr()?
        );
        tokio::pin!(shutdown);

        loop {
            let (stream, _) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Scenario mock server shutting down");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let server = Arc::clone(&self.server);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { route_request(req, server).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Mock server connection error: {}", e);
                }
            });
        }
    }
}

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    server: Arc<MockServer>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    debug!("{} {}", parts.method, parts.uri.path());

    if parts.method == Method::OPTIONS {
        return Ok(with_cors(
            HttpResponseBuilder::new(StatusCode::NO_CONTENT)
                .header("access-control-allow-methods", ALLOW_METHODS)
                .header("access-control-allow-headers", "content-type"),
        )
        .build());
    }

    let body = body.collect().await?.to_bytes();
    let request = translate_request(
        parts.method.as_str(),
        parts.uri.path(),
        parts.uri.query(),
        &parts.headers,
        &body,
    );

    let session = server.session(request.header("cookie"));
    let result = dispatch(&server, &request, &session).await;

    let mut response = with_cors(HttpResponseBuilder::from_result(&result));
    // Mocks may set their own cookies; the session cookie goes alongside them
    if let Some(cookie) = session.set_cookie(&server.options().cookie_name) {
        response = response.append_header("set-cookie", &cookie);
    }
    Ok(response.build())
}

/// Route a translated request to selection, listing or mock dispatch
async fn dispatch(server: &MockServer, request: &MockRequest, session: &Session) -> MockResult {
    let options = server.options();

    if request.method == "PUT" && request.path == options.select_scenario_path {
        return match scenario_id(&request.body) {
            Some(id) => server.select_scenario(id, session),
            None => RequestError::MissingScenarioId.into_result(),
        };
    }

    if request.method == "GET" && request.path == options.scenarios_path {
        return server.list_scenarios(session);
    }

    match server.handle_request(request, session).await {
        Ok(result) => result,
        Err(e) => {
            error!(
                "Mock for {} {} failed: {:#}",
                request.method, request.path, e
            );
            MockResult::json(500, json!({ "message": e.to_string() }))
        }
    }
}

fn with_cors(builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .header("access-control-allow-origin", "*")
        .header("access-control-allow-credentials", "true")
}

fn scenario_id(body: &RequestBody) -> Option<&str> {
    match body {
        RequestBody::Json(Value::Object(fields)) => fields.get("scenarioId")?.as_str(),
        _ => None,
    }
}

/// Build the transport-agnostic request out of hyper's request parts
pub fn translate_request(
    method: &str,
    path: &str,
    query: Option<&str>,
    headers: &hyper::HeaderMap,
    body: &[u8],
) -> MockRequest {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
        })
        .collect();

    let content_type = headers.get("content-type").map(String::as_str);
    let body = decode_body(content_type, body);

    MockRequest {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
        query: query.map(parse_query_string).unwrap_or_default(),
        headers,
        body,
    }
}

/// Decode a body by content-type: JSON (raw text when malformed), urlencoded
/// forms as an object of strings, anything else as text.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> RequestBody {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let text = String::from_utf8_lossy(body).into_owned();

    match mime.as_str() {
        "application/json" if !text.trim().is_empty() => match serde_json::from_str(&text) {
            Ok(value) => RequestBody::Json(value),
            Err(_) => RequestBody::Text(text),
        },
        "application/x-www-form-urlencoded" => serde_json::to_value(parse_query_string(&text))
            .map(RequestBody::Json)
            .unwrap_or(RequestBody::Text(text)),
        _ => RequestBody::Text(text),
    }
}
