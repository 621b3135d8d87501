//! HTTP transport for the session API.

use crate::api::{self, ApiRequest, ApiResponse, Method};
use crate::error::{Error, Result};
use crate::relay::RelayStore;
use std::io::{self, Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

/// Room for the JSON envelope around an image payload.
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Session API served over HTTP.
pub struct ApiServer {
    http: Server,
    relay: Arc<dyn RelayStore>,
    max_body_bytes: usize,
}

impl ApiServer {
    /// Bind to `addr` (`127.0.0.1:0` picks a free port).
    ///
    /// # Errors
    ///
    /// Returns `Server` if the address cannot be bound.
    pub fn bind(addr: &str, relay: Arc<dyn RelayStore>, max_payload_bytes: usize) -> Result<Self> {
        let http = Server::http(addr).map_err(|e| Error::Server(format!("bind {addr}: {e}")))?;
        Ok(Self {
            http,
            relay,
            max_body_bytes: max_payload_bytes.saturating_add(BODY_OVERHEAD_BYTES),
        })
    }

    /// Address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Answer requests until [`ApiServer::shutdown`] is called.
    pub fn serve(&self) {
        info!(addr = ?self.local_addr(), "session API listening");
        for mut request in self.http.incoming_requests() {
            let response = self.dispatch(&mut request);
            debug!(method = %request.method(), url = request.url(), status = response.status, "request served");
            if let Err(e) = request.respond(to_http(&response)) {
                warn!(error = %e, "failed to write response");
            }
        }
        info!("session API stopped");
    }

    /// Make [`ApiServer::serve`] return.
    pub fn shutdown(&self) {
        self.http.unblock();
    }

    fn dispatch(&self, request: &mut Request) -> ApiResponse {
        let method = Method::parse(&request.method().to_string());
        let body = if method == Method::Post {
            match read_body(request.as_reader(), self.max_body_bytes) {
                Ok(Some(body)) => Some(body),
                Ok(None) => return ApiResponse::error(413, "Image payload too large"),
                Err(e) => {
                    warn!(error = %e, "failed to read request body");
                    return ApiResponse::error(500, "Failed to store image");
                }
            }
        } else {
            None
        };

        match ApiRequest::new(method, request.url(), body) {
            Ok(api_request) => api::handle(&api_request, self.relay.as_ref()),
            Err(e) => {
                warn!(error = %e, "rejecting request");
                ApiResponse::error(400, "Bad request")
            }
        }
    }
}

/// Read at most `limit` bytes. `None` when the body is longer.
fn read_body(reader: &mut dyn Read, limit: usize) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(cap).read_to_end(&mut bytes)?;
    if bytes.len() > limit {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn to_http(response: &ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let bytes = response
        .body
        .as_ref()
        .and_then(|body| serde_json::to_vec(body).ok())
        .unwrap_or_default();
    let headers = response
        .headers
        .iter()
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .collect();
    let len = bytes.len();
    Response::new(StatusCode(response.status), headers, Cursor::new(bytes), Some(len), None)
}
