//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

use crate::forward::transport::{
    OutboundRequest, RedirectMode, Transport, TransportError, UpstreamResponse,
};

/// What the mock saw for one fetch.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub redirect: RedirectMode,
}

enum Scripted {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    Failure(String),
}

/// Returns scripted responses in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn respond(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        self.script.lock().unwrap().push_back(Scripted::Response {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        });
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn fetch(
        &self,
        request: OutboundRequest,
        redirect: RedirectMode,
    ) -> Result<UpstreamResponse, TransportError> {
        self.seen.lock().unwrap().push(RecordedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
            redirect,
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response {
                status,
                headers,
                body,
            }) => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.append(
                        HeaderName::from_bytes(name.as_bytes()).unwrap(),
                        HeaderValue::from_str(&value).unwrap(),
                    );
                }
                Ok(UpstreamResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers: map,
                    body: Body::from(body),
                })
            }
            Some(Scripted::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("no scripted response left")),
        }
    }
}
