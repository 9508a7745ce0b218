#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use playscrape::envelope;
use playscrape::request::{HttpRequest, HttpResponse, HttpTransport};
use playscrape::{Client, ClientOptions, Result};
use serde_json::Value;

struct Route {
    needle: String,
    responses: VecDeque<HttpResponse>,
}

#[derive(Default)]
struct Inner {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

/// Answers requests by the first route whose needle the URL contains. The last
/// response of a route repeats; unrouted requests get a 404.
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<Inner>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, needle: &str, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        let response = HttpResponse {
            status,
            body: body.into(),
        };
        let mut inner = self.inner.lock().unwrap();
        match inner.routes.iter_mut().find(|route| route.needle == needle) {
            Some(route) => route.responses.push_back(response),
            None => inner.routes.push(Route {
                needle: needle.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, needle: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.contains(needle))
            .collect()
    }

    pub fn client(&self, options: ClientOptions) -> Client {
        Client::with_transport(self.clone(), options)
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());
        let route = inner
            .routes
            .iter_mut()
            .find(|route| request.url.contains(&route.needle));
        let response = match route {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front(),
            Some(route) => route.responses.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or(HttpResponse {
            status: 404,
            body: b"no route".to_vec(),
        }))
    }
}

/// An HTML page carrying `datasets` the way the store embeds them.
pub fn html_page(datasets: &[(&str, Value)], service_requests: Option<&str>) -> String {
    let mut html = String::from("<html><head>\n");
    for (key, data) in datasets {
        html.push_str(&format!(
            "<script nonce=\"n\">AF_initDataCallback({{key: '{key}', hash: '1', data:{data}, sideChannel: {{}}}});</script>\n"
        ));
    }
    if let Some(requests) = service_requests {
        html.push_str(&format!(
            "<script>var x = 1; var AF_dataServiceRequests = {requests}; var AF_initDataChunkQueue = [];</script>\n"
        ));
    }
    html.push_str("</head><body></body></html>");
    html
}

pub fn rpc_body(rpc_id: &str, payload: Option<&Value>) -> Vec<u8> {
    envelope::encode(rpc_id, payload)
}

/// The chunked (`rt=c`) framing, envelope on the fourth line.
pub fn chunked_body(rpc_id: &str, payload: &Value) -> Vec<u8> {
    let framed = rpc_body(rpc_id, Some(payload));
    let outer = String::from_utf8_lossy(&framed[envelope::XSSI_PREFIX.len()..]).into_owned();
    format!(")]}}'\n\n{}\n{outer}\n25\n[[\"e\",4,null,null,1]]\n", outer.len()).into_bytes()
}

/// The `f.req` entry of a form-encoded RPC request.
pub fn rpc_entry(request: &HttpRequest) -> Value {
    let body = request.body.as_deref().unwrap_or_default();
    let freq = url::form_urlencoded::parse(body.as_bytes())
        .find(|(name, _)| name == "f.req")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let outer: Value = serde_json::from_str(&freq).unwrap();
    outer[0][0].clone()
}

/// The decoded inner request of a form-encoded RPC request.
pub fn rpc_inner(request: &HttpRequest) -> Value {
    let entry = rpc_entry(request);
    serde_json::from_str(entry[1].as_str().unwrap()).unwrap()
}
