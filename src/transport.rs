//! Deliver encoded messages to the target.

use std::time::Duration;
use reqwest::{blocking::Client, header::CONTENT_TYPE};

use crate::error::TransportError;

/// What the target answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers in the order they were received
    pub headers: Vec<(String, String)>,
    /// Response body, lossily decoded as UTF-8
    pub body: String,
}

impl Response {
    /// Whether the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that delivers a payload to a URL.
pub trait Runner {
    /// Send `payload` to `url`. An empty payload is not sent and yields `None`.
    fn run(&self, url: &str, payload: &[u8]) -> Result<Option<Response>, TransportError>;
}

/// POSTs payloads over HTTP.
pub struct HttpRunner {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpRunner {
    /// Create a runner. Requests wait for the target indefinitely unless a `timeout` is given.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        
        Ok(Self {
            client,
            timeout,
        })
    }
    
    /// The request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Runner for HttpRunner {
    fn run(&self, url: &str, payload: &[u8]) -> Result<Option<Response>, TransportError> {
        if payload.is_empty() {
            log::debug!("Empty payload, nothing is sent to {}", url);
            return Ok(None);
        }
        
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-protobuf")
            .body(payload.to_vec())
            .send()?;
        
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();
        let body = String::from_utf8_lossy(&response.bytes()?).into_owned();
        
        let response = Response {
            status,
            headers,
            body,
        };
        
        log::info!("Status code: {}", response.status);
        log::info!("Headers: {:?}", response.headers);
        log::info!("Response: {}", response.body);
        
        Ok(Some(response))
    }
}
