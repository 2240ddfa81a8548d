//! HTTP and TCP probes

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Method;
use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Status and latency of a completed request
#[derive(Debug, Clone, Copy)]
pub struct HttpProbe {
    pub status: u16,
    pub elapsed: Duration,
}

/// Client for probing local services.
///
/// Redirects are not followed so a configured 3xx status can be checked,
/// and proxies are bypassed.
pub fn create_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(Policy::none())
        .no_proxy()
        .user_agent("qgate-functional-verifier")
        .build()
        .context("Failed to create HTTP client")
}

/// Issue one request and report the status code
pub fn probe_http(
    client: &Client,
    method: &str,
    url: &str,
    headers: &BTreeMap<String, String>,
    body: Option<&str>,
) -> Result<HttpProbe> {
    let method = Method::from_bytes(method.as_bytes())
        .with_context(|| format!("Invalid HTTP method: {method}"))?;

    let mut request = client.request(method, url);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = body {
        request = request.body(body.to_string());
    }

    let start = Instant::now();
    let response = request
        .send()
        .with_context(|| format!("Request to {url} failed"))?;

    Ok(HttpProbe {
        status: response.status().as_u16(),
        elapsed: start.elapsed(),
    })
}

/// True if something accepts TCP connections on `host:port`
pub fn probe_port(host: &str, port: u16, timeout: Duration) -> Result<bool> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {host}:{port}"))?
        .collect();

    Ok(addrs
        .iter()
        .any(|addr| TcpStream::connect_timeout(addr, timeout).is_ok()))
}
