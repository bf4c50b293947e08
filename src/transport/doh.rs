//! DNS-over-HTTPS client (RFC 8484)
//!
//! Queries go out as `POST` with an `application/dns-message` body carrying
//! the wire-format query; a JSON `GET` variant (`application/dns-json`) is
//! also supported for resolvers that offer it.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::dns::constants::DNSRcode;
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, build_query};
use crate::error::{DnsError, Result};

const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";
const DNS_JSON_CONTENT_TYPE: &str = "application/dns-json";

/// CNAME links followed inside a single DoH answer.
const MAX_IN_ANSWER_HOPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTPS surface the DoH client needs.
#[async_trait]
pub trait HttpsClient: Send + Sync {
    async fn post(&self, url: &str, body: Vec<u8>, headers: &[(&str, &str)])
    -> Result<HttpResponse>;

    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// [`HttpsClient`] backed by a rustls `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| DnsError::Transport(format!("Failed to build HTTPS client: {}", e)))?;
        Ok(Self { client })
    }

    async fn finish(request: reqwest::RequestBuilder, url: &str) -> Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| DnsError::Transport(format!("DoH request to {} failed: {}", url, e)))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            DnsError::Transport(format!("Failed to read DoH response from {}: {}", url, e))
        })?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl HttpsClient for ReqwestClient {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Self::finish(request, url).await
    }

    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Self::finish(request, url).await
    }
}

#[derive(Debug, Deserialize)]
struct DohJsonResponse {
    #[serde(rename = "Status")]
    status: u8,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohJsonAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohJsonAnswer {
    #[serde(rename = "type")]
    rtype: u16,
    data: String,
}

pub struct DohResolver {
    url: String,
    client: Arc<dyn HttpsClient>,
}

impl DohResolver {
    pub fn new(url: impl Into<String>, client: Arc<dyn HttpsClient>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn with_reqwest(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(url, Arc::new(ReqwestClient::new(timeout)?)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn check_status(&self, response: &HttpResponse) -> Result<()> {
        if response.status != 200 {
            return Err(DnsError::HttpStatus {
                status: response.status,
                url: self.url.clone(),
            });
        }
        Ok(())
    }

    /// Send one wire-format query and return the parsed response.
    pub async fn query(&self, name: &str, qtype: DNSResourceType) -> Result<DNSPacket> {
        // ID 0 keeps requests cache friendly (RFC 8484 §4.1)
        let query = build_query(0, name, qtype, true)?;
        debug!("Sending DoH query for {} {} to {}", name, qtype, self.url);

        let response = self
            .client
            .post(
                &self.url,
                query,
                &[
                    (CONTENT_TYPE.as_str(), DNS_MESSAGE_CONTENT_TYPE),
                    (ACCEPT.as_str(), DNS_MESSAGE_CONTENT_TYPE),
                ],
            )
            .await?;
        self.check_status(&response)?;
        trace!("DoH response of {} bytes", response.body.len());

        Ok(DNSPacket::parse_response(&response.body, 0)?)
    }

    /// Resolve `name` to one address of `qtype`, following CNAMEs in the answer.
    pub async fn resolve(&self, name: &str, qtype: DNSResourceType) -> Result<IpAddr> {
        let packet = self.query(name, qtype).await?;
        if packet.is_nxdomain() {
            return Err(DnsError::NotFound(name.to_string()));
        }
        packet
            .answer_address(name, qtype, MAX_IN_ANSWER_HOPS)
            .map(|(ip, _)| ip)
            .ok_or_else(|| DnsError::NotFound(name.to_string()))
    }

    /// JSON API variant: every address of `qtype` in the answer.
    pub async fn resolve_json(&self, name: &str, qtype: DNSResourceType) -> Result<Vec<IpAddr>> {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}name={}&type={}",
            self.url,
            separator,
            name.trim_end_matches('.'),
            qtype
        );
        debug!("Sending DoH JSON query {}", url);

        let response = self
            .client
            .get(&url, &[(ACCEPT.as_str(), DNS_JSON_CONTENT_TYPE)])
            .await?;
        self.check_status(&response)?;

        let parsed: DohJsonResponse = serde_json::from_slice(&response.body)
            .map_err(|e| DnsError::Parse(format!("Invalid DoH JSON: {}", e)))?;

        match parsed.status {
            DNSRcode::NOERROR => {}
            DNSRcode::NXDOMAIN => return Err(DnsError::NotFound(name.to_string())),
            other => {
                return Err(DnsError::Transport(format!(
                    "DoH JSON status {} for {}",
                    other, name
                )));
            }
        }

        let wanted = u16::from(qtype);
        let addresses: Vec<IpAddr> = parsed
            .answer
            .iter()
            .filter(|a| a.rtype == wanted)
            .filter_map(|a| a.data.parse().ok())
            .collect();

        if addresses.is_empty() {
            return Err(DnsError::NotFound(name.to_string()));
        }
        Ok(addresses)
    }
}
