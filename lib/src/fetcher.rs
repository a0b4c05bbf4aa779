//! HTTP fetch adapter (C2): given a URI and a response object, performs one
//! request and populates the response. Redirects are disabled at the
//! transport layer — following them is the fetch loop's job (C6), not the
//! adapter's.

use crate::error::LodError;
use crate::response::Response;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

pub const DEFAULT_USER_AGENT: &str = "lod/0.1 (+https://github.com/gtfierro/lod-rs)";

/// RDF serialisations this crate can parse, in preference order, paired
/// with a declared q-value on a 0-10 scale (10 maps to `;q=1.0`).
pub const DEFAULT_ACCEPT_FORMATS: &[(&str, u8)] = &[
    ("text/turtle", 10),
    ("application/trig", 8),
    ("application/n-quads", 8),
    ("application/n-triples", 8),
    ("application/rdf+xml", 7),
    ("text/n3", 5),
];

/// Whether `mime` (already stripped of any `;` parameters) names one of the
/// RDF serialisations this crate can parse. Used by the response processor
/// (C5) to decide whether a declared or sniffed MIME type is good enough to
/// call `Complete`, and by the fetch loop (C6) to pick a parser.
pub fn is_known_rdf_mime(mime: &str) -> bool {
    DEFAULT_ACCEPT_FORMATS.iter().any(|(known, _)| *known == mime)
}

/// Builds an `Accept` header from a preference-ordered list of
/// `(mime_type, q)` pairs, with a trailing `*/*;q=0.1`.
pub fn build_accept_header(formats: &[(&str, u8)]) -> String {
    let mut parts: Vec<String> = formats
        .iter()
        .map(|(mime, q)| {
            if *q >= 10 {
                format!("{mime};q=1.0")
            } else {
                format!("{mime};q=0.{q}")
            }
        })
        .collect();
    parts.push("*/*;q=0.1".to_string());
    parts.join(", ")
}

/// Contract: `fetch(uri, response) -> ok|err`. On return, regardless of
/// outcome, `response` holds at minimum a status (0 for transport failure)
/// and either an `errmsg` or enough fields to drive the response processor.
pub trait HttpFetcher {
    fn fetch(&self, uri: &str, response: &mut Response) -> Result<(), LodError>;
}

/// The default adapter: a blocking `reqwest` client with redirects disabled.
/// `Accept`/`User-Agent` headers are only set when this struct built its own
/// client; a caller-supplied client is used as-is, headers included.
pub struct ReqwestFetcher {
    client: Client,
    headers_are_default: bool,
    accept_header: String,
    user_agent: String,
}

impl ReqwestFetcher {
    pub fn new(accept_header: impl Into<String>, user_agent: impl Into<String>) -> Self {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("failed to build default HTTP client");
        Self {
            client,
            headers_are_default: true,
            accept_header: accept_header.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Wraps a caller-supplied client. No headers are set on its behalf;
    /// the caller owns that configuration.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            headers_are_default: false,
            accept_header: String::new(),
            user_agent: String::new(),
        }
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn fetch(&self, uri: &str, response: &mut Response) -> Result<(), LodError> {
        let mut builder = self.client.get(uri);
        if self.headers_are_default {
            builder = builder
                .header(reqwest::header::ACCEPT, &self.accept_header)
                .header(reqwest::header::USER_AGENT, &self.user_agent);
        }

        let resp = match builder.send() {
            Ok(r) => r,
            Err(e) => {
                response.set_status(0);
                response.set_errmsg(e.to_string());
                return Err(LodError::Transport(e.to_string()));
            }
        };

        let status = resp.status().as_u16() as u32;
        response.set_status(status);
        response.set_effective_uri(resp.url().as_str());

        if let Some(ct) = resp.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                response.set_mime_type(ct_str);
            }
        }

        if (300..=399).contains(&status) {
            if let Some(loc) = resp.headers().get(reqwest::header::LOCATION) {
                if let Ok(loc_str) = loc.to_str() {
                    response.set_redirect_target(loc_str);
                }
            }
            return Ok(());
        }

        let bytes = match resp.bytes() {
            Ok(b) => b,
            Err(e) => {
                response.set_errmsg(e.to_string());
                return Err(LodError::Transport(e.to_string()));
            }
        };
        response.append_payload(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_values_above_ten_become_one() {
        let header = build_accept_header(&[("text/turtle", 10), ("text/n3", 5)]);
        assert_eq!(header, "text/turtle;q=1.0, text/n3;q=0.5, */*;q=0.1");
    }
}
