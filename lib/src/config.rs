//! Per-session configuration (§2.3). There is no on-disk configuration file
//! and no cross-run persistence; a `ResolverConfig` is a plain struct built
//! with `Default` and mutated through `Context`'s setters, in the same
//! spirit as the teacher's hand-rolled `ConfigBuilder` (not its unused
//! `derive_builder` macro).

use crate::fetcher::{DEFAULT_ACCEPT_FORMATS, DEFAULT_USER_AGENT};

/// Formats accepted by the resolver's default `Accept` header, in
/// preference order, paired with a declared q-value on a 0-10 scale.
pub type AcceptFormats = Vec<(&'static str, u8)>;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bound on both the fetch loop's hop count and the subject chain's
    /// length (§4.6/§5). Default 32.
    pub max_redirects: u32,
    pub user_agent: String,
    pub accept_formats: AcceptFormats,
    /// A raw `Accept` header that, when set, is sent verbatim instead of one
    /// built from `accept_formats` (e.g. `--accept` on the CLI).
    pub accept_header_override: Option<String>,
    /// Whether `fetch`/`resolve`'s chain search re-indirects through
    /// `foaf:primaryTopic` once a candidate subject is found (§4.7).
    pub follow_primary_topic: bool,
    /// Diagnostic toggle; when set, the CLI raises its log level to debug.
    pub verbose: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_redirects: 32,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_formats: DEFAULT_ACCEPT_FORMATS.to_vec(),
            accept_header_override: None,
            follow_primary_topic: false,
            verbose: false,
        }
    }
}
