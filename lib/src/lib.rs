//! A follow-your-nose Linked Data resolver: given a URI, negotiates content
//! over HTTP, follows redirects and HTML autodiscovery links, and parses
//! whatever RDF serialisation it finds into an in-memory model.
//!
//! The public surface is [`Context`], which owns the model and the HTTP
//! adapter and exposes [`Context::locate`], [`Context::fetch`], and
//! [`Context::resolve`] as the three ways to ask for a subject.

pub mod config;
pub mod consts;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod response;
pub mod subject;

mod html;
mod process;
mod session;
mod sniff;

pub use context::{Context, FetchMode};
pub use error::LodError;
pub use fetcher::{HttpFetcher, ReqwestFetcher};
pub use response::Response;
pub use subject::SubjectHandle;

use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Initialises `env_logger` from `LOD_LOG`, falling back to `RUST_LOG`, and
/// then to `warn`. Safe to call more than once; only the first call takes
/// effect.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        let filter = std::env::var("LOD_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());
        env_logger::Builder::new().parse_filters(&filter).init();
    });
}
