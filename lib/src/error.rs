//! The error taxonomy shared by every fallible operation in this crate.

use thiserror::Error;

/// Error kinds a resolution session can terminate in. Variants that carry a
/// message already hold the user-facing text, so there is no representable
/// state where an error is flagged without one (see `Context::errmsg`).
#[derive(Debug, Clone, Error)]
pub enum LodError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("too many redirects encountered")]
    TooManyRedirects,

    #[error("failed to discover link to RDF representation from HTML document")]
    HtmlAutodiscoveryExhausted,

    #[error("a <link rel=\"alternate\"> has previously been followed in this resolution session")]
    LinkAlreadyFollowed,

    #[error("failed to determine serialisation")]
    UnknownSerialisation,

    #[error("{0}")]
    ParseFailed(String),

    #[error("payload exceeds the 256 MiB limit")]
    PayloadTooLarge,

    #[error("invalid URI: {0}")]
    InvalidUri(String),
}
