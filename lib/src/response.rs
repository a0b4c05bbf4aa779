//! The reusable per-hop response object (C1).

use crate::error::LodError;

/// Growth quantum for the payload buffer, in bytes.
const PAYLOAD_QUANTUM: usize = 512;
/// Hard cap on a single response's payload.
const PAYLOAD_MAX: usize = 256 * 1024 * 1024;

/// One HTTP exchange's outputs. Created once per fetch loop and reset
/// between hops so the payload's allocated capacity can be reused.
#[derive(Debug, Default)]
pub struct Response {
    status: u32,
    effective_uri: Option<String>,
    redirect_target: Option<String>,
    mime_type: Option<String>,
    payload: Vec<u8>,
    errmsg: Option<String>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes status, clears all strings, and truncates the payload length
    /// without necessarily releasing its capacity.
    pub fn reset(&mut self) {
        self.status = 0;
        self.effective_uri = None;
        self.redirect_target = None;
        self.mime_type = None;
        self.errmsg = None;
        self.payload.clear();
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn set_status(&mut self, status: u32) {
        self.status = status;
    }

    pub fn effective_uri(&self) -> Option<&str> {
        self.effective_uri.as_deref()
    }

    /// Strips any `#...` suffix before storage.
    pub fn set_effective_uri(&mut self, uri: &str) {
        let stripped = match uri.find('#') {
            Some(idx) => &uri[..idx],
            None => uri,
        };
        self.effective_uri = Some(stripped.to_string());
    }

    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect_target.as_deref()
    }

    /// Assigns the redirect target only; `effective_uri` is left untouched.
    pub fn set_redirect_target(&mut self, target: &str) {
        self.redirect_target = Some(target.to_string());
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn set_mime_type(&mut self, mime: &str) {
        self.mime_type = Some(mime.to_string());
    }

    pub fn errmsg(&self) -> Option<&str> {
        self.errmsg.as_deref()
    }

    pub fn set_errmsg(&mut self, msg: impl Into<String>) {
        self.errmsg = Some(msg.into());
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Grows the buffer in 512-byte quanta; exceeding the 256 MiB cap sets
    /// the response's error and reports failure so the adapter aborts the
    /// transfer rather than continuing to buffer.
    pub fn append_payload(&mut self, bytes: &[u8]) -> Result<(), LodError> {
        let needed = self.payload.len() + bytes.len();
        if needed > PAYLOAD_MAX {
            self.set_errmsg("payload exceeds the 256 MiB limit");
            return Err(LodError::PayloadTooLarge);
        }
        if self.payload.capacity() < needed {
            let quanta = needed / PAYLOAD_QUANTUM + 1;
            let target_capacity = quanta * PAYLOAD_QUANTUM;
            self.payload.reserve(target_capacity - self.payload.len());
        }
        self.payload.extend_from_slice(bytes);
        Ok(())
    }
}
