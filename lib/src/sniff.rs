//! Content sniffer (C3): last-resort MIME-type guessing from a payload's
//! leading bytes, used only when the declared type is missing or generic.

/// Declared MIME types generic enough that sniffing should still run.
const GENERIC_FALLBACKS: &[&str] = &["text/plain", "application/octet-stream", "application/x-unknown"];

/// Whether the declared MIME type (if any) is specific enough to skip
/// sniffing, or is missing/generic and needs it.
pub fn needs_sniffing(mime: Option<&str>) -> bool {
    match mime {
        None => true,
        Some(m) => {
            let base = m.split(';').next().unwrap_or(m).trim();
            GENERIC_FALLBACKS.contains(&base)
        }
    }
}

/// Guesses an RDF serialisation from a payload's leading bytes. Rules,
/// applied in order after skipping leading whitespace:
///
/// 1. fewer than 128 bytes remaining: unknown (do not guess).
/// 2. prefix begins `<!` or `<?`: `application/rdf+xml`.
/// 3. prefix begins `@base`, `@prefix`, or `<http`: `text/turtle`.
/// 4. otherwise: unknown.
pub fn sniff(payload: &[u8]) -> Option<&'static str> {
    let mut start = 0;
    while start < payload.len() && payload[start].is_ascii_whitespace() {
        start += 1;
    }
    let trimmed = &payload[start..];

    if trimmed.len() < 128 {
        return None;
    }

    if trimmed.starts_with(b"<!") || trimmed.starts_with(b"<?") {
        return Some("application/rdf+xml");
    }

    if trimmed.starts_with(b"@base") || trimmed.starts_with(b"@prefix") || trimmed.starts_with(b"<http") {
        return Some("text/turtle");
    }

    None
}
