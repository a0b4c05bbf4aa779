//! HTML autodiscovery (C4): extracts the first `<link rel="alternate"
//! type="...">` pointing at an RDF serialisation. The scan is a manual
//! string walk rather than a full HTML parser, matching how this kind of
//! best-effort extraction is done elsewhere in this codebase's lineage —
//! permissive input is the point, so a strict parser buys nothing.

use url::Url;

const ALTERNATE_TYPES: &[&str] = &["text/turtle", "application/rdf+xml"];

/// Finds the first matching `<link>` element's resolved `href`, or `None`.
pub fn discover_alternate_link(html: &str, base: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut idx = 0;

    while let Some(offset) = lower[idx..].find("<link") {
        let tag_start = idx + offset;
        let after = tag_start + "<link".len();
        match lower.as_bytes().get(after) {
            Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') | Some(b'>') => {}
            _ => {
                idx = after;
                continue;
            }
        }

        let tag_end = match lower[tag_start..].find('>') {
            Some(rel) => tag_start + rel,
            None => break,
        };
        let tag = &html[tag_start..=tag_end];
        idx = tag_end + 1;

        let rel = extract_attr(tag, "rel");
        let typ = extract_attr(tag, "type");
        let href = extract_attr(tag, "href");

        if let (Some(rel), Some(typ), Some(href)) = (rel, typ, href) {
            if rel.eq_ignore_ascii_case("alternate")
                && ALTERNATE_TYPES.contains(&typ.to_ascii_lowercase().as_str())
            {
                return resolve_relative(base, &href);
            }
        }
    }

    None
}

fn extract_attr(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    for (needle, quote) in [
        (format!("{name}=\""), '"'),
        (format!("{name}='"), '\''),
    ] {
        if let Some(pos) = lower.find(&needle) {
            let value_start = pos + needle.len();
            if let Some(rel_end) = tag[value_start..].find(quote) {
                return Some(tag[value_start..value_start + rel_end].to_string());
            }
        }
    }
    None
}

fn resolve_relative(base: &str, href: &str) -> Option<String> {
    let base_url = Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_turtle_alternate() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/s.css">
            <link rel="alternate" type="text/turtle" href="/data.ttl">
            <link rel="alternate" type="application/rdf+xml" href="/data.rdf">
        </head></html>"#;
        assert_eq!(
            discover_alternate_link(html, "http://example/doc"),
            Some("http://example/data.ttl".to_string())
        );
    }

    #[test]
    fn resolves_relative_href_against_base() {
        let html = r#"<link rel="alternate" type="application/rdf+xml" href="data.rdf">"#;
        assert_eq!(
            discover_alternate_link(html, "http://example/dir/doc.html"),
            Some("http://example/dir/data.rdf".to_string())
        );
    }

    #[test]
    fn skips_elements_missing_an_attribute() {
        let html = r#"<link rel="alternate" href="/data.ttl">"#;
        assert_eq!(discover_alternate_link(html, "http://example/"), None);
    }

    #[test]
    fn ignores_unrelated_types() {
        let html = r#"<link rel="alternate" type="application/json" href="/data.json">"#;
        assert_eq!(discover_alternate_link(html, "http://example/"), None);
    }

    #[test]
    fn single_quoted_attributes_are_recognised() {
        let html = r#"<link rel='alternate' type='text/turtle' href='/data.ttl'>"#;
        assert_eq!(
            discover_alternate_link(html, "http://example/"),
            Some("http://example/data.ttl".to_string())
        );
    }
}
