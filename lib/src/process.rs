//! Response processor (C5): classifies one populated response into a
//! fetch-loop action. Pure with respect to the model — on `Complete` it
//! only resolves which MIME type to parse with; the fetch loop (C6) drives
//! the actual parse, since that's where the model lives.

use crate::error::LodError;
use crate::fetcher::is_known_rdf_mime;
use crate::html;
use crate::response::Response;
use crate::sniff;

/// HTML-family MIME types that trigger autodiscovery instead of parsing.
const HTML_FAMILY: &[&str] = &[
    "text/html",
    "application/xhtml+xml",
    "application/vnd.wap.xhtml+xml",
    "application/vnd.ctv.xhtml+xml",
    "application/vnd.hbbtv.xhtml+xml",
];

#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx, non-empty payload, and `mime` is one of the RDF serialisations
    /// this crate knows how to parse (checked via `is_known_rdf_mime`) --
    /// the fetch loop can hand `mime`/the payload straight to the parser
    /// without a further format check of its own.
    Complete { mime: String },
    /// 3xx other than 303 with a redirect target: push onto the chain.
    Follow { target: String },
    /// 303 with a redirect target: do not push onto the chain.
    FollowReplace { target: String },
    /// HTML with a discovered autodiscovery link: always push.
    FollowLink { target: String },
    Fail(LodError),
}

fn strip_params(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}

fn is_html_family(mime: Option<&str>) -> bool {
    mime.map(|m| HTML_FAMILY.contains(&strip_params(m).to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn classify(response: &mut Response) -> FetchOutcome {
    let status = response.status();

    if (300..=399).contains(&status) {
        return match response.redirect_target() {
            Some(target) => {
                let target = target.to_string();
                if status == 303 {
                    FetchOutcome::FollowReplace { target }
                } else {
                    FetchOutcome::Follow { target }
                }
            }
            None => FetchOutcome::Fail(LodError::Transport(
                "redirect status without a Location header".to_string(),
            )),
        };
    }

    if !(200..=299).contains(&status) {
        return FetchOutcome::Fail(LodError::HttpStatus(status as u16));
    }

    let effective_uri = match response.effective_uri() {
        Some(uri) => uri.to_string(),
        None => {
            return FetchOutcome::Fail(LodError::Transport(
                "no effective URI in response".to_string(),
            ))
        }
    };

    let declared_mime = response.mime_type().map(|s| s.to_string());

    if is_html_family(declared_mime.as_deref()) {
        let body = String::from_utf8_lossy(response.payload()).into_owned();
        return match html::discover_alternate_link(&body, &effective_uri) {
            Some(target) => FetchOutcome::FollowLink { target },
            None => FetchOutcome::Fail(LodError::HtmlAutodiscoveryExhausted),
        };
    }

    if response.payload().is_empty() {
        return FetchOutcome::Fail(LodError::Transport(
            "empty payload on success status".to_string(),
        ));
    }

    if sniff::needs_sniffing(declared_mime.as_deref()) {
        return match sniff::sniff(response.payload()) {
            Some(detected) => {
                response.set_mime_type(detected);
                FetchOutcome::Complete {
                    mime: detected.to_string(),
                }
            }
            None => FetchOutcome::Fail(LodError::UnknownSerialisation),
        };
    }

    let declared_mime = declared_mime.expect("checked by needs_sniffing");
    let stripped = strip_params(&declared_mime);
    if is_known_rdf_mime(stripped) {
        FetchOutcome::Complete { mime: stripped.to_string() }
    } else {
        FetchOutcome::Fail(LodError::UnknownSerialisation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(status: u32, mime: Option<&str>, body: &[u8]) -> Response {
        let mut r = Response::new();
        r.set_status(status);
        r.set_effective_uri("http://example/doc");
        if let Some(m) = mime {
            r.set_mime_type(m);
        }
        if !body.is_empty() {
            r.append_payload(body).unwrap();
        }
        r
    }

    #[test]
    fn non_303_redirect_is_follow() {
        let mut r = response_with(302, None, b"");
        r.set_redirect_target("http://example/b");
        match process_classify(&mut r) {
            FetchOutcome::Follow { target } => assert_eq!(target, "http://example/b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn a_303_redirect_is_follow_replace() {
        let mut r = response_with(303, None, b"");
        r.set_redirect_target("http://example/b");
        match process_classify(&mut r) {
            FetchOutcome::FollowReplace { target } => assert_eq!(target, "http://example/b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn html_with_link_is_follow_link() {
        let body = br#"<link rel="alternate" type="text/turtle" href="/data.ttl">"#;
        let mut r = response_with(200, Some("text/html"), body);
        match process_classify(&mut r) {
            FetchOutcome::FollowLink { target } => assert_eq!(target, "http://example/data.ttl"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn html_without_link_fails() {
        let mut r = response_with(200, Some("text/html"), b"<html></html>");
        assert!(matches!(
            process_classify(&mut r),
            FetchOutcome::Fail(LodError::HtmlAutodiscoveryExhausted)
        ));
    }

    #[test]
    fn known_mime_is_complete() {
        let mut r = response_with(200, Some("text/turtle"), b"<http://e/> <http://p/> \"v\" .");
        match process_classify(&mut r) {
            FetchOutcome::Complete { mime } => assert_eq!(mime, "text/turtle"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn declared_mime_outside_the_known_rdf_set_fails_without_reaching_a_parser() {
        let mut r = response_with(200, Some("application/json"), b"{\"not\":\"rdf\"}");
        assert!(matches!(
            process_classify(&mut r),
            FetchOutcome::Fail(LodError::UnknownSerialisation)
        ));
    }

    #[test]
    fn unsniffable_generic_type_fails() {
        let mut r = response_with(200, Some("text/plain"), b"short body");
        assert!(matches!(
            process_classify(&mut r),
            FetchOutcome::Fail(LodError::UnknownSerialisation)
        ));
    }

    #[test]
    fn status_4xx_fails_with_status_code() {
        let mut r = response_with(404, Some("text/turtle"), b"not found");
        assert!(matches!(
            process_classify(&mut r),
            FetchOutcome::Fail(LodError::HttpStatus(404))
        ));
    }

    fn process_classify(r: &mut Response) -> FetchOutcome {
        classify(r)
    }
}
