//! The fetch loop (C6): drives one or more HTTP hops from a starting URI
//! to a parsed document, pushing every candidate subject it encounters
//! onto the context's subject chain.
//!
//! Grounded on `original_source/fetch.c::lod_fetch_`: push the starting
//! URI first, save its fragment, loop up to `max_redirects` hops resetting
//! the response each time, splice the saved fragment onto non-303 redirect
//! targets (303 replaces the chain's head instead of extending it and
//! drops the fragment), and apply the one-shot HTML-autodiscovery guard
//! before giving up and reporting "too many redirects".

use crate::context::Context;
use crate::error::LodError;
use crate::process::{self, FetchOutcome};
use crate::response::Response;
use oxigraph::io::{RdfFormat, RdfParser};

/// Appends `fragment` (the `#...` suffix, including the `#`) to `target`,
/// overwriting any fragment `target` already carries.
fn splice_fragment(target: &str, fragment: Option<&str>) -> String {
    let Some(fragment) = fragment else {
        return target.to_string();
    };
    match target.find('#') {
        Some(idx) => format!("{}{}", &target[..idx], fragment),
        None => format!("{target}{fragment}"),
    }
}

fn mime_to_format(mime: &str) -> Result<RdfFormat, LodError> {
    match mime {
        "text/turtle" => Ok(RdfFormat::Turtle),
        "application/trig" => Ok(RdfFormat::TriG),
        "application/n-quads" => Ok(RdfFormat::NQuads),
        "application/n-triples" => Ok(RdfFormat::NTriples),
        "application/rdf+xml" => Ok(RdfFormat::RdfXml),
        "text/n3" => Ok(RdfFormat::N3),
        other => Err(LodError::ParseFailed(format!(
            "no parser registered for {other}"
        ))),
    }
}

fn parse_into_store(
    ctx: &Context,
    base_uri: &str,
    mime: &str,
    payload: &[u8],
) -> Result<(), LodError> {
    let format = mime_to_format(mime)?;
    let parser = RdfParser::from_format(format)
        .with_base_iri(base_uri)
        .map_err(|e| LodError::ParseFailed(e.to_string()))?;
    ctx.store()
        .load_from_reader(parser, payload)
        .map_err(|e| LodError::ParseFailed(e.to_string()))
}

/// Runs the bounded hop loop starting from `start_uri`, leaving
/// `ctx.document` set to the final document on success and `ctx.status` set
/// to its HTTP status. Every candidate subject considered along the way
/// (the start URI, non-303 redirect targets, and discovered autodiscovery
/// links) is pushed onto `ctx.subject_chain` in encounter order.
pub(crate) fn run(ctx: &mut Context, start_uri: &str) -> Result<(), LodError> {
    ctx.push_subject(start_uri.to_string())?;

    let fragment = start_uri.find('#').map(|idx| start_uri[idx..].to_string());

    let mut current = start_uri.to_string();
    let mut response = Response::new();
    let mut followed_link = false;
    let max_hops = ctx.max_redirects();

    for _hop in 0..max_hops {
        response.reset();

        if let Err(e) = ctx.http().fetch(&current, &mut response) {
            ctx.status = response.status();
            ctx.set_error(e.clone());
            return Err(e);
        }
        ctx.status = response.status();

        match process::classify(&mut response) {
            FetchOutcome::Complete { mime } => {
                let doc = response
                    .effective_uri()
                    .ok_or_else(|| {
                        LodError::Transport("no effective URI in response".to_string())
                    })?
                    .to_string();
                parse_into_store(ctx, &doc, &mime, response.payload())?;
                ctx.document = Some(doc);
                return Ok(());
            }
            FetchOutcome::Follow { target } => {
                let spliced = splice_fragment(&target, fragment.as_deref());
                ctx.push_subject(spliced.clone())?;
                current = spliced;
            }
            FetchOutcome::FollowReplace { target } => {
                // 303: the target replaces the chain's head rather than
                // extending it, and the fragment is not carried over.
                current = target;
            }
            FetchOutcome::FollowLink { target } => {
                if followed_link {
                    let err = LodError::LinkAlreadyFollowed;
                    ctx.set_error(err.clone());
                    return Err(err);
                }
                followed_link = true;
                ctx.push_subject(target.clone())?;
                current = target;
            }
            FetchOutcome::Fail(e) => {
                ctx.set_error(e.clone());
                return Err(e);
            }
        }
    }

    let err = LodError::TooManyRedirects;
    ctx.set_error(err.clone());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_spliced_onto_redirect_target_without_one() {
        assert_eq!(
            splice_fragment("http://example/b", Some("#frag")),
            "http://example/b#frag"
        );
    }

    #[test]
    fn fragment_overwrites_existing_fragment_on_target() {
        assert_eq!(
            splice_fragment("http://example/b#other", Some("#frag")),
            "http://example/b#frag"
        );
    }

    #[test]
    fn no_fragment_leaves_target_untouched() {
        assert_eq!(splice_fragment("http://example/b", None), "http://example/b");
    }
}
