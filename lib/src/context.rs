//! Context (C8) and the resolver façade (C7): the root scoped resource that
//! owns the model, the HTTP adapter, the subject chain, and the sticky error
//! state, plus the three entry points `locate`/`fetch`/`resolve`.
//!
//! Grounded on `original_source/context.c` (lifecycle, `lod_set_error_`'s
//! sticky-error rule, `lod_push_subject_`'s bounded arena) and
//! `original_source/resolve.c` (`lod_locate`/`lod_fetch`/`lod_resolve`'s
//! duplicate-then-reset preamble, `lod_locate_subject_`'s linear chain
//! search). Note on `subject_chain`: in the C source, `lod_locate` never
//! calls `lod_push_subject_` at all -- only the fetch loop populates
//! `context->subjects`. This crate preserves that distinction: `subject`
//! (the URI most recently handed to an entry point) is tracked separately
//! from `subject_chain` (the candidates accumulated by a fetch loop), so
//! `locate` leaves the chain empty exactly as the original does.

use crate::consts::FOAF_PRIMARY_TOPIC;
use crate::error::LodError;
use crate::fetcher::{build_accept_header, HttpFetcher, ReqwestFetcher};
use crate::config::ResolverConfig;
use crate::session;
use crate::subject::SubjectHandle;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphNameRef, NamedNode, SubjectRef, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::io::Write;

/// The three resolution modes named in §6: `FETCH_NEVER`/`FETCH_ABSENT`/
/// `FETCH_ALWAYS`. `FETCH_PRIMARY_TOPIC` is not a mode but a standing
/// toggle, carried on `ResolverConfig::follow_primary_topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Equivalent to `locate`: never touches the network.
    Never,
    /// Equivalent to `resolve`: fetches only if the subject is absent.
    Absent,
    /// Equivalent to `fetch`: always fetches.
    Always,
}

/// The root scoped resource (§3 "Context"). Not `Sync`: it owns a
/// `reqwest::blocking::Client` (via its `HttpFetcher`) and an
/// `oxigraph::store::Store`, neither of which this crate shares across
/// threads. Callers needing parallelism create independent contexts.
pub struct Context {
    store: Store,
    http: Box<dyn HttpFetcher>,
    using_default_fetcher: bool,
    config: ResolverConfig,
    /// The URI most recently handed to `locate`/`fetch`/`resolve`. Not
    /// mutated by redirects.
    subject: Option<String>,
    /// Every URI considered a candidate subject during a `fetch`/`resolve`
    /// session: the requested URI, then each non-303 redirect target and
    /// each HTML-discovered link, in encounter order. Bounded by
    /// `max_redirects`. Empty after `locate` (no fetch loop runs).
    pub(crate) subject_chain: Vec<String>,
    pub(crate) document: Option<String>,
    pub(crate) status: u32,
    error: Option<LodError>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with an in-memory model and the default
    /// `reqwest`-backed HTTP adapter.
    pub fn new() -> Self {
        Self::with_store(Store::new().expect("failed to create in-memory RDF store"))
    }

    /// Creates a context around a caller-supplied model. The context still
    /// owns this store for the purposes of `Drop`; there is no separate
    /// "externally owned, don't free" bookkeeping as in the C source --
    /// Rust's ownership model makes that distinction moot.
    pub fn with_store(store: Store) -> Self {
        let config = ResolverConfig::default();
        let http = Box::new(ReqwestFetcher::new(
            accept_header_for(&config),
            config.user_agent.clone(),
        ));
        Self {
            store,
            http,
            using_default_fetcher: true,
            config,
            subject: None,
            subject_chain: Vec::new(),
            document: None,
            status: 0,
            error: None,
        }
    }

    /// Replaces the HTTP adapter. No headers are set on the context's
    /// behalf from this point on -- the caller is responsible, matching the
    /// contract in §6.
    pub fn set_fetcher(&mut self, fetcher: Box<dyn HttpFetcher>) {
        self.http = fetcher;
        self.using_default_fetcher = false;
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.config.user_agent = user_agent.into();
        self.rebuild_default_fetcher();
    }

    pub fn set_accept_formats(&mut self, formats: Vec<(&'static str, u8)>) {
        self.config.accept_formats = formats;
        self.config.accept_header_override = None;
        self.rebuild_default_fetcher();
    }

    /// Sends `header` verbatim as `Accept` instead of one built from
    /// `accept_formats` (the CLI's `--accept` flag).
    pub fn set_accept_header(&mut self, header: impl Into<String>) {
        self.config.accept_header_override = Some(header.into());
        self.rebuild_default_fetcher();
    }

    pub fn set_max_redirects(&mut self, max_redirects: u32) {
        self.config.max_redirects = max_redirects;
    }

    pub fn set_follow_primary_topic(&mut self, follow: bool) {
        self.config.follow_primary_topic = follow;
    }

    pub fn follow_primary_topic(&self) -> bool {
        self.config.follow_primary_topic
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn rebuild_default_fetcher(&mut self) {
        if self.using_default_fetcher {
            self.http = Box::new(ReqwestFetcher::new(
                accept_header_for(&self.config),
                self.config.user_agent.clone(),
            ));
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn http(&self) -> &dyn HttpFetcher {
        self.http.as_ref()
    }

    pub(crate) fn max_redirects(&self) -> u32 {
        self.config.max_redirects
    }

    /// The URI most recently handed to an entry point (invariant: not
    /// mutated by redirects).
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The final document that contributed parsed triples, fragment
    /// stripped; `None` if no fetch has completed.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// The HTTP status of the last exchange; 0 if none occurred.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// Whether an error occurred during the last entry-point call.
    pub fn error(&self) -> bool {
        self.error.is_some()
    }

    /// The sticky error's message (only the first error between resets is
    /// retained). `None` if `error()` is `false`.
    pub fn errmsg(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Records an error, but only if none has been recorded since the last
    /// `reset` (§4.7/§7).
    pub(crate) fn set_error(&mut self, error: LodError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Clears per-resolution fields but preserves configuration and the
    /// model.
    fn reset(&mut self) {
        self.subject = None;
        self.subject_chain.clear();
        self.document = None;
        self.status = 0;
        self.error = None;
    }

    /// Appends a URI to the subject chain, refusing to exceed
    /// `max_redirects` (§4.6).
    pub(crate) fn push_subject(&mut self, uri: String) -> Result<(), LodError> {
        if self.subject_chain.len() >= self.config.max_redirects as usize {
            return Err(LodError::TooManyRedirects);
        }
        self.subject_chain.push(uri);
        Ok(())
    }

    /// Attempts to locate a subject within the model without fetching
    /// anything.
    pub fn locate(&mut self, uri: &str) -> Result<Option<SubjectHandle<'_>>, LodError> {
        let owned = uri.to_string();
        self.reset();
        self.subject = Some(owned.clone());
        self.locate_in_store(&owned)
    }

    /// Unconditionally fetches data about `uri` and parses it into the
    /// model, irrespective of whether it's already present.
    pub fn fetch(&mut self, uri: &str) -> Result<Option<SubjectHandle<'_>>, LodError> {
        let owned = uri.to_string();
        self.reset();
        self.subject = Some(owned.clone());
        session::run(self, &owned)?;
        let follow = self.config.follow_primary_topic;
        self.locate_subject_in_chain(follow)
    }

    /// Fetches only if `uri` is not already a subject in the model.
    pub fn resolve(&mut self, uri: &str) -> Result<Option<SubjectHandle<'_>>, LodError> {
        let owned = uri.to_string();
        self.reset();
        self.subject = Some(owned.clone());
        if let Some(handle) = self.locate_in_store(&owned)? {
            return Ok(Some(handle));
        }
        session::run(self, &owned)?;
        let follow = self.config.follow_primary_topic;
        self.locate_subject_in_chain(follow)
    }

    /// Dispatches to `locate`/`resolve`/`fetch` per the §6 fetch-mode
    /// bitflags (`FETCH_NEVER`/`FETCH_ABSENT`/`FETCH_ALWAYS`).
    pub fn resolve_with_mode(
        &mut self,
        uri: &str,
        mode: FetchMode,
    ) -> Result<Option<SubjectHandle<'_>>, LodError> {
        match mode {
            FetchMode::Never => self.locate(uri),
            FetchMode::Absent => self.resolve(uri),
            FetchMode::Always => self.fetch(uri),
        }
    }

    fn locate_in_store(&self, uri: &str) -> Result<Option<SubjectHandle<'_>>, LodError> {
        let node = NamedNode::new(uri).map_err(|e| LodError::InvalidUri(e.to_string()))?;
        if subject_has_triples(&self.store, &node)? {
            Ok(Some(SubjectHandle {
                context: self,
                subject: node,
            }))
        } else {
            Ok(None)
        }
    }

    /// Iterates `subject_chain` in push order; returns a handle for the
    /// first URI that has any triple in the model. If `follow_primary_topic`
    /// is set and the match has a `foaf:primaryTopic` object that is itself
    /// a subject of some triple, returns a handle for that object instead.
    fn locate_subject_in_chain(
        &self,
        follow_primary_topic: bool,
    ) -> Result<Option<SubjectHandle<'_>>, LodError> {
        for uri in &self.subject_chain {
            let node = NamedNode::new(uri).map_err(|e| LodError::InvalidUri(e.to_string()))?;
            if subject_has_triples(&self.store, &node)? {
                if follow_primary_topic {
                    if let Some(topic) = primary_topic(&self.store, &node)? {
                        return Ok(Some(SubjectHandle {
                            context: self,
                            subject: topic,
                        }));
                    }
                }
                return Ok(Some(SubjectHandle {
                    context: self,
                    subject: node,
                }));
            }
        }
        Ok(None)
    }

    /// Supplemental: SPARQL query pass-through against the session's model
    /// (grounded on `original_source/lod-util.c::perform_query`, which the
    /// distilled spec's `.q` CLI command implies but never gives a library
    /// hook for).
    pub fn query(&self, sparql: &str) -> Result<QueryResults, LodError> {
        self.store
            .query(sparql)
            .map_err(|e| LodError::ParseFailed(e.to_string()))
    }

    /// Supplemental: renders every triple about `subject` as Turtle
    /// (grounded on `lod-util.c::get_serializer`, backing the `.doc`/
    /// `.primary` CLI commands).
    pub fn serialize_subject(&self, subject: &str) -> Result<String, LodError> {
        let node = NamedNode::new(subject).map_err(|e| LodError::InvalidUri(e.to_string()))?;
        let quads = self.store.quads_for_pattern(
            Some(SubjectRef::NamedNode(node.as_ref())),
            None,
            None,
            Some(GraphNameRef::DefaultGraph),
        );
        let mut buf = Vec::new();
        {
            let mut writer = RdfSerializer::from_format(RdfFormat::Turtle).for_writer(&mut buf);
            for quad in quads {
                let quad = quad.map_err(|e| LodError::ParseFailed(e.to_string()))?;
                writer
                    .write_quad(&quad)
                    .map_err(|e| LodError::ParseFailed(e.to_string()))?;
            }
            writer.finish().map_err(|e| LodError::ParseFailed(e.to_string()))?;
        }
        String::from_utf8(buf).map_err(|e| LodError::ParseFailed(e.to_string()))
    }

    /// Supplemental: renders every triple in the model as Turtle (backs the
    /// `.dump` CLI command).
    pub fn serialize_all(&self) -> Result<String, LodError> {
        let quads =
            self.store
                .quads_for_pattern(None, None, None, Some(GraphNameRef::DefaultGraph));
        let mut buf = Vec::new();
        {
            let mut writer = RdfSerializer::from_format(RdfFormat::Turtle).for_writer(&mut buf);
            for quad in quads {
                let quad = quad.map_err(|e| LodError::ParseFailed(e.to_string()))?;
                writer
                    .write_quad(&quad)
                    .map_err(|e| LodError::ParseFailed(e.to_string()))?;
            }
            writer.finish().map_err(|e| LodError::ParseFailed(e.to_string()))?;
        }
        String::from_utf8(buf).map_err(|e| LodError::ParseFailed(e.to_string()))
    }
}

/// The `Accept` header to send: the caller's raw override if one was set,
/// otherwise one built from the preference-ordered format list (§6).
fn accept_header_for(config: &ResolverConfig) -> String {
    config
        .accept_header_override
        .clone()
        .unwrap_or_else(|| build_accept_header(&config.accept_formats))
}

pub(crate) fn subject_has_triples(store: &Store, node: &NamedNode) -> Result<bool, LodError> {
    let mut quads = store.quads_for_pattern(
        Some(SubjectRef::NamedNode(node.as_ref())),
        None,
        None,
        Some(GraphNameRef::DefaultGraph),
    );
    match quads.next() {
        Some(Ok(_)) => Ok(true),
        Some(Err(e)) => Err(LodError::ParseFailed(e.to_string())),
        None => Ok(false),
    }
}

fn primary_topic(store: &Store, subject: &NamedNode) -> Result<Option<NamedNode>, LodError> {
    let mut quads = store.quads_for_pattern(
        Some(SubjectRef::NamedNode(subject.as_ref())),
        Some(FOAF_PRIMARY_TOPIC),
        None,
        Some(GraphNameRef::DefaultGraph),
    );
    let Some(quad) = quads.next() else {
        return Ok(None);
    };
    let quad = quad.map_err(|e| LodError::ParseFailed(e.to_string()))?;
    let Term::NamedNode(topic) = quad.object else {
        return Ok(None);
    };
    if subject_has_triples(store, &topic)? {
        Ok(Some(topic))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A canned exchange for one URI, installed ahead of time.
    #[derive(Clone)]
    struct Canned {
        status: u32,
        mime: Option<&'static str>,
        redirect: Option<&'static str>,
        body: &'static str,
    }

    struct FakeFetcher {
        responses: HashMap<&'static str, Canned>,
    }

    impl FakeFetcher {
        fn new(responses: Vec<(&'static str, Canned)>) -> Self {
            Self {
                responses: responses.into_iter().collect(),
            }
        }
    }

    impl HttpFetcher for FakeFetcher {
        fn fetch(&self, uri: &str, response: &mut crate::response::Response) -> Result<(), LodError> {
            let Some(canned) = self.responses.get(uri) else {
                return Err(LodError::Transport(format!("no canned response for {uri}")));
            };
            response.set_status(canned.status);
            response.set_effective_uri(uri);
            if let Some(mime) = canned.mime {
                response.set_mime_type(mime);
            }
            if let Some(redirect) = canned.redirect {
                response.set_redirect_target(redirect);
            }
            if !canned.body.is_empty() {
                response.append_payload(canned.body.as_bytes())?;
            }
            Ok(())
        }
    }

    fn ctx_with(responses: Vec<(&'static str, Canned)>) -> Context {
        let mut ctx = Context::with_store(Store::new().unwrap());
        ctx.set_fetcher(Box::new(FakeFetcher::new(responses)));
        ctx
    }

    fn turtle(subject: &str, predicate: &str, object_literal: &str) -> String {
        format!("<{subject}> <{predicate}> \"{object_literal}\" .")
    }

    /// Property 6 (§8): after a successful resolve, `locate` for the same
    /// URI succeeds with no further network activity, and a fresh handle
    /// from a second `locate` call still sees the same triples.
    #[test]
    fn property_locate_is_idempotent_after_resolve() {
        let body = turtle("http://e/thing", "http://p/", "v");
        let mut ctx = ctx_with(vec![(
            "http://e/thing",
            Canned { status: 200, mime: Some("text/turtle"), redirect: None, body: Box::leak(body.into_boxed_str()) },
        )]);

        ctx.resolve("http://e/thing").unwrap().unwrap();

        let first = ctx.locate("http://e/thing").unwrap().unwrap();
        assert!(first.exists());
        drop(first);

        let second = ctx.locate("http://e/thing").unwrap().unwrap();
        assert!(second.exists());
    }

    /// Property 7 (§8): only the first of several errors recorded between
    /// resets is retained.
    #[test]
    fn property_set_error_keeps_only_the_first() {
        let mut ctx = ctx_with(vec![]);
        ctx.set_error(LodError::TooManyRedirects);
        ctx.set_error(LodError::UnknownSerialisation);
        assert_eq!(
            ctx.errmsg().as_deref(),
            Some("too many redirects encountered")
        );
    }

    /// A later successful entry-point call resets the sticky error from an
    /// earlier failed one, since every entry point resets implicitly.
    #[test]
    fn property_error_is_cleared_by_the_next_entry_point_call() {
        let body = turtle("http://e/thing", "http://p/", "v");
        let mut ctx = ctx_with(vec![(
            "http://e/thing",
            Canned { status: 200, mime: Some("text/turtle"), redirect: None, body: Box::leak(body.into_boxed_str()) },
        )]);

        let _ = ctx.fetch("http://e/missing-first");
        assert!(ctx.error());

        ctx.fetch("http://e/thing").unwrap();
        assert!(!ctx.error());
        assert_eq!(ctx.errmsg(), None);
    }

    /// Property 8 (§8): the subject-chain search returns the FIRST chain
    /// entry with triples, even when a later entry also has triples.
    #[test]
    fn property_chain_search_prefers_earlier_subject() {
        // U0 redirects (302, chain-extending) to U1, which redirects to U2,
        // which serves Turtle describing U2 itself. We then separately seed
        // the model with a triple about U1 so that both U1 and U2 are
        // present; U0 has none. The chain order is [U0, U1, U2], so the
        // search must prefer U1 over U2.
        let body_u2 = turtle("http://e/u2", "http://p/", "v2");
        let mut ctx = ctx_with(vec![
            ("http://e/u0", Canned { status: 302, mime: None, redirect: Some("http://e/u1"), body: "" }),
            ("http://e/u1", Canned { status: 302, mime: None, redirect: Some("http://e/u2"), body: "" }),
            ("http://e/u2", Canned { status: 200, mime: Some("text/turtle"), redirect: None, body: Box::leak(body_u2.into_boxed_str()) }),
        ]);

        // Seed a triple about U1 directly, before resolving, so it's present
        // in the model without ever being the final fetched document.
        let seed = turtle("http://e/u1", "http://p/", "v1");
        let parser = oxigraph::io::RdfParser::from_format(oxigraph::io::RdfFormat::Turtle)
            .with_base_iri("http://e/u1")
            .unwrap();
        ctx.store()
            .load_from_reader(parser, seed.as_bytes())
            .unwrap();

        let handle = ctx.fetch("http://e/u0").unwrap().unwrap();
        assert_eq!(handle.uri(), "http://e/u1");
    }

    /// Property 9 (§8): with `follow_primary_topic` set, resolving a
    /// document whose triples include `<Doc> foaf:primaryTopic <Thing>` and
    /// `<Thing> rdfs:label "x"` returns a handle whose subject is `<Thing>`.
    #[test]
    fn property_primary_topic_indirection() {
        let body = format!(
            "<http://e/doc> <{}> <http://e/thing> .\n<http://e/thing> <http://www.w3.org/2000/01/rdf-schema#label> \"x\" .",
            FOAF_PRIMARY_TOPIC.as_str()
        );
        let mut ctx = ctx_with(vec![(
            "http://e/doc",
            Canned { status: 200, mime: Some("text/turtle"), redirect: None, body: Box::leak(body.into_boxed_str()) },
        )]);
        ctx.set_follow_primary_topic(true);

        let handle = ctx.resolve("http://e/doc").unwrap().unwrap();
        assert_eq!(handle.uri(), "http://e/thing");
    }

    /// `locate` never touches the network, even when the subject is absent.
    #[test]
    fn locate_never_invokes_the_fetcher() {
        let mut ctx = ctx_with(vec![]);
        let result = ctx.locate("http://e/absent").unwrap();
        assert!(result.is_none());
        assert!(!ctx.error());
    }
}
