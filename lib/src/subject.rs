//! Subject handle: a borrowed view onto one subject's triples in the
//! context's model (§3 "Subject handle", §6 "Subject-handle operations").
//!
//! Grounded on `original_source/instance.c` and `subject.c`, which together
//! implement the same idea with two parallel C structs and explicit
//! `lod_instance_destroy`/free calls. Rust's borrow checker makes the
//! separate alloc-tracking unnecessary: the handle borrows the context for
//! as long as it's alive, and there is nothing to explicitly destroy.

use crate::context::Context;
use crate::error::LodError;
use oxigraph::model::{GraphNameRef, NamedNode, Quad, SubjectRef};

/// All triples in the model whose subject is `subject`. Destroying this
/// value (simply letting it go out of scope) does not remove anything from
/// the model; a later `Context::locate` for the same URI still succeeds.
pub struct SubjectHandle<'a> {
    pub(crate) context: &'a Context,
    pub(crate) subject: NamedNode,
}

impl<'a> SubjectHandle<'a> {
    /// The subject node's URI.
    pub fn uri(&self) -> &str {
        self.subject.as_str()
    }

    /// Whether the model holds at least one triple about this subject.
    pub fn exists(&self) -> bool {
        self.context
            .store()
            .quads_for_pattern(
                Some(SubjectRef::NamedNode(self.subject.as_ref())),
                None,
                None,
                Some(GraphNameRef::DefaultGraph),
            )
            .next()
            .is_some()
    }

    /// The triple-pattern query `(subject = N, predicate = *, object = *)`,
    /// streamed lazily from the model.
    pub fn triples(&self) -> impl Iterator<Item = Result<Quad, LodError>> + '_ {
        self.context
            .store()
            .quads_for_pattern(
                Some(SubjectRef::NamedNode(self.subject.as_ref())),
                None,
                None,
                Some(GraphNameRef::DefaultGraph),
            )
            .map(|r| r.map_err(|e| LodError::ParseFailed(e.to_string())))
    }
}
