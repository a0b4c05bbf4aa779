//! Well-known predicate URIs used by the resolver.

use oxigraph::model::NamedNodeRef;

pub const FOAF_PRIMARY_TOPIC: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://xmlns.com/foaf/0.1/primaryTopic");
