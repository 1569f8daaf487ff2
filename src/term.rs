//! Concrete RDF terms and quads, as consumed by the canonicalization
//! algorithm.
//!
//! Unlike a full RDF toolkit, this crate does not abstract terms behind
//! traits: canonicalization only ever sees IRIs, blank nodes, literals and
//! the default graph, so a plain enum is all that is needed.

/// The IRI identifying the `xsd:string` datatype.
///
/// Literals with this datatype are serialized without a datatype suffix.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// The IRI identifying the `rdf:langString` datatype,
/// implied by any language-tagged literal.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// A single RDF term.
///
/// Blank node labels are stored *without* the `_:` prefix;
/// the prefix belongs to the concrete N-Quads syntax and is added back
/// by the serializer.
#[derive(Clone, Debug)]
pub enum Term {
    /// An IRI (called "named node" in some toolkits).
    Iri(Box<str>),
    /// A blank node, identified by its label (without the leading `_:`).
    BlankNode(Box<str>),
    /// A literal.
    Literal {
        /// The lexical form.
        value: Box<str>,
        /// The datatype IRI ([`XSD_STRING`] for plain literals).
        datatype: Box<str>,
        /// The language tag, if any.
        ///
        /// Compared case-insensitively, but preserved verbatim when
        /// serializing.
        language: Option<Box<str>>,
    },
    /// The default graph; only meaningful as the graph component of a
    /// [`Quad`].
    DefaultGraph,
}

impl Term {
    /// Build an IRI term.
    pub fn iri(value: impl Into<Box<str>>) -> Self {
        Term::Iri(value.into())
    }

    /// Build a blank node term from its label (without the leading `_:`).
    pub fn bnode(label: impl Into<Box<str>>) -> Self {
        Term::BlankNode(label.into())
    }

    /// Build a literal term with the given datatype and no language tag.
    pub fn literal(value: impl Into<Box<str>>, datatype: impl Into<Box<str>>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Build a language-tagged literal term
    /// (its datatype is always [`RDF_LANG_STRING`]).
    pub fn literal_lang(value: impl Into<Box<str>>, tag: impl Into<Box<str>>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: RDF_LANG_STRING.into(),
            language: Some(tag.into()),
        }
    }

    /// Whether this term is a blank node.
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// The blank node label of this term, if it is a blank node.
    pub fn bnode_id(&self) -> Option<&str> {
        match self {
            Term::BlankNode(label) => Some(label),
            _ => None,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        use Term::{BlankNode, DefaultGraph, Iri, Literal};
        match (self, other) {
            (Iri(i1), Iri(i2)) => i1 == i2,
            (BlankNode(b1), BlankNode(b2)) => b1 == b2,
            (
                Literal {
                    value: v1,
                    datatype: d1,
                    language: l1,
                },
                Literal {
                    value: v2,
                    datatype: d2,
                    language: l2,
                },
            ) => {
                v1 == v2
                    && d1 == d2
                    && match (l1, l2) {
                        (None, None) => true,
                        // language tags are compared case-insensitively
                        (Some(t1), Some(t2)) => t1.eq_ignore_ascii_case(t2),
                        _ => false,
                    }
            }
            (DefaultGraph, DefaultGraph) => true,
            _ => false,
        }
    }
}

impl Eq for Term {}

/// An RDF quad: subject, predicate, object and graph.
///
/// Subject must be an IRI or blank node, predicate an IRI,
/// object an IRI, blank node or literal, and graph an IRI, blank node or
/// [`Term::DefaultGraph`]. These constraints are enforced by the N-Quads
/// serializer rather than by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quad {
    /// The subject.
    pub s: Term,
    /// The predicate.
    pub p: Term,
    /// The object.
    pub o: Term,
    /// The graph name, or [`Term::DefaultGraph`].
    pub g: Term,
}

impl Quad {
    /// Build a quad in the default graph.
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Quad {
            s,
            p,
            o,
            g: Term::DefaultGraph,
        }
    }

    /// Build a quad in the given graph.
    pub fn new_in_graph(s: Term, p: Term, o: Term, g: Term) -> Self {
        Quad { s, p, o, g }
    }
}
