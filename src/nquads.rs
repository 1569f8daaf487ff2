//! Canonical N-Quads serialization.
//!
//! Canonicalization compares and hashes quads through their N-Quads
//! rendering, so this serializer must be byte-exact:
//! IRIs as `<iri>`, literals with the `xsd:string` datatype elided,
//! blank nodes as `_:label`, the default graph omitted,
//! one quad per `\n`-terminated line.

use crate::term::{Quad, Term, XSD_STRING};
use crate::C14nError;

/// Serialize `quad` as a single canonical N-Quads line, `\n`-terminated.
///
/// Fails with [`C14nError::Serialization`] if a term is not admissible in
/// its position (e.g. a literal used as predicate).
pub fn serialize_quad(quad: &Quad) -> Result<String, C14nError> {
    check_quad(quad)?;
    let mut line = String::new();
    write_term(&quad.s, &mut line)?;
    write_term(&quad.p, &mut line)?;
    write_term(&quad.o, &mut line)?;
    if !matches!(quad.g, Term::DefaultGraph) {
        write_term(&quad.g, &mut line)?;
    }
    line.push_str(".\n");
    Ok(line)
}

/// Check that every component of `quad` is admissible in its position.
pub(crate) fn check_quad(quad: &Quad) -> Result<(), C14nError> {
    use Term::{BlankNode, DefaultGraph, Iri, Literal};
    match quad.s {
        Iri(_) | BlankNode(_) => {}
        _ => {
            return Err(C14nError::Serialization(
                "subject must be an IRI or blank node".into(),
            ))
        }
    }
    match quad.p {
        Iri(_) => {}
        _ => {
            return Err(C14nError::Serialization(
                "predicate must be an IRI".into(),
            ))
        }
    }
    match quad.o {
        Iri(_) | BlankNode(_) | Literal { .. } => {}
        _ => {
            return Err(C14nError::Serialization(
                "object must be an IRI, blank node or literal".into(),
            ))
        }
    }
    match quad.g {
        Iri(_) | BlankNode(_) | DefaultGraph => {}
        _ => {
            return Err(C14nError::Serialization(
                "graph must be an IRI, blank node or the default graph".into(),
            ))
        }
    }
    Ok(())
}

/// Write one term into `buffer`, followed by a single space.
pub(crate) fn write_term(term: &Term, buffer: &mut String) -> Result<(), C14nError> {
    match term {
        Term::Iri(iri) => {
            buffer.push('<');
            buffer.push_str(iri);
            buffer.push('>');
        }
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            buffer.push('"');
            escape_into(value, buffer);
            buffer.push('"');
            if let Some(tag) = language {
                buffer.push('@');
                buffer.push_str(tag);
            } else if &**datatype != XSD_STRING {
                buffer.push_str("^^<");
                buffer.push_str(datatype);
                buffer.push('>');
            }
        }
        Term::BlankNode(label) => {
            buffer.push_str("_:");
            buffer.push_str(label);
        }
        Term::DefaultGraph => {
            return Err(C14nError::Serialization(
                "the default graph has no term representation".into(),
            ))
        }
    }
    buffer.push(' ');
    Ok(())
}

fn escape_into(value: &str, buffer: &mut String) {
    for c in value.chars() {
        match c {
            '"' => buffer.push_str("\\\""),
            '\\' => buffer.push_str("\\\\"),
            '\n' => buffer.push_str("\\n"),
            '\r' => buffer.push_str("\\r"),
            _ => buffer.push(c),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn nq(term: &Term) -> String {
        let mut buffer = String::new();
        write_term(term, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn iri_term() {
        assert_eq!(nq(&Term::iri("http://example.org/a")), "<http://example.org/a> ");
    }

    #[test]
    fn blank_node_term() {
        assert_eq!(nq(&Term::bnode("b0")), "_:b0 ");
    }

    #[test]
    fn plain_literal_elides_xsd_string() {
        assert_eq!(nq(&Term::literal("hello", XSD_STRING)), "\"hello\" ");
    }

    #[test]
    fn typed_literal_keeps_datatype() {
        let t = Term::literal("42", "http://www.w3.org/2001/XMLSchema#integer");
        assert_eq!(
            nq(&t),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer> "
        );
    }

    #[test]
    fn language_tagged_literal() {
        // the tag is preserved verbatim, even though comparison ignores case
        assert_eq!(nq(&Term::literal_lang("chat", "FR")), "\"chat\"@FR ");
    }

    #[test_case("say \"hi\"", "\"say \\\"hi\\\"\" "; "double quote")]
    #[test_case("a\\b", "\"a\\\\b\" "; "backslash")]
    #[test_case("line1\nline2", "\"line1\\nline2\" "; "newline")]
    #[test_case("a\rb", "\"a\\rb\" "; "carriage return")]
    #[test_case("tab\there", "\"tab\there\" "; "tab is not escaped")]
    fn literal_escapes(value: &str, expected: &str) {
        assert_eq!(nq(&Term::literal(value, XSD_STRING)), expected);
    }

    #[test]
    fn quad_in_default_graph() {
        let q = Quad::new(
            Term::bnode("s"),
            Term::iri("tag:p"),
            Term::literal("o", XSD_STRING),
        );
        assert_eq!(serialize_quad(&q).unwrap(), "_:s <tag:p> \"o\" .\n");
    }

    #[test]
    fn quad_in_named_graph() {
        let q = Quad::new_in_graph(
            Term::iri("tag:s"),
            Term::iri("tag:p"),
            Term::iri("tag:o"),
            Term::bnode("g"),
        );
        assert_eq!(serialize_quad(&q).unwrap(), "<tag:s> <tag:p> <tag:o> _:g .\n");
    }

    #[test_case(Quad::new(Term::literal("s", XSD_STRING), Term::iri("tag:p"), Term::iri("tag:o")); "literal subject")]
    #[test_case(Quad::new(Term::DefaultGraph, Term::iri("tag:p"), Term::iri("tag:o")); "default graph subject")]
    #[test_case(Quad::new(Term::iri("tag:s"), Term::bnode("p"), Term::iri("tag:o")); "blank predicate")]
    #[test_case(Quad::new(Term::iri("tag:s"), Term::iri("tag:p"), Term::DefaultGraph); "default graph object")]
    #[test_case(Quad::new_in_graph(Term::iri("tag:s"), Term::iri("tag:p"), Term::iri("tag:o"), Term::literal("g", XSD_STRING)); "literal graph")]
    fn malformed_quads_are_rejected(q: Quad) {
        assert!(matches!(
            serialize_quad(&q),
            Err(C14nError::Serialization(_))
        ));
    }
}
