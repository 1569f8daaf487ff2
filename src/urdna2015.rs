//! Implementation of the URDNA2015 canonicalization algorithm described at:
//!
//!   <https://json-ld.github.io/rdf-dataset-canonicalization/spec/>
//!
//! Blank nodes are first bucketed by a hash of their immediate
//! neighbourhood (first-degree hash); nodes still sharing a bucket are then
//! disambiguated by recursively hashing their relation paths (deep hash),
//! selecting the lexicographically smallest path over all permutations of
//! the related nodes.

use std::collections::btree_map::Entry::{Occupied, Vacant};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::rc::Rc;

use crate::_permutation::Permutator;
use crate::hash::{hex, HashFunction, Sha256, Sha384};
use crate::nquads;
use crate::term::{Quad, Term};
use crate::C14nError;

/// Map from original blank node label to canonical label
/// (both without the leading `_:`), as returned by [`relabel`].
pub type C14nIdMap = BTreeMap<Rc<str>, Rc<str>>;

/// Write into `w` the canonical N-Quads representation of `dataset`:
/// blank nodes are relabeled with SHA-256-derived canonical labels and the
/// resulting lines are sorted in code point order.
///
/// See also [`normalize_with`].
pub fn normalize<W: io::Write>(dataset: &[Quad], w: W) -> Result<(), C14nError> {
    normalize_with::<Sha256, W>(dataset, w, None)
}

/// Write into `w` the canonical N-Quads representation of `dataset`,
/// relabeling blank nodes with SHA-384 instead of SHA-256.
///
/// See also [`normalize_with`].
pub fn normalize_sha384<W: io::Write>(dataset: &[Quad], w: W) -> Result<(), C14nError> {
    normalize_with::<Sha384, W>(dataset, w, None)
}

/// Write into `w` the canonical N-Quads representation of `dataset`,
/// using the [hash function](HashFunction) `H` and capping deep hashing at
/// `max_deep_iterations` recursive iterations (`None` for no cap).
///
/// See also [`normalize`], [`relabel_with`].
pub fn normalize_with<H: HashFunction, W: io::Write>(
    dataset: &[Quad],
    mut w: W,
    max_deep_iterations: Option<usize>,
) -> Result<(), C14nError> {
    let (quads, _) = relabel_with::<H>(dataset, max_deep_iterations)?;
    for line in sorted_nquad_lines(&quads)? {
        w.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Return a copy of `dataset` whose blank nodes bear canonical labels,
/// paired with the map from original to canonical labels.
///
/// This calls [`relabel_with`] with SHA-256 and no deep-iteration cap.
pub fn relabel(dataset: &[Quad]) -> Result<(Vec<Quad>, C14nIdMap), C14nError> {
    relabel_with::<Sha256>(dataset, None)
}

/// Return a copy of `dataset` whose blank nodes bear canonical labels,
/// paired with the map from original to canonical labels.
///
/// The input is never mutated; quads are returned in input order
/// (sorting belongs to the serialization step, see [`normalize_with`]).
///
/// `max_deep_iterations` caps the number of *recursive* deep hashing
/// iterations performed over the whole canonicalization; when the cap is
/// exceeded the canonicalization fails with
/// [`C14nError::DeepIterationsExceeded`]. `None` means unbounded;
/// `Some(1)` is recommended for untrusted input, and rejects any dataset
/// whose blank nodes cannot be distinguished by their immediate
/// neighbourhood alone.
pub fn relabel_with<H: HashFunction>(
    dataset: &[Quad],
    max_deep_iterations: Option<usize>,
) -> Result<(Vec<Quad>, C14nIdMap), C14nError> {
    let mut state = C14nState::<H>::new(max_deep_iterations);

    // Index every blank node occurrence. A node appearing k times across
    // quad components is listed k times; predicates are never considered
    // (they cannot be blank, which check_quad enforces).
    for quad in dataset {
        nquads::check_quad(quad)?;
        for term in [&quad.s, &quad.o, &quad.g] {
            if let Term::BlankNode(label) = term {
                state.b2q.entry(Rc::from(&**label)).or_default().push(quad);
            }
        }
    }
    let mut non_normalized: BTreeSet<Rc<str>> = state.b2q.keys().cloned().collect();

    // Simple labeling: repeatedly hash the remaining nodes and give
    // canonical labels to those with a unique hash, in hash order.
    // First-degree hashes never change, so the loop settles after the first
    // pass that issues nothing; the b2h cache makes later passes cheap.
    let mut hash_to_blank_nodes: BTreeMap<H::Output, Vec<Rc<str>>> = BTreeMap::new();
    let mut simple = true;
    while simple {
        simple = false;
        hash_to_blank_nodes.clear();
        for id in &non_normalized {
            let hash = state.hash_first_degree_quads(id)?;
            hash_to_blank_nodes.entry(hash).or_default().push(Rc::clone(id));
        }
        let mut next = BTreeMap::new();
        for (hash, ids) in std::mem::take(&mut hash_to_blank_nodes) {
            if ids.len() == 1 {
                state.canonical.issue(&ids[0]);
                non_normalized.remove(&ids[0]);
                simple = true;
            } else {
                next.insert(hash, ids);
            }
        }
        hash_to_blank_nodes = next;
    }

    // Complex labeling: disambiguate each shared-hash bucket through deep
    // hashing, then promote the temporary labels in deep-hash order.
    for ids in hash_to_blank_nodes.values() {
        let mut hash_path_list: Vec<(H::Output, IdentifierIssuer)> = Vec::new();
        for id in ids {
            // a previous bucket's promotion may already have reached this node
            if state.canonical.has(id) {
                continue;
            }
            let mut issuer = IdentifierIssuer::new("b");
            issuer.issue(id);
            hash_path_list.push(state.hash_n_degree_quads(id, &issuer, 0)?);
        }
        hash_path_list.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, issuer) in hash_path_list {
            for existing in issuer.issued_in_order() {
                state.canonical.issue(existing);
            }
        }
    }

    // Every blank node now has a canonical label; rewrite copies of the
    // input quads accordingly.
    let issued = state.canonical.issued;
    let convert = |term: &Term| -> Result<Term, C14nError> {
        if let Term::BlankNode(label) = term {
            let canon_id = issued.get(&**label).ok_or_else(|| {
                C14nError::InternalInvariant(format!(
                    "blank node _:{label} received no canonical label"
                ))
            })?;
            Ok(Term::BlankNode((&**canon_id).into()))
        } else {
            Ok(term.clone())
        }
    };
    let quads = dataset
        .iter()
        .map(|quad| {
            Ok(Quad {
                s: convert(&quad.s)?,
                p: quad.p.clone(),
                o: convert(&quad.o)?,
                g: convert(&quad.g)?,
            })
        })
        .collect::<Result<Vec<_>, C14nError>>()?;
    Ok((quads, issued))
}

/// Serialize `quads` and sort the lines in code point order.
pub(crate) fn sorted_nquad_lines(quads: &[Quad]) -> Result<Vec<String>, C14nError> {
    let mut lines = quads
        .iter()
        .map(nquads::serialize_quad)
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_unstable();
    Ok(lines)
}

struct C14nState<'a, H: HashFunction> {
    /// Quad lists, by blank node label.
    b2q: BTreeMap<Rc<str>, Vec<&'a Quad>>,
    /// Memoized first-degree hashes, by blank node label.
    b2h: BTreeMap<Rc<str>, H::Output>,
    canonical: IdentifierIssuer,
    /// Recursive deep-hashing iterations performed so far.
    deep_iterations: usize,
    max_deep_iterations: Option<usize>,
}

impl<'a, H: HashFunction> C14nState<'a, H> {
    fn new(max_deep_iterations: Option<usize>) -> Self {
        C14nState {
            b2q: BTreeMap::new(),
            b2h: BTreeMap::new(),
            canonical: IdentifierIssuer::new("c14n"),
            deep_iterations: 0,
            max_deep_iterations,
        }
    }

    /// Hash the quads in which `id` appears, with every blank label masked:
    /// `_:a` for `id` itself, `_:z` for any other.
    fn hash_first_degree_quads(&mut self, id: &str) -> Result<H::Output, C14nError> {
        if let Some(hash) = self.b2h.get(id) {
            return Ok(*hash);
        }
        let quads = self.b2q.get(id).ok_or_else(|| {
            C14nError::InternalInvariant(format!("no quad list for blank node _:{id}"))
        })?;
        let mut nquads = Vec::with_capacity(quads.len());
        for quad in quads {
            nquads.push(nq_for_hash(quad, id)?);
        }
        nquads.sort_unstable();
        let mut hasher = H::initialize();
        for line in &nquads {
            hasher.update(line);
        }
        let hash = hasher.finalize();
        debug_assert!({
            log::trace!("hash-first-degree(_:{id}) -> {}", hex(&hash));
            true
        });
        self.b2h.insert(Rc::from(id), hash);
        Ok(hash)
    }

    /// Hash one co-occurrence of `related` with the node being deep-hashed:
    /// the position character, the predicate (except in graph position),
    /// then the best available identifier for `related` — canonical label,
    /// temporary label, or its first-degree hash.
    fn hash_related_blank_node(
        &self,
        related: &str,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: &str,
    ) -> Result<H::Output, C14nError> {
        let mut input = H::initialize();
        input.update(position);
        if position != "g" {
            match &quad.p {
                Term::Iri(p) => {
                    input.update("<");
                    input.update(&**p);
                    input.update(">");
                }
                _ => {
                    return Err(C14nError::InternalInvariant(
                        "non-IRI predicate escaped validation".into(),
                    ))
                }
            }
        }
        if let Some(canon_id) = self.canonical.issued.get(related) {
            input.update("_:");
            input.update(canon_id.as_bytes());
        } else if let Some(temp_id) = issuer.issued.get(related) {
            input.update("_:");
            input.update(temp_id.as_bytes());
        } else {
            let h1d = self.b2h.get(related).ok_or_else(|| {
                C14nError::InternalInvariant(format!(
                    "missing first-degree hash for blank node _:{related}"
                ))
            })?;
            input.update(hex(h1d));
        }
        Ok(input.finalize())
    }

    /// Group the blank nodes co-occurring with `identifier` by their
    /// related-blank-node hash.
    fn create_hash_to_related(
        &self,
        identifier: &str,
        issuer: &IdentifierIssuer,
    ) -> Result<BTreeMap<H::Output, Vec<Rc<str>>>, C14nError> {
        let mut hash_to_related: BTreeMap<H::Output, Vec<Rc<str>>> = BTreeMap::new();
        let quads = self.b2q.get(identifier).ok_or_else(|| {
            C14nError::InternalInvariant(format!("no quad list for blank node _:{identifier}"))
        })?;
        for quad in quads {
            for (term, position) in [(&quad.s, "s"), (&quad.o, "o"), (&quad.g, "g")] {
                if let Term::BlankNode(label) = term {
                    if &**label != identifier {
                        let hash =
                            self.hash_related_blank_node(label, quad, issuer, position)?;
                        hash_to_related
                            .entry(hash)
                            .or_default()
                            .push(Rc::from(&**label));
                    }
                }
            }
        }
        Ok(hash_to_related)
    }

    /// Deep-hash `identifier`: for each related-hash group in ascending
    /// order, pick over all permutations of the group the lexicographically
    /// smallest relation path, recursing into nodes that have no label yet.
    /// Returns the resulting hash together with the issuer state of the
    /// winning permutations.
    fn hash_n_degree_quads(
        &mut self,
        identifier: &str,
        issuer: &IdentifierIssuer,
        depth: usize,
    ) -> Result<(H::Output, IdentifierIssuer), C14nError> {
        if depth > 0 {
            self.deep_iterations += 1;
            if let Some(max) = self.max_deep_iterations {
                if self.deep_iterations > max {
                    return Err(C14nError::DeepIterationsExceeded(max));
                }
            }
        }
        let hash_to_related = self.create_hash_to_related(identifier, issuer)?;
        let mut data_to_hash = H::initialize();
        let mut issuer = issuer.clone();
        for (related_hash, blank_nodes) in hash_to_related {
            data_to_hash.update(hex(&related_hash));
            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;
            let mut permutator = Permutator::new(blank_nodes);
            'permutation: while permutator.has_next() {
                let Some(permutation) = permutator.next() else {
                    break;
                };
                let mut issuer_copy = issuer.clone();
                let mut path = String::new();
                let mut recursion_list: Vec<Rc<str>> = Vec::new();
                for related in permutation {
                    if let Some(canon_id) = self.canonical.issued.get(related) {
                        path.push_str("_:");
                        path.push_str(canon_id);
                    } else {
                        let (id, new) = issuer_copy.issue(related);
                        if new {
                            recursion_list.push(Rc::clone(related));
                        }
                        path.push_str("_:");
                        path.push_str(&id);
                    }
                    // a partial path already above the chosen one can only grow
                    if !chosen_path.is_empty()
                        && path.len() >= chosen_path.len()
                        && path > chosen_path
                    {
                        continue 'permutation;
                    }
                }
                for related in recursion_list {
                    let result = self.hash_n_degree_quads(&related, &issuer_copy, depth + 1)?;
                    let (id, _) = issuer_copy.issue(&related);
                    path.push_str("_:");
                    path.push_str(&id);
                    path.push('<');
                    path.push_str(&hex(&result.0));
                    path.push('>');
                    issuer_copy = result.1;
                    if !chosen_path.is_empty()
                        && path.len() >= chosen_path.len()
                        && path > chosen_path
                    {
                        continue 'permutation;
                    }
                }
                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
            }
            data_to_hash.update(chosen_path.as_bytes());
            issuer = chosen_issuer.ok_or_else(|| {
                C14nError::InternalInvariant("empty related-hash group in deep hashing".into())
            })?;
        }
        let ret = (data_to_hash.finalize(), issuer);
        debug_assert!({
            log::trace!("hash-n-degree(_:{identifier}, {depth}) -> {}", hex(&ret.0));
            true
        });
        Ok(ret)
    }
}

/// Issues labels `prefix0`, `prefix1`, ... to blank nodes,
/// remembering prior issuances and their order.
#[derive(Clone, Debug)]
pub(crate) struct IdentifierIssuer {
    prefix: &'static str,
    issued: C14nIdMap,
    issued_order: Vec<Rc<str>>,
}

impl IdentifierIssuer {
    fn new(prefix: &'static str) -> Self {
        IdentifierIssuer {
            prefix,
            issued: BTreeMap::new(),
            issued_order: Vec::new(),
        }
    }

    /// Return the label for `existing`, issuing the next one if none was
    /// issued before; the boolean tells whether the label is new.
    fn issue(&mut self, existing: &str) -> (Rc<str>, bool) {
        let key: Rc<str> = Rc::from(existing);
        let key2 = Rc::clone(&key);
        match self.issued.entry(key) {
            Occupied(e) => (Rc::clone(e.get()), false),
            Vacant(e) => {
                let label: Rc<str> =
                    format!("{}{}", self.prefix, self.issued_order.len()).into();
                e.insert(Rc::clone(&label));
                self.issued_order.push(key2);
                (label, true)
            }
        }
    }

    fn has(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }

    /// The existing identifiers, in the order their labels were issued.
    /// This order drives the promotion of temporary labels to canonical
    /// ones, so it must reflect first issuance, not key order.
    fn issued_in_order(&self) -> impl Iterator<Item = &Rc<str>> + '_ {
        self.issued_order.iter()
    }
}

/// Serialize `quad` for first-degree hashing, masking every blank label:
/// the reference node as `_:a`, any other as `_:z`.
fn nq_for_hash(quad: &Quad, ref_bnid: &str) -> Result<String, C14nError> {
    let mut line = String::new();
    mask_term(&quad.s, &mut line, ref_bnid)?;
    mask_term(&quad.p, &mut line, ref_bnid)?;
    mask_term(&quad.o, &mut line, ref_bnid)?;
    if !matches!(quad.g, Term::DefaultGraph) {
        mask_term(&quad.g, &mut line, ref_bnid)?;
    }
    line.push_str(".\n");
    Ok(line)
}

fn mask_term(term: &Term, buffer: &mut String, ref_bnid: &str) -> Result<(), C14nError> {
    match term {
        Term::BlankNode(label) => {
            buffer.push_str(if &**label == ref_bnid { "_:a " } else { "_:z " });
            Ok(())
        }
        _ => nquads::write_term(term, buffer),
    }
}
