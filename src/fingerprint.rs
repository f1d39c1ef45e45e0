//! Request canonicalization and fingerprinting.
//!
//! A [`Fingerprint`] is the registry lookup key: the SHA-256 digest of a
//! deterministic byte encoding of a stub request. Two requests that differ
//! only in representation (query key order, body whitespace) canonicalize to
//! the same bytes and therefore hash to the same key. SHA-256 is a
//! correctness mechanism here, not a security boundary.

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::stub::StubRequest;

/// Opaque fixed-length key identifying a canonicalized stub request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a sanitized stub request.
    pub fn of(request: &StubRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_bytes(request));
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic byte encoding of a stub request:
///
/// ```text
/// method '\n' path '\n' ( key '=' ( value ',' )* '&' )* '\n' [ body ]
/// ```
///
/// Each query key and value is emitted length-prefixed (`len ':' bytes`),
/// so delimiter characters inside a component can never collide with the
/// delimiters between components: distinct logical query mappings always
/// encode to distinct bytes. Query keys are emitted in lexicographic order
/// so that key order in the source representation never affects the
/// encoding; the values of a single key keep their registered order. An
/// absent body contributes no bytes, which keeps it distinct from an
/// explicitly empty one.
fn canonical_bytes(request: &StubRequest) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(request.method.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(request.path.as_bytes());
    buf.push(b'\n');
    let mut keys: Vec<&String> = request.query.keys().collect();
    keys.sort();
    for key in keys {
        push_component(&mut buf, key);
        buf.push(b'=');
        for value in &request.query[key] {
            push_component(&mut buf, value);
            buf.push(b',');
        }
        buf.push(b'&');
    }
    buf.push(b'\n');
    if let Some(body) = &request.body {
        buf.extend_from_slice(compact(body).as_bytes());
    }
    buf
}

fn push_component(buf: &mut Vec<u8>, component: &str) {
    buf.extend_from_slice(component.len().to_string().as_bytes());
    buf.push(b':');
    buf.extend_from_slice(component.as_bytes());
}

/// Serialize a structured value to compact JSON text (no insignificant
/// whitespace, object keys in deterministic order).
pub fn compact(value: &Value) -> String {
    serde_json::to_string(value).expect("serializing a serde_json::Value cannot fail")
}
