//! The in-memory stub registry and the dispatch facade.
//!
//! The registry maps request [`Fingerprint`]s to [`Stub`]s. It is owned by a
//! single server instance and guarded by a reader/writer lock: dispatch is
//! read-heavy and concurrent, registration and clearing are occasional
//! exclusive writes.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::fingerprint::{compact, Fingerprint};
use crate::stub::{Stub, StubRequest};

/// Key-indexed store of registered stubs.
///
/// Registration is last-write-wins: adding a stub whose request fingerprints
/// to an already-registered key silently replaces the previous stub.
/// Registries are small and operator-controlled, and re-registration is a
/// normal workflow, so replacement is preferred over a conflict error.
#[derive(Debug, Default)]
pub struct StubRegistry {
    stubs: RwLock<HashMap<Fingerprint, Stub>>,
}

impl StubRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize, validate and register a stub.
    ///
    /// On validation failure every accumulated error is returned and the
    /// registry is left unchanged. On success the request body is compacted
    /// in place before fingerprinting, so later lookups are insensitive to
    /// body formatting.
    pub fn add(&self, mut stub: Stub) -> Result<(), Vec<ValidationError>> {
        stub.request.sanitize();
        let errs = stub.validation_errors();
        if !errs.is_empty() {
            warn!(request = %stub.request, ?errs, "rejected invalid stub");
            return Err(errs);
        }

        if let Some(body) = &stub.request.body {
            stub.request.body = Some(Value::String(compact(body)));
        }

        let fingerprint = Fingerprint::of(&stub.request);
        let mut stubs = self.stubs.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = stubs.get(&fingerprint) {
            warn!(request = %existing.request, "overriding existing stub");
        }
        info!(request = %stub.request, "added stub");
        stubs.insert(fingerprint, stub);
        Ok(())
    }

    /// Register several stubs in order. Each stub is attempted independently;
    /// an invalid entry is skipped without aborting the batch.
    ///
    /// Returns the rejected entries as `(position, errors)` pairs, empty if
    /// every stub was registered.
    pub fn add_all(
        &self,
        stubs: impl IntoIterator<Item = Stub>,
    ) -> Vec<(usize, Vec<ValidationError>)> {
        let mut rejected = Vec::new();
        for (position, stub) in stubs.into_iter().enumerate() {
            if let Err(errs) = self.add(stub) {
                rejected.push((position, errs));
            }
        }
        rejected
    }

    /// Look up the stub registered under a fingerprint.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<Stub> {
        let stubs = self.stubs.read().unwrap_or_else(|e| e.into_inner());
        stubs.get(fingerprint).cloned()
    }

    /// Snapshot of all registered stubs, in no particular order.
    pub fn list(&self) -> Vec<Stub> {
        let stubs = self.stubs.read().unwrap_or_else(|e| e.into_inner());
        stubs.values().cloned().collect()
    }

    /// Remove every registered stub.
    pub fn clear(&self) {
        let mut stubs = self.stubs.write().unwrap_or_else(|e| e.into_inner());
        stubs.clear();
    }

    /// Number of registered stubs.
    pub fn len(&self) -> usize {
        let stubs = self.stubs.read().unwrap_or_else(|e| e.into_inner());
        stubs.len()
    }

    /// Whether the registry holds no stubs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Match an inbound request against the registry.
    ///
    /// The raw body is compacted exactly like a registered stub body before
    /// fingerprinting. A non-empty body that is not valid JSON can never
    /// match a registered stub (stored bodies are always structured), so it
    /// reports a miss.
    pub fn dispatch(
        &self,
        method: &str,
        path: &str,
        query: HashMap<String, Vec<String>>,
        raw_body: &[u8],
    ) -> Option<Stub> {
        let body = if raw_body.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(raw_body) {
                Ok(value) => Some(Value::String(compact(&value))),
                Err(err) => {
                    warn!(%method, %path, %err, "request body is not structured, cannot match");
                    return None;
                }
            }
        };

        let request = StubRequest {
            method: method.to_string(),
            path: path.to_string(),
            query,
            body,
        };
        let fingerprint = Fingerprint::of(&request);
        match self.lookup(&fingerprint) {
            Some(stub) => {
                info!(request = %stub.request, "stub found");
                Some(stub)
            }
            None => {
                info!(request = %request, "no stub found for request");
                None
            }
        }
    }
}
