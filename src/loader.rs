//! Loading stub definitions from a directory tree.
//!
//! Runs once at startup, synchronously, before the server accepts traffic.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::registry::StubRegistry;
use crate::stub::Stub;

/// File extensions recognized as stub definitions.
const STUB_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Recursively load every stub definition under `root` into the registry.
///
/// Files with unrecognized extensions are skipped silently. A file that
/// cannot be read or decoded is skipped with a logged warning so one broken
/// definition does not prevent the rest of the tree from loading. A missing
/// or unreadable root is reported and loading is skipped entirely; server
/// startup proceeds either way.
///
/// Returns the number of stubs registered.
pub fn load_stubs(registry: &StubRegistry, root: &Path) -> usize {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %root.display(), %err, "failed to read stubs directory");
            return 0;
        }
    };

    let mut loaded = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %root.display(), %err, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            loaded += load_stubs(registry, &path);
            continue;
        }
        match path.extension().and_then(OsStr::to_str) {
            Some(ext) if STUB_EXTENSIONS.contains(&ext) => {}
            _ => {
                debug!(file = %path.display(), "skipping non-stub file");
                continue;
            }
        }
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(file = %path.display(), %err, "failed to read stub file, skipping");
                continue;
            }
        };
        let stub = match Stub::from_bytes(&bytes) {
            Ok(stub) => stub,
            Err(err) => {
                warn!(file = %path.display(), %err, "failed to parse stub file, skipping");
                continue;
            }
        };
        if registry.add(stub).is_ok() {
            loaded += 1;
        }
    }
    info!(dir = %root.display(), loaded, "loaded stubs");
    loaded
}
