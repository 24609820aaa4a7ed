//! Request-path to file-path resolution.
//!
//! Two strategies: direct (join the request path onto the data root, no
//! state) and enumerated (walk the data root once at startup and match
//! routes exactly).

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filename token that stands in for `/`, letting a single filename encode
/// nested route segments (filesystems forbid `/` inside a name).
pub const SEGMENT_MARKER: &str = "__S__";

/// Direct mode: data root + request path, leading slash stripped.
///
/// `/` and the empty path resolve to nothing (served as 404, never a
/// panic). Paths with a `..` segment resolve to nothing so requests cannot
/// escape the data root.
pub fn resolve_direct(root: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = request_path.trim_start_matches('/');
    if rel.is_empty() {
        return None;
    }
    if rel.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(root.join(rel))
}

/// A route discovered at startup, bound to the file that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url_path: String,
    pub file_path: PathBuf,
}

/// Enumerated mode: exact route -> file mapping, built once by walking the
/// data root. Routes never change at runtime; only file contents do.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, PathBuf>,
}

impl RouteTable {
    /// Walk `root` recursively and register every regular file under its
    /// derived route.
    pub fn build(root: &Path) -> anyhow::Result<Self> {
        let mut routes = HashMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry.with_context(|| format!("walking data root {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let route = entry
                .path()
                .strip_prefix(root)
                .map(route_for)
                .with_context(|| format!("relativizing {}", entry.path().display()))?;
            routes.insert(route, entry.into_path());
        }
        Ok(Self { routes })
    }

    /// Exact-match lookup. Misses touch neither cache nor filesystem.
    pub fn lookup(&self, url_path: &str) -> Option<&Path> {
        self.routes.get(url_path).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.routes.iter().map(|(url_path, file_path)| Endpoint {
            url_path: url_path.clone(),
            file_path: file_path.clone(),
        })
    }
}

/// Derive the route for a root-relative file path: join components with
/// `/`, substitute every occurrence of the segment marker, prefix with `/`.
fn route_for(rel: &Path) -> String {
    let joined = rel
        .iter()
        .map(|component| component.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined.replace(SEGMENT_MARKER, "/"))
}
