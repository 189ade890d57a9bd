//! Destination key construction
//!
//! GridFS names are flat, so folder structure was encoded with underscores:
//! `invoices_2019_march.pdf` lands at `<base>/invoices/2019/march.pdf`.

/// Maps source names to destination keys under a fixed base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    base: String,
}

impl KeyBuilder {
    /// Base path `<project>/<environment>/<prefix>`; an empty prefix is
    /// dropped by normalization.
    pub fn new(project: &str, environment: &str, prefix: &str) -> Self {
        Self {
            base: normalize_path(&format!("{}/{}/{}", project, environment, prefix)),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn key_for(&self, name: &str) -> String {
        normalize_path(&format!("{}/{}", self.base, name.replace('_', "/")))
    }
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// against the preceding segment. A `..` that cannot be resolved is kept for
/// relative paths and dropped at the root. An empty result becomes `.`.
pub fn normalize_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
