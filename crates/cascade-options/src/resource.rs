//! Resource locators used by the property file source.
//!
//! A locator is either a plain filesystem path or a `scheme://path` string.
//! [`FileSystem`] understands plain paths and `file://`; [`StaticResources`]
//! serves in-memory text under any scheme, which is how bundled defaults
//! ship inside a binary.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Opens a resource by locator. `Ok(None)` means the resource does not
/// exist, which sources treat as "nothing to read".
pub trait ResourceLocator: Send + Sync {
    fn open(&self, locator: &str) -> io::Result<Option<String>>;
}

/// Split `scheme://path` into its parts. Plain paths have no scheme.
pub fn split_scheme(locator: &str) -> (Option<&str>, &str) {
    match locator.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, locator),
    }
}

/// Filesystem lookup for plain paths and `file://` locators.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystem;

impl ResourceLocator for FileSystem {
    fn open(&self, locator: &str) -> io::Result<Option<String>> {
        let path = match split_scheme(locator) {
            (None, path) | (Some("file"), path) => Path::new(path),
            (Some(scheme), _) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no locator for scheme '{scheme}' in '{locator}'"),
                ))
            }
        };

        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Named in-memory resources, falling back to the filesystem for plain
/// paths and `file://`.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    entries: HashMap<String, String>,
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register text under a path, reachable as `<any scheme>://<path>`.
    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(path.into(), text.into());
        self
    }
}

impl ResourceLocator for StaticResources {
    fn open(&self, locator: &str) -> io::Result<Option<String>> {
        match split_scheme(locator) {
            (None, _) | (Some("file"), _) => FileSystem.open(locator),
            (Some(_), path) => Ok(self.entries.get(path).cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn split_plain_and_scheme() {
        assert_eq!(split_scheme("app.properties"), (None, "app.properties"));
        assert_eq!(
            split_scheme("classpath://config/app.properties"),
            (Some("classpath"), "config/app.properties")
        );
    }

    #[test]
    fn filesystem_reads_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PORT=8080").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        assert_eq!(FileSystem.open(&path).unwrap().unwrap().trim(), "PORT=8080");
        assert!(FileSystem.open(&format!("file://{path}")).unwrap().is_some());
    }

    #[test]
    fn filesystem_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.properties");
        assert!(FileSystem.open(missing.to_str().unwrap()).unwrap().is_none());
    }

    #[test]
    fn filesystem_rejects_other_schemes() {
        let err = FileSystem.open("classpath://app.properties").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn static_resources_serve_bundled_text() {
        let resources = StaticResources::new().with("app.properties", "PORT=1");
        assert_eq!(
            resources.open("classpath://app.properties").unwrap(),
            Some("PORT=1".to_string())
        );
        assert_eq!(resources.open("classpath://other").unwrap(), None);
    }
}
