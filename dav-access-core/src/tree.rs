//! Location tree and configuration file
//!
//! A configuration file holds server-level directives and any number of
//! `[[location]]` sections:
//!
//! ```toml
//! [server]
//! DavAccessPrincipalUrl = "/principals/%{escape:%{REMOTE_USER}}"
//!
//! [[location]]
//! path = "/dav"
//! DavAccess = true
//! directives = ["DavAccessPriviledge all"]
//!
//! [[location]]
//! path = "/principals"
//! DavAccessPrincipal = "on"
//! ```
//!
//! Each location is merged exactly once, at load time, onto its nearest
//! enclosing location (or the server scope). Requests then pick the
//! effective scope of the longest matching location.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ConfigScope;
use crate::error::{DavAccessError, Result};

/// Directive value as written in TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    Flag(bool),
    Text(String),
}

impl DirectiveValue {
    fn as_arg(&self) -> &str {
        match self {
            DirectiveValue::Flag(true) => "on",
            DirectiveValue::Flag(false) => "off",
            DirectiveValue::Text(text) => text,
        }
    }
}

/// Directives of one scope
///
/// Keys are directive names; `directives` holds whole directive lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectiveTable {
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(flatten)]
    pub settings: BTreeMap<String, DirectiveValue>,
}

impl DirectiveTable {
    /// Build the scope these directives describe
    ///
    /// Keyed settings are applied first, then the directive lines in order.
    pub fn to_scope(&self) -> Result<ConfigScope> {
        let mut scope = ConfigScope::new();
        for (name, value) in &self.settings {
            scope.apply_directive(name, &[value.as_arg()])?;
        }
        for line in &self.directives {
            scope.apply_line(line)?;
        }
        Ok(scope)
    }
}

/// One `[[location]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LocationTable {
    pub path: String,
    #[serde(flatten)]
    pub table: DirectiveTable,
}

/// The configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: DirectiveTable,
    #[serde(default)]
    pub location: Vec<LocationTable>,
}

/// A location with its own and its effective (merged) scope
#[derive(Debug, Clone)]
pub struct Location {
    pub path: String,
    pub own: ConfigScope,
    pub effective: Arc<ConfigScope>,
}

/// Server scope plus every location, merged
#[derive(Debug, Clone)]
pub struct ScopeTree {
    root: Arc<ConfigScope>,
    /// Sorted by path length, so parents come before children
    locations: Vec<Location>,
}

impl ScopeTree {
    /// Build the tree and merge every location onto its parent
    pub fn build(root: ConfigScope, locations: Vec<(String, ConfigScope)>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(locations.len());
        for (path, scope) in locations {
            let path = normalize_path(&path)?;
            if !seen.insert(path.clone()) {
                return Err(DavAccessError::Config(format!(
                    "duplicate location '{}'",
                    path
                )));
            }
            pending.push((path, scope));
        }
        pending.sort_by_key(|(path, _)| path.len());

        let mut tree = ScopeTree {
            root: Arc::new(root),
            locations: Vec::with_capacity(pending.len()),
        };
        for (path, own) in pending {
            let parent = tree.scope_for(&path);
            let effective = Arc::new(ConfigScope::merge(&parent, &own));
            debug!(location = %path, "merged location scope");
            tree.locations.push(Location {
                path,
                own,
                effective,
            });
        }

        Ok(tree)
    }

    /// Parse a TOML configuration
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(source)?;
        let root = file.server.to_scope()?;
        let locations = file
            .location
            .iter()
            .map(|location| -> Result<(String, ConfigScope)> {
                Ok((location.path.clone(), location.table.to_scope()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let tree = Self::build(root, locations)?;
        info!(
            locations = tree.locations.len(),
            "loaded dav-access configuration"
        );
        Ok(tree)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&source)
    }

    /// Server-level scope
    pub fn root(&self) -> &Arc<ConfigScope> {
        &self.root
    }

    /// Locations, parents first
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Effective scope for a request URI
    pub fn scope_for(&self, uri: &str) -> Arc<ConfigScope> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        self.locations
            .iter()
            .rev()
            .find(|location| path_matches(&location.path, path))
            .map(|location| location.effective.clone())
            .unwrap_or_else(|| self.root.clone())
    }
}

fn normalize_path(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(DavAccessError::Config(format!(
            "location path must start with '/': '{}'",
            path
        )));
    }
    let trimmed = path.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}

/// Whether `location` covers `path`, on segment boundaries
fn path_matches(location: &str, path: &str) -> bool {
    if location == "/" {
        return true;
    }
    match path.strip_prefix(location) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrivilegeGrant, Setting};
    use assert_matches::assert_matches;

    #[test]
    fn test_path_matching() {
        assert!(path_matches("/", "/anything"));
        assert!(path_matches("/dav", "/dav"));
        assert!(path_matches("/dav", "/dav/"));
        assert!(path_matches("/dav", "/dav/file"));
        assert!(!path_matches("/dav", "/davx"));
        assert!(!path_matches("/dav/a", "/dav"));
    }

    #[test]
    fn test_child_inherits_nearest_ancestor() {
        let tree = ScopeTree::from_toml(
            r#"
            [server]
            DavAccess = "off"

            [[location]]
            path = "/dav/"
            DavAccess = true

            [[location]]
            path = "/dav/shared/deep"
            DavAccessPrincipal = "on"

            [[location]]
            path = "/dav/shared"
            directives = ["DavAccessPriviledge all"]
            "#,
        )
        .unwrap();

        let deep = tree.scope_for("/dav/shared/deep/file.ics");
        assert_eq!(deep.dav_access, Setting::Set(true));
        assert_eq!(deep.privilege, Setting::Set(PrivilegeGrant::All));
        assert!(deep.principal_resource_type_enabled());

        let shared = tree.scope_for("/dav/shared/x");
        assert!(shared.dav_access_enabled());
        assert!(!shared.principal_resource_type_enabled());

        assert!(!tree.scope_for("/other").dav_access_enabled());
        assert_eq!(tree.scope_for("/other").dav_access, Setting::Set(false));
        assert!(tree.scope_for("/dav?x=1").dav_access_enabled());
    }

    #[test]
    fn test_explicit_child_setting_wins() {
        let tree = ScopeTree::from_toml(
            r#"
            [[location]]
            path = "/dav"
            DavAccess = "on"

            [[location]]
            path = "/dav/private"
            DavAccess = "off"
            "#,
        )
        .unwrap();

        assert!(tree.scope_for("/dav/public").dav_access_enabled());
        assert!(!tree.scope_for("/dav/private/x").dav_access_enabled());
        assert_eq!(tree.locations()[0].path, "/dav");
        assert_eq!(tree.locations()[1].own.dav_access, Setting::Set(false));
    }

    #[test]
    fn test_errors_name_the_directive() {
        let err = ScopeTree::from_toml(
            r#"
            [[location]]
            path = "/dav"
            DavAccessPriviledge = "foo"
            "#,
        )
        .unwrap_err();
        assert!(err.is_config_time());
        assert_eq!(err.to_string(), "DavAccessPriviledge must be set to 'all': 'foo'");

        let err = ScopeTree::from_toml(
            r#"
            [server]
            DavAcess = "on"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid command 'DavAcess'");
    }

    #[test]
    fn test_structural_errors() {
        assert_matches!(
            ScopeTree::from_toml("[[location]]\npath = \"dav\"\n"),
            Err(DavAccessError::Config(_))
        );
        assert_matches!(
            ScopeTree::from_toml(
                "[[location]]\npath = \"/dav\"\n[[location]]\npath = \"/dav/\"\n"
            ),
            Err(DavAccessError::Config(_))
        );
        assert_matches!(
            ScopeTree::from_toml("[unknown]\n"),
            Err(DavAccessError::Toml(_))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dav-access.toml");
        std::fs::write(
            &path,
            "[[location]]\npath = \"/\"\nDavAccess = \"on\"\n",
        )
        .unwrap();

        let tree = ScopeTree::load(&path).unwrap();
        assert!(tree.scope_for("/anything").dav_access_enabled());

        assert_matches!(
            ScopeTree::load(dir.path().join("missing.toml")),
            Err(DavAccessError::Io(_))
        );
    }
}
