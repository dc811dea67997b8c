//! CLI command implementations
//!
//! Each command builds a request against the loaded scope tree and drives
//! the provider through an in-process host, the same path a DAV server's
//! PROPFIND and OPTIONS handlers take.

use std::fmt::Display;

use anyhow::{anyhow, Result};
use dav_access_core::{
    ConfigScope, DavAccessProvider, HostRegistry, InsertMode, Inserted, Request,
    ResourceTypeDecision, ScopeTree, Setting, DAV_XML_NAMESPACE,
};
use serde_json::json;
use tracing::{debug, info};

fn host() -> HostRegistry {
    let mut host = HostRegistry::new();
    DavAccessProvider::register(&mut host);
    host
}

fn request(tree: &ScopeTree, path: &str, method: &str) -> Request {
    Request::new(path, tree.scope_for(path)).with_method(method)
}

/// Split `{namespace}name` or a bare `name` in the `DAV:` namespace
fn parse_prop(prop: &str) -> Result<(String, String)> {
    match prop.strip_prefix('{') {
        Some(rest) => {
            let (namespace, name) = rest
                .split_once('}')
                .ok_or_else(|| anyhow!("Invalid property name: {}", prop))?;
            if name.is_empty() {
                return Err(anyhow!("Invalid property name: {}", prop));
            }
            Ok((namespace.to_string(), name.to_string()))
        }
        None => Ok((DAV_XML_NAMESPACE.to_string(), prop.to_string())),
    }
}

fn inserted_label(inserted: Inserted) -> &'static str {
    match inserted {
        Inserted::NotDefined => "not-defined",
        Inserted::Value => "value",
        Inserted::Name => "name",
        Inserted::Supported => "supported",
    }
}

/// Execute the propfind command
///
/// # Arguments
/// * `tree` - Loaded configuration
/// * `path` - Request path
/// * `user` - Authenticated user, `None` for anonymous
/// * `props` - Requested properties; all catalogued properties when empty
/// * `mode` - Insertion mode
/// * `as_json` - Print JSON instead of XML fragments
pub fn execute_propfind(
    tree: &ScopeTree,
    path: &str,
    user: Option<String>,
    props: &[String],
    mode: InsertMode,
    as_json: bool,
) -> Result<()> {
    let host = host();
    let mut request = request(tree, path, "PROPFIND");
    if let Some(user) = &user {
        request = request.with_user(user.as_str());
    }

    let wanted: Vec<(String, String)> = if props.is_empty() {
        host.groups()
            .iter()
            .flat_map(|group| {
                group
                    .specs
                    .iter()
                    .map(|spec| (group.namespace_uri(spec).to_string(), spec.name.to_string()))
            })
            .collect()
    } else {
        props
            .iter()
            .map(|prop| parse_prop(prop))
            .collect::<Result<_>>()?
    };

    info!(path, user = user.as_deref(), count = wanted.len(), "rendering properties");

    let mut results = Vec::with_capacity(wanted.len());
    for (namespace, name) in &wanted {
        let mut fragment = String::new();
        let inserted = host.insert_prop(&request, namespace, name, mode, &mut fragment);
        debug!(namespace = %namespace, name = %name, inserted = inserted_label(inserted));
        results.push((namespace, name, inserted, fragment));
    }

    if as_json {
        let properties: Vec<_> = results
            .iter()
            .map(|(namespace, name, inserted, fragment)| {
                json!({
                    "namespace": namespace,
                    "name": name,
                    "inserted": inserted_label(*inserted),
                    "xml": fragment.trim_end(),
                })
            })
            .collect();
        let output = json!({
            "path": path,
            "user": user,
            "properties": properties,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (_, _, _, fragment) in &results {
        print!("{}", fragment);
    }
    let missing: Vec<_> = results
        .iter()
        .filter(|(_, _, inserted, _)| *inserted == Inserted::NotDefined)
        .map(|(namespace, name, _, _)| format!("{{{}}}{}", namespace, name))
        .collect();
    if !missing.is_empty() {
        eprintln!("Not defined: {}", missing.join(", "));
    }
    Ok(())
}

/// Execute the options command
pub fn execute_options(tree: &ScopeTree, path: &str, as_json: bool) -> Result<()> {
    let host = host();
    let request = request(tree, path, "OPTIONS");

    let dav = host.dav_header(&request)?;
    let methods = host.dav_methods(&request)?;

    if as_json {
        let output = json!({ "path": path, "dav": dav, "methods": methods });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("DAV: {}", dav.join(", "));
        println!("Allow: {}", methods.join(", "));
    }
    Ok(())
}

/// Execute the resourcetype command
pub fn execute_resourcetype(tree: &ScopeTree, path: &str, as_json: bool) -> Result<()> {
    let host = host();
    let request = request(tree, path, "PROPFIND");

    match (host.resource_type(&request), as_json) {
        (ResourceTypeDecision::Type { name, namespace }, true) => {
            let output = json!({ "path": path, "name": name, "namespace": namespace });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        (ResourceTypeDecision::Type { name, namespace }, false) => {
            println!("{{{}}}{}", namespace, name);
        }
        (ResourceTypeDecision::Declined, true) => {
            println!("{}", json!({ "path": path, "declined": true }));
        }
        (ResourceTypeDecision::Declined, false) => println!("declined"),
    }
    Ok(())
}

fn setting_text<T: Display>(setting: &Setting<T>) -> String {
    match setting.get() {
        Some(value) => value.to_string(),
        None => "unset".to_string(),
    }
}

fn flag_text(setting: &Setting<bool>) -> String {
    match setting.get() {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "unset".to_string(),
    }
}

fn scope_summary(scope: &ConfigScope) -> serde_json::Value {
    json!({
        "DavAccess": flag_text(&scope.dav_access),
        "DavAccessPrincipal": flag_text(&scope.dav_access_principal),
        "DavAccessPriviledge": setting_text(&scope.privilege),
        "DavAccessPrincipalUrl": setting_text(&scope.principal_url),
        "DavAccessPrincipalUrlMode": scope.principal_url_mode().to_string(),
    })
}

fn print_scope(label: &str, scope: &ConfigScope) {
    println!("{}", label);
    println!("  DavAccess: {}", flag_text(&scope.dav_access));
    println!("  DavAccessPrincipal: {}", flag_text(&scope.dav_access_principal));
    println!("  DavAccessPriviledge: {}", setting_text(&scope.privilege));
    println!("  DavAccessPrincipalUrl: {}", setting_text(&scope.principal_url));
    println!("  DavAccessPrincipalUrlMode: {}", scope.principal_url_mode());
}

/// Execute the check command
///
/// Loading already validated every directive; this prints the effective
/// scope of the server and of each location.
pub fn execute_check(tree: &ScopeTree, as_json: bool) -> Result<()> {
    if as_json {
        let locations: Vec<_> = tree
            .locations()
            .iter()
            .map(|location| {
                json!({
                    "path": location.path,
                    "effective": scope_summary(&location.effective),
                })
            })
            .collect();
        let output = json!({
            "server": scope_summary(tree.root()),
            "locations": locations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_scope("server", tree.root());
    for location in tree.locations() {
        print_scope(&location.path, &location.effective);
    }
    println!("✓ Configuration OK ({} locations)", tree.locations().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prop() {
        assert_eq!(
            parse_prop("current-user-principal").unwrap(),
            ("DAV:".to_string(), "current-user-principal".to_string())
        );
        assert_eq!(
            parse_prop("{urn:example}thing").unwrap(),
            ("urn:example".to_string(), "thing".to_string())
        );
        assert!(parse_prop("{DAV:").is_err());
        assert!(parse_prop("{DAV:}").is_err());
    }

    #[test]
    fn test_setting_text() {
        let tree = ScopeTree::from_toml(
            "[[location]]\npath = \"/dav\"\nDavAccess = \"on\"\nDavAccessPriviledge = \"all\"\n",
        )
        .unwrap();
        let summary = scope_summary(&tree.scope_for("/dav/x"));
        assert_eq!(summary["DavAccess"], "on");
        assert_eq!(summary["DavAccessPrincipal"], "unset");
        assert_eq!(summary["DavAccessPriviledge"], "all");
        assert_eq!(summary["DavAccessPrincipalUrlMode"], "template");
    }
}
