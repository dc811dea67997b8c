//! Per-scope configuration
//!
//! Every directory or location scope carries its own [`ConfigScope`]. A field
//! is either [`Setting::Unset`] (inherit) or [`Setting::Set`] at that scope;
//! [`ConfigScope::merge`] lets the child's set fields win.

use std::fmt;
use std::sync::Arc;

use crate::error::{DavAccessError, Result};
use crate::expr::CompiledExpression;
use crate::principal::PrincipalUrlMode;

/// A field that is either inherited or set at this scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    Unset,
    Set(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Unset
    }
}

impl<T> Setting<T> {
    /// Whether the value was set at this scope (or inherited from one that set it)
    pub fn is_set(&self) -> bool {
        matches!(self, Setting::Set(_))
    }

    /// Value, if set
    pub fn get(&self) -> Option<&T> {
        match self {
            Setting::Set(value) => Some(value),
            Setting::Unset => None,
        }
    }
}

impl<T: Clone> Setting<T> {
    /// `add` when it is set, otherwise `base`
    pub fn merge(base: &Self, add: &Self) -> Self {
        match add {
            Setting::Set(_) => add.clone(),
            Setting::Unset => base.clone(),
        }
    }
}

/// Privileges granted to every user by `DavAccessPriviledge`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeGrant {
    /// read, write, bind and unbind
    All,
}

impl fmt::Display for PrivilegeGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeGrant::All => f.write_str("all"),
        }
    }
}

/// Directives understood by this module
///
/// Names are part of the operator-facing contract and keep their historical
/// spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    DavAccess,
    DavAccessPrincipal,
    DavAccessPriviledge,
    DavAccessPrincipalUrl,
    DavAccessPrincipalUrlMode,
}

impl Directive {
    /// Every directive, in documentation order
    pub const ALL: [Directive; 5] = [
        Directive::DavAccess,
        Directive::DavAccessPrincipal,
        Directive::DavAccessPriviledge,
        Directive::DavAccessPrincipalUrl,
        Directive::DavAccessPrincipalUrlMode,
    ];

    /// Look a directive up by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|directive| directive.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Directive::DavAccess => "DavAccess",
            Directive::DavAccessPrincipal => "DavAccessPrincipal",
            Directive::DavAccessPriviledge => "DavAccessPriviledge",
            Directive::DavAccessPrincipalUrl => "DavAccessPrincipalUrl",
            Directive::DavAccessPrincipalUrlMode => "DavAccessPrincipalUrlMode",
        }
    }

    /// Operator help text
    pub fn help(self) -> &'static str {
        match self {
            Directive::DavAccess => {
                "When enabled, the URL space will declared to support the option 'access-control'."
            }
            Directive::DavAccessPrincipal => {
                "When enabled, the URL space will declared to contain resourcetype 'principal'."
            }
            Directive::DavAccessPriviledge => {
                "When set to 'all', the URL space will allow all DAV priviledges."
            }
            Directive::DavAccessPrincipalUrl => {
                "Set the URL template to use for the principal URL. Recommended value is \"/principals/%{escape:%{REMOTE_USER}}\"."
            }
            Directive::DavAccessPrincipalUrlMode => {
                "Set to 'prefix' to append the escaped user name to the principal URL template, or 'template' (default) to use the template as is."
            }
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for one configuration scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigScope {
    /// `DavAccess`
    pub dav_access: Setting<bool>,
    /// `DavAccessPrincipal`
    pub dav_access_principal: Setting<bool>,
    /// `DavAccessPriviledge`
    pub privilege: Setting<PrivilegeGrant>,
    /// `DavAccessPrincipalUrl`
    pub principal_url: Setting<Arc<CompiledExpression>>,
    /// `DavAccessPrincipalUrlMode`
    pub principal_url_mode: Setting<PrincipalUrlMode>,
}

impl ConfigScope {
    /// Scope with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a child scope onto its parent
    ///
    /// Each field comes from `add` if it was set there, else from `base`.
    pub fn merge(base: &ConfigScope, add: &ConfigScope) -> ConfigScope {
        ConfigScope {
            dav_access: Setting::merge(&base.dav_access, &add.dav_access),
            dav_access_principal: Setting::merge(
                &base.dav_access_principal,
                &add.dav_access_principal,
            ),
            privilege: Setting::merge(&base.privilege, &add.privilege),
            principal_url: Setting::merge(&base.principal_url, &add.principal_url),
            principal_url_mode: Setting::merge(&base.principal_url_mode, &add.principal_url_mode),
        }
    }

    /// Whether `access-control` is advertised
    pub fn dav_access_enabled(&self) -> bool {
        self.dav_access.get().copied().unwrap_or(false)
    }

    /// Whether resources are classified as principals
    pub fn principal_resource_type_enabled(&self) -> bool {
        self.dav_access_principal.get().copied().unwrap_or(false)
    }

    /// Static privilege grant, if any
    pub fn privilege_grant(&self) -> Option<PrivilegeGrant> {
        self.privilege.get().copied()
    }

    /// Compiled principal URL template, if any
    pub fn principal_url(&self) -> Option<&CompiledExpression> {
        self.principal_url.get().map(Arc::as_ref)
    }

    /// How the principal URL template is turned into a URL
    pub fn principal_url_mode(&self) -> PrincipalUrlMode {
        self.principal_url_mode.get().copied().unwrap_or_default()
    }

    /// Apply one directive with its arguments
    pub fn apply_directive(&mut self, name: &str, args: &[&str]) -> Result<()> {
        let directive = Directive::from_name(name)
            .ok_or_else(|| DavAccessError::UnknownDirective(name.to_string()))?;

        let [value] = args else {
            return Err(DavAccessError::invalid_directive(
                directive.name(),
                format!("{} takes one argument, {}", directive, directive.help()),
            ));
        };

        match directive {
            Directive::DavAccess => {
                self.dav_access = Setting::Set(parse_flag(directive, value)?);
            }
            Directive::DavAccessPrincipal => {
                self.dav_access_principal = Setting::Set(parse_flag(directive, value)?);
            }
            Directive::DavAccessPriviledge => {
                // Only the "all" shortcut exists so far; per-privilege lists
                // would extend this match.
                if *value != "all" {
                    return Err(DavAccessError::invalid_directive(
                        directive.name(),
                        format!("{} must be set to 'all': '{}'", directive, value),
                    ));
                }
                self.privilege = Setting::Set(PrivilegeGrant::All);
            }
            Directive::DavAccessPrincipalUrl => {
                let expression = CompiledExpression::parse(value)?;
                self.principal_url = Setting::Set(Arc::new(expression));
            }
            Directive::DavAccessPrincipalUrlMode => {
                let mode = value.parse::<PrincipalUrlMode>().map_err(|_| {
                    DavAccessError::invalid_directive(
                        directive.name(),
                        format!("{} must be 'template' or 'prefix': '{}'", directive, value),
                    )
                })?;
                self.principal_url_mode = Setting::Set(mode);
            }
        }

        Ok(())
    }

    /// Apply a directive line such as `DavAccess on`
    ///
    /// Blank lines and `#` comments are accepted and ignored. Arguments may
    /// be double-quoted.
    pub fn apply_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let words = split_words(line)?;
        let Some((name, args)) = words.split_first() else {
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.apply_directive(name, &args)
    }
}

fn parse_flag(directive: Directive, value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("on") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("off") {
        Ok(false)
    } else {
        Err(DavAccessError::invalid_directive(
            directive.name(),
            format!("{} must be On or Off", directive),
        ))
    }
}

/// Split a directive line into words, honouring double quotes
///
/// Inside quotes only `\"` is an escape; other backslashes are kept so that
/// template escapes pass through untouched.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' if chars.peek() == Some(&'"') => {
                        word.push('"');
                        chars.next();
                    }
                    c => word.push(c),
                }
            }
            if !closed {
                return Err(DavAccessError::Config(format!(
                    "unterminated quote in '{}'",
                    line
                )));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
        }
        words.push(word);
    }

    Ok(words)
}
