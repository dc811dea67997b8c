//! String template expressions
//!
//! A template is literal text with `%{VAR}` references and `%{func:ARG}`
//! calls, where `ARG` is itself a template:
//!
//! ```text
//! /dav/principals/%{escape:%{REMOTE_USER}}
//! ```
//!
//! Templates are compiled once when the configuration is loaded and
//! evaluated per request. Names are checked at compile time; whether a
//! variable actually has a value is only known per request.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{DavAccessError, Result};
use crate::escape::escape_path_segment;
use crate::request::RequestContext;

/// Request variables a template may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    RemoteUser,
    RequestUri,
    RequestMethod,
    RequestScheme,
    ServerName,
    HttpHost,
    DocumentRoot,
}

impl Variable {
    fn from_name(name: &str) -> Option<Self> {
        let variable = match name {
            "REMOTE_USER" | "user" => Variable::RemoteUser,
            "REQUEST_URI" => Variable::RequestUri,
            "REQUEST_METHOD" => Variable::RequestMethod,
            "REQUEST_SCHEME" => Variable::RequestScheme,
            "SERVER_NAME" => Variable::ServerName,
            "HTTP_HOST" => Variable::HttpHost,
            "DOCUMENT_ROOT" => Variable::DocumentRoot,
            _ => return None,
        };
        Some(variable)
    }

    /// Canonical name passed to [`RequestContext::variable`]
    pub fn name(self) -> &'static str {
        match self {
            Variable::RemoteUser => "REMOTE_USER",
            Variable::RequestUri => "REQUEST_URI",
            Variable::RequestMethod => "REQUEST_METHOD",
            Variable::RequestScheme => "REQUEST_SCHEME",
            Variable::ServerName => "SERVER_NAME",
            Variable::HttpHost => "HTTP_HOST",
            Variable::DocumentRoot => "DOCUMENT_ROOT",
        }
    }
}

/// String functions a template may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Escape as a single URL path segment
    Escape,
    ToLower,
    ToUpper,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "escape" => Some(Function::Escape),
            "tolower" => Some(Function::ToLower),
            "toupper" => Some(Function::ToUpper),
            _ => None,
        }
    }

    fn apply(self, arg: &str) -> String {
        match self {
            Function::Escape => escape_path_segment(arg),
            Function::ToLower => arg.to_lowercase(),
            Function::ToUpper => arg.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Var(Variable),
    Call(Function, Vec<Part>),
}

/// A compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    source: String,
    parts: Vec<Part>,
}

impl CompiledExpression {
    /// Compile `source`
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            chars: source.chars().peekable(),
        };
        let parts = parser
            .sequence(false)
            .map_err(|reason| DavAccessError::ExpressionParse {
                expression: source.to_string(),
                reason,
            })?;

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Text the expression was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a request
    ///
    /// Fails with [`DavAccessError::ExpressionEval`] when a referenced
    /// variable has no value for this request.
    pub fn eval(&self, request: &dyn RequestContext) -> Result<String> {
        let mut out = String::new();
        eval_parts(&self.parts, request, &mut out)?;
        Ok(out)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval_parts(parts: &[Part], request: &dyn RequestContext, out: &mut String) -> Result<()> {
    for part in parts {
        match part {
            Part::Literal(text) => out.push_str(text),
            Part::Var(variable) => {
                let value = request.variable(variable.name()).ok_or_else(|| {
                    DavAccessError::ExpressionEval(format!(
                        "variable '{}' is not available for this request",
                        variable.name()
                    ))
                })?;
                out.push_str(&value);
            }
            Part::Call(function, arg) => {
                let mut inner = String::new();
                eval_parts(arg, request, &mut inner)?;
                out.push_str(&function.apply(&inner));
            }
        }
    }
    Ok(())
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    /// Parse up to end of input, or up to the closing `}` of a call argument
    fn sequence(&mut self, nested: bool) -> std::result::Result<Vec<Part>, String> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        loop {
            match self.chars.next() {
                None if nested => return Err("unterminated '%{'".to_string()),
                None => break,
                Some('}') if nested => break,
                Some('\\') => match self.chars.next() {
                    Some(c @ ('%' | '\\' | '}')) => literal.push(c),
                    Some(c) => return Err(format!("invalid escape sequence '\\{}'", c)),
                    None => return Err("dangling '\\' at end of expression".to_string()),
                },
                Some('%') if self.chars.peek() == Some(&'{') => {
                    self.chars.next();
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(self.reference()?);
                }
                Some(c) => literal.push(c),
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }
        Ok(parts)
    }

    /// Parse what follows `%{`
    fn reference(&mut self) -> std::result::Result<Part, String> {
        let mut name = String::new();

        loop {
            match self.chars.next() {
                None => return Err("unterminated '%{'".to_string()),
                Some('}') => {
                    if name.is_empty() {
                        return Err("empty variable name".to_string());
                    }
                    return Variable::from_name(&name)
                        .map(Part::Var)
                        .ok_or_else(|| format!("unknown variable '{}'", name));
                }
                Some(':') => {
                    if name.is_empty() {
                        return Err("empty function name".to_string());
                    }
                    let function = Function::from_name(&name)
                        .ok_or_else(|| format!("unknown function '{}'", name))?;
                    let arg = self.sequence(true)?;
                    return Ok(Part::Call(function, arg));
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => name.push(c),
                Some(c) => {
                    return Err(format!("unexpected character '{}' in variable name", c));
                }
            }
        }
    }
}
