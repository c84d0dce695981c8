//! Core policy types

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Role name that the legacy `is_admin` context flag stands in for
pub const ADMIN_ROLE: &str = "admin";

/// Breadth of an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// System-wide scope
    System,
    /// Domain scope
    Domain,
    /// Project scope
    Project,
}

impl ScopeType {
    /// All known scope types, in canonical order
    pub const ALL: [ScopeType; 3] = [ScopeType::System, ScopeType::Domain, ScopeType::Project];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::System => "system",
            ScopeType::Domain => "domain",
            ScopeType::Project => "project",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(ScopeType::System),
            "domain" => Ok(ScopeType::Domain),
            "project" => Ok(ScopeType::Project),
            other => Err(PolicyError::UnknownScopeType(other.to_string())),
        }
    }
}

/// HTTP method of a documented API operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API operation governed by a rule (e.g., `GET /v3/endpoints`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    /// URL path template
    pub path: String,

    /// HTTP method
    pub method: Method,
}

impl Operation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Ordered release tag
///
/// Releases compare by series number; the name is only for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Release {
    /// Monotonic release series
    pub series: u16,

    /// Release name (e.g., "stein")
    pub name: String,
}

impl Release {
    pub fn new(series: u16, name: impl Into<String>) -> Self {
        Self {
            series,
            name: name.into(),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity attributes of one incoming request
///
/// Built per request by the authentication layer and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Scope the token was issued for
    pub scope_type: ScopeType,

    /// Roles held in that scope
    #[serde(default)]
    pub roles: HashSet<String>,

    /// Project the token is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Domain the token is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,

    /// Legacy admin flag; satisfies `role:admin`
    #[serde(default)]
    pub is_admin: bool,
}

impl RequestContext {
    /// Create a context for the given scope with no roles
    pub fn new(scope_type: ScopeType) -> Self {
        Self {
            scope_type,
            roles: HashSet::new(),
            project_id: None,
            domain_id: None,
            is_admin: false,
        }
    }

    /// System-scoped context
    pub fn system() -> Self {
        Self::new(ScopeType::System)
    }

    /// Project-scoped context
    pub fn project(project_id: impl Into<String>) -> Self {
        let mut ctx = Self::new(ScopeType::Project);
        ctx.project_id = Some(project_id.into());
        ctx
    }

    /// Domain-scoped context
    pub fn domain(domain_id: impl Into<String>) -> Self {
        let mut ctx = Self::new(ScopeType::Domain);
        ctx.domain_id = Some(domain_id.into());
        ctx
    }

    /// Add a role to the context
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Set the legacy admin flag
    pub fn with_admin_flag(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Whether the request carries `role`, honoring the admin flag
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role) || (self.is_admin && role == ADMIN_ROLE)
    }
}
