//! Route authorization table.
//!
//! Rules are plain data: `(method, path pattern, requirement)`. The table is checked
//! and ordered once at startup by [`RoutePolicy::new`]; afterwards it is read-only
//! and shared between workers.
//!
//! Patterns are either exact paths (`/api/v1/task-mgmt/tasks`) or a literal prefix
//! followed by `/**` (`/api/v1/user-mgmt/**`). `/**` alone matches everything.
//! The most specific rule wins: exact paths before wildcards, longer prefixes before
//! shorter ones, a named method before "any method". Rules that tie keep their
//! declaration order.

use std::fmt;

use actix_web::http::Method;

use super::context::RequestContext;
use crate::error::AuthError;
use crate::models::Role;

/// A set of roles.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::User => 1,
            Role::Admin => 1 << 1,
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries([Role::User, Role::Admin].into_iter().filter(|r| self.contains(*r)))
            .finish()
    }
}

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, authenticated or not.
    Public,
    /// Any authenticated identity.
    Authenticated,
    /// An authenticated identity holding one of these roles.
    AnyOf(RoleSet),
}

/// Outcome of the authorization stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permitted,
    Denied(AuthError),
}

/// A rule as declared; compiled by [`RoutePolicy::new`].
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// `None` matches every method.
    pub method: Option<Method>,
    pub pattern: String,
    pub requirement: Requirement,
}

impl RouteRule {
    pub fn new(method: Method, pattern: &str, requirement: Requirement) -> Self {
        Self {
            method: Some(method),
            pattern: pattern.to_string(),
            requirement,
        }
    }

    pub fn any_method(pattern: &str, requirement: Requirement) -> Self {
        Self {
            method: None,
            pattern: pattern.to_string(),
            requirement,
        }
    }
}

/// Reasons a table is refused at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    InvalidPattern { pattern: String, reason: &'static str },
    EmptyRoleSet { pattern: String },
    DuplicateRule { method: Option<Method>, pattern: String },
    MissingCatchAll,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolicyError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern {:?}: {}", pattern, reason)
            }
            PolicyError::EmptyRoleSet { pattern } => {
                write!(f, "route {:?} requires an empty role set", pattern)
            }
            PolicyError::DuplicateRule { method, pattern } => match method {
                Some(method) => write!(f, "duplicate rule for {} {}", method, pattern),
                None => write!(f, "duplicate rule for * {}", pattern),
            },
            PolicyError::MissingCatchAll => f.write_str("route table has no catch-all rule"),
        }
    }
}

impl std::error::Error for PolicyError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    /// Literal prefix without the trailing `/**`; empty for the catch-all.
    Prefix(String),
}

impl PathPattern {
    fn parse(pattern: &str) -> Result<Self, PolicyError> {
        let invalid = |reason| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };
        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if let Some(prefix) = pattern.strip_suffix("/**") {
            if prefix.contains('*') {
                return Err(invalid("'**' is only allowed as the final segment"));
            }
            return Ok(PathPattern::Prefix(prefix.trim_end_matches('/').to_string()));
        }
        if pattern.contains('*') {
            return Err(invalid("'**' is only allowed as the final segment"));
        }
        Ok(PathPattern::Exact(normalize(pattern).to_string()))
    }

    fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => {
                prefix.is_empty()
                    || path == prefix
                    || (path.starts_with(prefix.as_str())
                        && path[prefix.len()..].starts_with('/'))
            }
        }
    }

    fn is_catch_all(&self) -> bool {
        matches!(self, PathPattern::Prefix(prefix) if prefix.is_empty())
    }
}

/// Strips a trailing slash, keeping the root path intact.
fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ if path.is_empty() => "/",
        _ => path,
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    method: Option<Method>,
    pattern: PathPattern,
    requirement: Requirement,
}

impl CompiledRule {
    /// Higher sorts first.
    fn specificity(&self) -> (bool, usize, bool) {
        let (exact, literal_len) = match &self.pattern {
            PathPattern::Exact(path) => (true, path.len()),
            PathPattern::Prefix(prefix) => (false, prefix.len()),
        };
        (exact, literal_len, self.method.is_some())
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.matches(path)
    }
}

/// The validated, specificity-ordered route table.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<CompiledRule>,
}

impl RoutePolicy {
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, PolicyError> {
        let mut compiled: Vec<CompiledRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = PathPattern::parse(&rule.pattern)?;
            if let Requirement::AnyOf(roles) = rule.requirement {
                if roles.is_empty() {
                    return Err(PolicyError::EmptyRoleSet {
                        pattern: rule.pattern,
                    });
                }
            }
            if compiled
                .iter()
                .any(|c| c.method == rule.method && c.pattern == pattern)
            {
                return Err(PolicyError::DuplicateRule {
                    method: rule.method,
                    pattern: rule.pattern,
                });
            }
            compiled.push(CompiledRule {
                method: rule.method,
                pattern,
                requirement: rule.requirement,
            });
        }
        if !compiled
            .iter()
            .any(|c| c.method.is_none() && c.pattern.is_catch_all())
        {
            return Err(PolicyError::MissingCatchAll);
        }

        // Stable: equally specific rules keep declaration order.
        compiled.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        Ok(Self { rules: compiled })
    }

    /// The production table for the task manager API.
    pub fn task_manager() -> Result<Self, PolicyError> {
        const ADMIN: Requirement = Requirement::AnyOf(RoleSet::of(&[Role::Admin]));
        const ADMIN_OR_USER: Requirement = Requirement::AnyOf(RoleSet::of(&[Role::Admin, Role::User]));

        Self::new(vec![
            RouteRule::new(Method::GET, "/health", Requirement::Public),
            RouteRule::new(Method::POST, "/api/v1/user-mgmt/**", Requirement::Public),
            RouteRule::new(Method::GET, "/api/v1/user-mgmt/users", ADMIN),
            RouteRule::new(Method::POST, "/api/v1/task-mgmt/tasks", ADMIN),
            RouteRule::new(Method::POST, "/api/v1/task-mgmt/tasks_assign", ADMIN),
            RouteRule::new(Method::DELETE, "/api/v1/task-mgmt/tasks", ADMIN),
            RouteRule::new(Method::PUT, "/api/v1/task-mgmt/assign", ADMIN),
            RouteRule::new(Method::GET, "/api/v1/task-mgmt/tasks", ADMIN_OR_USER),
            RouteRule::new(Method::GET, "/api/v1/task-mgmt/tasks/users", ADMIN_OR_USER),
            RouteRule::new(Method::PUT, "/api/v1/task-mgmt/tasks", ADMIN_OR_USER),
            RouteRule::any_method("/**", Requirement::Authenticated),
        ])
    }

    /// The requirement of the most specific rule matching the route, if any.
    pub fn requirement_for(&self, method: &Method, path: &str) -> Option<Requirement> {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.requirement)
    }

    /// Decides whether `context` may proceed to the route.
    pub fn authorize(&self, method: &Method, path: &str, context: &RequestContext) -> Decision {
        // Unreachable with a validated table, which always ends in a catch-all.
        let requirement = self
            .requirement_for(method, path)
            .unwrap_or(Requirement::Authenticated);

        match (requirement, context.identity()) {
            (Requirement::Public, _) => Decision::Permitted,
            (_, None) => Decision::Denied(AuthError::Unauthenticated),
            (Requirement::Authenticated, Some(_)) => Decision::Permitted,
            (Requirement::AnyOf(roles), Some(identity)) if roles.contains(identity.role) => {
                Decision::Permitted
            }
            (Requirement::AnyOf(_), Some(_)) => Decision::Denied(AuthError::InsufficientRole),
        }
    }
}
