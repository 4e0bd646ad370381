//! Which app paths need a session, and where to send the user otherwise.

use crate::location::Location;

/// Paths that require a logged-in user.
pub const PROTECTED_PATHS: &[&str] = &["/tasks", "/calendar", "/settings"];

/// Paths only useful to logged-out users.
pub const PUBLIC_ONLY_PATHS: &[&str] = &["/login", "/register"];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/tasks";
pub const REDIRECTED_FROM_PARAM: &str = "redirectedFrom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin { redirected_from: String },
    Redirect(String),
}

impl RouteDecision {
    /// Where the user ends up, given they asked for `requested`.
    pub fn destination(&self, requested: &Location) -> Location {
        match self {
            RouteDecision::Allow => requested.clone(),
            RouteDecision::RedirectToLogin { redirected_from } => {
                Location::new(LOGIN_PATH).with_param(REDIRECTED_FROM_PARAM, redirected_from.as_str())
            }
            RouteDecision::Redirect(path) => Location::parse(path),
        }
    }
}

fn is_under(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

pub fn is_protected(path: &str) -> bool {
    is_under(path, PROTECTED_PATHS)
}

pub fn gate(path: &str, has_session: bool) -> RouteDecision {
    if is_under(path, PROTECTED_PATHS) && !has_session {
        return RouteDecision::RedirectToLogin {
            redirected_from: path.to_string(),
        };
    }

    if is_under(path, PUBLIC_ONLY_PATHS) && has_session {
        return RouteDecision::Redirect(HOME_PATH.to_string());
    }

    RouteDecision::Allow
}

/// Where to go after logging in: back to the protected page that bounced
/// the user, or home.
pub fn after_login(login_location: &Location) -> Location {
    match login_location.param(REDIRECTED_FROM_PARAM) {
        Some(from) if from.starts_with('/') && is_protected(from) => Location::parse(from),
        _ => Location::new(HOME_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_paths_require_session() {
        assert_eq!(
            gate("/tasks", false),
            RouteDecision::RedirectToLogin {
                redirected_from: "/tasks".into()
            }
        );
        assert_eq!(gate("/settings/profile", true), RouteDecision::Allow);
        assert!(matches!(gate("/calendar", false), RouteDecision::RedirectToLogin { .. }));
    }

    #[test]
    fn public_only_paths_bounce_logged_in_users() {
        assert_eq!(gate("/login", true), RouteDecision::Redirect("/tasks".into()));
        assert_eq!(gate("/register", false), RouteDecision::Allow);
        assert_eq!(gate("/", false), RouteDecision::Allow);
    }

    #[test]
    fn login_redirect_carries_origin() {
        let requested = Location::parse("/calendar?view=week");
        let decision = gate(requested.path(), false);
        let login = decision.destination(&requested);

        assert_eq!(login.to_string(), "/login?redirectedFrom=%2Fcalendar");
        assert_eq!(after_login(&login).to_string(), "/calendar");
        assert_eq!(after_login(&Location::parse("/login")).to_string(), "/tasks");
        assert_eq!(
            after_login(&Location::parse("/login?redirectedFrom=https://evil.example")).to_string(),
            "/tasks"
        );
    }
}
