//! Role policy and navigation gating.
//!
//! Role checks live in one place instead of being repeated per screen, and
//! coordinator-only destinations are gated by *substitution*: an anonymous
//! visitor is shown the login screen and a plain user the event list, never
//! an error page. This is view policy, not a security boundary — the HTTP
//! layer separately rejects unauthorized writes.

use crate::session::AuthState;
use crate::types::Role;

/// The single role check for event management capabilities.
#[must_use]
pub const fn can_manage_events(role: Role) -> bool {
    matches!(role, Role::Coordinator)
}

/// Navigation-relevant authentication state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState {
    /// Session resolution still in flight.
    Loading,
    /// Nobody signed in.
    Anonymous,
    /// Signed in as a plain user.
    User,
    /// Signed in as a coordinator.
    Coordinator,
}

impl From<&AuthState> for NavState {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => Self::Loading,
            AuthState::Anonymous => Self::Anonymous,
            AuthState::Authenticated { role, .. } => match role {
                Role::User => Self::User,
                Role::Coordinator => Self::Coordinator,
            },
        }
    }
}

/// Screens a client can navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Landing page.
    Home,
    /// Account creation.
    Signup,
    /// Credential login.
    Login,
    /// Event list.
    Events,
    /// Calendar view.
    Calendar,
    /// Own profile.
    Profile,
    /// Coordinator-only: create a new event.
    CreateEvent,
    /// Coordinator-only: edit an existing event.
    EditEvent,
    /// Loading placeholder while the session resolves.
    LoadingScreen,
}

impl Screen {
    /// Whether the screen is reserved for coordinators.
    #[must_use]
    pub const fn coordinator_only(self) -> bool {
        matches!(self, Self::CreateEvent | Self::EditEvent)
    }
}

/// Resolves a requested destination for the current navigation state,
/// substituting an alternate screen where the request is not allowed.
#[must_use]
pub const fn resolve(nav: NavState, requested: Screen) -> Screen {
    if !requested.coordinator_only() {
        return requested;
    }
    match nav {
        NavState::Coordinator => requested,
        NavState::Anonymous => Screen::Login,
        NavState::User => Screen::Events,
        NavState::Loading => Screen::LoadingScreen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_coordinators_manage_events() {
        assert!(can_manage_events(Role::Coordinator));
        assert!(!can_manage_events(Role::User));
    }

    #[test]
    fn coordinator_screens_substitute_rather_than_error() {
        assert_eq!(resolve(NavState::Anonymous, Screen::CreateEvent), Screen::Login);
        assert_eq!(resolve(NavState::User, Screen::CreateEvent), Screen::Events);
        assert_eq!(resolve(NavState::User, Screen::EditEvent), Screen::Events);
        assert_eq!(
            resolve(NavState::Coordinator, Screen::CreateEvent),
            Screen::CreateEvent
        );
        assert_eq!(
            resolve(NavState::Loading, Screen::EditEvent),
            Screen::LoadingScreen
        );
    }

    #[test]
    fn public_screens_pass_through_for_everyone() {
        for nav in [
            NavState::Loading,
            NavState::Anonymous,
            NavState::User,
            NavState::Coordinator,
        ] {
            assert_eq!(resolve(nav, Screen::Events), Screen::Events);
            assert_eq!(resolve(nav, Screen::Calendar), Screen::Calendar);
        }
    }
}
