//! # Campus Portal Testing
//!
//! Deterministic test support for the campus event portal:
//!
//! - Mock implementations of environment traits
//! - A fixed clock so registration timestamps are reproducible
//! - A stalled identity service for exercising the session-resolution
//!   timeout path

use campus_portal_core::environment::Clock;
use chrono::{DateTime, Utc};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use campus_portal_core::identity::{
        AuthSignal, AuthWatch, Identity, IdentityError, IdentityService,
    };
    use campus_portal_core::BoxFuture;
    use tokio::sync::watch;

    /// Fixed clock for deterministic tests.
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use campus_portal_testing::mocks::FixedClock;
    /// use campus_portal_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-08-01 00:00:00 UTC).
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-08-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Identity service whose auth signal never resolves.
    ///
    /// Lets tests drive the session provider down its timeout path: the
    /// watch stays at [`AuthSignal::Unresolved`] forever, and every other
    /// operation reports a transport failure.
    pub struct StalledIdentity {
        auth: watch::Sender<AuthSignal>,
    }

    impl StalledIdentity {
        /// Creates a stalled identity service.
        #[must_use]
        pub fn new() -> Self {
            let (auth, _) = watch::channel(AuthSignal::Unresolved);
            Self { auth }
        }
    }

    impl Default for StalledIdentity {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdentityService for StalledIdentity {
        fn sign_up(
            &self,
            _email: String,
            _password: String,
        ) -> BoxFuture<'_, Result<Identity, IdentityError>> {
            Box::pin(async { Err(IdentityError::Transport("identity service stalled".into())) })
        }

        fn sign_in(
            &self,
            _email: String,
            _password: String,
        ) -> BoxFuture<'_, Result<Identity, IdentityError>> {
            Box::pin(async { Err(IdentityError::Transport("identity service stalled".into())) })
        }

        fn sign_out(&self) -> BoxFuture<'_, Result<(), IdentityError>> {
            Box::pin(async { Err(IdentityError::Transport("identity service stalled".into())) })
        }

        fn watch_auth(&self) -> AuthWatch {
            self.auth.subscribe()
        }
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, StalledIdentity};
