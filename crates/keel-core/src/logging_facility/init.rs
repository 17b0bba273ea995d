//! Subscriber installation

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Filter variable consulted before `RUST_LOG`
pub const FILTER_ENV: &str = "KEEL_LOG";

/// Output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines on stderr
    Development,
    /// One JSON object per event on stderr
    Production,
    /// Bare registry; pair with `init_test_capture()`
    Test,
}

impl Profile {
    /// Filter used when neither `KEEL_LOG` nor `RUST_LOG` is set
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "keel=debug",
            Profile::Production => "keel=info",
            Profile::Test => "off",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(FILTER_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call in a process has any effect, and a subscriber that
/// is already installed (a test harness, an embedding host) is kept.
/// Logs go to stderr; stdout belongs to command output.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        if installed.is_err() {
            tracing::debug!(?profile, "global subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(Profile::Test);
        init(Profile::Production);
    }

    #[test]
    fn test_default_directives_target_keel_crates() {
        assert_eq!(Profile::Development.default_directive(), "keel=debug");
        assert_eq!(Profile::Production.default_directive(), "keel=info");
        assert_eq!(Profile::Test.default_directive(), "off");
    }
}
