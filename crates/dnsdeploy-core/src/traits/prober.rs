// # Verification Traits
//
// Defines the two read-only collaborators used to verify a deployment:
// DNS target resolution and HTTP liveness probing.
//
// Both are deliberately infallible at the trait level: a hostname that does
// not resolve, or an endpoint that cannot be reached, is a normal observation
// during propagation, not an error. Transport failures are downgraded inside
// the implementations.

use async_trait::async_trait;

/// Result of one HTTP liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the endpoint answered at all
    pub reachable: bool,
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
}

impl ProbeOutcome {
    /// An outcome for an endpoint that could not be reached
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            status: None,
        }
    }

    /// An outcome carrying an HTTP status code
    pub fn with_status(status: u16) -> Self {
        Self {
            reachable: true,
            status: Some(status),
        }
    }

    /// Whether the probe counts as "live" (any 2xx/3xx response)
    pub fn is_live(&self) -> bool {
        self.reachable && self.status.is_some_and(|s| (200..400).contains(&s))
    }
}

/// Trait for DNS target resolution
///
/// Used by the propagation loop to check whether a hostname currently
/// resolves to the expected target.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Resolve the canonical target of `hostname`
    ///
    /// # Returns
    ///
    /// - `Some(target)`: The hostname resolves; `target` is its canonical
    ///   (CNAME) destination, or the hostname itself when it resolves
    ///   directly to an address
    /// - `None`: The hostname does not currently resolve
    async fn resolve_target(&self, hostname: &str) -> Option<String>;
}

/// Trait for HTTP liveness probing
#[async_trait]
pub trait LivenessProber: Send + Sync {
    /// Issue one HTTP request to `https://{hostname}` and report the outcome
    ///
    /// Network errors are downgraded to an unreachable outcome, never raised.
    async fn probe(&self, hostname: &str) -> ProbeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_count_as_live() {
        assert!(ProbeOutcome::with_status(200).is_live());
        assert!(ProbeOutcome::with_status(301).is_live());
        assert!(!ProbeOutcome::with_status(404).is_live());
        assert!(!ProbeOutcome::with_status(503).is_live());
        assert!(!ProbeOutcome::unreachable().is_live());
    }
}
