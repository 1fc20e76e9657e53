//! Anti-bot challenge capability.
//!
//! Solving the visual challenge is delegated to an external agent. The login
//! flow only needs two things from it: to be bound to the session before the
//! first navigation, and to block until a presented challenge is solved or
//! known to be absent.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Session;

#[async_trait]
pub trait ChallengeResolver: Send + Sync {
    /// Binds the resolver to `session`. Called before the login page loads so
    /// the resolver can observe page events from the start.
    async fn attach(&self, _session: &dyn Session) -> Result<()> {
        Ok(())
    }

    /// Resolves when the challenge is solved or confirmed absent.
    ///
    /// Errors are reported to the caller, which treats them as non-fatal.
    async fn wait_for_challenge(&self, session: &dyn Session) -> Result<()>;
}

/// Resolver for deployments without a challenge solver: never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChallenge;

#[async_trait]
impl ChallengeResolver for NoChallenge {
    async fn wait_for_challenge(&self, _session: &dyn Session) -> Result<()> {
        Ok(())
    }
}
