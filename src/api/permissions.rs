//! Ordered authorization checks.
//!
//! Every endpoint declares a [`Chain`]: a slice of [`Permission`]s that are
//! evaluated left to right. The first failing check decides the outcome, later
//! checks never run. Checks are pure predicates over the resolved [`Caller`].

use crate::api::middleware::auth::Caller;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("User does not have tier.")]
    NoTier,
    #[error("User does not have permissions to create link.")]
    MissingCapability,
}

pub trait Permission: Send + Sync {
    fn check(&self, caller: Option<&Caller>) -> Result<(), Denied>;
}

/// Caller identity was resolved from a valid token.
pub struct Authenticated;

/// Caller has a tier assigned.
pub struct HasTier;

/// Caller's tier grants binary link creation.
pub struct CanCreateLink;

impl Permission for Authenticated {
    fn check(&self, caller: Option<&Caller>) -> Result<(), Denied> {
        caller.map(|_| ()).ok_or(Denied::Unauthenticated)
    }
}

impl Permission for HasTier {
    fn check(&self, caller: Option<&Caller>) -> Result<(), Denied> {
        let caller = caller.ok_or(Denied::Unauthenticated)?;
        caller.tier().map(|_| ())
    }
}

impl Permission for CanCreateLink {
    fn check(&self, caller: Option<&Caller>) -> Result<(), Denied> {
        let caller = caller.ok_or(Denied::Unauthenticated)?;
        // two explicit steps: a missing tier is not a missing capability
        let tier = caller.tier()?;
        if tier.can_create_link() {
            Ok(())
        } else {
            Err(Denied::MissingCapability)
        }
    }
}

pub type Chain = &'static [&'static dyn Permission];

/// Listing and uploading images
pub const IMAGE_ACCESS: Chain = &[&Authenticated, &HasTier];

/// Minting a binary link
pub const CREATE_LINK: Chain = &[&Authenticated, &HasTier, &CanCreateLink];

/// Retrieving a binary link; the opaque id is the credential
pub const PUBLIC: Chain = &[];

pub fn authorize(chain: &[&dyn Permission], caller: Option<&Caller>) -> Result<(), Denied> {
    chain.iter().try_for_each(|permission| permission.check(caller))
}
