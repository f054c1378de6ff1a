//! Account layer for Mangrove.
//!
//! Everything credential-shaped lives here, behind the [`AccountStore`]
//! trait:
//!
//! 1. **The store boundary** ([`AccountStore`], [`PlayerAccount`]) —
//!    persisted accounts are an external collaborator; the server only
//!    sees this trait.
//! 2. **Signup** ([`signup`], [`SignupOutcome`]) — the one-shot
//!    provisioning operation and its exact client-facing replies.
//! 3. **Authentication** ([`Authenticator`], [`AuthOutcome`]) —
//!    turning an inbound credential pair into a client-safe profile.
//!
//! A production deployment implements [`AccountStore`] over its real
//! database and hash scheme. [`MemoryAccountStore`] is the in-process
//! implementation used by the dev server and the test suites.

mod auth;
mod error;
mod signup;
mod store;

pub use auth::{AuthOutcome, Authenticator};
pub use error::AccountError;
pub use signup::{SignupOutcome, signup, valid_username};
pub use store::{AccountStore, MemoryAccountStore, PlayerAccount};
