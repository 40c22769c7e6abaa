//! Coordination between the store, the provider client and the session
//!
//! [`IdentityLinker`] decides which local user a provider profile belongs
//! to. [`SocialAuth`] wraps it in the full sign-in flow.

mod errors;
mod linker;
mod mapping;
mod social;

pub use errors::LinkError;
pub use linker::{IdentityLinker, LinkOutcome, LinkedIdentity};
pub use social::SocialAuth;
