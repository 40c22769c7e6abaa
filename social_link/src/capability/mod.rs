//! Capabilities the host application injects
//!
//! - `provider`: the OAuth provider client
//! - `session`: session login/logout

mod provider;
mod session;

pub use provider::{ProviderClient, ProviderError};
pub use session::{SessionError, SessionLogin};
