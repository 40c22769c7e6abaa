mod types;

pub use types::{LocalUser, UserSearchField};
