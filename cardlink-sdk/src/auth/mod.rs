//! Bearer-token lifecycle management.
//!
//! [`TokenManager`] decorates any [`Transport`](crate::transport::Transport)
//! with a bearer token obtained through the OAuth2 client-credentials grant,
//! and recovers from a stale token with exactly one refresh and one retry.

mod credential;
mod token;

pub use credential::Credential;
pub use token::{GRANT_TYPE_CLIENT_CREDENTIALS, TokenManager};
