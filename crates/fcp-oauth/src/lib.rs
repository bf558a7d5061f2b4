//! FCP OAuth - OAuth 2.0 app authentication for FCP connectors
//!
//! Connectors that sign user-context requests themselves (OAuth 1.0a) can
//! still prefer an app-only bearer token where the provider allows it. This
//! crate covers that half:
//!
//! - **Client credentials**: exchange a client id/secret for a bearer token
//! - **Token bookkeeping**: expiry tracking and refresh thresholds
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fcp_oauth::{OAuth2Client, OAuth2Config};
//!
//! let config = OAuth2Config::new("client_id", "client_secret", "https://api.example.com/oauth2/token")
//!     .with_scopes(vec!["tweet.read".into(), "users.read".into()]);
//!
//! let client = OAuth2Client::new(config)?;
//! let tokens = client.client_credentials(&[]).await?;
//! println!("{}", tokens.authorization_header());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod oauth2;
mod token;

pub use error::*;
pub use oauth2::*;
pub use token::*;

use std::time::Duration;

/// Default token refresh threshold (refresh when less than this time remaining).
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(300); // 5 minutes

/// OAuth grant types used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Client credentials grant (service-to-service).
    ClientCredentials,
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientCredentials => write!(f, "client_credentials"),
        }
    }
}
