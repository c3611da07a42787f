//! Fundamental types for grantgov.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, bond-token amounts, timestamps, content references and
//! the governance configuration.

pub mod account;
pub mod amount;
pub mod content;
pub mod error;
pub mod params;
pub mod time;

pub use account::AccountId;
pub use amount::{TokenAmount, TOKEN_UNIT};
pub use content::ContentRef;
pub use error::TypesError;
pub use params::{ConfigSnapshot, GovernanceConfig};
pub use time::Timestamp;
