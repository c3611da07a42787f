//! Parse and validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account id: {0:?}")]
    InvalidAccount(String),

    #[error("invalid content reference: {0}")]
    InvalidContentRef(String),

    #[error("invalid token amount: {0}")]
    InvalidAmount(String),
}
