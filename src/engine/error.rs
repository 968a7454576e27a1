//! Error types for vending operations.

use thiserror::Error;

use crate::Amount;
use crate::model::Product;

pub use crate::change::ChangeError;

/// Top-level error returned by [`Engine::apply`](super::Engine::apply).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("select failed: {0}")]
    Select(#[from] SelectError),

    #[error("collect failed: {0}")]
    Collect(#[from] CollectError),

    #[error("refund failed: {0}")]
    Refund(#[from] ChangeError),
}

/// Error during product selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("{0} is sold out, please buy another item")]
    SoldOut(Product),
}

/// Error while collecting the selected product and its change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("no product selected")]
    NoSelection,

    #[error("price of {product} not fully paid, remaining: {remaining}")]
    NotFullPaid { product: Product, remaining: Amount },

    #[error("{0}, please try another product")]
    InsufficientChange(#[from] ChangeError),
}
