use thiserror::Error;

use crate::codec::{Address, Quantity};

/// Errors raised while declaring bindings or configuring a layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("binding at address {first} has zero size entries")]
    ZeroSize { first: Address },
    #[error("binding at address {first} has {size} unit entries but the value needs {needed}")]
    SizeTooSmall {
        first: Address,
        size: Quantity,
        needed: Quantity,
    },
    #[error("binding at address {first} does not fit below address 0xFFFF")]
    AddressOverflow { first: Address },
    #[error("entry {index} is out of range for a binding of {count} entries")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("binding at address {first} overlaps the binding at address {other}")]
    Overlapping { first: Address, other: Address },
    #[error("byte order is undefined")]
    UndefinedOrder,
    #[error("expected {expected} words, got {actual}")]
    WordCount { expected: usize, actual: usize },
}
