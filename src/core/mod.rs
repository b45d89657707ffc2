//! Shared primitives: constants, chain ids, currency units

pub mod chain;
pub mod consts;
pub mod units;
