//! Route handlers, one module per resource.

pub mod annotations;
pub mod annotators;
pub mod questions;
pub mod sampling;
