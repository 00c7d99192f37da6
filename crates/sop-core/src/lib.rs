//! Core types and trait definitions for the SOP annotation coordinator.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! sampler lives here so it can be driven by any [`store::AnnotationStore`].

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod annotation;
pub mod annotator;
pub mod error;
pub mod question;
pub mod sampling;
pub mod store;

pub use error::{Error, Result};
