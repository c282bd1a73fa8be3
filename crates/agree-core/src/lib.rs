//! Core types and trait definitions for the Agree statement tree.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, the card renderer and the HTTP layer all depend on it.

// Store traits spell out `Send` futures; implementors write `async fn`.
#![allow(async_fn_in_trait)]

pub mod card;
pub mod error;
pub mod normalize;
pub mod statement;
pub mod store;
pub mod vote;

pub use error::{Error, Result};
