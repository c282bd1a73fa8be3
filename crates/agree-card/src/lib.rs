//! Statement cards for Agree.
//!
//! [`layout::fit`] picks a font size and line breaks for a statement,
//! [`render::render`] turns that into an SVG for one
//! [`CardVariant`](agree_core::card::CardVariant) and
//! [`Theme`](agree_core::card::Theme), and [`worker`] keeps the card cache
//! in sync with statement content in the background.
//!
//! # Quick start
//!
//! ```no_run
//! use agree_card::render;
//! use agree_core::card::{CardVariant, Theme};
//!
//! let svg = render("cats are great", CardVariant::Square, Theme::Light).unwrap();
//! println!("{}", String::from_utf8_lossy(&svg));
//! ```

pub mod error;
pub mod layout;
pub mod render;
pub mod sink;
pub mod style;
pub mod worker;

pub use error::{Error, Result};
pub use render::{etag, render};
pub use sink::DirectorySink;
pub use worker::{RenderJobs, RetryPolicy};
