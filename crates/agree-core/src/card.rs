//! Card identities and cache entries.
//!
//! A card is a fixed-size SVG summary of a statement. Each statement has one
//! cached rendering per [`CardKind`]; the set is replaced as a whole whenever
//! the statement is re-rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Canvas geometry of a card.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardVariant {
  /// 512×512 thumbnail.
  Square,
  /// 1200×630 share image.
  Social,
  /// 1200×630 Open Graph image.
  Og,
}

/// Colour theme of a card.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

/// Cache key for one rendering of a statement.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CardKind {
  Square,
  Social,
  DarkSquare,
  DarkSocial,
  Og,
}

impl CardKind {
  /// Every kind the render worker produces for a statement.
  pub fn all() -> impl Iterator<Item = CardKind> { Self::iter() }

  /// The kind for a `(variant, theme)` request. Open Graph cards are only
  /// rendered in the light theme.
  pub fn from_parts(variant: CardVariant, theme: Theme) -> Option<Self> {
    match (variant, theme) {
      (CardVariant::Square, Theme::Light) => Some(Self::Square),
      (CardVariant::Square, Theme::Dark) => Some(Self::DarkSquare),
      (CardVariant::Social, Theme::Light) => Some(Self::Social),
      (CardVariant::Social, Theme::Dark) => Some(Self::DarkSocial),
      (CardVariant::Og, Theme::Light) => Some(Self::Og),
      (CardVariant::Og, Theme::Dark) => None,
    }
  }

  pub fn variant(self) -> CardVariant {
    match self {
      Self::Square | Self::DarkSquare => CardVariant::Square,
      Self::Social | Self::DarkSocial => CardVariant::Social,
      Self::Og => CardVariant::Og,
    }
  }

  pub fn theme(self) -> Theme {
    match self {
      Self::DarkSquare | Self::DarkSocial => Theme::Dark,
      Self::Square | Self::Social | Self::Og => Theme::Light,
    }
  }

  /// Key under which a rendering is uploaded to the blob sink. The key
  /// carries the body's digest, so a new rendering never overwrites the
  /// blob a cached entry points at.
  pub fn blob_key(self, statement_id: Uuid, etag: &str) -> String {
    format!("{statement_id}/{self}-{}.svg", etag.trim_matches('"'))
  }
}

/// A cached rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRender {
  pub statement_id: Uuid,
  pub kind:         CardKind,
  pub content_type: String,
  pub body:         Vec<u8>,
  /// Quoted SHA-256 hex digest of `body`.
  pub etag:         String,
  pub rendered_at:  DateTime<Utc>,
}
