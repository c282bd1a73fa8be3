//! Canvas geometry per [`CardVariant`] and colours per [`Theme`].

use agree_core::card::{CardVariant, Theme};

use crate::layout::{Frame, LINE_HEIGHT};

/// Space between the header baseline region and the statement text.
const HEADER_GAP: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
  pub width:       u32,
  pub height:      u32,
  pub padding:     u32,
  pub header_size: u32,
}

impl Canvas {
  pub const SQUARE: Canvas = Canvas { width: 512, height: 512, padding: 40, header_size: 24 };
  pub const WIDE: Canvas = Canvas { width: 1200, height: 630, padding: 60, header_size: 48 };

  pub fn of(variant: CardVariant) -> Self {
    match variant {
      CardVariant::Square => Self::SQUARE,
      CardVariant::Social | CardVariant::Og => Self::WIDE,
    }
  }

  /// Vertical space taken by the header line and the gap below it.
  pub fn header_total(&self) -> f64 { f64::from(self.header_size) * LINE_HEIGHT + HEADER_GAP }

  /// The frame the statement text is fitted into.
  pub fn frame(&self) -> Frame {
    let padding = f64::from(self.padding);
    Frame {
      width: f64::from(self.width),
      height: f64::from(self.height),
      padding,
      header_reserved: 2.0 * padding + self.header_total(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub background: &'static str,
  pub text:       &'static str,
  pub header:     &'static str,
}

impl Palette {
  pub const LIGHT: Palette = Palette { background: "#f8f9fa", text: "#111827", header: "#6b7280" };
  pub const DARK: Palette = Palette { background: "#111827", text: "#f8f9fa", header: "#9ca3af" };

  pub fn of(theme: Theme) -> Self {
    match theme {
      Theme::Light => Self::LIGHT,
      Theme::Dark => Self::DARK,
    }
  }
}
