//! Font fitting and greedy line wrapping.
//!
//! No font metrics are consulted: a glyph is assumed to be `0.6 × font_size`
//! wide. That keeps the result identical on every machine, at the cost of an
//! approximate fit.

/// Largest candidate font size, in pixels.
pub const MAX_FONT_SIZE: u32 = 120;
/// Smallest candidate font size. Used even when the text overflows.
pub const MIN_FONT_SIZE: u32 = 16;
/// Estimated glyph width as a fraction of the font size.
pub const CHAR_WIDTH: f64 = 0.6;
/// Baseline-to-baseline distance as a fraction of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// The space a block of text has to fit into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
  pub width:           f64,
  pub height:          f64,
  /// Horizontal padding applied on both sides.
  pub padding:         f64,
  /// Vertical space not available to the text (header and paddings).
  pub header_reserved: f64,
}

impl Frame {
  pub fn usable_width(&self) -> f64 { self.width - 2.0 * self.padding }

  pub fn available_height(&self) -> f64 { self.height - self.header_reserved }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  pub font_size: u32,
  pub lines:     Vec<String>,
}

impl Layout {
  /// Distance between consecutive baselines.
  pub fn line_height(&self) -> f64 { line_height(self.font_size) }

  pub fn block_height(&self) -> f64 { block_height(self.lines.len(), self.font_size) }
}

/// Pick the largest font size whose wrapped block fits `frame`.
///
/// Sizes are tried from [`MAX_FONT_SIZE`] down to [`MIN_FONT_SIZE`]. When
/// nothing fits, the minimum size is returned and the text overflows.
pub fn fit(text: &str, frame: &Frame) -> Layout {
  let words: Vec<&str> = text.split_whitespace().collect();
  let usable_width = frame.usable_width();
  let available_height = frame.available_height();

  for font_size in (MIN_FONT_SIZE..=MAX_FONT_SIZE).rev() {
    let lines = wrap(&words, font_size, usable_width);
    if block_height(lines.len(), font_size) <= available_height {
      return Layout { font_size, lines };
    }
  }

  Layout {
    font_size: MIN_FONT_SIZE,
    lines:     wrap(&words, MIN_FONT_SIZE, usable_width),
  }
}

/// Greedily pack `words` into lines no wider than `max_width`.
///
/// A word wider than `max_width` on its own still gets a line of its own.
pub fn wrap(words: &[&str], font_size: u32, max_width: f64) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();
  let mut current_len = 0usize;

  for word in words {
    let word_len = word.chars().count();
    let candidate_len = if current.is_empty() {
      word_len
    } else {
      current_len + 1 + word_len
    };

    if estimate_width(candidate_len, font_size) > max_width && !current.is_empty() {
      lines.push(std::mem::take(&mut current));
      current.push_str(word);
      current_len = word_len;
    } else {
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(word);
      current_len = candidate_len;
    }
  }

  if !current.is_empty() {
    lines.push(current);
  }
  lines
}

pub fn estimate_width(chars: usize, font_size: u32) -> f64 {
  chars as f64 * f64::from(font_size) * CHAR_WIDTH
}

pub fn line_height(font_size: u32) -> f64 { f64::from(font_size) * LINE_HEIGHT }

fn block_height(lines: usize, font_size: u32) -> f64 { lines as f64 * line_height(font_size) }
