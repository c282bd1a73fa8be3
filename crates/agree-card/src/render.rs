//! SVG generation for statement cards.
//!
//! Output depends only on `(content, variant, theme)`: no timestamps, ids or
//! random values are written, and every number is formatted with a fixed
//! precision. Identical input always yields identical bytes.

use std::io::Cursor;

use agree_core::card::{CardVariant, Theme};
use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};
use sha2::{Digest, Sha256};

use crate::{
  error::{Error, Result},
  layout::{self, Layout},
  style::{Canvas, Palette},
};

pub const HEADER_TEXT: &str = "we agree that...";
pub const FONT_FAMILY: &str = "Futura, sans-serif";
const FONT_WEIGHT: &str = "700";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Render `content` as an SVG card.
pub fn render(content: &str, variant: CardVariant, theme: Theme) -> Result<Vec<u8>> {
  let canvas = Canvas::of(variant);
  let palette = Palette::of(theme);
  let text = with_terminal_punctuation(content);
  let layout = layout::fit(&text, &canvas.frame());

  let mut svg = SvgWriter::new();
  let width = canvas.width.to_string();
  let height = canvas.height.to_string();
  let view_box = format!("0 0 {width} {height}");

  svg.start("svg", &[
    ("xmlns", SVG_NS),
    ("width", &width),
    ("height", &height),
    ("viewBox", &view_box),
  ])?;
  svg.empty("rect", &[
    ("width", "100%"),
    ("height", "100%"),
    ("fill", palette.background),
  ])?;
  write_header(&mut svg, &canvas, &palette)?;
  write_content(&mut svg, &canvas, &palette, &layout)?;
  svg.end("svg")?;

  Ok(svg.finish())
}

/// Quoted SHA-256 hex digest of a rendered body.
pub fn etag(body: &[u8]) -> String { format!("\"{}\"", hex::encode(Sha256::digest(body))) }

/// Append a period unless the text already ends in `.`, `!` or `?`.
pub fn with_terminal_punctuation(content: &str) -> String {
  let trimmed = content.trim_end();
  if trimmed.ends_with(['.', '!', '?']) {
    trimmed.to_owned()
  } else {
    format!("{trimmed}.")
  }
}

// ─── Sections ────────────────────────────────────────────────────────────────

fn write_header(svg: &mut SvgWriter, canvas: &Canvas, palette: &Palette) -> Result<()> {
  let padding = f64::from(canvas.padding);
  let x = num(padding);
  let y = num(padding + f64::from(canvas.header_size));
  let size = canvas.header_size.to_string();

  svg.start("text", &[
    ("x", &x),
    ("y", &y),
    ("font-family", FONT_FAMILY),
    ("font-size", &size),
    ("font-weight", FONT_WEIGHT),
    ("fill", palette.header),
  ])?;
  svg.text(HEADER_TEXT)?;
  svg.end("text")
}

fn write_content(
  svg: &mut SvgWriter,
  canvas: &Canvas,
  palette: &Palette,
  layout: &Layout,
) -> Result<()> {
  let padding = f64::from(canvas.padding);
  let x = num(padding);
  let y = num(padding + canvas.header_total() + f64::from(layout.font_size));
  let size = layout.font_size.to_string();
  let step = num(layout.line_height());

  svg.start("text", &[
    ("x", &x),
    ("y", &y),
    ("font-family", FONT_FAMILY),
    ("font-size", &size),
    ("font-weight", FONT_WEIGHT),
    ("fill", palette.text),
  ])?;
  for (i, line) in layout.lines.iter().enumerate() {
    let dy = if i == 0 { "0" } else { step.as_str() };
    svg.start("tspan", &[("x", &x), ("dy", dy)])?;
    svg.text(line)?;
    svg.end("tspan")?;
  }
  svg.end("text")
}

/// Two decimals, trailing zeros dropped.
fn num(value: f64) -> String {
  let s = format!("{value:.2}");
  s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

// ─── Writer ──────────────────────────────────────────────────────────────────

struct SvgWriter {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl SvgWriter {
  fn new() -> Self { Self { writer: Writer::new(Cursor::new(Vec::new())) } }

  fn start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let el = BytesStart::new(tag).with_attributes(attrs.iter().copied());
    self.write(Event::Start(el))
  }

  fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let el = BytesStart::new(tag).with_attributes(attrs.iter().copied());
    self.write(Event::Empty(el))
  }

  fn text(&mut self, text: &str) -> Result<()> { self.write(Event::Text(BytesText::new(text))) }

  fn end(&mut self, tag: &str) -> Result<()> { self.write(Event::End(BytesEnd::new(tag))) }

  fn write(&mut self, event: Event<'_>) -> Result<()> {
    self
      .writer
      .write_event(event)
      .map_err(|e| Error::Svg(e.to_string()))
  }

  fn finish(self) -> Vec<u8> { self.writer.into_inner().into_inner() }
}
