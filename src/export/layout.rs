//! Measured word-wrap and pagination.
//!
//! Layout is independent of the PDF backend: it only needs something that can
//! measure a run of text at the export font size ([`TextMeasure`]). Devanagari
//! and Latin glyphs differ a lot in advance width, so wrapping by character
//! count would overflow or under-fill lines that mix the two.
//!
//! Coordinates are PDF points with the origin at the top-left of the page and
//! y growing downward; the backend flips y when it writes the page.

use crate::config::ExportConfig;
use crate::error::ExportError;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Tolerance for floating-point comparisons against page bounds.
const EPSILON: f32 = 1e-3;

/// Width of a run of text at the export font size, in points.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

impl<F: Fn(&str) -> f32> TextMeasure for F {
    fn width(&self, text: &str) -> f32 {
        self(text)
    }
}

/// One line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub x: f32,
    /// Distance from the top edge of the page to the baseline.
    pub baseline: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PositionedLine>,
}

/// Laid-out pages, ready for a backend to serialise.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<Page>,
}

impl ExportArtifact {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Paragraphs are split at line breaks (`\r\n`, `\r` and `\n` all count) and
/// blank paragraphs become empty lines. Trailing line breaks are dropped.
/// Whitespace-only input yields no lines at all.
pub fn wrap_text(text: &str, max_width: f32, measure: &impl TextMeasure) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalised.trim_end();
    if body.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in body.split('\n') {
        wrap_paragraph(paragraph, max_width, measure, &mut lines);
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f32,
    measure: &impl TextMeasure,
    out: &mut Vec<String>,
) {
    let fits = |s: &str| measure.width(s) <= max_width + EPSILON;

    let mut current = String::new();
    let mut any_word = false;
    for word in paragraph.split_whitespace() {
        any_word = true;
        if current.is_empty() {
            if fits(word) {
                current.push_str(word);
            } else {
                current = break_word(word, &fits, out);
            }
            continue;
        }

        let candidate = format!("{current} {word}");
        if fits(&candidate) {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            if fits(word) {
                current.push_str(word);
            } else {
                current = break_word(word, &fits, out);
            }
        }
    }

    if !any_word || !current.is_empty() {
        out.push(current);
    }
}

/// Break a word wider than a line between grapheme clusters, so a vowel sign
/// or virama stays with its consonant. Full pieces go to `out`; the trailing
/// piece is returned so the next word can join it.
fn break_word(word: &str, fits: &impl Fn(&str) -> bool, out: &mut Vec<String>) -> String {
    let mut piece = String::new();
    for cluster in word.graphemes(true) {
        let before = piece.len();
        piece.push_str(cluster);
        if !fits(&piece) && before > 0 {
            piece.truncate(before);
            out.push(std::mem::take(&mut piece));
            piece.push_str(cluster);
        }
    }
    piece
}

/// Wrap and paginate `text` under `config`.
///
/// Line `k` of a page sits with its baseline at `margin + (k + 1) × line_advance`;
/// a line whose baseline would fall below `page_height − margin` starts a new
/// page. Empty input produces one empty page.
pub fn layout(
    text: &str,
    config: &ExportConfig,
    measure: &impl TextMeasure,
) -> Result<ExportArtifact, ExportError> {
    config.validate().map_err(ExportError::InvalidGeometry)?;

    let lines = wrap_text(text, config.line_width(), measure);
    let bottom = config.page_height - config.margin;

    let mut pages = vec![Page::default()];
    for line in lines {
        let slot = pages.last().map_or(0, |p| p.lines.len());
        let mut baseline = config.margin + (slot as f32 + 1.0) * config.line_advance;
        if baseline > bottom + EPSILON {
            pages.push(Page::default());
            baseline = config.margin + config.line_advance;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(PositionedLine {
                text: line,
                x: config.margin,
                baseline,
            });
        }
    }

    let artifact = ExportArtifact {
        page_width: config.page_width,
        page_height: config.page_height,
        pages,
    };
    debug!(
        "Laid out {} lines on {} page(s)",
        artifact.line_count(),
        artifact.page_count()
    );
    Ok(artifact)
}
