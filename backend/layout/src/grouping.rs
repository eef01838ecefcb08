//! Grouping of positioned text runs into lines and blocks.

use docsift_core::{Line, RawBlock, Span};

/// Average glyph advance as a fraction of the font size, used to estimate
/// where a run ends when glyph widths are not resolved.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// A string shown by one text operator, positioned in top-down page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Distance from the top of the page to the top of the glyph box.
    pub top: f32,
    pub size: f32,
    pub font: String,
    pub bold: bool,
    pub text: String,
}

impl TextRun {
    fn estimated_end(&self) -> f32 {
        self.x + self.text.chars().count() as f32 * self.size * AVG_GLYPH_WIDTH
    }
}

/// Tolerances for line and block grouping, relative to the font size.
#[derive(Debug, Clone, Copy)]
pub struct GroupingOptions {
    /// Runs whose tops differ by at most this × size share a line.
    pub line_tolerance: f32,
    /// Lines further apart than this × size start a new block.
    pub block_gap: f32,
    /// A size change of at least this many points starts a new block.
    pub size_break: f32,
    /// Horizontal gaps above this × size get a separating space.
    pub word_gap: f32,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            line_tolerance: 0.5,
            block_gap: 1.5,
            size_break: 1.0,
            word_gap: 0.1,
        }
    }
}

#[derive(Debug)]
struct LineBuild {
    top: f32,
    size: f32,
    x0: f32,
    runs: Vec<TextRun>,
}

/// Group runs into blocks ordered top-to-bottom, then left-to-right.
pub fn group_runs(mut runs: Vec<TextRun>, options: &GroupingOptions) -> Vec<RawBlock> {
    runs.retain(|r| !r.text.trim().is_empty() && r.size > 0.0);
    runs.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<LineBuild> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line)
                if (run.top - line.top).abs()
                    <= options.line_tolerance * run.size.max(line.size) =>
            {
                line.size = line.size.max(run.size);
                line.x0 = line.x0.min(run.x);
                line.runs.push(run);
            }
            _ => lines.push(LineBuild {
                top: run.top,
                size: run.size,
                x0: run.x,
                runs: vec![run],
            }),
        }
    }

    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut previous: Option<(f32, f32)> = None;
    for mut line in lines {
        line.runs.sort_by(|a, b| a.x.total_cmp(&b.x));
        let starts_block = match previous {
            None => true,
            Some((prev_top, prev_size)) => {
                line.top - prev_top > options.block_gap * prev_size
                    || (line.size - prev_size).abs() >= options.size_break
            }
        };
        previous = Some((line.top, line.size));

        let top = line.top;
        let x0 = line.x0;
        let built = Line::new(build_spans(line.runs, options));
        match blocks.last_mut() {
            Some(block) if !starts_block => {
                block.x0 = block.x0.min(x0);
                block.lines.push(built);
            }
            _ => blocks.push(RawBlock {
                x0,
                y0: top,
                lines: vec![built],
            }),
        }
    }

    blocks.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));
    blocks
}

/// Merge neighbouring runs with the same font and size into spans.
fn build_spans(runs: Vec<TextRun>, options: &GroupingOptions) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut prev_end: Option<f32> = None;

    for run in runs {
        let needs_space = match (prev_end, spans.last()) {
            (Some(end), Some(last)) => {
                run.x - end > options.word_gap * run.size
                    && !last.text.ends_with(' ')
                    && !run.text.starts_with(' ')
            }
            _ => false,
        };
        prev_end = Some(run.estimated_end());

        match spans.last_mut() {
            Some(last) if last.font == run.font && (last.size - run.size).abs() < 0.1 => {
                if needs_space {
                    last.text.push(' ');
                }
                last.text.push_str(&run.text);
            }
            _ => {
                let text = if needs_space {
                    format!(" {}", run.text)
                } else {
                    run.text
                };
                spans.push(Span {
                    text,
                    size: run.size,
                    font: run.font,
                    bold: run.bold,
                });
            }
        }
    }
    spans
}
