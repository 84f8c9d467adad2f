//! Recursive separator-based splitting.
//!
//! Tries to cut on the most natural boundary present in the text (paragraph,
//! line, sentence, word) and only falls back to single characters when a piece
//! has no boundary left. Pieces below the size limit are greedily merged back
//! together with a trailing window of overlap carried into the next segment.

use super::{ChunkingConfig, Segment};
use std::collections::VecDeque;
use tracing::debug;

/// Separators in priority order. The empty string splits into characters.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Byte range into the transcript being split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// Splits text on a prioritized list of separators.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkingConfig,
    separators: Vec<&'static str>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separators.
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// Split `text` into segments of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        let whole = Span {
            start: 0,
            end: text.len(),
        };
        let spans = self.split_span(text, whole, &self.separators);

        debug!(
            "Split {} bytes into {} segments (size {}, overlap {})",
            text.len(),
            spans.len(),
            self.config.chunk_size(),
            self.config.chunk_overlap()
        );

        spans
            .into_iter()
            .enumerate()
            .map(|(position, span)| Segment {
                text: text[span.start..span.end].to_string(),
                position,
                start: span.start,
                end: span.end,
            })
            .collect()
    }

    fn split_span(&self, text: &str, span: Span, separators: &[&'static str]) -> Vec<Span> {
        let slice = &text[span.start..span.end];

        // First separator that occurs in this piece; the rest are kept for
        // pieces that are still too long.
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&'static str] = &[];
        for (i, &candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if slice.contains(candidate) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut output = Vec::new();
        let mut short_pieces = Vec::new();

        for piece in split_keeping_separator(text, span, separator) {
            if char_len(text, piece) < self.config.chunk_size() {
                short_pieces.push(piece);
                continue;
            }

            if !short_pieces.is_empty() {
                output.extend(self.merge(text, &short_pieces));
                short_pieces.clear();
            }

            if remaining.is_empty() {
                output.extend(trim_span(text, piece));
            } else {
                output.extend(self.split_span(text, piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            output.extend(self.merge(text, &short_pieces));
        }

        output
    }

    /// Greedily merge adjacent pieces into segments, carrying up to
    /// `chunk_overlap` characters of trailing pieces into the next segment.
    fn merge(&self, text: &str, pieces: &[Span]) -> Vec<Span> {
        let chunk_size = self.config.chunk_size();
        let chunk_overlap = self.config.chunk_overlap();

        let mut merged = Vec::new();
        let mut window: VecDeque<(Span, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(text, piece);

            if total + len > chunk_size && !window.is_empty() {
                merged.extend(window_span(text, &window));

                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, popped)) => total -= popped,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        merged.extend(window_span(text, &window));
        merged
    }
}

/// Split `span` at every occurrence of `separator`, keeping the separator at
/// the start of the following piece. Empty pieces are dropped.
fn split_keeping_separator(text: &str, span: Span, separator: &str) -> Vec<Span> {
    let slice = &text[span.start..span.end];

    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| Span {
                start: span.start + i,
                end: span.start + i + c.len_utf8(),
            })
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in slice.match_indices(separator) {
        if idx > last {
            pieces.push(Span {
                start: span.start + last,
                end: span.start + idx,
            });
        }
        last = idx;
    }
    if slice.len() > last {
        pieces.push(Span {
            start: span.start + last,
            end: span.end,
        });
    }
    pieces
}

/// Contiguous span covered by the window, trimmed of surrounding whitespace.
fn window_span(text: &str, window: &VecDeque<(Span, usize)>) -> Option<Span> {
    let first = window.front()?.0;
    let last = window.back()?.0;
    trim_span(
        text,
        Span {
            start: first.start,
            end: last.end,
        },
    )
}

fn trim_span(text: &str, span: Span) -> Option<Span> {
    let slice = &text[span.start..span.end];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed_len = slice.trim().len();
    if trimmed_len == 0 {
        return None;
    }
    let start = span.start + leading;
    Some(Span {
        start,
        end: start + trimmed_len,
    })
}

fn char_len(text: &str, span: Span) -> usize {
    text[span.start..span.end].chars().count()
}
