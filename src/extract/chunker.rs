//! Token-budgeted chunk tiling.
//!
//! The universal fallback when structural decomposition is unavailable or
//! fails: slice the file into fixed-size chunks that tile it from start to
//! end with no gaps and no overlap, each at or below the per-request token
//! budget.

use crate::constants::budget;
use crate::types::{CodeUnit, UnitKind};

/// Estimate the token count of a piece of source code.
///
/// Chars-per-token heuristic; code is denser than natural language.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(budget::AVG_CHARS_PER_TOKEN)
}

/// Character budget corresponding to a token budget.
pub fn char_budget(token_budget: usize) -> usize {
    (token_budget * budget::AVG_CHARS_PER_TOKEN).max(budget::MIN_CHUNK_CHARS)
}

/// Tile `content` into `Chunk` units of at most `token_budget` tokens each.
///
/// Splits prefer line boundaries so chunks stay readable, falling back to a
/// hard character split (on a char boundary) for pathological single-line
/// input. Concatenating the returned chunks in ordinal order reproduces
/// `content` exactly.
pub fn chunk_units(file_name: &str, content: &str, token_budget: usize) -> Vec<CodeUnit> {
    let max_chars = char_budget(token_budget);
    let mut pieces: Vec<&str> = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        if rest.len() <= max_chars {
            pieces.push(rest);
            break;
        }
        let split = split_point(rest, max_chars);
        let (head, tail) = rest.split_at(split);
        pieces.push(head);
        rest = tail;
    }

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            CodeUnit::new(
                UnitKind::Chunk,
                format!("{} (part {}/{})", file_name, i + 1, total),
                text,
                i,
            )
        })
        .collect()
}

/// Find a split point at or below `max_chars`.
///
/// Prefers the last newline within the window (keeping the newline in the
/// leading piece); otherwise backs off to the nearest char boundary.
fn split_point(text: &str, max_chars: usize) -> usize {
    debug_assert!(text.len() > max_chars);

    if let Some(newline) = text[..max_chars].rfind('\n') {
        // Never emit an empty leading piece
        if newline > 0 {
            return newline + 1;
        }
    }

    let mut split = max_chars;
    while split > 0 && !text.is_char_boundary(split) {
        split -= 1;
    }
    if split == 0 {
        // Single multi-byte char wider than the budget; take it whole
        split = text
            .char_indices()
            .nth(1)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
    }
    split
}
