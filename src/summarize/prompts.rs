//! Prompt builders for unit, rollup, and fallback summarization calls.
//!
//! All prompts frame the output for a README.md audience and forbid
//! conversational filler, since the generated text is injected verbatim.

use crate::types::{CodeUnit, UnitKind};

const CORE_RULES: &str = "\
Rules:
1. Base the response ONLY on the provided content.
2. Output valid, concise Markdown with no conversational remarks.
3. Do not repeat the input code.";

/// Prompt for a file small enough to summarize in one pass.
pub fn whole_file(file_name: &str, ext: &str, snippet: &str) -> String {
    format!(
        "Write a technical summary of the source file '{file_name}' for a README.md.\n\
         Describe its primary responsibility and its key components.\n\n\
         {CORE_RULES}\n\n\
         Source ('{file_name}'):\n```{ext}\n{snippet}\n```\n"
    )
}

/// Prompt for one unit of a decomposed file.
pub fn unit(file_name: &str, unit: &CodeUnit, snippet: &str) -> String {
    let guidance = match unit.kind {
        UnitKind::Function => "Describe what it does, its inputs and outputs, and when it is called.",
        UnitKind::Class => "Describe its purpose, key fields, and public methods.",
        UnitKind::Module => "Describe the module-level declarations and what they set up.",
        UnitKind::Chunk => "Describe what this segment contributes; it is one part of a larger file.",
    };

    format!(
        "Summarize the {kind} named '{name}' from the file '{file_name}' for a README.md.\n\
         {guidance}\n\n\
         {CORE_RULES}\n\n\
         {kind} '{name}' from '{file_name}':\n```\n{snippet}\n```\n",
        kind = unit.kind,
        name = unit.name,
    )
}

/// Prompt that combines ordered unit blurbs into one cohesive summary.
pub fn rollup(file_name: &str, blurbs: &[String]) -> String {
    let mut sections = String::new();
    for (i, blurb) in blurbs.iter().enumerate() {
        sections.push_str(&format!("--- explanation {} ---\n{}\n\n", i + 1, blurb));
    }

    format!(
        "You are given partial explanations, in source order, each describing one part \
         of the single source file '{file_name}'.\n\
         Combine them into one cohesive technical overview for a README.md:\n\
         - one or two sentences on the file's primary responsibility\n\
         - up to 7 bullet points on its key components\n\
         Base the overview exclusively on the explanations; do not invent functionality.\n\n\
         {CORE_RULES}\n\n\
         {sections}"
    )
}

/// Last-resort prompt over the raw source, used when the rollup call fails.
pub fn direct_retry(file_name: &str, ext: &str, snippet: &str) -> String {
    format!(
        "Summarize the entire source file '{file_name}' directly for a README.md.\n\
         State its primary responsibility, then list its key components.\n\n\
         {CORE_RULES}\n\n\
         Source ('{file_name}'):\n```{ext}\n{snippet}\n```\n"
    )
}

/// Placeholder blurb recorded for a unit whose generation failed.
pub fn degraded_unit(unit: &CodeUnit, reason: &str) -> String {
    format!(
        "This part of the file ({} '{}') could not be summarized: {}.",
        unit.kind, unit.name, reason
    )
}

/// Canned blurb for an empty or comment-only file; no generation call.
pub fn empty_file(file_name: &str) -> String {
    if file_name == "__init__.py" {
        "This `__init__.py` file is empty or contains only comments. Its presence makes \
         this directory a Python package, allowing the modules within this folder to be \
         imported elsewhere."
            .to_string()
    } else {
        format!(
            "This file, {}, is empty or contains only comments. It does not define any \
             active code.",
            file_name
        )
    }
}

/// Truncate to the input budget on a char boundary.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
