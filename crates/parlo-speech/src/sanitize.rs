// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prepares bot text for speech.
//!
//! Strips emoji and markdown emphasis markers, collapses whitespace runs
//! (including line breaks) into single spaces, and trims. Every character of
//! the result remembers where it came from, so offsets reported while
//! speaking the clean text can be mapped back onto the original message.

use std::sync::LazyLock;

use regex::Regex;

/// Speakable text plus a map back into the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    text: String,
    /// `origins[i]` is the char offset in the original text of char `i` here.
    origins: Vec<usize>,
}

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Maps a char offset in the sanitized text to one in the original text.
    ///
    /// Offsets past the end map to the last character's origin.
    pub fn original_offset(&self, sanitized: usize) -> Option<usize> {
        self.origins
            .get(sanitized)
            .or_else(|| self.origins.last())
            .copied()
    }
}

/// Pictographs plus the joiners, selectors, modifiers, and tags that glue
/// emoji sequences together.
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[\p{Extended_Pictographic}",
        r"\x{2600}-\x{27BF}",   // miscellaneous symbols, dingbats
        r"\x{1F1E6}-\x{1F1FF}", // regional indicators (flags)
        r"\x{1F3FB}-\x{1F3FF}", // skin tone modifiers
        r"\x{FE00}-\x{FE0F}",   // variation selectors
        r"\x{200D}\x{20E3}",     // zero-width joiner, combining keycap
        r"\x{E0020}-\x{E007F}", // tag sequences
        r"]$",
    ))
    .expect("emoji pattern is valid")
});

/// Returns true for characters the speech engine should never see.
pub fn is_emoji(c: char) -> bool {
    let mut buf = [0u8; 4];
    EMOJI.is_match(c.encode_utf8(&mut buf))
}

fn is_markdown_marker(c: char) -> bool {
    matches!(c, '*' | '_' | '`' | '#')
}

/// Sanitizes `text` for speech.
pub fn sanitize(text: &str) -> SanitizedText {
    let mut out = String::with_capacity(text.len());
    let mut origins = Vec::with_capacity(text.len());
    let mut pending_space: Option<usize> = None;

    for (index, c) in text.chars().enumerate() {
        if is_emoji(c) || is_markdown_marker(c) {
            continue;
        }
        if c.is_whitespace() {
            if !out.is_empty() && pending_space.is_none() {
                pending_space = Some(index);
            }
            continue;
        }
        if let Some(space_at) = pending_space.take() {
            out.push(' ');
            origins.push(space_at);
        }
        out.push(c);
        origins.push(index);
    }

    SanitizedText { text: out, origins }
}
