// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Word spans for rendering the highlighted word of a bot message.

/// A whitespace-delimited word and its char offset in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub text: String,
}

/// Splits `text` into words, keeping each word's char offset.
pub fn split_words(text: &str) -> Vec<WordSpan> {
    let mut spans: Vec<WordSpan> = Vec::new();
    let mut current: Option<WordSpan> = None;

    for (index, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if let Some(span) = current.take() {
                spans.push(span);
            }
        } else {
            current
                .get_or_insert_with(|| WordSpan {
                    start: index,
                    text: String::new(),
                })
                .text
                .push(c);
        }
    }
    spans.extend(current);
    spans
}

/// Index of the last word starting at or before `char_offset`.
pub fn word_index_at(spans: &[WordSpan], char_offset: usize) -> Option<usize> {
    spans
        .partition_point(|span| span.start <= char_offset)
        .checked_sub(1)
}
