//! Fixed-size windowing.
//!
//! Two policies, both purely positional:
//!
//! - [`count_windows`] groups a list of lines into runs of `w` lines
//!   (chat transcripts).
//! - [`char_windows`] slices free text into spans of `s` characters
//!   (notes).
//!
//! Neither looks at sentence, word, turn or grapheme boundaries. A window
//! may end in the middle of a word or between the code points of a
//! combined character. Same input, same windows.

/// Group `lines` into consecutive runs of `w` lines joined with `\n`.
/// The final window may hold fewer than `w` lines. `w` must be > 0.
pub fn count_windows<S: AsRef<str>>(lines: &[S], w: usize) -> Vec<String> {
    assert!(w > 0, "window size must be > 0");
    lines
        .chunks(w)
        .map(|group| {
            group
                .iter()
                .map(|l| l.as_ref())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// A span of text cut by [`char_windows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharWindow {
    /// UTF-8 byte offset of the span start within the source text.
    pub byte_offset: usize,
    pub text: String,
}

/// Slice `text` into spans of `s` Unicode scalar values.
/// The final span may be shorter. Empty text yields no spans. `s` must be > 0.
pub fn char_windows(text: &str, s: usize) -> Vec<CharWindow> {
    assert!(s > 0, "window size must be > 0");
    let mut windows = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (pos, _) in text.char_indices() {
        if count == s {
            windows.push(CharWindow {
                byte_offset: start,
                text: text[start..pos].to_string(),
            });
            start = pos;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        windows.push(CharWindow {
            byte_offset: start,
            text: text[start..].to_string(),
        });
    }

    windows
}
