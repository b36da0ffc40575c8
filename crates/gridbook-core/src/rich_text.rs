//! Rich text: formatting runs for shared strings and comments

use crate::style::Font;

/// A rich text value: one or more runs, each with optional run-level font
/// formatting.
///
/// Equality and hashing cover run formatting as well as text, so two values
/// with the same characters but different run fonts are distinct entries in
/// the shared string table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RichText {
    runs: Vec<TextRun>,
}

/// One run of a rich text value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRun {
    pub text: String,
    pub font: Option<Font>,
}

impl RichText {
    /// Plain text: a single run with no run font.
    pub fn plain<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self { runs: Vec::new() };
        }
        Self {
            runs: vec![TextRun { text, font: None }],
        }
    }

    /// Build from explicit runs.
    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// The concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Total length in characters.
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Whether any run carries its own font.
    pub fn has_formatting(&self) -> bool {
        self.runs.iter().any(|r| r.font.is_some())
    }

    /// Append plain text as a new unformatted run.
    pub fn append<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if !text.is_empty() {
            self.runs.push(TextRun { text, font: None });
        }
    }

    /// Apply `font` to the character span `start..end`, splitting runs at
    /// the boundaries. The concatenated text is unchanged; only run
    /// boundaries and run fonts move.
    pub fn apply_font(&mut self, start: usize, end: usize, font: Font) {
        if start >= end {
            return;
        }
        let mut out: Vec<TextRun> = Vec::with_capacity(self.runs.len() + 2);
        let mut pos = 0usize;
        for run in self.runs.drain(..) {
            let len = run.text.chars().count();
            let run_start = pos;
            let run_end = pos + len;
            pos = run_end;

            // Run entirely outside the span
            if run_end <= start || run_start >= end {
                out.push(run);
                continue;
            }

            let split_at = |text: &str, n: usize| -> (String, String) {
                let byte = text
                    .char_indices()
                    .nth(n)
                    .map(|(i, _)| i)
                    .unwrap_or(text.len());
                (text[..byte].to_string(), text[byte..].to_string())
            };

            let local_start = start.saturating_sub(run_start).min(len);
            let local_end = (end - run_start).min(len);

            let (before, rest) = split_at(&run.text, local_start);
            let (middle, after) = split_at(&rest, local_end - local_start);

            if !before.is_empty() {
                out.push(TextRun {
                    text: before,
                    font: run.font.clone(),
                });
            }
            if !middle.is_empty() {
                out.push(TextRun {
                    text: middle,
                    font: Some(font.clone()),
                });
            }
            if !after.is_empty() {
                out.push(TextRun {
                    text: after,
                    font: run.font,
                });
            }
        }
        self.runs = out;
    }
}

impl From<&str> for RichText {
    fn from(s: &str) -> Self {
        RichText::plain(s)
    }
}

impl From<String> for RichText {
    fn from(s: String) -> Self {
        RichText::plain(s)
    }
}
