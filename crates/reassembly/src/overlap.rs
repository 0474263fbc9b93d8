//! Overlap detection between the end of accumulated text and the start of
//! a continuation fragment.
//!
//! Three strategies are tried in a fixed order and the first match wins:
//!
//! 1. [`Strategy::ExactLines`]: the last 1..=5 lines of the buffer reappear
//!    verbatim (whitespace-trimmed) as the first lines of the fragment.
//! 2. [`Strategy::PartialCompletion`]: the buffer's last line was cut
//!    mid-token and the fragment carries the completed version.
//! 3. [`Strategy::WordRun`]: a run of words at the end of the buffer
//!    reappears (case-insensitively) at the start of the fragment.
//!
//! Every strategy is a pure function returning [`Overlap`]. Offsets are
//! byte offsets into the strings passed in; the fragment is expected to be
//! trimmed already (the merger does this).

use serde::Serialize;

/// Most lines compared by the line-based strategies.
pub const MAX_LINE_OVERLAP: usize = 5;

/// Shortest word run accepted as an overlap.
pub const MIN_WORD_OVERLAP: usize = 2;

/// Longest word run compared.
pub const MAX_WORD_OVERLAP: usize = 20;

/// Shared prefix (in characters) needed to treat the buffer's last word as a
/// truncated form of the fragment's first word.
pub const MIN_SHARED_WORD_PREFIX: usize = 3;

/// An overlap detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    ExactLines,
    PartialCompletion,
    WordRun,
}

impl Strategy {
    /// Escalation order used by the merger.
    pub const ORDER: [Strategy; 3] = [Self::ExactLines, Self::PartialCompletion, Self::WordRun];

    /// Run this strategy.
    pub fn detect(self, accumulated: &str, fragment: &str) -> Overlap {
        match self {
            Self::ExactLines => exact_lines(accumulated, fragment),
            Self::PartialCompletion => partial_completion(accumulated, fragment),
            Self::WordRun => word_run(accumulated, fragment),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactLines => "exact-lines",
            Self::PartialCompletion => "partial-completion",
            Self::WordRun => "word-run",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to cut the accumulated text and the fragment so they join cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    /// Which strategy found it
    pub strategy: Strategy,
    /// Bytes of the accumulated text to keep
    pub keep: usize,
    /// Byte offset in the fragment where new material starts
    pub resume: usize,
    /// Match length, in lines, words or shared characters depending on the strategy
    pub length: usize,
}

impl Splice {
    /// Join `accumulated[..keep]` with `fragment[resume..]`.
    ///
    /// When the fragment has nothing left after the overlap the accumulated
    /// text is returned unchanged. When the kept text already ends in
    /// whitespace the fragment's own leading whitespace is dropped.
    pub fn apply(&self, accumulated: &str, fragment: &str) -> String {
        let rest = &fragment[self.resume..];
        if rest.trim().is_empty() {
            return accumulated.to_string();
        }

        let base = &accumulated[..self.keep];
        let rest = if base.ends_with(char::is_whitespace) {
            rest.trim_start()
        } else {
            rest
        };

        let mut out = String::with_capacity(base.len() + rest.len());
        out.push_str(base);
        out.push_str(rest);
        out
    }
}

/// Result of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    NoMatch,
    MatchAt(Splice),
}

impl Overlap {
    pub fn splice(self) -> Option<Splice> {
        match self {
            Self::NoMatch => None,
            Self::MatchAt(splice) => Some(splice),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::MatchAt(_))
    }
}

/// Run the strategies in escalation order and return the first match.
pub fn find(accumulated: &str, fragment: &str) -> Overlap {
    Strategy::ORDER
        .into_iter()
        .map(|strategy| strategy.detect(accumulated, fragment))
        .find(Overlap::is_match)
        .unwrap_or(Overlap::NoMatch)
}

/// Strategy 1: the longest run of 1..=5 trailing buffer lines that equals the
/// fragment's leading lines.
pub fn exact_lines(accumulated: &str, fragment: &str) -> Overlap {
    let tail = accumulated.trim_end();
    let tail_lines = line_spans(tail);
    let head_lines = line_spans(fragment);

    let max = MAX_LINE_OVERLAP.min(tail_lines.len()).min(head_lines.len());
    for n in (1..=max).rev() {
        let tail_window = &tail_lines[tail_lines.len() - n..];
        let head_window = &head_lines[..n];

        let all_equal = tail_window
            .iter()
            .zip(head_window)
            .all(|(t, h)| tail[t.0..t.1].trim() == fragment[h.0..h.1].trim());
        let has_content = head_window.iter().any(|h| !fragment[h.0..h.1].trim().is_empty());

        if all_equal && has_content {
            return Overlap::MatchAt(Splice {
                strategy: Strategy::ExactLines,
                keep: accumulated.len(),
                resume: head_window[n - 1].1,
                length: n,
            });
        }
    }

    Overlap::NoMatch
}

/// Strategy 2: the buffer's last line was cut off.
///
/// (a) One of the fragment's first lines starts with the buffer's trimmed
/// last line and is strictly longer: the buffer line's content is replaced by
/// that fragment line (indentation kept). Fragment lines before the match
/// must repeat the buffer lines just above the cut line, so nothing new is
/// skipped.
/// (b) The buffer's last word and the fragment's first word share a prefix
/// of at least [`MIN_SHARED_WORD_PREFIX`] characters: the truncated word is
/// replaced by the fragment.
pub fn partial_completion(accumulated: &str, fragment: &str) -> Overlap {
    let tail = accumulated.trim_end();
    let last_start = tail.rfind('\n').map_or(0, |i| i + 1);
    let last_line = tail[last_start..].trim_start();
    if last_line.is_empty() {
        return Overlap::NoMatch;
    }
    let content_start = tail.len() - last_line.len();

    let tail_lines = line_spans(tail);
    let above = &tail_lines[..tail_lines.len() - 1];
    let head_lines = line_spans(fragment);

    for (i, &(start, end)) in head_lines.iter().enumerate().take(MAX_LINE_OVERLAP) {
        let raw = &fragment[start..end];
        let line = raw.trim();
        if !(line.len() > last_line.len() && line.starts_with(last_line)) {
            continue;
        }

        let repeats_buffer = i <= above.len()
            && head_lines[..i]
                .iter()
                .zip(&above[above.len() - i..])
                .all(|(h, t)| fragment[h.0..h.1].trim() == tail[t.0..t.1].trim());
        if repeats_buffer {
            return Overlap::MatchAt(Splice {
                strategy: Strategy::PartialCompletion,
                keep: content_start,
                resume: start + (raw.len() - raw.trim_start().len()),
                length: last_line.len(),
            });
        }
    }

    let (Some(last_word), Some((first_start, first_word))) = (
        tail.split_whitespace().next_back(),
        word_spans(fragment).next(),
    ) else {
        return Overlap::NoMatch;
    };

    let shared = shared_prefix_chars(last_word, first_word);
    if shared >= MIN_SHARED_WORD_PREFIX {
        return Overlap::MatchAt(Splice {
            strategy: Strategy::PartialCompletion,
            keep: tail.len() - last_word.len(),
            resume: first_start,
            length: shared,
        });
    }

    Overlap::NoMatch
}

/// Strategy 3: the longest run of trailing buffer words (up to
/// [`MAX_WORD_OVERLAP`], at least [`MIN_WORD_OVERLAP`]) equal, ignoring case,
/// to the fragment's leading words.
pub fn word_run(accumulated: &str, fragment: &str) -> Overlap {
    let tail_words: Vec<&str> = accumulated.split_whitespace().collect();
    let head_words: Vec<(usize, &str)> = word_spans(fragment).take(MAX_WORD_OVERLAP).collect();

    let max = MAX_WORD_OVERLAP.min(tail_words.len()).min(head_words.len());
    for k in (MIN_WORD_OVERLAP..=max).rev() {
        let tail_window = &tail_words[tail_words.len() - k..];
        let head_window = &head_words[..k];

        if tail_window
            .iter()
            .zip(head_window)
            .all(|(t, (_, h))| eq_ignore_case(t, h))
        {
            let (start, word) = head_window[k - 1];
            return Overlap::MatchAt(Splice {
                strategy: Strategy::WordRun,
                keep: accumulated.len(),
                resume: start + word.len(),
                length: k,
            });
        }
    }

    Overlap::NoMatch
}

/// `(start, end)` byte spans of each `\n`-separated line, excluding the newline.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            spans.push((start, i));
            start = i + 1;
        }
    }
    spans.push((start, text.len()));
    spans
}

/// Whitespace-separated words with their starting byte offsets.
fn word_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let base = text.as_ptr() as usize;
    text.split_whitespace()
        .map(move |word| (word.as_ptr() as usize - base, word))
}

fn shared_prefix_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
