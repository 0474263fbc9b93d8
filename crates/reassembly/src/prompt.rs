//! Continuation prompt construction.

use splice_core::GenerationRequest;

use crate::oracle::percent_of;

/// Lines of the merged text quoted back to the backend as an anchor.
pub const CONTEXT_LINES: usize = 10;

/// Appended to every continuation prompt.
pub const OUTPUT_FORMAT_INSTRUCTIONS: &str = "\
Output format:
- Respond with the raw content only.
- Do not wrap the response in code fences or quotes.
- Do not add explanations, commentary, or headings before or after the content.";

/// Builds the prompt for the next round from what has been merged so far.
#[derive(Debug, Clone, Copy)]
pub struct ContinuationPromptBuilder {
    context_lines: usize,
}

impl Default for ContinuationPromptBuilder {
    fn default() -> Self {
        Self {
            context_lines: CONTEXT_LINES,
        }
    }
}

impl ContinuationPromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines.max(1);
        self
    }

    pub fn build(&self, merged_so_far: &str, original: &str, request: &GenerationRequest) -> String {
        let mut prompt = String::with_capacity(merged_so_far.len().min(4096) + 512);

        prompt.push_str(&format!(
            "Your previous response for {} was cut off before it was finished.\n",
            request.display_label()
        ));
        prompt.push_str(&format!(
            "The original instruction was: {}\n",
            request.prompt.trim()
        ));
        prompt.push_str(
            "Continue exactly where the previous response stopped. \
             Do not repeat any content that was already produced and do not start over.\n\n",
        );

        match percent_of(merged_so_far.len(), original.len()) {
            Some(pct) => prompt.push_str(&format!(
                "Progress: {} of an original {} characters produced so far (roughly {pct}% complete).\n",
                merged_so_far.len(),
                original.len()
            )),
            None => prompt.push_str(&format!(
                "Progress: {} characters produced so far.\n",
                merged_so_far.len()
            )),
        }

        prompt.push_str(&format!(
            "\nThe previous response ended with these lines:\n```\n{}\n```\n\n",
            tail_lines(merged_so_far, self.context_lines)
        ));

        prompt.push_str("Continue from the very next character after those lines.\n\n");
        prompt.push_str(OUTPUT_FORMAT_INSTRUCTIONS);
        prompt
    }
}

/// The last `n` lines of `text`, ignoring trailing blank lines.
pub fn tail_lines(text: &str, n: usize) -> &str {
    let text = text.trim_end();
    if n == 0 {
        return "";
    }
    match text.rmatch_indices('\n').nth(n - 1) {
        Some((idx, _)) => &text[idx + 1..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::ContentClass;

    fn request() -> GenerationRequest {
        GenerationRequest::transform("Convert this", "original body", ContentClass::Freeform)
            .with_label("src/app.js")
    }

    #[test]
    fn tail_lines_takes_last_n() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a\nb", 10), "a\nb");
        assert_eq!(tail_lines("a\nb\n\n\n", 1), "b");
        assert_eq!(tail_lines("", 3), "");
        assert_eq!(tail_lines("a\nb", 0), "");
    }

    #[test]
    fn prompt_anchors_on_last_ten_lines() {
        let merged: String = (1..=15).map(|i| format!("line {i}\n")).collect();
        let prompt = ContinuationPromptBuilder::new().build(&merged, "", &request());

        assert!(prompt.contains("line 6\nline 7"));
        assert!(prompt.contains("line 15\n```"));
        assert!(!prompt.contains("line 5\n"));
    }

    #[test]
    fn prompt_states_cutoff_and_no_repeat() {
        let prompt = ContinuationPromptBuilder::new().build("abc", "abcdef", &request());
        assert!(prompt.contains("src/app.js"));
        assert!(prompt.contains("cut off"));
        assert!(prompt.contains("Do not repeat"));
        assert!(prompt.contains("The original instruction was: Convert this\n"));
        assert!(prompt.contains("roughly 50% complete"));
        assert!(prompt.ends_with(OUTPUT_FORMAT_INSTRUCTIONS));
    }

    #[test]
    fn empty_original_omits_percentage() {
        let prompt = ContinuationPromptBuilder::new().build("abc", "", &request());
        assert!(prompt.contains("3 characters produced"));
        assert!(!prompt.contains('%'));
    }

    #[test]
    fn build_is_pure() {
        let builder = ContinuationPromptBuilder::new().with_context_lines(3);
        let req = request();
        assert_eq!(
            builder.build("x\ny\nz\nw", "orig", &req),
            builder.build("x\ny\nz\nw", "orig", &req)
        );
        assert!(builder.build("x\ny\nz\nw", "orig", &req).contains("```\ny\nz\nw\n```"));
    }
}
