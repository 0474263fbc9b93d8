//! Delimiter balance scanning for brace-delimited content.
//!
//! A small state machine over characters. Delimiters are only counted in
//! [`ScanState::Normal`]; inside a string literal they are ignored. A
//! backslash escapes the following character in every state.
//!
//! Single- and double-quoted strings end at a line break (so an apostrophe
//! in a comment cannot swallow the rest of the file). Backtick strings may
//! span lines.
//!
//! A single quote directly after an identifier character, `&` or `<` is a
//! lifetime (`&'a str`, `<'a>`) or an apostrophe, never a quote opener.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Normal,
    InSingleQuote,
    InDoubleQuote,
    InBacktick,
}

/// Running open-minus-close counts. Negative means an unmatched closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BraceTally {
    pub braces: i64,
    pub parens: i64,
    pub brackets: i64,
}

impl BraceTally {
    pub fn is_zero(&self) -> bool {
        self.braces == 0 && self.parens == 0 && self.brackets == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct BraceScanner {
    state: ScanState,
    escaped: bool,
    prev: Option<char>,
    tally: BraceTally,
}

impl BraceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a whole string from a fresh state.
    pub fn scan(text: &str) -> Self {
        let mut scanner = Self::new();
        for ch in text.chars() {
            scanner.feed(ch);
        }
        scanner
    }

    pub fn feed(&mut self, ch: char) {
        let prev = self.prev.replace(ch);
        if self.escaped {
            self.escaped = false;
            return;
        }
        if ch == '\\' {
            self.escaped = true;
            return;
        }

        self.state = match (self.state, ch) {
            (ScanState::Normal, '\'') if prev.is_some_and(continues_word) => ScanState::Normal,
            (ScanState::Normal, '\'') => ScanState::InSingleQuote,
            (ScanState::Normal, '"') => ScanState::InDoubleQuote,
            (ScanState::Normal, '`') => ScanState::InBacktick,
            (ScanState::Normal, _) => {
                self.count(ch);
                ScanState::Normal
            }

            (ScanState::InSingleQuote, '\'' | '\n') => ScanState::Normal,
            (ScanState::InDoubleQuote, '"' | '\n') => ScanState::Normal,
            (ScanState::InBacktick, '`') => ScanState::Normal,

            (state, _) => state,
        };
    }

    fn count(&mut self, ch: char) {
        match ch {
            '{' => self.tally.braces += 1,
            '}' => self.tally.braces -= 1,
            '(' => self.tally.parens += 1,
            ')' => self.tally.parens -= 1,
            '[' => self.tally.brackets += 1,
            ']' => self.tally.brackets -= 1,
            _ => {}
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn tally(&self) -> BraceTally {
        self.tally
    }

    /// Outside every string literal with all delimiter counts at zero.
    pub fn is_balanced(&self) -> bool {
        self.state == ScanState::Normal && self.tally.is_zero()
    }
}

fn continues_word(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '&' | '<')
}
