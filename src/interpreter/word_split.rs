//! Word Splitting
//!
//! Turns the evaluated parts of a command into argv words. Literal parts are
//! glued onto the current word; unquoted expansions are split on whitespace.
//!
//! Examples with X="1 2":
//!   a$X       -> ["a1", "2"]
//!   $X"b c"   -> ["1", "2b c"]
//!   ''        -> [""]
//!   $EMPTY    -> []

/// One evaluated part of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSegment {
    /// Appended verbatim; anchors a word even when empty
    Literal(String),
    /// Split on whitespace runs
    Expansion(String),
    /// Ends the current word
    Break,
}

pub fn is_split_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b')
}

#[derive(Default)]
struct WordBuilder {
    words: Vec<String>,
    current: String,
    has_current: bool,
}

impl WordBuilder {
    fn push_str(&mut self, s: &str) {
        self.current.push_str(s);
        self.has_current = true;
    }

    fn push_char(&mut self, c: char) {
        self.current.push(c);
        self.has_current = true;
    }

    fn flush(&mut self) {
        if self.has_current {
            self.words.push(std::mem::take(&mut self.current));
            self.has_current = false;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.words
    }
}

/// Build argv words with shell-style splitting of expansions.
pub fn split_words(segments: &[WordSegment]) -> Vec<String> {
    let mut builder = WordBuilder::default();
    for segment in segments {
        match segment {
            WordSegment::Literal(text) => builder.push_str(text),
            WordSegment::Expansion(text) => {
                for c in text.chars() {
                    if is_split_char(c) {
                        builder.flush();
                    } else {
                        builder.push_char(c);
                    }
                }
            }
            WordSegment::Break => builder.flush(),
        }
    }
    builder.finish()
}

/// Build the text of a redirection target: parts are concatenated without
/// splitting and the resulting words are joined with single spaces.
pub fn join_words(segments: &[WordSegment]) -> String {
    let mut builder = WordBuilder::default();
    for segment in segments {
        match segment {
            WordSegment::Literal(text) => builder.push_str(text),
            WordSegment::Expansion(text) if !text.is_empty() => builder.push_str(text),
            WordSegment::Expansion(_) => {}
            WordSegment::Break => builder.flush(),
        }
    }
    builder.finish().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> WordSegment {
        WordSegment::Literal(s.to_string())
    }

    fn exp(s: &str) -> WordSegment {
        WordSegment::Expansion(s.to_string())
    }

    #[test]
    fn test_literals_glue_until_break() {
        let segments = vec![lit("echo"), WordSegment::Break, lit("a"), lit("b")];
        assert_eq!(split_words(&segments), vec!["echo", "ab"]);
    }

    #[test]
    fn test_expansion_splits() {
        let segments = vec![lit("echo"), WordSegment::Break, exp("a b")];
        assert_eq!(split_words(&segments), vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_expansion_glues_to_neighbours() {
        let segments = vec![lit("x"), exp("1 2"), lit("y")];
        assert_eq!(split_words(&segments), vec!["x1", "2y"]);
    }

    #[test]
    fn test_edge_whitespace_makes_no_empty_fields() {
        let segments = vec![exp("  a\t\nb  "), WordSegment::Break];
        assert_eq!(split_words(&segments), vec!["a", "b"]);

        let segments = vec![lit("x"), exp(" 1 ")];
        assert_eq!(split_words(&segments), vec!["x", "1"]);
    }

    #[test]
    fn test_empty_expansion_drops_word() {
        let segments = vec![lit("echo"), WordSegment::Break, exp(""), WordSegment::Break];
        assert_eq!(split_words(&segments), vec!["echo"]);
        assert!(split_words(&[exp("   ")]).is_empty());
    }

    #[test]
    fn test_empty_literal_anchors_word() {
        let segments = vec![lit("echo"), WordSegment::Break, lit("")];
        assert_eq!(split_words(&segments), vec!["echo", ""]);
    }

    #[test]
    fn test_join_words_keeps_expansions_whole() {
        let segments = vec![lit("out"), exp(" a  b"), WordSegment::Break, lit("x")];
        assert_eq!(join_words(&segments), "out a  b x");
        assert_eq!(join_words(&[exp("")]), "");
    }
}
