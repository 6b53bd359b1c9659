//! Lexical helpers for pattern scanning over C source text.
//!
//! `LineSanitizer` blanks comments and the contents of string and character
//! literals with spaces, carrying block-comment state from one line to the
//! next. Character offsets are preserved so reported columns stay accurate.

use regex::Regex;
use tracing::warn;

#[derive(Debug, Default)]
pub struct LineSanitizer {
    in_block_comment: bool,
}

impl LineSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    /// Sanitize one line. Returns `None` when the whole line lies inside a
    /// block comment.
    pub fn sanitize(&mut self, line: &str) -> Option<String> {
        let chars: Vec<char> = line.chars().collect();
        let n = chars.len();
        let started_in_comment = self.in_block_comment;
        let mut closed_comment = false;
        let mut out = String::with_capacity(line.len());
        let mut i = 0;
        while i < n {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    out.push_str("  ");
                    i += 2;
                    self.in_block_comment = false;
                    closed_comment = true;
                } else {
                    out.push(' ');
                    i += 1;
                }
                continue;
            }
            match (c, next) {
                ('/', Some('/')) => {
                    out.extend(std::iter::repeat(' ').take(n - i));
                    break;
                }
                ('/', Some('*')) => {
                    out.push_str("  ");
                    i += 2;
                    self.in_block_comment = true;
                }
                ('"', _) | ('\'', _) => {
                    out.push(c);
                    i += 1;
                    while i < n {
                        if chars[i] == '\\' && i + 1 < n {
                            out.push_str("  ");
                            i += 2;
                            continue;
                        }
                        if chars[i] == c {
                            out.push(c);
                            i += 1;
                            break;
                        }
                        out.push(' ');
                        i += 1;
                    }
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }
        if started_in_comment && !closed_comment {
            return None;
        }
        Some(out)
    }
}

/// Pattern matcher: a compiled regex, or a plain substring when the pattern
/// is not a valid regex.
#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    Substring(String),
}

impl Matcher {
    pub fn compile(pattern: &str) -> Matcher {
        match Regex::new(pattern) {
            Ok(re) => Matcher::Regex(re),
            Err(e) => {
                warn!(pattern, error = %e, "invalid rule pattern; using substring match");
                Matcher::Substring(pattern.to_string())
            }
        }
    }

    pub fn is_substring(&self) -> bool {
        matches!(self, Matcher::Substring(_))
    }

    /// 1-based character column of the first match.
    pub fn find_column(&self, line: &str) -> Option<usize> {
        let byte = match self {
            Matcher::Regex(re) => re.find(line).map(|m| m.start()),
            Matcher::Substring(s) if s.is_empty() => None,
            Matcher::Substring(s) => line.find(s.as_str()),
        }?;
        Some(line[..byte].chars().count() + 1)
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.find_column(line).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_and_line_comments_blanked_preserving_width() {
        let mut s = LineSanitizer::new();
        let line = r#"printf("goto \"x\""); // goto"#;
        let out = s.sanitize(line).unwrap();
        assert_eq!(out.chars().count(), line.chars().count());
        assert!(!out.contains("goto"));
        assert!(out.starts_with("printf(\""));
    }

    #[test]
    fn test_block_comment_state_spans_lines() {
        let mut s = LineSanitizer::new();
        let first = s.sanitize("int a; /* start").unwrap();
        assert_eq!(first, format!("int a;{}", " ".repeat(9)));
        assert!(s.in_block_comment());
        assert_eq!(s.sanitize("   goto fail;"), None);
        let out = s.sanitize("end */ goto x;").unwrap();
        assert!(!s.in_block_comment());
        assert!(out.contains("goto x;"));
        assert!(!out.contains("end"));
    }

    #[test]
    fn test_inline_block_comment_and_char_literal() {
        let mut s = LineSanitizer::new();
        let out = s.sanitize("x = '/'; /* goto */ y = 1;").unwrap();
        assert!(!out.contains("goto"));
        assert!(out.contains("y = 1;"));
        assert!(!s.in_block_comment());
    }

    #[test]
    fn test_matcher_falls_back_to_substring_on_bad_regex() {
        let m = Matcher::compile("alloca(");
        assert!(m.is_substring());
        assert_eq!(m.find_column("  p = alloca(16);"), Some(7));
        let r = Matcher::compile(r"\bgoto\b");
        assert!(!r.is_substring());
        assert!(r.is_match("goto end;"));
        assert!(!r.is_match("gotox"));
    }
}
