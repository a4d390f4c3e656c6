//! Strict parser for the model-generated file list.
//!
//! The planning stage asks the model for a bracketed list of quoted path
//! strings, e.g. `["index.html", 'src/app.js',]`. This module is the single
//! place where that untrusted text becomes typed data. It validates:
//! - The text is one list literal (an outer code fence is tolerated).
//! - Every element is a quoted string, single or double quotes.
//! - The list is non-empty and no path is blank or duplicated.
//! - No path is absolute or climbs out of the output directory with `..`.

use std::collections::HashSet;
use std::path::{Component, Path};

use thiserror::Error;

use crate::sanitize::sanitize;

/// Errors that can occur while parsing and validating a file list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("expected a list starting with '[', found {0:?}")]
    NotAList(String),

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("list is missing its closing ']'")]
    Unclosed,

    #[error("unexpected text after the closing ']': {0:?}")]
    TrailingText(String),

    #[error("file list must contain at least one path")]
    NoFiles,

    #[error("entry {0} is an empty path")]
    EmptyPath(usize),

    #[error("duplicate path: {0:?}")]
    DuplicatePath(String),

    #[error("path {0:?} is absolute or escapes the output directory")]
    UnsafePath(String),
}

/// Parse and validate a file-list literal into its paths, in order.
pub fn parse_file_list(raw: &str) -> Result<Vec<String>, PlanParseError> {
    let text = sanitize(raw);
    let paths = Scanner::new(text.trim()).list()?;
    validate(&paths)?;
    Ok(paths)
}

fn validate(paths: &[String]) -> Result<(), PlanParseError> {
    if paths.is_empty() {
        return Err(PlanParseError::NoFiles);
    }

    let mut seen = HashSet::new();
    for (index, path) in paths.iter().enumerate() {
        if path.is_empty() {
            return Err(PlanParseError::EmptyPath(index));
        }
        check_relative_path(path)?;
        if !seen.insert(path.as_str()) {
            return Err(PlanParseError::DuplicatePath(path.clone()));
        }
    }

    Ok(())
}

/// Reject a path that is absolute or would escape the output directory.
pub fn check_relative_path(path: &str) -> Result<(), PlanParseError> {
    if is_unsafe(path) {
        return Err(PlanParseError::UnsafePath(path.to_string()));
    }
    Ok(())
}

fn is_unsafe(path: &str) -> bool {
    let has_drive_prefix = path.as_bytes().get(1) == Some(&b':');
    path.starts_with('/')
        || path.starts_with('\\')
        || has_drive_prefix
        || Path::new(path)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// Hand-rolled scanner over the list grammar:
///
/// ```text
/// list   := '[' ws ( string ws ( ',' ws string ws )* ( ',' ws )? )? ']'
/// string := '"' chars '"' | '\'' chars '\''
/// ```
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn list(&mut self) -> Result<Vec<String>, PlanParseError> {
        if self.peek() != Some('[') {
            let found: String = self.text.chars().take(40).collect();
            return Err(PlanParseError::NotAList(found));
        }
        self.bump();

        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                Some('"') | Some('\'') => {
                    items.push(self.string()?.trim().to_string());
                    self.skip_ws();
                    match self.bump() {
                        Some(',') => continue,
                        Some(']') => break,
                        Some(ch) => {
                            return Err(PlanParseError::UnexpectedChar {
                                ch,
                                offset: self.pos - ch.len_utf8(),
                            });
                        }
                        None => return Err(PlanParseError::Unclosed),
                    }
                }
                Some(ch) => {
                    return Err(PlanParseError::UnexpectedChar {
                        ch,
                        offset: self.pos,
                    });
                }
                None => return Err(PlanParseError::Unclosed),
            }
        }

        let rest = self.text[self.pos..].trim();
        if !rest.is_empty() {
            return Err(PlanParseError::TrailingText(rest.chars().take(40).collect()));
        }
        Ok(items)
    }

    fn string(&mut self) -> Result<String, PlanParseError> {
        let start = self.pos;
        let quote = self.bump().ok_or(PlanParseError::Unclosed)?;
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(PlanParseError::UnterminatedString(start)),
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(PlanParseError::UnterminatedString(start)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(ch @ ('\\' | '\'' | '"')) => out.push(ch),
                    Some(ch) => {
                        // Unknown escapes are kept verbatim, backslash included.
                        out.push('\\');
                        out.push(ch);
                    }
                },
                Some('\n') => return Err(PlanParseError::UnterminatedString(start)),
                Some(ch) => out.push(ch),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_double_quoted_list() {
        let paths = parse_file_list(r#"["index.html", "script.js"]"#).unwrap();
        assert_eq!(paths, vec!["index.html", "script.js"]);
    }

    #[test]
    fn parses_single_quotes_and_trailing_comma() {
        let paths = parse_file_list("['app.py', 'templates/index.html',]").unwrap();
        assert_eq!(paths, vec!["app.py", "templates/index.html"]);
    }

    #[test]
    fn parses_multiline_list() {
        let raw = "[\n  \"src/main.rs\",\n  \"Cargo.toml\"\n]\n";
        assert_eq!(parse_file_list(raw).unwrap(), vec!["src/main.rs", "Cargo.toml"]);
    }

    #[test]
    fn tolerates_outer_code_fence() {
        let raw = "```python\n[\"a.py\", \"b.py\"]\n```";
        assert_eq!(parse_file_list(raw).unwrap(), vec!["a.py", "b.py"]);
    }

    #[test]
    fn keeps_directory_placeholders() {
        let paths = parse_file_list(r#"["static/", "static/app.css"]"#).unwrap();
        assert_eq!(paths, vec!["static/", "static/app.css"]);
    }

    #[test]
    fn handles_escaped_quotes() {
        let paths = parse_file_list(r#"['it\'s.txt']"#).unwrap();
        assert_eq!(paths, vec!["it's.txt"]);
    }

    #[test]
    fn rejects_prose() {
        let err = parse_file_list("Sure! Here are the files you need:").unwrap_err();
        assert!(matches!(err, PlanParseError::NotAList(_)), "got: {err}");
    }

    #[test]
    fn rejects_tree_listing() {
        let err = parse_file_list("templates/\n    index.html").unwrap_err();
        assert!(matches!(err, PlanParseError::NotAList(_)), "got: {err}");
    }

    #[test]
    fn rejects_unquoted_elements() {
        let err = parse_file_list("[index.html, app.js]").unwrap_err();
        assert_eq!(
            err,
            PlanParseError::UnexpectedChar {
                ch: 'i',
                offset: 1
            }
        );
    }

    #[test]
    fn rejects_missing_separator() {
        let err = parse_file_list(r#"["a" "b"]"#).unwrap_err();
        assert!(
            matches!(err, PlanParseError::UnexpectedChar { ch: '"', .. }),
            "got: {err}"
        );
    }

    #[test]
    fn rejects_unclosed_list() {
        assert_eq!(
            parse_file_list(r#"["a.py", "b.py""#).unwrap_err(),
            PlanParseError::Unclosed
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert_eq!(
            parse_file_list(r#"["a.py"#).unwrap_err(),
            PlanParseError::UnterminatedString(1)
        );
    }

    #[test]
    fn rejects_trailing_text() {
        let err = parse_file_list(r#"["a.py"] and that's it"#).unwrap_err();
        assert!(matches!(err, PlanParseError::TrailingText(_)), "got: {err}");
    }

    #[test]
    fn rejects_empty_list() {
        assert_eq!(parse_file_list("[]").unwrap_err(), PlanParseError::NoFiles);
    }

    #[test]
    fn rejects_blank_path() {
        assert_eq!(
            parse_file_list(r#"["a.py", "  "]"#).unwrap_err(),
            PlanParseError::EmptyPath(1)
        );
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            parse_file_list(r#"["a.py", "a.py"]"#).unwrap_err(),
            PlanParseError::DuplicatePath("a.py".into())
        );
    }

    #[test]
    fn check_relative_path_accepts_nested_and_rejects_escapes() {
        assert_eq!(check_relative_path("src/app.js"), Ok(()));
        assert_eq!(check_relative_path("static/"), Ok(()));
        assert_eq!(
            check_relative_path("../../x"),
            Err(PlanParseError::UnsafePath("../../x".into()))
        );
        assert!(check_relative_path("/etc/passwd").is_err());
        assert!(check_relative_path("C:\\x").is_err());
    }

    #[test]
    fn rejects_escaping_paths() {
        for bad in [r#"["/etc/passwd"]"#, r#"["../up.txt"]"#, r#"["a/../../b"]"#, r#"["C:\\x"]"#] {
            let err = parse_file_list(bad).unwrap_err();
            assert!(matches!(err, PlanParseError::UnsafePath(_)), "{bad}: {err}");
        }
    }
}
