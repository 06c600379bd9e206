use aho_corasick::AhoCorasick;

use crate::compiler::scanner::{skip_whitespace, Pattern};
use crate::error::{Error, ErrorKind};

/// A literal delimiter with optional whitespace padding.
///
/// Leading padding is part of the match, so finding `  }}` in `name  }}`
/// stops right after `name`.
#[derive(Debug, Clone)]
pub struct Delimiter {
    literal: Box<str>,
    finder: AhoCorasick,
    leading_ws: bool,
    trailing_ws: bool,
}

impl Delimiter {
    fn new(literal: &str, leading_ws: bool, trailing_ws: bool) -> Result<Delimiter, Error> {
        let finder = ok!(AhoCorasick::new([literal]).map_err(|err| {
            Error::new(
                ErrorKind::InvalidDelimiter,
                format!("cannot search for `{literal}`"),
            )
            .with_source(err)
        }));
        Ok(Delimiter {
            literal: literal.into(),
            finder,
            leading_ws,
            trailing_ws,
        })
    }

    /// The delimiter text without padding.
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

impl Pattern for Delimiter {
    fn match_prefix(&self, haystack: &str) -> Option<usize> {
        let mut pos = 0;
        if self.leading_ws {
            pos += skip_whitespace(haystack);
        }
        if !haystack[pos..].starts_with(&*self.literal) {
            return None;
        }
        pos += self.literal.len();
        if self.trailing_ws {
            pos += skip_whitespace(&haystack[pos..]);
        }
        Some(pos)
    }

    fn find(&self, haystack: &str) -> Option<usize> {
        let start = some!(self.finder.find(haystack)).start();
        if self.leading_ws {
            Some(haystack[..start].trim_end_matches(char::is_whitespace).len())
        } else {
            Some(start)
        }
    }
}

/// The patterns derived from a pair of delimiters.
///
/// Compiled once for the configured syntax and again for every
/// `{{=<% %>=}}` tag in a template.
#[derive(Debug, Clone)]
pub struct TagMatchers {
    /// The opening delimiter followed by whitespace.
    pub opening: Delimiter,
    /// Whitespace followed by the closing delimiter.
    pub closing: Delimiter,
    /// Whitespace followed by `}` and the closing delimiter.
    pub closing_curly: Delimiter,
    /// Whitespace followed by `=`.
    pub equals: Delimiter,
    /// Whitespace followed by `}`.
    pub curly: Delimiter,
}

impl TagMatchers {
    /// Compiles the matchers for an opener and closer.
    pub fn new(opener: &str, closer: &str) -> Result<TagMatchers, Error> {
        ok!(validate_delimiters(opener, closer));
        Ok(TagMatchers {
            opening: ok!(Delimiter::new(opener, false, true)),
            closing: ok!(Delimiter::new(closer, true, false)),
            closing_curly: ok!(Delimiter::new(&format!("}}{closer}"), true, false)),
            equals: ok!(Delimiter::new("=", true, false)),
            curly: ok!(Delimiter::new("}", true, false)),
        })
    }

    /// The active closing delimiter.
    pub fn closer(&self) -> &str {
        self.closing.literal()
    }
}

/// Delimiters must be non empty and may not contain whitespace.
pub fn validate_delimiters(opener: &str, closer: &str) -> Result<(), Error> {
    for delimiter in [opener, closer] {
        if delimiter.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidDelimiter,
                "delimiters cannot be empty",
            ));
        }
        if delimiter.contains(char::is_whitespace) {
            return Err(Error::new(
                ErrorKind::InvalidDelimiter,
                format!("delimiter `{delimiter}` contains whitespace"),
            ));
        }
    }
    Ok(())
}
