/// Something the [`Scanner`] can look for.
pub trait Pattern {
    /// Returns the length of the match if the pattern matches at the very
    /// start of `haystack`.
    fn match_prefix(&self, haystack: &str) -> Option<usize>;

    /// Returns the offset of the first match in `haystack`.
    fn find(&self, haystack: &str) -> Option<usize>;
}

/// Matches a (possibly empty) run of whitespace.
#[derive(Debug, Copy, Clone)]
pub struct Whitespace;

impl Pattern for Whitespace {
    fn match_prefix(&self, haystack: &str) -> Option<usize> {
        Some(skip_whitespace(haystack))
    }

    fn find(&self, _haystack: &str) -> Option<usize> {
        Some(0)
    }
}

/// Matches the one character sigil that follows an opening delimiter.
#[derive(Debug, Copy, Clone)]
pub struct Sigil;

impl Sigil {
    const CHARS: &'static [u8] = b"#^/>{&=!";
}

impl Pattern for Sigil {
    fn match_prefix(&self, haystack: &str) -> Option<usize> {
        haystack
            .as_bytes()
            .first()
            .filter(|b| Sigil::CHARS.contains(b))
            .map(|_| 1)
    }

    fn find(&self, haystack: &str) -> Option<usize> {
        haystack.bytes().position(|b| Sigil::CHARS.contains(&b))
    }
}

/// Returns the length of the leading whitespace of `s`.
#[inline]
pub fn skip_whitespace(s: &str) -> usize {
    s.len() - s.trim_start_matches(char::is_whitespace).len()
}

/// A cursor over an immutable source string.
///
/// The scanner knows nothing about mustache.  It only moves forward, either
/// over a pattern anchored at the cursor or up to the next occurrence of a
/// pattern.
#[derive(Debug)]
pub struct Scanner<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    /// Creates a scanner positioned at the start of `source`.
    pub fn new(source: &'s str) -> Scanner<'s> {
        Scanner { source, pos: 0 }
    }

    /// Returns `true` once the whole source was consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The current byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The not yet consumed part of the source.
    #[inline]
    pub fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    /// Consumes `pattern` if it matches at the cursor.
    ///
    /// Returns the matched text or `None` without moving if it does not
    /// match.
    pub fn consume<P: Pattern + ?Sized>(&mut self, pattern: &P) -> Option<&'s str> {
        let len = some!(pattern.match_prefix(self.rest()));
        Some(self.advance(len))
    }

    /// Skips ahead to the next match of `pattern`.
    ///
    /// If the pattern does not occur again the rest of the source is
    /// skipped.  Returns the skipped text.
    pub fn consume_until<P: Pattern + ?Sized>(&mut self, pattern: &P) -> &'s str {
        let rest = self.rest();
        let len = pattern.find(rest).unwrap_or(rest.len());
        self.advance(len)
    }

    fn advance(&mut self, bytes: usize) -> &'s str {
        let skipped = &self.source[self.pos..self.pos + bytes];
        self.pos += bytes;
        skipped
    }
}
