use std::borrow::Cow;
use std::fmt;

/// The kind of a token in the flat token stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal template text.
    Text,
    /// `{{name}}`: escaped interpolation.
    Name,
    /// `{{#name}}`: opens a section.
    Section,
    /// `{{^name}}`: opens an inverted section.
    Inverted,
    /// `{{/name}}`: closes a section.
    Close,
    /// `{{&name}}` or `{{{name}}}`: raw interpolation.
    Unescaped,
    /// `{{>name}}`: includes a partial.
    Partial,
    /// `{{!text}}`: a comment.
    Comment,
    /// `{{=<% %>=}}`: switches the delimiters.
    SetDelimiters,
}

impl TokenKind {
    /// Maps the sigil that follows an opening delimiter to a kind.
    pub fn from_sigil(sigil: Option<&str>) -> TokenKind {
        match sigil {
            Some("#") => TokenKind::Section,
            Some("^") => TokenKind::Inverted,
            Some("/") => TokenKind::Close,
            Some(">") => TokenKind::Partial,
            Some("{") | Some("&") => TokenKind::Unescaped,
            Some("=") => TokenKind::SetDelimiters,
            Some("!") => TokenKind::Comment,
            _ => TokenKind::Name,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Text => "text",
            TokenKind::Name => "variable",
            TokenKind::Section => "section",
            TokenKind::Inverted => "inverted section",
            TokenKind::Close => "section close",
            TokenKind::Unescaped => "unescaped variable",
            TokenKind::Partial => "partial",
            TokenKind::Comment => "comment",
            TokenKind::SetDelimiters => "delimiter change",
        })
    }
}

/// A token in the flat token stream.
#[derive(Clone, PartialEq, Eq)]
pub struct Token<'s> {
    /// What the token is.
    pub kind: TokenKind,
    /// The text for text tokens, the trimmed tag contents otherwise.
    pub value: Cow<'s, str>,
    /// Where the token sits in the source.
    pub span: Span,
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?}){:?}", self.kind, self.value, self.span)
    }
}

/// Token span information.
///
/// Offsets are byte offsets into the template source.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Span {
    /// Creates a span from two offsets.
    pub fn new(start_offset: usize, end_offset: usize) -> Span {
        Span {
            start_offset,
            end_offset,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " @ {}..{}", self.start_offset, self.end_offset)
    }
}
