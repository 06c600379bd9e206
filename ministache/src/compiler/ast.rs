use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use crate::compiler::tokens::Span;

/// Container for nodes with location info.
///
/// This container fulfills two purposes: it adds location information
/// to nodes, but it also ensures the nodes is heap allocated.  The
/// latter is useful to ensure that enum variants do not cause the enum
/// to become too large.
pub struct Spanned<T> {
    inner: Box<(T, Span)>,
}

impl<T> Spanned<T> {
    /// Creates a new spanned node.
    pub fn new(node: T, span: Span) -> Spanned<T> {
        Spanned {
            inner: Box::new((node, span)),
        }
    }

    /// Accesses the span.
    pub fn span(&self) -> Span {
        self.inner.1
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ok!(fmt::Debug::fmt(&self.inner.0, f));
        write!(f, "{:?}", self.inner.1)
    }
}

/// A node in the template tree.
#[derive(Debug)]
pub enum Node<'s> {
    /// Literal text.
    Text(Spanned<Text<'s>>),
    /// Escaped interpolation.
    Var(Spanned<Var<'s>>),
    /// Unescaped interpolation.
    UnescapedVar(Spanned<Var<'s>>),
    /// A section, rendered when its value is truthy.
    Section(Spanned<Section<'s>>),
    /// An inverted section, rendered when its value is missing or empty.
    InvertedSection(Spanned<Section<'s>>),
    /// An included partial.
    Partial(Spanned<Partial<'s>>),
    /// A comment.
    Comment(Spanned<Comment<'s>>),
    /// A delimiter change.
    SetDelimiters(Spanned<SetDelimiters<'s>>),
}

impl Node<'_> {
    /// Returns the span of the node.
    ///
    /// For sections the span covers the whole section up to the end of the
    /// closing tag.
    pub fn span(&self) -> Span {
        match self {
            Node::Text(n) => n.span(),
            Node::Var(n) | Node::UnescapedVar(n) => n.span(),
            Node::Section(n) | Node::InvertedSection(n) => n.span(),
            Node::Partial(n) => n.span(),
            Node::Comment(n) => n.span(),
            Node::SetDelimiters(n) => n.span(),
        }
    }
}

/// Literal template text.
#[derive(Debug)]
pub struct Text<'s> {
    pub text: Cow<'s, str>,
}

/// An interpolated name or dotted path.
#[derive(Debug)]
pub struct Var<'s> {
    pub name: Cow<'s, str>,
}

/// A section or inverted section.
#[derive(Debug)]
pub struct Section<'s> {
    pub name: Cow<'s, str>,
    pub children: Vec<Node<'s>>,
    /// Offset of the closing tag.
    pub section_end: usize,
}

/// A partial include.
#[derive(Debug)]
pub struct Partial<'s> {
    pub name: Cow<'s, str>,
}

/// A comment.
#[derive(Debug)]
pub struct Comment<'s> {
    pub text: Cow<'s, str>,
}

/// A delimiter change.  Only kept for tooling, it has no effect at render
/// time.
#[derive(Debug)]
pub struct SetDelimiters<'s> {
    pub delimiters: Cow<'s, str>,
}
