//! Documents the template syntax and exposes the compiler.
//!
//! <details><summary><strong style="cursor: pointer">Table of Contents</strong></summary>
//!
//! - [Synopsis](#synopsis)
//! - [Variables](#variables)
//! - [Sections](#sections)
//! - [Inverted Sections](#inverted-sections)
//! - [Comments](#comments)
//! - [Partials](#partials)
//! - [Set Delimiter](#set-delimiter)
//! - [Standalone Lines](#standalone-lines)
//! - [Inspecting Templates](#inspecting-templates)
//!
//! </details>
//!
//! # Synopsis
//!
//! A ministache template is a text file with mustache tags in it.  Tags are
//! enclosed in delimiters which default to `{{` and `}}`.  The character
//! directly after the opening delimiter (the sigil) decides what kind of tag
//! it is.  Whitespace between the delimiters and the tag name is ignored, so
//! `{{ name }}` and `{{name}}` are the same tag.
//!
//! ```mustache
//! <h1>{{title}}</h1>
//! <ul>
//! {{#items}}
//!   <li>{{name}}</li>
//! {{/items}}
//! {{^items}}
//!   <li>nothing here</li>
//! {{/items}}
//! </ul>
//! ```
//!
//! # Variables
//!
//! `{{name}}` looks up `name` in the current context and writes it out
//! through the escape callback of the [`Renderer`](crate::Renderer), which
//! HTML escapes by default.  `{{{name}}}` and `{{&name}}` write the value
//! unescaped.  A name that cannot be found renders as nothing.
//!
//! Names can be dotted paths.  `{{person.name}}` looks up `person` and then
//! `name` on it.  A path resolves in the innermost scope where every segment
//! resolves, otherwise the lookup continues in the enclosing scope.  The
//! special name `.` refers to the current item, which is mostly useful when
//! iterating over lists of strings:
//!
//! ```mustache
//! {{#tags}}<span>{{.}}</span>{{/tags}}
//! ```
//!
//! # Sections
//!
//! `{{#name}}...{{/name}}` renders its block depending on the value of
//! `name`:
//!
//! - undefined, none and `false` render nothing.
//! - sequences render the block once per item, with the item pushed as new
//!   innermost scope.
//! - any other value renders the block once against the current scope.
//!   [`Renderer::set_push_object_scopes`](crate::Renderer::set_push_object_scopes)
//!   changes this to push the value as a scope instead.
//!
//! # Inverted Sections
//!
//! `{{^name}}...{{/name}}` renders its block only if `name` is falsy or an
//! empty sequence.
//!
//! # Comments
//!
//! `{{! anything }}` renders nothing.
//!
//! # Partials
//!
//! `{{>name}}` renders the partial called `name` against the current
//! context.  Partials are supplied per render through the
//! [`Partials`](crate::Partials) trait.  Without partials, or if the partial
//! does not exist, nothing is rendered.
//!
//! # Set Delimiter
//!
//! `{{=<% %>=}}` switches the delimiters to `<%` and `%>` for the rest of the
//! template.  Delimiters may not be empty or contain whitespace.
//!
//! ```mustache
//! {{=<% %>=}}
//! * <% name %>
//! <%={{ }}=%>
//! ```
//!
//! The initial delimiters can be changed per renderer with
//! [`Renderer::set_syntax`](crate::Renderer::set_syntax).
//!
//! # Standalone Lines
//!
//! A line that only holds whitespace and tags other than variables is a
//! standalone line.  Its whitespace and line break are removed, so block tags
//! on their own lines do not leave blank lines behind.  The last line of a
//! template is never considered standalone unless it ends in a newline.
//!
//! # Inspecting Templates
//!
//! The functions in this module expose the compiler for tooling.  They do
//! not go through any cache.
//!
//! ```
//! # use ministache::syntax::{parse, Node};
//! let nodes = parse("Hello {{name}}!").unwrap();
//! assert!(matches!(nodes[1], Node::Var(_)));
//! ```
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::compiler::lexer::Tokenizer;
use crate::compiler::tags::TagMatchers;
use crate::error::Error;

pub use crate::compiler::ast::{
    Comment, Node, Partial, Section, SetDelimiters, Spanned, Text, Var,
};
pub use crate::compiler::tokens::{Span, Token, TokenKind};

/// The delimiter configuration of a renderer.
///
/// ```
/// # use ministache::{context, syntax::Syntax, Renderer};
/// let mut renderer = Renderer::new();
/// renderer.set_syntax(Syntax::new("<%", "%>")).unwrap();
/// let rv = renderer.render("Hello <% name %>!", context!(name => "World")).unwrap();
/// assert_eq!(rv, "Hello World!");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Syntax {
    opener: Cow<'static, str>,
    closer: Cow<'static, str>,
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax {
            opener: Cow::Borrowed("{{"),
            closer: Cow::Borrowed("}}"),
        }
    }
}

impl fmt::Debug for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax({:?} {:?})", self.opener, self.closer)
    }
}

impl Syntax {
    /// Creates a syntax with custom delimiters.
    ///
    /// The delimiters are validated when the syntax is installed on a
    /// renderer or used for parsing.
    pub fn new<O, C>(opener: O, closer: C) -> Syntax
    where
        O: Into<Cow<'static, str>>,
        C: Into<Cow<'static, str>>,
    {
        Syntax {
            opener: opener.into(),
            closer: closer.into(),
        }
    }

    /// Returns the opening delimiter.
    pub fn opener(&self) -> &str {
        &self.opener
    }

    /// Returns the closing delimiter.
    pub fn closer(&self) -> &str {
        &self.closer
    }

    pub(crate) fn compile(&self) -> Result<SyntaxConfig, Error> {
        let tags = ok!(TagMatchers::new(&self.opener, &self.closer));
        Ok(SyntaxConfig(Arc::new(SyntaxConfigInternal {
            syntax: self.clone(),
            tags,
        })))
    }
}

struct SyntaxConfigInternal {
    syntax: Syntax,
    tags: TagMatchers,
}

/// A validated syntax with its matchers compiled.
#[derive(Clone)]
pub(crate) struct SyntaxConfig(Arc<SyntaxConfigInternal>);

impl SyntaxConfig {
    pub fn syntax(&self) -> &Syntax {
        &self.0.syntax
    }

    pub fn tags(&self) -> &TagMatchers {
        &self.0.tags
    }
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        // the default delimiters always validate
        match Syntax::default().compile() {
            Ok(config) => config,
            Err(err) => panic!("default syntax is invalid: {err}"),
        }
    }
}

impl fmt::Debug for SyntaxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.syntax(), f)
    }
}

/// Parses a template with the default delimiters into a tree.
pub fn parse(source: &str) -> Result<Vec<Node<'_>>, Error> {
    parse_with_syntax(source, &Syntax::default())
}

/// Parses a template with custom initial delimiters into a tree.
///
/// ```
/// # use ministache::syntax::{parse_with_syntax, Node, Syntax};
/// let nodes = parse_with_syntax("[[#a]]x[[/a]]", &Syntax::new("[[", "]]")).unwrap();
/// match nodes[0] {
///     Node::Section(ref section) => assert_eq!(section.section_end, 7),
///     _ => unreachable!(),
/// }
/// ```
pub fn parse_with_syntax<'s>(source: &'s str, syntax: &Syntax) -> Result<Vec<Node<'s>>, Error> {
    let config = ok!(syntax.compile());
    crate::compiler::parser::parse(source, config.tags())
}

/// Tokenizes a template with the default delimiters.
///
/// Returns the flat token stream after standalone lines were stripped and
/// adjacent text was merged.
///
/// ```
/// # use ministache::syntax::{tokenize, TokenKind};
/// let tokens = tokenize("{{#a}}\n  x\n{{/a}}\n").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|x| x.kind).collect();
/// assert_eq!(kinds, [TokenKind::Section, TokenKind::Text, TokenKind::Close]);
/// assert_eq!(tokens[1].value, "  x\n");
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, Error> {
    tokenize_with_syntax(source, &Syntax::default())
}

/// Tokenizes a template with custom initial delimiters.
pub fn tokenize_with_syntax<'s>(source: &'s str, syntax: &Syntax) -> Result<Vec<Token<'s>>, Error> {
    let config = ok!(syntax.compile());
    Tokenizer::new(source).tokenize(config.tags())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;
    use similar_asserts::assert_eq;

    #[test]
    fn test_invalid_syntax() {
        let err = Syntax::new("", "}}").compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);
        let err = Syntax::new("{ {", "}}").compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);
    }

    #[test]
    fn test_syntax_config() {
        let config = SyntaxConfig::default();
        assert_eq!(config.syntax(), &Syntax::default());
        assert_eq!(config.tags().opening.literal(), "{{");
        assert_eq!(format!("{config:?}"), "Syntax(\"{{\" \"}}\")");
    }
}
