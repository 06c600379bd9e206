use crate::compiler::ast::{self, Node, Spanned};
use crate::compiler::lexer::Tokenizer;
use crate::compiler::tags::TagMatchers;
use crate::compiler::tokens::{Span, Token, TokenKind};
use crate::error::{Error, ErrorKind};

struct OpenSection<'s> {
    token: Token<'s>,
    children: Vec<Node<'s>>,
}

/// Folds a flat token stream into a tree.
///
/// Sections own the nodes up to their close tag, which is dropped.  The
/// tokenizer already verified the balance, this only reports imbalance for
/// hand built streams.
pub fn nest(tokens: Vec<Token<'_>>) -> Result<Vec<Node<'_>>, Error> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenSection<'_>> = Vec::new();

    for token in tokens {
        let node = match token.kind {
            TokenKind::Section | TokenKind::Inverted => {
                stack.push(OpenSection {
                    token,
                    children: Vec::new(),
                });
                continue;
            }
            TokenKind::Close => {
                let open = ok!(stack.pop().ok_or_else(|| {
                    Error::new(
                        ErrorKind::UnopenedSection,
                        format!("section `{}` was never opened", token.value),
                    )
                }));
                let section = ast::Section {
                    name: open.token.value,
                    children: open.children,
                    section_end: token.span.start_offset,
                };
                let span = Span::new(open.token.span.start_offset, token.span.end_offset);
                if open.token.kind == TokenKind::Inverted {
                    Node::InvertedSection(Spanned::new(section, span))
                } else {
                    Node::Section(Spanned::new(section, span))
                }
            }
            TokenKind::Text => Node::Text(Spanned::new(
                ast::Text { text: token.value },
                token.span,
            )),
            TokenKind::Name => Node::Var(Spanned::new(ast::Var { name: token.value }, token.span)),
            TokenKind::Unescaped => Node::UnescapedVar(Spanned::new(
                ast::Var { name: token.value },
                token.span,
            )),
            TokenKind::Partial => Node::Partial(Spanned::new(
                ast::Partial { name: token.value },
                token.span,
            )),
            TokenKind::Comment => Node::Comment(Spanned::new(
                ast::Comment { text: token.value },
                token.span,
            )),
            TokenKind::SetDelimiters => Node::SetDelimiters(Spanned::new(
                ast::SetDelimiters {
                    delimiters: token.value,
                },
                token.span,
            )),
        };
        match stack.last_mut() {
            Some(open) => open.children.push(node),
            None => root.push(node),
        }
    }

    if let Some(open) = stack.pop() {
        return Err(Error::new(
            ErrorKind::UnclosedSection,
            format!("section `{}` is never closed", open.token.value),
        ));
    }

    Ok(root)
}

/// Tokenizes and nests a template.
pub fn parse<'s>(source: &'s str, tags: &TagMatchers) -> Result<Vec<Node<'s>>, Error> {
    let tokens = ok!(Tokenizer::new(source).tokenize(tags));
    nest(tokens)
}
