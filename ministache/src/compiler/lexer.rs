use std::borrow::Cow;

use crate::compiler::scanner::{Scanner, Sigil, Whitespace};
use crate::compiler::tags::TagMatchers;
use crate::compiler::tokens::{Span, Token, TokenKind};
use crate::error::{Error, ErrorKind};
use crate::utils::splitn_whitespace;

/// The deepest section nesting a template may have.
pub const MAX_SECTION_DEPTH: usize = 150;

/// Tokenizes mustache templates.
///
/// Produces the flat token stream with standalone lines already stripped
/// and adjacent text merged.  Section balance is validated here, the
/// nesting itself happens in the parser.
pub struct Tokenizer<'s> {
    source: &'s str,
    scanner: Scanner<'s>,
    tokens: Vec<Token<'s>>,
    sections: Vec<(&'s str, usize)>,
    // indices of whitespace text tokens on the current line
    spaces: Vec<usize>,
    line_has_tag: bool,
    line_has_text: bool,
}

impl<'s> Tokenizer<'s> {
    /// Creates a new tokenizer.
    pub fn new(source: &'s str) -> Tokenizer<'s> {
        Tokenizer {
            source,
            scanner: Scanner::new(source),
            tokens: Vec::new(),
            sections: Vec::new(),
            spaces: Vec::new(),
            line_has_tag: false,
            line_has_text: false,
        }
    }

    /// Runs the tokenizer with the initial delimiters.
    pub fn tokenize(mut self, initial_tags: &TagMatchers) -> Result<Vec<Token<'s>>, Error> {
        let mut switched_tags: Option<TagMatchers> = None;

        while !self.scanner.at_end() {
            let tags = switched_tags.as_ref().unwrap_or(initial_tags);

            let text_start = self.scanner.pos();
            let text = self.scanner.consume_until(&tags.opening);
            self.push_text(text, text_start);

            let tag_start = self.scanner.pos();
            if self.scanner.consume(&tags.opening).is_none() {
                break;
            }
            self.line_has_tag = true;

            let sigil = self.scanner.consume(&Sigil);
            let kind = TokenKind::from_sigil(sigil);
            self.scanner.consume(&Whitespace);

            let value = match sigil {
                Some("=") => {
                    let value = self.scanner.consume_until(&tags.equals);
                    self.scanner.consume(&tags.equals);
                    self.scanner.consume_until(&tags.closing);
                    value
                }
                Some("{") => {
                    let value = self.scanner.consume_until(&tags.closing_curly);
                    self.scanner.consume(&tags.curly);
                    self.scanner.consume_until(&tags.closing);
                    value
                }
                _ => self.scanner.consume_until(&tags.closing),
            };

            if self.scanner.consume(&tags.closing).is_none() {
                return Err(self.error(
                    ErrorKind::UnclosedTag,
                    format!("expected `{}` to close the tag", tags.closer()),
                    self.scanner.pos(),
                ));
            }

            let span = Span::new(tag_start, self.scanner.pos());
            match kind {
                TokenKind::Section | TokenKind::Inverted => {
                    if self.sections.len() >= MAX_SECTION_DEPTH {
                        return Err(self.error(
                            ErrorKind::NestingTooDeep,
                            format!("section `{value}` exceeds {MAX_SECTION_DEPTH} nested sections"),
                            tag_start,
                        ));
                    }
                    self.sections.push((value, tag_start));
                }
                TokenKind::Close => match self.sections.pop() {
                    None => {
                        return Err(self.error(
                            ErrorKind::UnopenedSection,
                            format!("section `{value}` was never opened"),
                            tag_start,
                        ));
                    }
                    Some((open, _)) if open != value => {
                        return Err(self.error(
                            ErrorKind::MismatchedSection,
                            format!("expected `{open}` to be closed, found `{value}`"),
                            tag_start,
                        ));
                    }
                    Some(_) => {}
                },
                TokenKind::Name | TokenKind::Unescaped => {
                    self.line_has_text = true;
                }
                TokenKind::SetDelimiters => {
                    let mut parts = splitn_whitespace(value, 2);
                    let opener = parts.next().unwrap_or("");
                    let closer = parts.next().unwrap_or("");
                    switched_tags = Some(ok!(TagMatchers::new(opener, closer).map_err(
                        |mut err| {
                            self.locate(&mut err, tag_start);
                            err
                        }
                    )));
                }
                _ => {}
            }

            self.tokens.push(Token {
                kind,
                value: Cow::Borrowed(value),
                span,
            });
        }

        if let Some((name, offset)) = self.sections.pop() {
            return Err(self.error(
                ErrorKind::UnclosedSection,
                format!("section `{name}` is never closed"),
                offset,
            ));
        }

        Ok(squash(self.source, self.tokens))
    }

    fn push_text(&mut self, text: &'s str, offset: usize) {
        for (idx, c) in text.char_indices() {
            let start = offset + idx;
            let end = start + c.len_utf8();
            if c.is_whitespace() {
                self.spaces.push(self.tokens.len());
            } else {
                self.line_has_text = true;
            }
            self.tokens.push(Token {
                kind: TokenKind::Text,
                value: Cow::Borrowed(&text[idx..idx + c.len_utf8()]),
                span: Span::new(start, end),
            });
            if c == '\n' {
                self.strip_line();
            }
        }
    }

    /// Drops the whitespace of a line that only held tags.
    fn strip_line(&mut self) {
        if self.line_has_tag && !self.line_has_text {
            if let Some(&first) = self.spaces.first() {
                // all whitespace indices are on this line and ascending
                let tail = self.tokens.split_off(first);
                let mut spaces = self.spaces.iter().map(|idx| idx - first).peekable();
                self.tokens
                    .extend(tail.into_iter().enumerate().filter_map(|(idx, token)| {
                        if spaces.peek() == Some(&idx) {
                            spaces.next();
                            None
                        } else {
                            Some(token)
                        }
                    }));
            }
        }
        self.spaces.clear();
        self.line_has_tag = false;
        self.line_has_text = false;
    }

    fn locate(&self, err: &mut Error, offset: usize) {
        err.set_location(self.source, offset);
        #[cfg(feature = "debug")]
        {
            err.attach_template_source(self.source);
        }
    }

    fn error(&self, kind: ErrorKind, detail: String, offset: usize) -> Error {
        let mut err = Error::new(kind, detail);
        self.locate(&mut err, offset);
        err
    }
}

/// Merges runs of text tokens into single tokens.
///
/// Contiguous runs keep borrowing from the source.  Runs with holes left by
/// standalone stripping are copied.
fn squash<'s>(source: &'s str, tokens: Vec<Token<'s>>) -> Vec<Token<'s>> {
    let mut rv: Vec<Token<'s>> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.kind == TokenKind::Text {
            if let Some(last) = rv.last_mut() {
                if last.kind == TokenKind::Text {
                    let contiguous = last.span.end_offset == token.span.start_offset;
                    if contiguous && matches!(last.value, Cow::Borrowed(_)) {
                        last.value =
                            Cow::Borrowed(&source[last.span.start_offset..token.span.end_offset]);
                    } else {
                        last.value.to_mut().push_str(&token.value);
                    }
                    last.span.end_offset = token.span.end_offset;
                    continue;
                }
            }
        }
        rv.push(token);
    }
    rv
}
