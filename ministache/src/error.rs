use std::borrow::Cow;
use std::fmt;

/// Represents template errors.
///
/// Compile errors carry the byte offset at which the compiler gave up and
/// the line that offset falls on.  If the `debug` feature is enabled the
/// error also holds on to the template source, which the alternative
/// formatting (``format!("{:#}", err)``) uses to show the failing line.
///
/// # Example
///
/// ```rust
/// # let renderer = ministache::Renderer::new();
/// match renderer.render("{{#open}}never closed", ()) {
///     Ok(result) => println!("{}", result),
///     Err(err) => {
///         eprintln!("Could not render template:");
///         eprintln!("  {:#}", err);
///     }
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    offset: Option<usize>,
    lineno: usize,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    #[cfg(feature = "debug")]
    template_source: Option<String>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut err = f.debug_struct("Error");
        err.field("kind", &self.kind);
        if let Some(ref detail) = self.detail {
            err.field("detail", detail);
        }
        if let Some(offset) = self.offset {
            err.field("offset", &offset);
            err.field("line", &self.lineno);
        }
        if let Some(ref source) = self.source {
            err.field("source", source);
        }
        err.finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An opening tag was never closed by the closing delimiter.
    UnclosedTag,
    /// A section close tag appeared without an open section.
    UnopenedSection,
    /// A section close tag did not match the innermost open section.
    MismatchedSection,
    /// The template ended while sections were still open.
    UnclosedSection,
    /// A delimiter change or syntax configuration is unusable.
    InvalidDelimiter,
    /// Sections were nested deeper than a template permits.
    NestingTooDeep,
    /// Partials were nested deeper than the renderer permits.
    RecursionLimitExceeded,
    /// A partial could not be loaded.
    PartialLoadFailure,
    /// Failed writing output.
    WriteFailure,
    /// A value could not be converted into the internal format.
    BadSerialization,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::UnclosedTag => "unclosed tag",
            ErrorKind::UnopenedSection => "unopened section",
            ErrorKind::MismatchedSection => "mismatched section",
            ErrorKind::UnclosedSection => "unclosed section",
            ErrorKind::InvalidDelimiter => "invalid delimiter",
            ErrorKind::NestingTooDeep => "sections nested too deeply",
            ErrorKind::RecursionLimitExceeded => "recursion limit exceeded",
            ErrorKind::PartialLoadFailure => "could not load partial",
            ErrorKind::WriteFailure => "failed to write output",
            ErrorKind::BadSerialization => "could not serialize to internal format",
        }
    }

    /// Returns `true` if this kind is raised while compiling a template.
    pub fn is_compile_error(self) -> bool {
        matches!(
            self,
            ErrorKind::UnclosedTag
                | ErrorKind::UnopenedSection
                | ErrorKind::MismatchedSection
                | ErrorKind::UnclosedSection
                | ErrorKind::InvalidDelimiter
                | ErrorKind::NestingTooDeep
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}: {}", self.kind, detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (at offset {}, line {})", offset, self.lineno)?;
        }
        if f.alternate() {
            if let Some(source) = self.template_source() {
                writeln!(f)?;
                writeln!(f, "{:-^1$}", " Template Source ", 74)?;
                let lines: Vec<_> = source.lines().enumerate().collect();
                let idx = self.line().unwrap_or(1).saturating_sub(1);
                if let Some(current) = lines.get(idx) {
                    let skip = idx.saturating_sub(3);
                    let pre = lines.iter().skip(skip).take(3.min(idx)).collect::<Vec<_>>();
                    let post = lines.iter().skip(idx + 1).take(3).collect::<Vec<_>>();
                    for (idx, line) in pre {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                    writeln!(f, "{:>4} > {}", idx + 1, current.1)?;
                    for (idx, line) in post {
                        writeln!(f, "{:>4} | {}", idx + 1, line)?;
                    }
                }
                write!(f, "{:-^1$}", "", 74)?;
            }
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            kind,
            detail: Some(detail.into()),
            offset: None,
            lineno: 0,
            source: None,
            #[cfg(feature = "debug")]
            template_source: None,
        }
    }

    /// Records where in `source` the error happened.
    pub(crate) fn set_location(&mut self, source: &str, offset: usize) {
        let offset = offset.min(source.len());
        self.offset = Some(offset);
        self.lineno = source.as_bytes()[..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
    }

    #[cfg(feature = "debug")]
    pub(crate) fn attach_template_source(&mut self, source: &str) {
        if self.template_source.is_none() {
            self.template_source = Some(source.to_string());
        }
    }

    /// Attaches another error as source to this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the byte offset into the template the error refers to.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the line.
    pub fn line(&self) -> Option<usize> {
        self.offset.map(|_| self.lineno)
    }

    /// Returns the template source if debug information is available.
    ///
    /// The source is only retained when the `debug` feature is enabled.
    pub fn template_source(&self) -> Option<&str> {
        #[cfg(feature = "debug")]
        {
            self.template_source.as_deref()
        }
        #[cfg(not(feature = "debug"))]
        {
            None
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            offset: None,
            lineno: 0,
            source: None,
            #[cfg(feature = "debug")]
            template_source: None,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::new(ErrorKind::WriteFailure, "formatting failed")
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(ErrorKind::BadSerialization, msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_location() {
        let mut err = Error::new(ErrorKind::UnclosedTag, "expected `}}`");
        err.set_location("a\nb\n{{c", 6);
        assert_eq!(err.offset(), Some(6));
        assert_eq!(err.line(), Some(3));
        assert_eq!(
            err.to_string(),
            "unclosed tag: expected `}}` (at offset 6, line 3)"
        );
    }

    #[test]
    fn test_no_location() {
        let err = Error::from(ErrorKind::RecursionLimitExceeded);
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "recursion limit exceeded");
    }

    #[test]
    #[cfg(feature = "debug")]
    fn test_alternate_display() {
        let source = "one\ntwo\n{{#three}}";
        let mut err = Error::new(ErrorKind::UnclosedSection, "section `three` is never closed");
        err.set_location(source, 8);
        err.attach_template_source(source);
        let rendered = format!("{err:#}");
        assert!(rendered.contains("   3 > {{#three}}"));
        assert!(rendered.contains("   2 | two"));
    }
}
