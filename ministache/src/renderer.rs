use std::fmt;
use std::sync::Arc;

use memo_map::MemoMap;
use serde::Serialize;

use crate::context::Context;
use crate::defaults;
use crate::error::Error;
use crate::output::Output;
use crate::partials::Partials;
use crate::syntax::{Syntax, SyntaxConfig};
use crate::template::{LoadedTemplate, Template};

type EscapeFunc = dyn Fn(&mut Output, &str) -> fmt::Result + Sync + Send;

/// The default maximum depth of nested partials.
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// An abstraction that holds the engine configuration.
///
/// The renderer holds the configuration for parsing and rendering and is
/// the cache for all parsed templates.  Templates are cached by their source
/// text, so rendering the same source twice only parses it once.  The cache
/// is never evicted on its own, use [`clear_cache`](Self::clear_cache) for
/// that.
///
/// A renderer is `Send` and `Sync` and can be shared between threads.
///
/// ```
/// # use ministache::{context, Renderer};
/// let renderer = Renderer::new();
/// let rv = renderer.render("Hello {{name}}!", context!(name => "World")).unwrap();
/// assert_eq!(rv, "Hello World!");
/// assert_eq!(renderer.cached_templates(), 1);
/// ```
pub struct Renderer {
    templates: MemoMap<Arc<str>, Arc<LoadedTemplate>>,
    syntax_config: SyntaxConfig,
    escape_callback: Arc<EscapeFunc>,
    recursion_limit: usize,
    push_object_scopes: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("syntax", self.syntax_config.syntax())
            .field("cached_templates", &self.cached_templates())
            .field("recursion_limit", &self.recursion_limit)
            .field("push_object_scopes", &self.push_object_scopes)
            .finish()
    }
}

impl Renderer {
    /// Creates a new renderer with sensible defaults.
    ///
    /// It uses `{{` and `}}` as delimiters and escapes HTML.
    pub fn new() -> Renderer {
        Renderer {
            templates: MemoMap::default(),
            syntax_config: SyntaxConfig::default(),
            escape_callback: Arc::new(defaults::escape_html),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            push_object_scopes: false,
        }
    }

    /// Parses a template or returns it from the cache.
    ///
    /// Parse errors are not cached, parsing a broken source again reports
    /// the error again.
    ///
    /// ```
    /// # use ministache::{ErrorKind, Renderer};
    /// let renderer = Renderer::new();
    /// let err = renderer.parse("{{#a}}x").unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::UnclosedSection);
    /// assert_eq!(renderer.cached_templates(), 0);
    /// ```
    pub fn parse(&self, source: &str) -> Result<Template<'_>, Error> {
        if let Some(loaded) = self.templates.get(source) {
            return Ok(Template::new(self, loaded.clone()));
        }
        let source: Arc<str> = source.into();
        self.templates
            .get_or_try_insert(&source.clone(), || -> Result<_, Error> {
                LoadedTemplate::load(source, &self.syntax_config).map(Arc::new)
            })
            .map(|loaded| Template::new(self, loaded.clone()))
    }

    /// Removes all cached templates.
    pub fn clear_cache(&mut self) {
        self.templates.clear();
    }

    /// Returns the number of cached templates.
    pub fn cached_templates(&self) -> usize {
        self.templates.len()
    }

    /// Parses and renders a template.
    ///
    /// This is a shortcut for [`parse`](Self::parse) followed by
    /// [`Template::render`].  Partial tags render nothing.
    pub fn render<S: Serialize>(&self, source: &str, view: S) -> Result<String, Error> {
        ok!(self.parse(source)).render(view)
    }

    /// Parses and renders a template with partials.
    ///
    /// ```
    /// # use std::collections::HashMap;
    /// # use ministache::{context, Renderer};
    /// let renderer = Renderer::new();
    /// let mut partials = HashMap::new();
    /// partials.insert("user", "<strong>{{name}}</strong>");
    /// let rv = renderer.render_with_partials(
    ///     "<h2>Names</h2>{{#names}}  {{> user}}{{/names}}",
    ///     context!(names => [context!(name => "Moe"), context!(name => "Homer")]),
    ///     &partials,
    /// ).unwrap();
    /// assert_eq!(rv, "<h2>Names</h2>  <strong>Moe</strong>  <strong>Homer</strong>");
    /// ```
    pub fn render_with_partials<S: Serialize, P: Partials + ?Sized>(
        &self,
        source: &str,
        view: S,
        partials: &P,
    ) -> Result<String, Error> {
        ok!(self.parse(source)).render_with_partials(view, partials)
    }

    /// Parses and renders a template against an existing context.
    ///
    /// Lookups that the template does not resolve in the view of `ctx` walk
    /// up its parent scopes.
    ///
    /// ```
    /// # use ministache::{context, Context, Renderer};
    /// let renderer = Renderer::new();
    /// let root = Context::new(context!(greeting => "Hello"));
    /// let child = root.push(context!(name => "World"));
    /// let rv = renderer.render_in_context("{{greeting}} {{name}}!", &child, None).unwrap();
    /// assert_eq!(rv, "Hello World!");
    /// ```
    pub fn render_in_context(
        &self,
        source: &str,
        ctx: &Context<'_>,
        partials: Option<&dyn Partials>,
    ) -> Result<String, Error> {
        ok!(self.parse(source)).render_in_context(ctx, partials)
    }

    /// Changes the initial delimiters.
    ///
    /// The syntax is validated and the template cache is cleared since the
    /// cached trees were parsed with the old delimiters.
    pub fn set_syntax(&mut self, syntax: Syntax) -> Result<(), Error> {
        self.syntax_config = ok!(syntax.compile());
        self.clear_cache();
        Ok(())
    }

    /// Returns the current syntax.
    pub fn syntax(&self) -> &Syntax {
        self.syntax_config.syntax()
    }

    /// Sets the escape callback.
    ///
    /// The callback is invoked for every `{{name}}` interpolation with the
    /// stringified value and writes the escaped form to the output.  The
    /// default is [`escape_html`](crate::escape_html).
    ///
    /// ```
    /// # use ministache::{context, Output, Renderer};
    /// let mut renderer = Renderer::new();
    /// renderer.set_escape_callback(|out: &mut Output, value: &str| {
    ///     out.write_str(&value.to_uppercase())
    /// });
    /// let rv = renderer.render("{{x}} {{{x}}}", context!(x => "shout")).unwrap();
    /// assert_eq!(rv, "SHOUT shout");
    /// ```
    pub fn set_escape_callback<F>(&mut self, f: F)
    where
        F: Fn(&mut Output, &str) -> fmt::Result + 'static + Sync + Send,
    {
        self.escape_callback = Arc::new(f);
    }

    #[inline(always)]
    pub(crate) fn escape_callback(&self) -> &EscapeFunc {
        &*self.escape_callback
    }

    /// Sets the maximum depth of nested partials.
    ///
    /// Rendering a partial deeper than this fails with
    /// [`ErrorKind::RecursionLimitExceeded`](crate::ErrorKind::RecursionLimitExceeded).
    /// The default is 64.  With the `stacker` feature the stack grows on
    /// demand, so much larger limits are safe.  Independently of this limit,
    /// sections and partials together cannot nest deeper than 500 levels
    /// while rendering.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }

    /// Returns the maximum depth of nested partials.
    #[inline(always)]
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Controls scoping of sections over non sequence values.
    ///
    /// By default a section over a truthy value that is not a sequence
    /// renders its block against the current scope.  When enabled, the
    /// value is pushed as a new scope instead, so its keys are visible
    /// without dotted paths.
    ///
    /// ```
    /// # use ministache::{context, Renderer};
    /// let mut renderer = Renderer::new();
    /// let view = context!(name => "outer", person => context!(name => "inner"));
    /// let source = "{{#person}}{{name}}{{/person}}";
    /// assert_eq!(renderer.render(source, &view).unwrap(), "outer");
    /// renderer.set_push_object_scopes(true);
    /// assert_eq!(renderer.render(source, &view).unwrap(), "inner");
    /// ```
    pub fn set_push_object_scopes(&mut self, yes: bool) {
        self.push_object_scopes = yes;
    }

    /// Returns whether sections push non sequence values as scopes.
    #[inline(always)]
    pub fn push_object_scopes(&self) -> bool {
        self.push_object_scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_send_sync() {
        assert_send_sync::<Renderer>();
    }

    #[test]
    fn test_cache_hits() {
        let mut renderer = Renderer::new();
        let a = renderer.parse("{{a}}").unwrap();
        let b = renderer.parse("{{a}}").unwrap();
        assert!(std::ptr::eq(a.source(), b.source()));
        drop((a, b));
        renderer.parse("{{b}}").unwrap();
        assert_eq!(renderer.cached_templates(), 2);
        renderer.clear_cache();
        assert_eq!(renderer.cached_templates(), 0);
    }

    #[test]
    fn test_set_syntax_clears_cache() {
        let mut renderer = Renderer::new();
        renderer.parse("{{a}}").unwrap();
        renderer.set_syntax(Syntax::new("<%", "%>")).unwrap();
        assert_eq!(renderer.cached_templates(), 0);
        assert_eq!(renderer.syntax(), &Syntax::new("<%", "%>"));
        assert!(renderer.set_syntax(Syntax::new("<%", "")).is_err());
        assert_eq!(renderer.syntax().opener(), "<%");
    }

    #[test]
    fn test_debug() {
        let renderer = Renderer::new();
        assert_eq!(
            format!("{renderer:?}"),
            "Renderer { syntax: Syntax(\"{{\" \"}}\"), cached_templates: 0, \
             recursion_limit: 64, push_object_scopes: false }"
        );
    }
}
