use std::sync::Arc;
use std::{fmt, io};

use self_cell::self_cell;
use serde::Serialize;

use crate::compiler::ast::Node;
use crate::compiler::parser::parse;
use crate::context::Context;
use crate::error::Error;
use crate::evaluator::{Depth, Evaluator};
use crate::output::{Output, WriteWrapper};
use crate::partials::Partials;
use crate::renderer::Renderer;
use crate::syntax::SyntaxConfig;
use crate::value::Value;

/// Represents a handle to a template.
///
/// Templates are parsed and cached by the [`Renderer`].  With
/// [`Renderer::parse`] the cached tree is looked up and returned in form of
/// this handle.  Such a template can be cheaply cloned as it only holds a
/// reference to the renderer and a reference count to the tree.
///
/// ```
/// # use ministache::{context, Renderer};
/// let renderer = Renderer::new();
/// let tmpl = renderer.parse("Hello {{name}}!").unwrap();
/// assert_eq!(tmpl.render(context!(name => "John")).unwrap(), "Hello John!");
/// ```
#[derive(Clone)]
pub struct Template<'r> {
    renderer: &'r Renderer,
    loaded: Arc<LoadedTemplate>,
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source())
            .field("nodes", &self.nodes())
            .finish()
    }
}

impl<'r> Template<'r> {
    pub(crate) fn new(renderer: &'r Renderer, loaded: Arc<LoadedTemplate>) -> Template<'r> {
        Template { renderer, loaded }
    }

    /// Returns the source code of the template.
    pub fn source(&self) -> &str {
        self.loaded.borrow_dependent().source
    }

    /// Returns the parsed tree of the template.
    pub fn nodes(&self) -> &[Node<'_>] {
        &self.loaded.borrow_dependent().nodes
    }

    /// Renders the template into a string.
    ///
    /// The provided value is used as the root view of the template.  It can
    /// be any object that implements [`Serialize`](serde::Serialize).  You
    /// can either create your own struct and derive `Serialize` for it or
    /// the [`context!`](crate::context) macro can be used to create an ad-hoc
    /// view.
    ///
    /// Partial tags render nothing.  Use
    /// [`render_with_partials`](Self::render_with_partials) to supply them.
    ///
    /// **Note on values:** The [`Value`] type implements `Serialize` and can
    /// be efficiently passed to render.  It does not undergo actual
    /// serialization.
    pub fn render<S: Serialize>(&self, view: S) -> Result<String, Error> {
        // reduce total amount of code falling under mono morphization into
        // this function, and share the rest in _render.
        self._render(ok!(Value::try_from_serialize(&view)), None)
    }

    /// Renders the template into a string with partials.
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use ministache::{context, Renderer};
    /// let renderer = Renderer::new();
    /// let partials = BTreeMap::from([("item", "<li>{{.}}</li>")]);
    /// let tmpl = renderer.parse("{{#items}}{{>item}}{{/items}}").unwrap();
    /// let rv = tmpl.render_with_partials(context!(items => ["a", "b"]), &partials).unwrap();
    /// assert_eq!(rv, "<li>a</li><li>b</li>");
    /// ```
    pub fn render_with_partials<S: Serialize, P: Partials + ?Sized>(
        &self,
        view: S,
        partials: &P,
    ) -> Result<String, Error> {
        self._render(ok!(Value::try_from_serialize(&view)), Some(&partials))
    }

    fn _render(&self, root: Value, partials: Option<&dyn Partials>) -> Result<String, Error> {
        let mut rv = String::with_capacity(self.source().len());
        let ctx = Context::new(root);
        ok!(self._eval(&ctx, partials, &mut Output::new(&mut rv)));
        Ok(rv)
    }

    /// Renders the template into an [`io::Write`].
    ///
    /// This works exactly like [`render_with_partials`](Self::render_with_partials)
    /// but instead writes the template as it's evaluating into an
    /// [`io::Write`].  Pass `None` to render without partials.
    ///
    /// ```
    /// # use ministache::{context, Renderer};
    /// let renderer = Renderer::new();
    /// let tmpl = renderer.parse("Hello {{name}}!").unwrap();
    /// let mut buf = Vec::new();
    /// tmpl.render_to_write(context!(name => "John"), None, &mut buf).unwrap();
    /// assert_eq!(buf, b"Hello John!");
    /// ```
    pub fn render_to_write<S: Serialize, W: io::Write>(
        &self,
        view: S,
        partials: Option<&dyn Partials>,
        w: W,
    ) -> Result<(), Error> {
        let ctx = Context::new(ok!(Value::try_from_serialize(&view)));
        let mut wrapper = WriteWrapper { w, err: None };
        self._eval(&ctx, partials, &mut Output::new(&mut wrapper))
            .map_err(|err| wrapper.take_err(err))
    }

    /// Renders the template against an existing context.
    ///
    /// This is the path taken when a view is already a scope chain, for
    /// instance when rendering from within another render.
    pub fn render_in_context(
        &self,
        ctx: &Context<'_>,
        partials: Option<&dyn Partials>,
    ) -> Result<String, Error> {
        let mut rv = String::with_capacity(self.source().len());
        ok!(self._eval(ctx, partials, &mut Output::new(&mut rv)));
        Ok(rv)
    }

    fn _eval(
        &self,
        ctx: &Context<'_>,
        partials: Option<&dyn Partials>,
        out: &mut Output,
    ) -> Result<(), Error> {
        Evaluator::new(self.renderer, partials).eval_template(self, ctx, out, Depth::default())
    }
}

/// Represents a compiled template in memory.
pub(crate) struct CompiledTemplate<'source> {
    /// The source the nodes borrow from.
    pub source: &'source str,
    /// The root nodes.
    pub nodes: Vec<Node<'source>>,
}

impl fmt::Debug for CompiledTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl<'source> CompiledTemplate<'source> {
    /// Parses a source with the given syntax.
    pub fn new(
        source: &'source str,
        config: &SyntaxConfig,
    ) -> Result<CompiledTemplate<'source>, Error> {
        Ok(CompiledTemplate {
            source,
            nodes: ok!(parse(source, config.tags())),
        })
    }
}

self_cell! {
    pub(crate) struct LoadedTemplate {
        owner: Arc<str>,
        #[covariant]
        dependent: CompiledTemplate,
    }
}

impl fmt::Debug for LoadedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.borrow_dependent(), f)
    }
}

impl LoadedTemplate {
    pub(crate) fn load(source: Arc<str>, config: &SyntaxConfig) -> Result<LoadedTemplate, Error> {
        LoadedTemplate::try_new(source, |source| -> Result<_, Error> {
            CompiledTemplate::new(source, config)
        })
    }
}
