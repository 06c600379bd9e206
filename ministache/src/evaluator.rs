use crate::compiler::ast::{Node, Section};
use crate::context::Context;
use crate::error::{Error, ErrorKind};
use crate::output::Output;
use crate::partials::Partials;
use crate::renderer::Renderer;
use crate::template::Template;
use crate::value::Value;

/// The deepest combined nesting of sections and partials while rendering.
pub(crate) const MAX_RENDER_NESTING: usize = 500;

/// How deep the evaluator currently is.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Depth {
    /// Nested partials.
    pub partials: usize,
    /// Nested sections and partials together.
    pub nesting: usize,
}

impl Depth {
    fn enter(self, partial: bool) -> Result<Depth, Error> {
        if self.nesting >= MAX_RENDER_NESTING {
            return Err(Error::new(
                ErrorKind::RecursionLimitExceeded,
                format!("sections and partials nested deeper than {MAX_RENDER_NESTING} levels"),
            ));
        }
        Ok(Depth {
            partials: self.partials + partial as usize,
            nesting: self.nesting + 1,
        })
    }
}

// stack space to keep free before growing when recursing into partials
#[cfg(feature = "stacker")]
const STACK_RED_ZONE: usize = 32 * 1024;
#[cfg(feature = "stacker")]
const STACK_GROWTH: usize = 1024 * 1024;

/// Walks a template tree and writes it out.
///
/// An evaluator lives for a single render call.  It holds the renderer for
/// configuration and the partials source of that render.
pub(crate) struct Evaluator<'r, 'p> {
    renderer: &'r Renderer,
    partials: Option<&'p dyn Partials>,
}

impl<'r, 'p> Evaluator<'r, 'p> {
    pub fn new(renderer: &'r Renderer, partials: Option<&'p dyn Partials>) -> Evaluator<'r, 'p> {
        Evaluator { renderer, partials }
    }

    /// Renders a whole template at the given depth.
    pub fn eval_template(
        &self,
        tmpl: &Template<'_>,
        ctx: &Context<'_>,
        out: &mut Output,
        depth: Depth,
    ) -> Result<(), Error> {
        self.eval_nodes(tmpl.nodes(), ctx, out, depth)
    }

    fn eval_nodes(
        &self,
        nodes: &[Node<'_>],
        ctx: &Context<'_>,
        out: &mut Output,
        depth: Depth,
    ) -> Result<(), Error> {
        for node in nodes {
            match node {
                Node::Text(text) => out.write_str(&text.text)?,
                Node::Var(var) => {
                    let value = ctx.lookup(&var.name);
                    if !value.is_absent() {
                        ok!(self.escape(out, &value));
                    }
                }
                Node::UnescapedVar(var) => {
                    let value = ctx.lookup(&var.name);
                    if !value.is_absent() {
                        write!(out, "{value}")?;
                    }
                }
                Node::Section(section) => ok!(self.eval_section(section, ctx, out, depth)),
                Node::InvertedSection(section) => {
                    let value = ctx.lookup(&section.name);
                    if !value.is_true() || value.is_empty_seq() {
                        let depth = ok!(depth.enter(false));
                        ok!(self.eval_nodes(&section.children, ctx, out, depth));
                    }
                }
                Node::Partial(partial) => ok!(self.eval_partial(&partial.name, ctx, out, depth)),
                Node::Comment(_) | Node::SetDelimiters(_) => {}
            }
        }
        Ok(())
    }

    fn escape(&self, out: &mut Output, value: &Value) -> Result<(), Error> {
        let escape = self.renderer.escape_callback();
        match value.as_str() {
            Some(s) => escape(out, s)?,
            None => escape(out, &value.to_string())?,
        }
        Ok(())
    }

    fn eval_section(
        &self,
        section: &Section<'_>,
        ctx: &Context<'_>,
        out: &mut Output,
        depth: Depth,
    ) -> Result<(), Error> {
        let value = ctx.lookup(&section.name);
        if !value.is_true() {
            return Ok(());
        }
        let depth = ok!(depth.enter(false));
        if value.is_seq() {
            if let Some(items) = value.try_iter() {
                for item in items {
                    let child = ctx.push(item);
                    ok!(self.eval_nodes(&section.children, &child, out, depth));
                }
            }
        } else if self.renderer.push_object_scopes() {
            let child = ctx.push(value);
            ok!(self.eval_nodes(&section.children, &child, out, depth));
        } else {
            ok!(self.eval_nodes(&section.children, ctx, out, depth));
        }
        Ok(())
    }

    fn eval_partial(
        &self,
        name: &str,
        ctx: &Context<'_>,
        out: &mut Output,
        depth: Depth,
    ) -> Result<(), Error> {
        let partials = match self.partials {
            Some(partials) => partials,
            None => return Ok(()),
        };
        let source = match ok!(partials.load_partial(name)) {
            Some(source) => source,
            None => return Ok(()),
        };
        if depth.partials >= self.renderer.recursion_limit() {
            return Err(Error::new(
                ErrorKind::RecursionLimitExceeded,
                format!("partial `{name}` exceeds maximum recursion limits"),
            ));
        }
        let tmpl = ok!(self.renderer.parse(&source));
        let depth = ok!(depth.enter(true));

        #[cfg(feature = "stacker")]
        {
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
                self.eval_template(&tmpl, ctx, out, depth)
            })
        }
        #[cfg(not(feature = "stacker"))]
        {
            self.eval_template(&tmpl, ctx, out, depth)
        }
    }
}
