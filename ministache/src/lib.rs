//! <div align=center>
//!   <p><strong>ministache: a small mustache template engine for Rust built on serde</strong></p>
//! </div>
//!
//! ministache renders [mustache](https://mustache.github.io/) templates.
//! Views are anything that implements [`serde::Serialize`], and parsed
//! templates are cached by the [`Renderer`] that parsed them.
//!
//! ```mustache
//! {{#users}}
//!   <li>{{name}}</li>
//! {{/users}}
//! ```
//!
//! # Why ministache
//!
//! * Small API: a renderer, a template handle and a value type
//! * Support for all `serde` compatible types as views
//! * Dynamic views through the [`Object`](crate::value::Object) trait
//! * Delimiter switching and standalone line handling like other mustache
//!   implementations
//! * Renderers can be shared between threads
//!
//! # Template Usage
//!
//! To render a template, create a [`Renderer`] and pass it the source and a
//! view.  The [`context!`] macro can be used to quickly construct a view:
//!
//! ```
//! use ministache::{Renderer, context};
//!
//! let renderer = Renderer::new();
//! let rv = renderer.render("Hello {{name}}!", context!(name => "John")).unwrap();
//! assert_eq!(rv, "Hello John!");
//! ```
//!
//! For super trivial cases where you need to render a string once, you can
//! also use the [`render!`] macro which acts a bit like a replacement
//! for the [`format!`] macro, or the [`render`] function which uses a thread
//! local renderer.
//!
//! Partials are passed to the render call.  Anything implementing
//! [`Partials`] works, maps of strings are the most common:
//!
//! ```
//! use std::collections::BTreeMap;
//! use ministache::{context, render_with_partials};
//!
//! let partials = BTreeMap::from([("user", "<strong>{{name}}</strong>")]);
//! let rv = render_with_partials(
//!     "{{#users}}{{>user}}{{/users}}",
//!     context!(users => [context!(name => "Moe")]),
//!     &partials,
//! ).unwrap();
//! assert_eq!(rv, "<strong>Moe</strong>");
//! ```
//!
//! For the syntax of templates see the [`syntax`] module.
//!
//! # Errors
//!
//! Malformed templates fail to parse with an [`Error`] that points at the
//! offending position.  Missing data never is an error, a name that cannot be
//! resolved renders as nothing:
//!
//! ```
//! # use ministache::{render, ErrorKind};
//! assert_eq!(render("[{{missing}}]", ()).unwrap(), "[]");
//! assert_eq!(render("{{#a}}", ()).unwrap_err().kind(), ErrorKind::UnclosedSection);
//! ```
//!
//! # Optional Features
//!
//! There are some additional features that can be enabled:
//!
//! - `debug`: errors retain a copy of the template source and render the
//!   surrounding lines with the alternate formatter (`{:#}`).  Enabled by
//!   default.
//! - `loader`: enables [`path_loader`] to load partials from a folder.
//!   Enabled by default.
//! - `preserve_order`: When enable the internal value implementation uses an
//!   indexmap which preserves the original order of maps and structs.
//!
//! Performance and memory related features:
//!
//! - `stacker`: enables automatic stack growth which permits much larger
//!   levels of partial recursion at runtime.
#![allow(clippy::needless_borrowed_reference)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

use serde::Serialize;

#[macro_use]
mod macros;

mod compiler;
mod context;
mod defaults;
mod error;
mod evaluator;
mod output;
mod partials;
mod renderer;
mod template;
mod utils;

pub mod syntax;
pub mod value;

pub use self::context::Context;
pub use self::defaults::{escape_html, no_escape};
pub use self::error::{Error, ErrorKind};
pub use self::output::Output;
pub use self::partials::{Partials, PartialsFn};
pub use self::renderer::{Renderer, DEFAULT_RECURSION_LIMIT};
pub use self::template::Template;
pub use self::utils::HtmlEscape;

#[cfg(feature = "loader")]
pub use self::partials::path_loader;

/// Re-export for convenience.
pub use self::value::Value;

#[doc(hidden)]
pub use self::macros::__context;

/// Renders a template with a thread local default [`Renderer`].
///
/// The parsed template stays cached for the current thread.
///
/// ```
/// # use ministache::{context, render};
/// let rv = render("{{#list}}{{.}}{{/list}}", context!(list => ["a", "b", "c"])).unwrap();
/// assert_eq!(rv, "abc");
/// ```
pub fn render<S: Serialize>(source: &str, view: S) -> Result<String, Error> {
    __context::thread_local_renderer().render(source, view)
}

/// Renders a template with partials with a thread local default [`Renderer`].
pub fn render_with_partials<S: Serialize, P: Partials + ?Sized>(
    source: &str,
    view: S,
    partials: &P,
) -> Result<String, Error> {
    __context::thread_local_renderer().render_with_partials(source, view, partials)
}
