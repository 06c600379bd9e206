use std::fmt;

use crate::output::Output;
use crate::utils::HtmlEscape;

/// The default escape callback.
///
/// Escapes `&`, `<`, `>`, `"` and `'` to their HTML entities.
///
/// ```
/// # use ministache::Renderer;
/// let renderer = Renderer::new();
/// let rv = renderer.render("{{x}}", ministache::context!(x => "<b>")).unwrap();
/// assert_eq!(rv, "&lt;b&gt;");
/// ```
pub fn escape_html(out: &mut Output, value: &str) -> fmt::Result {
    write!(out, "{}", HtmlEscape(value))
}

/// An escape callback that writes values unchanged.
///
/// Useful when templates produce something other than HTML.
///
/// ```
/// # use ministache::{Renderer, no_escape};
/// let mut renderer = Renderer::new();
/// renderer.set_escape_callback(no_escape);
/// let rv = renderer.render("{{x}}", ministache::context!(x => "<b>")).unwrap();
/// assert_eq!(rv, "<b>");
/// ```
pub fn no_escape(out: &mut Output, value: &str) -> fmt::Result {
    out.write_str(value)
}
