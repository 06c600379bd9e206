use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

#[cfg(feature = "loader")]
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::Error;
#[cfg(feature = "loader")]
use crate::error::ErrorKind;
use crate::value::Value;

/// A source of partial templates.
///
/// `{{>name}}` asks the partials source for `name`.  `Ok(None)` means the
/// partial does not exist, which renders nothing.  Errors abort rendering.
///
/// Maps of strings, [`Value`] maps and closures wrapped in [`PartialsFn`] are
/// partials sources:
///
/// ```
/// # use std::collections::BTreeMap;
/// # use ministache::{context, Renderer};
/// let mut partials = BTreeMap::new();
/// partials.insert("user", "<strong>{{name}}</strong>");
/// let rv = Renderer::new()
///     .render_with_partials("{{#users}}{{>user}}{{/users}}", context!(users => vec![
///         context!(name => "Moe"),
///     ]), &partials)
///     .unwrap();
/// assert_eq!(rv, "<strong>Moe</strong>");
/// ```
pub trait Partials {
    /// Loads the source of the partial called `name`.
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error>;
}

impl<K, V> Partials for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error> {
        Ok(self.get(name).map(|source| Cow::Borrowed(source.as_ref())))
    }
}

impl<K, V, S> Partials for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error> {
        Ok(self.get(name).map(|source| Cow::Borrowed(source.as_ref())))
    }
}

impl Partials for Value {
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error> {
        Ok(self
            .get_attr(name)
            .filter(|source| !source.is_absent())
            .map(|source| Cow::Owned(source.to_string())))
    }
}

impl<T: Partials + ?Sized> Partials for &T {
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error> {
        (**self).load_partial(name)
    }
}

/// Wraps a closure as a partials source.
///
/// ```
/// # use ministache::{Error, PartialsFn, Renderer};
/// let partials = PartialsFn(|name: &str| Ok::<_, Error>(Some(format!("[{name}]"))));
/// let rv = Renderer::new().render_with_partials("{{>a}}{{>b}}", (), &partials).unwrap();
/// assert_eq!(rv, "[a][b]");
/// ```
pub struct PartialsFn<F>(pub F);

impl<F> fmt::Debug for PartialsFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PartialsFn")
    }
}

impl<F> Partials for PartialsFn<F>
where
    F: Fn(&str) -> Result<Option<String>, Error>,
{
    fn load_partial(&self, name: &str) -> Result<Option<Cow<'_, str>>, Error> {
        (self.0)(name).map(|source| source.map(Cow::Owned))
    }
}

/// Safely joins two paths.
#[cfg(feature = "loader")]
pub fn safe_join(base: &Path, name: &str) -> Option<PathBuf> {
    let mut rv = base.to_path_buf();
    for segment in name.split('/') {
        if segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        rv.push(segment);
    }
    Some(rv)
}

#[cfg(feature = "loader")]
fn read_partial(path: &Path) -> Result<Option<String>, Error> {
    match fs::read_to_string(path) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::new(
            ErrorKind::PartialLoadFailure,
            format!("could not read partial `{}`", path.display()),
        )
        .with_source(err)),
    }
}

/// Helper to load partials from a given directory.
///
/// `{{>name}}` loads `<dir>/name` or, failing that, `<dir>/name.mustache`.
/// Names may contain `/` to reach into sub folders.  Partials that start
/// with a dot (`.`) or are contained in a folder starting with a dot cannot
/// be loaded.
///
/// # Example
///
/// ```rust
/// # use ministache::{path_loader, Renderer};
/// let partials = path_loader("path/to/partials");
/// let rv = Renderer::new().render_with_partials("{{>missing}}", (), &partials).unwrap();
/// assert_eq!(rv, "");
/// ```
#[cfg(feature = "loader")]
#[cfg_attr(docsrs, doc(cfg(feature = "loader")))]
pub fn path_loader<P: AsRef<Path>>(
    dir: P,
) -> PartialsFn<impl Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static> {
    let dir = dir.as_ref().to_path_buf();
    PartialsFn(move |name: &str| {
        let path = match safe_join(&dir, name) {
            Some(path) => path,
            None => return Ok(None),
        };
        if path.is_file() {
            return read_partial(&path);
        }
        let mut with_extension = path.into_os_string();
        with_extension.push(".mustache");
        read_partial(Path::new(&with_extension))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_map_partials() {
        let mut partials = HashMap::new();
        partials.insert(String::from("user"), String::from("{{name}}"));
        assert_eq!(
            partials.load_partial("user").unwrap().as_deref(),
            Some("{{name}}")
        );
        assert_eq!(partials.load_partial("missing").unwrap(), None);
    }

    #[test]
    fn test_value_partials() {
        let partials = Value::from_iter([("a", Value::from("A")), ("b", Value::from(()))]);
        assert_eq!(partials.load_partial("a").unwrap().as_deref(), Some("A"));
        assert_eq!(partials.load_partial("b").unwrap(), None);
        assert_eq!(partials.load_partial("c").unwrap(), None);
    }

    #[test]
    #[cfg(feature = "loader")]
    fn test_safe_join() {
        assert_eq!(
            safe_join(Path::new("foo"), "bar/baz"),
            Some(PathBuf::from("foo").join("bar").join("baz"))
        );
        assert_eq!(safe_join(Path::new("foo"), ".bar/baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/.baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/../baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar\\baz"), None);
    }
}
