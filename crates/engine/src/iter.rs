//! Bulk iteration cache
//!
//! Positional `get` pays a container read per call. Anything that visits
//! every element should go through [`iterable`], which materializes the
//! whole vector with a single `collect` the first time it is polled and then
//! yields from memory.
//!
//! The snapshot is point-in-time: later pushes to the source are not seen.
//! An `Iterable` is consumed once; call [`iterable`] again to re-read.

use std::fmt;

use chunkvec_core::Result;

/// A vector that can be read in bulk
pub trait BulkSource {
    /// Element type
    type Item;

    /// Every element, with a bounded number of container reads
    fn collect_all(&self) -> Result<Vec<Self::Item>>;
}

/// Lazy iteration over a bulk snapshot of `source`
pub fn iterable<S>(source: &S) -> Iterable<'_, S::Item>
where
    S: BulkSource + ?Sized,
{
    Iterable::new(move || source.collect_all())
}

type Loader<'a, T> = Box<dyn FnOnce() -> Result<Vec<T>> + 'a>;

/// One-shot iterator over a bulk snapshot
///
/// Yields `Err` once if the snapshot cannot be read, then ends.
pub struct Iterable<'a, T> {
    loader: Option<Loader<'a, T>>,
    items: Option<std::vec::IntoIter<T>>,
}

impl<'a, T> Iterable<'a, T> {
    /// Iterator that materializes through `loader` on first use
    pub fn new<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Vec<T>> + 'a,
    {
        Iterable {
            loader: Some(Box::new(loader)),
            items: None,
        }
    }

    /// True once the snapshot has been read
    pub fn is_materialized(&self) -> bool {
        self.loader.is_none()
    }

    /// Materialize the remaining elements into a `Vec`
    pub fn into_vec(mut self) -> Result<Vec<T>> {
        if let Some(loader) = self.loader.take() {
            return loader();
        }
        Ok(self.items.map(|rest| rest.collect()).unwrap_or_default())
    }
}

impl<T> Iterator for Iterable<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(loader) = self.loader.take() {
            match loader() {
                Ok(items) => self.items = Some(items.into_iter()),
                Err(e) => return Some(Err(e)),
            }
        }
        self.items.as_mut()?.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match (&self.loader, &self.items) {
            (Some(_), _) => (0, None),
            (None, Some(items)) => items.size_hint(),
            (None, None) => (0, Some(0)),
        }
    }
}

impl<T> fmt::Debug for Iterable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iterable")
            .field("materialized", &self.is_materialized())
            .field("remaining", &self.items.as_ref().map(|i| i.len()))
            .finish()
    }
}
