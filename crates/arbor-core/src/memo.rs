//! Value-keyed memoisation.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Type-erased cache key compared by value.
pub trait CacheKey: Any {
    fn as_any(&self) -> &dyn Any;

    fn same_as(&self, other: &dyn CacheKey) -> bool;
}

impl<T: PartialEq + 'static> CacheKey for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn CacheKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

pub(crate) type KeyFn = Rc<dyn Fn() -> Box<dyn CacheKey>>;

pub(crate) fn key_fn<K: PartialEq + 'static>(key: impl Fn() -> K + 'static) -> KeyFn {
    Rc::new(move || Box::new(key()) as Box<dyn CacheKey>)
}

/// Remembers the last computed key so callers can tell whether it moved.
#[derive(Default)]
pub(crate) struct LastKey(RefCell<Option<Box<dyn CacheKey>>>);

impl LastKey {
    /// Stores `key` and reports whether it differs from the one stored before.
    /// The first key never counts as a change.
    pub(crate) fn changed(&self, key: Box<dyn CacheKey>) -> bool {
        let mut last = self.0.borrow_mut();
        let changed = last.as_ref().is_some_and(|last| !last.same_as(&*key));
        *last = Some(key);
        changed
    }
}

/// A computed value that is recomputed only when its inputs change.
///
/// ```rust
/// use arbor_core::Observable;
///
/// let total = Observable::default();
/// assert_eq!(total.render((1, 2), || 3), 3);
/// assert_eq!(total.render((1, 2), || unreachable!()), 3);
/// assert_eq!(total.render((2, 2), || 4), 4);
/// ```
pub struct Observable<K, T> {
    last: Rc<RefCell<Option<(K, T)>>>,
}

impl<K, T> Clone for Observable<K, T> {
    fn clone(&self) -> Self {
        Self {
            last: self.last.clone(),
        }
    }
}

impl<K, T> Default for Observable<K, T> {
    fn default() -> Self {
        Self {
            last: Rc::new(RefCell::new(None)),
        }
    }
}

impl<K: PartialEq, T: Clone> Observable<K, T> {
    pub fn render(&self, values: K, compute: impl FnOnce() -> T) -> T {
        if let Some((key, value)) = &*self.last.borrow()
            && *key == values
        {
            return value.clone();
        }
        let value = compute();
        *self.last.borrow_mut() = Some((values, value.clone()));
        value
    }

    pub fn reset(&self) {
        self.last.borrow_mut().take();
    }
}

impl<K: fmt::Debug, T> fmt::Debug for Observable<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.last.borrow();
        f.debug_struct("Observable")
            .field("values", &last.as_ref().map(|(k, _)| k))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_of_different_types_never_match() {
        let a: Box<dyn CacheKey> = Box::new(1u32);
        let b: Box<dyn CacheKey> = Box::new(1u64);
        assert!(!a.same_as(&*b));
        assert!(a.same_as(&1u32));
    }

    #[test]
    fn last_key_reports_moves_only() {
        let last = LastKey::default();
        assert!(!last.changed(Box::new("a")));
        assert!(!last.changed(Box::new("a")));
        assert!(last.changed(Box::new("b")));
    }

    #[test]
    fn observable_recomputes_on_new_values() {
        let runs = Rc::new(RefCell::new(0));
        let memo = Observable::default();
        for values in [1, 1, 2, 2, 1] {
            let runs = runs.clone();
            memo.render(values, move || {
                *runs.borrow_mut() += 1;
                values * 10
            });
        }
        assert_eq!(*runs.borrow(), 3);
    }
}
