//! Host-provided values.
//!
//! The runtime carries a typed map of values the host wants widgets to see,
//! such as a theme or a notification sink. Hook factories receive it during
//! evaluation:
//!
//! ```rust
//! use arbor_core::*;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Theme { dark: bool }
//!
//! let locals = Locals::default();
//! locals.provide(Theme { dark: true });
//!
//! let hooks = HookContainer::default();
//! let theme = hooks.hook_value(|l: &Locals| l.get::<Theme>());
//! hooks.evaluate(&locals);
//! assert_eq!(theme.get().unwrap(), Some(Theme { dark: true }));
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct Locals {
    values: Rc<RefCell<HashMap<TypeId, Rc<dyn Any>>>>,
}

impl Locals {
    /// Replaces a previously provided value of the same type.
    pub fn provide<T: 'static>(&self, value: T) -> &Self {
        self.values
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::new(value));
        self
    }

    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.values
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn get_or_default<T: Clone + Default + 'static>(&self) -> T {
        self.get().unwrap_or_default()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.borrow().contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: 'static>(&self) -> bool {
        self.values.borrow_mut().remove(&TypeId::of::<T>()).is_some()
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locals")
            .field("len", &self.values.borrow().len())
            .finish()
    }
}
