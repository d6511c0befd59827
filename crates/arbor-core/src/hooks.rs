//! Render-pass scoped values.
//!
//! Registration happens at construction and yields a typed handle bound to a
//! slot. The runtime calls [`HookContainer::evaluate`] when it enters a widget,
//! which runs every factory in registration order. Reading a handle before
//! that is a contract violation and returns [`Error::HookNotEvaluated`].

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::locals::Locals;

type Factory = Rc<dyn Fn(&Locals) -> Rc<dyn Any>>;

#[derive(Clone, Default)]
pub struct HookContainer(Rc<Inner>);

#[derive(Default)]
struct Inner {
    factories: RefCell<Vec<Factory>>,
    evaluated: RefCell<Vec<Rc<dyn Any>>>,
    is_evaluated: Cell<bool>,
}

impl Inner {
    fn slot(&self, index: usize) -> Result<Rc<dyn Any>> {
        if !self.is_evaluated.get() {
            return Err(Error::HookNotEvaluated { index });
        }
        self.evaluated
            .borrow()
            .get(index)
            .cloned()
            .ok_or(Error::HookNotEvaluated { index })
    }
}

impl HookContainer {
    fn register(&self, factory: Factory) -> usize {
        let mut factories = self.0.factories.borrow_mut();
        factories.push(factory);
        factories.len() - 1
    }

    pub fn hook_value<T: Clone + 'static>(
        &self,
        factory: impl Fn(&Locals) -> T + 'static,
    ) -> Hook<T> {
        let index = self.register(Rc::new(move |locals: &Locals| {
            Rc::new(factory(locals)) as Rc<dyn Any>
        }));
        Hook {
            container: self.0.clone(),
            index,
            _marker: PhantomData,
        }
    }

    /// Like [`hook_value`](HookContainer::hook_value), for a callable produced
    /// once per pass.
    pub fn hook_function<A: 'static, R: 'static, F>(
        &self,
        factory: impl Fn(&Locals) -> F + 'static,
    ) -> HookFunction<A, R>
    where
        F: Fn(A) -> R + 'static,
    {
        let index = self.register(Rc::new(move |locals: &Locals| {
            let f: Rc<dyn Fn(A) -> R> = Rc::new(factory(locals));
            Rc::new(f) as Rc<dyn Any>
        }));
        HookFunction {
            container: self.0.clone(),
            index,
            _marker: PhantomData,
        }
    }

    /// Run every factory in order. Factories may read hooks registered
    /// before them.
    pub fn evaluate(&self, locals: &Locals) {
        let factories = self.0.factories.borrow().clone();
        self.0.evaluated.borrow_mut().clear();
        self.0.is_evaluated.set(true);
        for factory in factories {
            let value = factory(locals);
            self.0.evaluated.borrow_mut().push(value);
        }
    }

    pub fn evaluated(&self) -> bool {
        self.0.is_evaluated.get()
    }

    pub fn len(&self) -> usize {
        self.0.factories.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContainer")
            .field("hooks", &self.len())
            .field("evaluated", &self.evaluated())
            .finish()
    }
}

pub struct Hook<T> {
    container: Rc<Inner>,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> Hook<T> {
    pub fn get(&self) -> Result<T> {
        let slot = self.container.slot(self.index)?;
        slot.downcast_ref::<T>()
            .cloned()
            .ok_or(Error::HookTypeMismatch { index: self.index })
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

pub struct HookFunction<A, R> {
    container: Rc<Inner>,
    index: usize,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R> Clone for HookFunction<A, R> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<A: 'static, R: 'static> HookFunction<A, R> {
    pub fn call(&self, args: A) -> Result<R> {
        let slot = self.container.slot(self.index)?;
        let f = slot
            .downcast_ref::<Rc<dyn Fn(A) -> R>>()
            .cloned()
            .ok_or(Error::HookTypeMismatch { index: self.index })?;
        Ok(f(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_evaluate_fails() {
        let hooks = HookContainer::default();
        let value = hooks.hook_value(|_| 42);
        assert_eq!(value.get(), Err(Error::HookNotEvaluated { index: 0 }));

        hooks.evaluate(&Locals::default());
        assert_eq!(value.get(), Ok(42));
    }

    #[test]
    fn factories_run_once_per_evaluate() {
        let hooks = HookContainer::default();
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let value = hooks.hook_value(move |_| {
            r.set(r.get() + 1);
            r.get()
        });

        hooks.evaluate(&Locals::default());
        assert_eq!(value.get(), Ok(1));
        assert_eq!(value.get(), Ok(1));
        hooks.evaluate(&Locals::default());
        assert_eq!(value.get(), Ok(2));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn hook_registered_after_evaluate_is_not_ready() {
        let hooks = HookContainer::default();
        hooks.hook_value(|_| 1);
        hooks.evaluate(&Locals::default());
        let late = hooks.hook_value(|_| 2);
        assert_eq!(late.get(), Err(Error::HookNotEvaluated { index: 1 }));
    }

    #[test]
    fn hook_function_reads_locals() {
        let locals = Locals::default();
        locals.provide(String::from("snack"));
        let hooks = HookContainer::default();
        let greet = hooks.hook_function(|l: &Locals| {
            let prefix = l.get_or_default::<String>();
            move |name: &'static str| format!("{prefix}:{name}")
        });

        assert!(greet.call("x").is_err());
        hooks.evaluate(&locals);
        assert_eq!(greet.call("bar").as_deref(), Ok("snack:bar"));
    }
}
