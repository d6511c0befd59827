//! Widgets whose identity follows a host value.
//!
//! [`Hooked`] registers a hook at construction. Every pass the hook is
//! evaluated before `draw()`, and its value decides whether the inner widget
//! is reused or rebuilt. The modes mirror [`Conditional`](crate::Conditional):
//! `widget` rebuilds on every draw, `persist` builds once, `cache` rebuilds
//! when the hook value or the optional cache key changes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::hooks::Hook;
use crate::locals::Locals;
use crate::memo::{KeyFn, LastKey, key_fn};
use crate::widget::{Drawable, Widget, WidgetCore, WidgetExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Plain,
    Persist,
    Cache,
}

type Factory<H, W> = Rc<dyn Fn(&H, Option<&W>) -> W>;

pub struct Hooked<H, W> {
    core: WidgetCore,
    hook: Hook<H>,
    inner: Rc<Inner<H, W>>,
}

struct Inner<H, W> {
    factory: RefCell<Option<Factory<H, W>>>,
    appliers: RefCell<Vec<Rc<dyn Fn(W) -> W>>>,
    mode: Cell<Mode>,
    widget: RefCell<Option<W>>,
    last_hook: RefCell<Option<H>>,
    cache_key: RefCell<Option<KeyFn>>,
    last_key: LastKey,
}

impl<H, W> Clone for Hooked<H, W> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            hook: self.hook.clone(),
            inner: self.inner.clone(),
        }
    }
}

pub fn hooked<H, W>(hook: impl Fn(&Locals) -> H + 'static) -> Hooked<H, W>
where
    H: Clone + PartialEq + 'static,
    W: Widget + Clone,
{
    Hooked::new(hook)
}

impl<H, W> Hooked<H, W>
where
    H: Clone + PartialEq + 'static,
    W: Widget + Clone,
{
    pub fn new(hook: impl Fn(&Locals) -> H + 'static) -> Self {
        let core = WidgetCore::of::<Self>();
        let hook = core.hooks().hook_value(hook);
        Self {
            core,
            hook,
            inner: Rc::new(Inner {
                factory: RefCell::new(None),
                appliers: RefCell::new(Vec::new()),
                mode: Cell::new(Mode::Plain),
                widget: RefCell::new(None),
                last_hook: RefCell::new(None),
                cache_key: RefCell::new(None),
                last_key: LastKey::default(),
            }),
        }
    }

    pub fn widget(self, factory: impl Fn(&H) -> W + 'static) -> Self {
        let factory: Factory<H, W> = Rc::new(move |hook: &H, _: Option<&W>| factory(hook));
        self.configure(Mode::Plain, factory, None)
    }

    pub fn persist(self, factory: impl Fn(&H) -> W + 'static) -> Self {
        let factory: Factory<H, W> = Rc::new(move |hook: &H, _: Option<&W>| factory(hook));
        self.configure(Mode::Persist, factory, None)
    }

    /// Rebuilds when the hook value changes. `factory` receives the instance
    /// being replaced, if any.
    pub fn cache(self, factory: impl Fn(&H, Option<&W>) -> W + 'static) -> Self {
        self.configure(Mode::Cache, Rc::new(factory), None)
    }

    /// Like [`cache`](Hooked::cache), also rebuilding when `key` changes.
    pub fn cache_by<K: PartialEq + 'static>(
        self,
        factory: impl Fn(&H, Option<&W>) -> W + 'static,
        key: impl Fn() -> K + 'static,
    ) -> Self {
        self.configure(Mode::Cache, Rc::new(factory), Some(key_fn(key)))
    }

    fn configure(self, mode: Mode, factory: Factory<H, W>, key: Option<KeyFn>) -> Self {
        self.inner.mode.set(mode);
        *self.inner.factory.borrow_mut() = Some(factory);
        *self.inner.cache_key.borrow_mut() = key;
        self
    }

    pub fn apply(self, action: impl Fn(W) -> W + 'static) -> Self {
        let action: Rc<dyn Fn(W) -> W> = Rc::new(action);
        self.inner.appliers.borrow_mut().push(action.clone());
        let current = self.inner.widget.borrow_mut().take();
        if let Some(current) = current {
            let applied = action(current);
            *self.inner.widget.borrow_mut() = Some(applied);
        }
        self
    }

    /// Fails until the first render built the inner widget.
    pub fn map<V>(&self, action: impl FnOnce(&W) -> V) -> Result<V> {
        let widget = self.get()?;
        Ok(action(&widget))
    }

    pub fn get(&self) -> Result<W> {
        self.inner
            .widget
            .borrow()
            .clone()
            .ok_or_else(|| Error::NotRendered {
                widget: self.core.name(),
            })
    }

    /// Whether the inner widget exists yet.
    pub fn evaluated(&self) -> bool {
        self.inner.widget.borrow().is_some()
    }

    fn build(&self, factory: &Factory<H, W>, hook: &H) -> W {
        let current = self.inner.widget.borrow().clone();
        let appliers = self.inner.appliers.borrow().clone();
        let widget = appliers
            .iter()
            .fold(factory(hook, current.as_ref()), |widget, apply| apply(widget));
        *self.inner.widget.borrow_mut() = Some(widget.clone());
        widget
    }

    fn get_or_build(&self, factory: &Factory<H, W>, hook: &H) -> W {
        let current = self.inner.widget.borrow().clone();
        match current {
            Some(widget) => widget,
            None => self.build(factory, hook),
        }
    }

    fn select(&self) -> Result<W> {
        let hook = self.hook.get()?;
        let factory = self
            .inner
            .factory
            .borrow()
            .clone()
            .ok_or_else(|| Error::FactoryNotConfigured {
                widget: self.core.name(),
            })?;

        Ok(match self.inner.mode.get() {
            Mode::Plain => self.build(&factory, &hook),
            Mode::Persist => self.get_or_build(&factory, &hook),
            Mode::Cache => {
                let hook_changed = self
                    .inner
                    .last_hook
                    .replace(Some(hook.clone()))
                    .is_some_and(|last| last != hook);
                let key = self.inner.cache_key.borrow().clone();
                let key_changed = key.is_some_and(|key| self.inner.last_key.changed(key()));
                if hook_changed || key_changed {
                    self.build(&factory, &hook)
                } else {
                    self.get_or_build(&factory, &hook)
                }
            }
        })
    }
}

impl<H, W> Drawable for Hooked<H, W>
where
    H: Clone + PartialEq + 'static,
    W: Widget + Clone,
{
    fn draw(&self) -> Result<Element> {
        Ok(self.select()?.render())
    }
}

impl<H, W> Widget for Hooked<H, W>
where
    H: Clone + PartialEq + 'static,
    W: Widget + Clone,
{
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl<H, W> fmt::Debug for Hooked<H, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooked")
            .field("name", &self.core.name())
            .field("mode", &self.inner.mode.get())
            .field("evaluated", &self.inner.widget.borrow().is_some())
            .finish()
    }
}
