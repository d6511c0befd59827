//! Memoised branch selection.
//!
//! A [`Conditional`] renders its main widget while the predicate holds and a
//! stub otherwise. How the main widget is obtained depends on the mode:
//!
//! - [`widget`](Conditional::widget): a fresh instance on every draw;
//! - [`persist`](Conditional::persist): built once, reused while the
//!   predicate stays true;
//! - [`cache`](Conditional::cache): reused while a caller-supplied key stays
//!   equal, rebuilt when it moves.
//!
//! When the predicate turns false the held instance is released, so a
//! widget that was unmounted is never rendered again. A cache key is still
//! recorded on the false branch. The stub follows the same rule: it is
//! built when the predicate turns false and released when it turns true.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::basic::empty;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::memo::{KeyFn, LastKey, key_fn};
use crate::widget::{Drawable, Widget, WidgetCore, WidgetExt, WidgetRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Plain,
    Persist,
    Cache,
}

type Factory<W> = Rc<dyn Fn(Option<&W>) -> W>;
type Applier<W> = Rc<dyn Fn(W) -> W>;
type StubFactory = Rc<dyn Fn() -> WidgetRef>;

pub struct Conditional<W> {
    core: WidgetCore,
    inner: Rc<Inner<W>>,
}

struct Inner<W> {
    predicate: RefCell<Rc<dyn Fn() -> bool>>,
    stub_factory: RefCell<StubFactory>,
    stub: RefCell<Option<WidgetRef>>,
    factory: RefCell<Option<Factory<W>>>,
    appliers: RefCell<Vec<Applier<W>>>,
    mode: Cell<Mode>,
    widget: RefCell<Option<W>>,
    cache_key: RefCell<Option<KeyFn>>,
    last_key: LastKey,
}

impl<W> Clone for Conditional<W> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            inner: self.inner.clone(),
        }
    }
}

pub fn conditional<W: Widget + Clone>(predicate: impl Fn() -> bool + 'static) -> Conditional<W> {
    Conditional::new().predicate(predicate)
}

impl<W: Widget + Clone> Default for Conditional<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Widget + Clone> Conditional<W> {
    pub fn new() -> Self {
        Self {
            core: WidgetCore::of::<Self>(),
            inner: Rc::new(Inner {
                predicate: RefCell::new(Rc::new(|| true)),
                stub_factory: RefCell::new(Rc::new(|| empty().to_ref())),
                stub: RefCell::new(None),
                factory: RefCell::new(None),
                appliers: RefCell::new(Vec::new()),
                mode: Cell::new(Mode::Plain),
                widget: RefCell::new(None),
                cache_key: RefCell::new(None),
                last_key: LastKey::default(),
            }),
        }
    }

    pub fn predicate(self, predicate: impl Fn() -> bool + 'static) -> Self {
        *self.inner.predicate.borrow_mut() = Rc::new(predicate);
        self
    }

    /// Stub rendered while the predicate is false. `factory` runs once each
    /// time the predicate turns false; the stub lives until it turns true.
    pub fn otherwise<S: Widget>(self, factory: impl Fn() -> S + 'static) -> Self {
        *self.inner.stub_factory.borrow_mut() = Rc::new(move || WidgetRef::new(factory()));
        self.inner.stub.borrow_mut().take();
        self
    }

    /// The stub currently shown, if the predicate was false at the last draw.
    pub fn stub(&self) -> Option<WidgetRef> {
        self.inner.stub.borrow().clone()
    }

    pub fn widget(self, factory: impl Fn() -> W + 'static) -> Self {
        self.configure(Mode::Plain, Rc::new(move |_: Option<&W>| factory()), None)
    }

    pub fn persist(self, factory: impl Fn() -> W + 'static) -> Self {
        self.configure(Mode::Persist, Rc::new(move |_: Option<&W>| factory()), None)
    }

    /// `factory` receives the instance being replaced, if any.
    pub fn cache<K: PartialEq + 'static>(
        self,
        factory: impl Fn(Option<&W>) -> W + 'static,
        key: impl Fn() -> K + 'static,
    ) -> Self {
        self.configure(Mode::Cache, Rc::new(factory), Some(key_fn(key)))
    }

    fn configure(self, mode: Mode, factory: Factory<W>, key: Option<KeyFn>) -> Self {
        self.inner.mode.set(mode);
        *self.inner.factory.borrow_mut() = Some(factory);
        *self.inner.cache_key.borrow_mut() = key;
        self
    }

    /// Post-processes every instance the factory builds, and the current one.
    pub fn apply(self, action: impl Fn(W) -> W + 'static) -> Self {
        let action: Applier<W> = Rc::new(action);
        self.inner.appliers.borrow_mut().push(action.clone());
        let current = self.inner.widget.borrow_mut().take();
        if let Some(current) = current {
            let applied = action(current);
            *self.inner.widget.borrow_mut() = Some(applied);
        }
        self
    }

    pub fn map<V>(&self, action: impl FnOnce(&W) -> V) -> Option<V> {
        let widget = self.get()?;
        Some(action(&widget))
    }

    pub fn get(&self) -> Option<W> {
        self.inner.widget.borrow().clone()
    }

    pub fn is_true(&self) -> bool {
        self.inner.widget.borrow().is_some()
    }

    pub fn is_false(&self) -> bool {
        !self.is_true()
    }

    fn build(&self) -> Result<W> {
        let factory = self
            .inner
            .factory
            .borrow()
            .clone()
            .ok_or_else(|| Error::FactoryNotConfigured {
                widget: self.core.name(),
            })?;
        let current = self.get();
        let appliers = self.inner.appliers.borrow().clone();
        let widget = appliers
            .iter()
            .fold(factory(current.as_ref()), |widget, apply| apply(widget));
        *self.inner.widget.borrow_mut() = Some(widget.clone());
        Ok(widget)
    }

    fn stub_or_build(&self) -> WidgetRef {
        if let Some(stub) = self.stub() {
            return stub;
        }
        let factory = self.inner.stub_factory.borrow().clone();
        let stub = factory();
        *self.inner.stub.borrow_mut() = Some(stub.clone());
        stub
    }

    fn get_or_build(&self) -> Result<W> {
        match self.get() {
            Some(widget) => Ok(widget),
            None => self.build(),
        }
    }

    fn select(&self) -> Result<Option<W>> {
        let predicate = self.inner.predicate.borrow().clone();
        let key = self.inner.cache_key.borrow().clone();
        if !predicate() {
            if let Some(key) = key {
                self.inner.last_key.changed(key());
            }
            self.inner.widget.borrow_mut().take();
            return Ok(None);
        }
        self.inner.stub.borrow_mut().take();
        let widget = match (self.inner.mode.get(), key) {
            (Mode::Persist, _) => self.get_or_build()?,
            (Mode::Cache, Some(key)) => {
                if self.inner.last_key.changed(key()) {
                    self.build()?
                } else {
                    self.get_or_build()?
                }
            }
            _ => self.build()?,
        };
        Ok(Some(widget))
    }
}

impl<W: Widget + Clone> Drawable for Conditional<W> {
    fn draw(&self) -> Result<Element> {
        Ok(match self.select()? {
            Some(widget) => widget.render(),
            None => Element::Widget(self.stub_or_build()),
        })
    }
}

impl<W: Widget + Clone> Widget for Conditional<W> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl<W> fmt::Debug for Conditional<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conditional")
            .field("name", &self.core.name())
            .field("mode", &self.inner.mode.get())
            .field("holds_widget", &self.inner.widget.borrow().is_some())
            .finish()
    }
}

/// Several conditionals rendered side by side.
#[derive(Clone)]
pub struct When {
    core: WidgetCore,
    conditions: Rc<RefCell<Vec<Conditional<WidgetRef>>>>,
}

pub fn when() -> When {
    When {
        core: WidgetCore::of::<When>(),
        conditions: Rc::default(),
    }
}

impl When {
    fn push(self, condition: Conditional<WidgetRef>) -> Self {
        self.conditions.borrow_mut().push(condition);
        self
    }

    pub fn widget<V: Widget>(
        self,
        predicate: impl Fn() -> bool + 'static,
        factory: impl Fn() -> V + 'static,
    ) -> Self {
        self.push(conditional(predicate).widget(move || WidgetRef::new(factory())))
    }

    pub fn persist<V: Widget>(
        self,
        predicate: impl Fn() -> bool + 'static,
        factory: impl Fn() -> V + 'static,
    ) -> Self {
        self.push(conditional(predicate).persist(move || WidgetRef::new(factory())))
    }

    pub fn cache<V: Widget, K: PartialEq + 'static>(
        self,
        predicate: impl Fn() -> bool + 'static,
        factory: impl Fn() -> V + 'static,
        key: impl Fn() -> K + 'static,
    ) -> Self {
        self.push(conditional(predicate).cache(move |_| WidgetRef::new(factory()), key))
    }

    /// Stub factory for every condition registered so far.
    pub fn otherwise<S: Widget>(self, factory: impl Fn() -> S + 'static) -> Self {
        let factory = Rc::new(factory);
        let conditions = self.conditions.borrow().clone();
        let updated = conditions
            .into_iter()
            .map(|condition| {
                let factory = factory.clone();
                condition.otherwise(move || factory())
            })
            .collect();
        *self.conditions.borrow_mut() = updated;
        self
    }

    pub fn apply(self, action: impl Fn(WidgetRef) -> WidgetRef + 'static) -> Self {
        let action = Rc::new(action);
        let conditions = self.conditions.borrow().clone();
        let updated = conditions
            .into_iter()
            .map(|condition| {
                let action = action.clone();
                condition.apply(move |widget| action(widget))
            })
            .collect();
        *self.conditions.borrow_mut() = updated;
        self
    }

    /// Result of `action` on the first condition holding a widget.
    pub fn map<V>(&self, action: impl Fn(&WidgetRef) -> V) -> Option<V> {
        self.conditions
            .borrow()
            .iter()
            .find_map(|condition| condition.map(&action))
    }

    pub fn current(&self) -> Option<WidgetRef> {
        self.map(WidgetRef::clone)
    }

    pub fn all(&self) -> Vec<WidgetRef> {
        self.conditions
            .borrow()
            .iter()
            .filter_map(Conditional::get)
            .collect()
    }
}

impl Drawable for When {
    fn draw(&self) -> Result<Element> {
        Ok(Element::fragment(
            self.conditions.borrow().iter().map(WidgetExt::render),
        ))
    }
}

impl Widget for When {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl fmt::Debug for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When")
            .field("conditions", &self.conditions.borrow().len())
            .finish()
    }
}
