//! Widget base.
//!
//! A widget is a cheap, cloneable handle made of a [`WidgetCore`] (identity,
//! key, lifecycle, addons, hooks, configuration) plus whatever state the
//! concrete widget keeps. Capabilities are split across small traits:
//!
//! - [`Drawable`] builds the visual subtree;
//! - [`Widget`] exposes the core, which is all the runtime needs;
//! - [`HasConfiguration`] gives typed access to the widget's reactive state;
//! - [`HasLifecycle`] exposes the state machine and its callbacks.
//!
//! [`HasLifecycle`] and [`WidgetExt`] are implemented for every widget.
//!
//! ```rust
//! use arbor_core::*;
//!
//! #[derive(Clone)]
//! struct Hello {
//!     core: WidgetCore,
//! }
//!
//! impl Drawable for Hello {
//!     fn draw(&self) -> Result<Element> {
//!         Ok(Element::tag("p").child("hello".into()))
//!     }
//! }
//!
//! impl Widget for Hello {
//!     fn core(&self) -> &WidgetCore {
//!         &self.core
//!     }
//! }
//!
//! let hello = Hello { core: WidgetCore::of::<Hello>() };
//! let runtime = Runtime::new();
//! let node = runtime.frame(&hello.render()).unwrap();
//! assert_eq!(node.to_string(), "<p>hello</p>");
//! ```

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::configurable::{Configurable, Configuration};
use crate::effects::{Dispose, Subscription};
use crate::element::Element;
use crate::error::Result;
use crate::hooks::{Hook, HookContainer, HookFunction};
use crate::lifecycle::{LifeCycle, Stage, WidgetState};
use crate::locals::Locals;

/// Process-unique widget identity, handed out by a monotonic counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reconciliation key. Defaults to the widget id; set a stable one for
/// widgets living in collections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Id(WidgetId),
    Index(u64),
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Id(id) => fmt::Display::fmt(id, f),
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for Key {
    fn from(i: u64) -> Self {
        Key::Index(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i as u64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

pub trait Drawable {
    fn draw(&self) -> Result<Element>;

    /// Static widgets redraw on every pass instead of waiting for their
    /// trigger.
    fn render_without_changes(&self) -> bool {
        false
    }
}

pub trait Widget: Drawable + 'static {
    fn core(&self) -> &WidgetCore;
}

/// Typed access to a widget's reactive state.
pub trait HasConfiguration: Widget {
    type Config: Configuration;

    fn configuration(&self) -> &Self::Config;

    /// Hand the selected part of the configuration to `user`.
    fn use_config<S>(
        &self,
        selector: impl FnOnce(&Self::Config) -> &S,
        user: impl FnOnce(&S),
    ) -> &Self {
        user(selector(self.configuration()));
        self
    }

    /// Scoped mutator for one property: the returned handle writes straight
    /// into this widget's configuration.
    fn extract<S: Clone>(&self, selector: impl FnOnce(&Self::Config) -> &S) -> S {
        selector(self.configuration()).clone()
    }
}

#[derive(Clone)]
pub struct WidgetCore(Rc<CoreInner>);

struct CoreInner {
    id: WidgetId,
    type_name: &'static str,
    key: RefCell<Option<Key>>,
    state: Rc<Cell<WidgetState>>,
    configurable: Configurable,
    managed: bool,
    lifecycle: RefCell<LifeCycle>,
    addons: RefCell<Vec<WidgetRef>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

fn short_type_name<W: ?Sized>() -> &'static str {
    let full = type_name::<W>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl WidgetCore {
    /// Core of a widget without reactive state. Such widgets redraw on every
    /// pass.
    pub fn of<W: ?Sized>() -> Self {
        Self::build(short_type_name::<W>(), false, None)
    }

    /// Core of a widget whose redraws are gated by its own trigger.
    pub fn managed_of<W: ?Sized>() -> Self {
        Self::build(short_type_name::<W>(), true, None)
    }

    /// Managed core reusing another widget's configuration, so both re-render
    /// in lockstep.
    pub fn sharing<W: ?Sized>(configurable: &Configurable) -> Self {
        Self::build(short_type_name::<W>(), true, Some(configurable.clone()))
    }

    fn build(type_name: &'static str, managed: bool, configurable: Option<Configurable>) -> Self {
        let state = Rc::new(Cell::new(WidgetState::Created));
        let configurable = configurable.unwrap_or_else(|| Configurable::new(state.clone()));
        Self(Rc::new(CoreInner {
            id: WidgetId::next(),
            type_name,
            key: RefCell::new(None),
            state,
            configurable,
            managed,
            lifecycle: RefCell::new(LifeCycle::default()),
            addons: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> WidgetId {
        self.0.id
    }

    pub fn key(&self) -> Key {
        self.0.key.borrow().clone().unwrap_or(Key::Id(self.0.id))
    }

    pub fn set_key(&self, key: impl Into<Key>) {
        *self.0.key.borrow_mut() = Some(key.into());
    }

    pub fn name(&self) -> String {
        format!("{}: {}", self.0.type_name, self.key())
    }

    pub fn state(&self) -> WidgetState {
        self.0.state.get()
    }

    pub(crate) fn transition(&self, to: WidgetState, logs: bool) {
        let from = self.0.state.replace(to);
        if logs {
            log::trace!("[{}]: {} -> {}", self.name(), from, to);
        }
    }

    pub fn is_managed(&self) -> bool {
        self.0.managed
    }

    pub fn configurable(&self) -> &Configurable {
        &self.0.configurable
    }

    pub fn hooks(&self) -> &HookContainer {
        self.0.configurable.hooks()
    }

    pub fn on(&self, stage: Stage, action: impl Fn(&WidgetCore) + 'static) {
        self.0.lifecycle.borrow_mut().push(stage, Rc::new(action));
    }

    pub(crate) fn fire(&self, stage: Stage) {
        let actions = self.0.lifecycle.borrow().actions(stage).to_vec();
        for action in actions {
            action(self);
        }
    }

    pub fn subscribe(&self, subscription: impl Fn() -> Dispose + 'static) {
        self.0.subscriptions.borrow_mut().push(Rc::new(subscription));
    }

    pub(crate) fn start_subscriptions(&self) -> Vec<Dispose> {
        let subscriptions = self.0.subscriptions.borrow().clone();
        subscriptions.iter().map(|subscribe| subscribe()).collect()
    }

    pub fn add_addon(&self, addon: WidgetRef) {
        self.0.addons.borrow_mut().push(addon);
    }

    pub fn addons(&self) -> Vec<WidgetRef> {
        self.0.addons.borrow().clone()
    }

    pub fn notify(&self) {
        self.0.configurable.notify_trigger();
    }

    pub fn pause(&self) {
        self.0.configurable.pause_render();
    }

    pub fn resume(&self) {
        self.0.configurable.continue_render();
    }

    /// Run `action` with rendering paused; at most one notification follows.
    pub fn lock<R>(&self, action: impl FnOnce() -> R) -> R {
        self.pause();
        let result = action();
        self.resume();
        result
    }

    pub fn ptr_eq(&self, other: &WidgetCore) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for WidgetCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetCore")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("managed", &self.0.managed)
            .field("addons", &self.0.addons.borrow().len())
            .finish()
    }
}

/// Type-erased widget handle.
#[derive(Clone)]
pub struct WidgetRef(Rc<dyn Widget>);

impl WidgetRef {
    pub fn new(widget: impl Widget) -> Self {
        Self(Rc::new(widget))
    }

    pub fn id(&self) -> WidgetId {
        self.0.core().id()
    }

    pub fn ptr_eq(&self, other: &WidgetRef) -> bool {
        self.core().ptr_eq(other.core())
    }
}

impl Drawable for WidgetRef {
    fn draw(&self) -> Result<Element> {
        self.0.draw()
    }

    fn render_without_changes(&self) -> bool {
        self.0.render_without_changes()
    }
}

impl Widget for WidgetRef {
    fn core(&self) -> &WidgetCore {
        self.0.core()
    }
}

impl fmt::Debug for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WidgetRef").field(&self.core().name()).finish()
    }
}

/// Lifecycle surface shared by every widget.
pub trait HasLifecycle: Widget + Sized {
    fn state(&self) -> WidgetState {
        self.core().state()
    }

    fn on_load(self, action: impl Fn(&WidgetCore) + 'static) -> Self {
        self.core().on(Stage::Load, action);
        self
    }

    fn on_mount(self, action: impl Fn(&WidgetCore) + 'static) -> Self {
        self.core().on(Stage::Mount, action);
        self
    }

    fn on_render(self, action: impl Fn(&WidgetCore) + 'static) -> Self {
        self.core().on(Stage::Render, action);
        self
    }

    fn on_draw(self, action: impl Fn(&WidgetCore) + 'static) -> Self {
        self.core().on(Stage::Draw, action);
        self
    }

    fn on_unmount(self, action: impl Fn(&WidgetCore) + 'static) -> Self {
        self.core().on(Stage::Unmount, action);
        self
    }

    fn subscribe(self, subscription: impl Fn() -> Dispose + 'static) -> Self {
        self.core().subscribe(subscription);
        self
    }
}

impl<W: Widget> HasLifecycle for W {}

/// Fluent surface shared by every widget.
pub trait WidgetExt: Widget + Clone + Sized {
    fn id(&self) -> WidgetId {
        self.core().id()
    }

    fn key(&self) -> Key {
        self.core().key()
    }

    fn widget_name(&self) -> String {
        self.core().name()
    }

    fn with_key(self, key: impl Into<Key>) -> Self {
        self.core().set_key(key);
        self
    }

    fn with(self, action: impl FnOnce(&Self)) -> Self {
        action(&self);
        self
    }

    fn hook_value<T: Clone + 'static>(&self, factory: impl Fn(&Locals) -> T + 'static) -> Hook<T> {
        self.core().hooks().hook_value(factory)
    }

    fn hook_function<A: 'static, R: 'static, F>(
        &self,
        factory: impl Fn(&Locals) -> F + 'static,
    ) -> HookFunction<A, R>
    where
        F: Fn(A) -> R + 'static,
    {
        self.core().hooks().hook_function(factory)
    }

    fn pause(&self) -> &Self {
        self.core().pause();
        self
    }

    /// Ends a [`pause`](WidgetExt::pause).
    fn resume(&self) -> &Self {
        self.core().resume();
        self
    }

    fn lock<R>(&self, action: impl FnOnce() -> R) -> R {
        self.core().lock(action)
    }

    fn notify(&self) -> &Self {
        self.core().notify();
        self
    }

    /// Register an addon, rendered next to this widget on every pass.
    fn add<A: Widget + Clone>(&self, addon: A) -> A {
        self.core().add_addon(WidgetRef::new(addon.clone()));
        addon
    }

    fn to_ref(&self) -> WidgetRef {
        WidgetRef::new(self.clone())
    }

    fn render(&self) -> Element {
        Element::Widget(self.to_ref())
    }
}

impl<W: Widget + Clone> WidgetExt for W {}
