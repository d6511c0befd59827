//! Per-widget reactive state.
//!
//! A [`Configurable`] owns the trigger that turns property changes into
//! re-render requests. Every property created through
//! [`Configurable::property`] notifies it on change and on clear. Widgets with
//! typed state keep their properties in a struct implementing
//! [`Configuration`]:
//!
//! ```rust
//! use arbor_core::*;
//!
//! struct CounterConfig {
//!     configurable: Configurable,
//!     count: Property<u32>,
//! }
//!
//! impl CounterConfig {
//!     fn new(configurable: Configurable) -> Self {
//!         let count = configurable.property(0);
//!         Self { configurable, count }
//!     }
//! }
//!
//! impl Configuration for CounterConfig {
//!     fn configurable(&self) -> &Configurable {
//!         &self.configurable
//!     }
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::hooks::HookContainer;
use crate::lifecycle::WidgetState;
use crate::property::Property;
use crate::trigger::Trigger;

#[derive(Clone)]
pub struct Configurable(Rc<Inner>);

struct Inner {
    owner: Rc<Cell<WidgetState>>,
    trigger: RefCell<Option<Trigger>>,
    render_paused: Cell<bool>,
    missed: Cell<bool>,
    hooks: HookContainer,
}

/// Typed reactive state of a widget.
pub trait Configuration: 'static {
    fn configurable(&self) -> &Configurable;
}

impl Configuration for Configurable {
    fn configurable(&self) -> &Configurable {
        self
    }
}

impl Configurable {
    /// `owner` is the lifecycle state of the widget this configuration
    /// belongs to. Once it reads `Unmounted` nothing is notified any more.
    pub fn new(owner: Rc<Cell<WidgetState>>) -> Self {
        Self(Rc::new(Inner {
            owner,
            trigger: RefCell::new(None),
            render_paused: Cell::new(false),
            missed: Cell::new(false),
            hooks: HookContainer::default(),
        }))
    }

    /// A configuration not attached to any widget.
    pub fn standalone() -> Self {
        Self::new(Rc::new(Cell::new(WidgetState::Created)))
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.0.trigger.borrow().clone()
    }

    /// The first trigger is adopted; later ones are connected to it so every
    /// place this configuration is rendered from shares one notification
    /// channel.
    pub fn bind_trigger(&self, trigger: Trigger) -> &Self {
        let current = self.0.trigger.borrow().clone();
        match current {
            Some(current) => {
                current.connect(&trigger);
            }
            None => *self.0.trigger.borrow_mut() = Some(trigger),
        }
        self
    }

    pub fn dispose_trigger(&self) -> &Self {
        let trigger = self.0.trigger.borrow().clone();
        if let Some(trigger) = trigger {
            trigger.dispose();
        }
        self
    }

    /// Request a re-render. Silently does nothing while paused, after the
    /// owner unmounted, or before any trigger was bound.
    pub fn notify_trigger(&self) -> &Self {
        if self.0.owner.get() == WidgetState::Unmounted {
            return self;
        }
        if self.0.render_paused.get() {
            self.0.missed.set(true);
            return self;
        }
        let trigger = self.0.trigger.borrow().clone();
        if let Some(trigger) = trigger {
            trigger.notify();
        }
        self
    }

    /// Not reference counted: one [`continue_render`](Configurable::continue_render)
    /// ends any number of pauses.
    pub fn pause_render(&self) -> &Self {
        self.0.render_paused.set(true);
        self
    }

    /// End a pause. Notifies once if anything asked for a render meanwhile.
    pub fn continue_render(&self) -> &Self {
        if !self.0.render_paused.replace(false) {
            return self;
        }
        if self.0.missed.replace(false) {
            self.notify_trigger();
        }
        self
    }

    pub fn is_render_paused(&self) -> bool {
        self.0.render_paused.get()
    }

    pub fn owner_state(&self) -> WidgetState {
        self.0.owner.get()
    }

    pub fn hooks(&self) -> &HookContainer {
        &self.0.hooks
    }

    pub fn property<T: Clone + PartialEq + 'static>(&self, value: T) -> Property<T> {
        self.wire(Property::new(value))
    }

    pub fn empty_property<T: Clone + PartialEq + 'static>(&self) -> Property<T> {
        self.wire(Property::empty())
    }

    fn wire<T: Clone + PartialEq + 'static>(&self, property: Property<T>) -> Property<T> {
        let on_change = Rc::downgrade(&self.0);
        let on_clear = on_change.clone();
        property
            .consume(move |_| notify(&on_change))
            .cleared(move || notify(&on_clear));
        property
    }

    pub fn ptr_eq(&self, other: &Configurable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn notify(inner: &Weak<Inner>) {
    if let Some(inner) = inner.upgrade() {
        Configurable(inner).notify_trigger();
    }
}

impl fmt::Debug for Configurable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurable")
            .field("owner", &self.0.owner.get())
            .field("trigger", &self.0.trigger.borrow())
            .field("render_paused", &self.0.render_paused.get())
            .finish()
    }
}
