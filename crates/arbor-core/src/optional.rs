//! Widgets created and destroyed on demand.
//!
//! ```rust
//! use arbor_core::*;
//!
//! let popup = optional(|props: Option<&u32>| empty().with_key(*props.unwrap_or(&0) as u64));
//! let runtime = Runtime::new();
//!
//! runtime.frame(&popup.render()).unwrap();
//! assert!(popup.get().is_none());
//!
//! popup.spawn(7);
//! runtime.frame(&popup.render()).unwrap();
//! assert!(popup.get().is_some());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::conditional::{Conditional, conditional};
use crate::element::Element;
use crate::error::Result;
use crate::widget::{Drawable, Widget, WidgetCore, WidgetExt};

/// A widget that can ask to be closed.
pub trait Closable: Widget {
    fn on_close(&self, action: Rc<dyn Fn()>);
}

pub struct Optional<W, P: 'static> {
    state: Rc<SpawnState<P>>,
    conditional: Conditional<W>,
}

struct SpawnState<P> {
    core: WidgetCore,
    spawned: Cell<bool>,
    generation: Cell<u64>,
    properties: RefCell<Option<Rc<P>>>,
    on_spawn: RefCell<Vec<Rc<dyn Fn()>>>,
    on_destroy: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl<P> SpawnState<P> {
    fn destroy(&self) {
        if self.spawned.replace(false) {
            self.core.notify();
        }
        let actions = self.on_destroy.borrow().clone();
        for action in actions {
            action();
        }
    }
}

impl<W, P> Clone for Optional<W, P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            conditional: self.conditional.clone(),
        }
    }
}

pub fn optional<W, P>(factory: impl Fn(Option<&P>) -> W + 'static) -> Optional<W, P>
where
    W: Widget + Clone,
{
    Optional::new(factory)
}

impl<W: Widget + Clone, P: 'static> Optional<W, P> {
    /// `factory` receives the properties of the last [`spawn`](Optional::spawn).
    pub fn new(factory: impl Fn(Option<&P>) -> W + 'static) -> Self {
        let state = Rc::new(SpawnState {
            core: WidgetCore::of::<Self>(),
            spawned: Cell::new(false),
            generation: Cell::new(0),
            properties: RefCell::new(None),
            on_spawn: RefCell::new(Vec::new()),
            on_destroy: RefCell::new(Vec::new()),
        });
        let predicate = Rc::downgrade(&state);
        let properties = Rc::downgrade(&state);
        let key = Rc::downgrade(&state);
        let conditional = conditional(move || predicate.upgrade().is_some_and(|s| s.spawned.get()))
            .cache(
                move |_: Option<&W>| {
                    let props = properties
                        .upgrade()
                        .and_then(|s| s.properties.borrow().clone());
                    factory(props.as_deref())
                },
                move || key.upgrade().map(|s| (s.spawned.get(), s.generation.get())),
            );
        Self { state, conditional }
    }

    /// Show the widget built from `properties`. Spawning again replaces the
    /// properties and rebuilds the widget.
    pub fn spawn(&self, properties: P) -> &Self {
        let state = &self.state;
        *state.properties.borrow_mut() = Some(Rc::new(properties));
        state.spawned.set(true);
        state.generation.set(state.generation.get().wrapping_add(1));
        state.core.notify();
        let actions = state.on_spawn.borrow().clone();
        for action in actions {
            action();
        }
        self
    }

    pub fn destroy(&self) -> &Self {
        self.state.destroy();
        self
    }

    pub fn is_spawned(&self) -> bool {
        self.state.spawned.get()
    }

    pub fn properties(&self) -> Option<Rc<P>> {
        self.state.properties.borrow().clone()
    }

    /// The live widget, if spawned and rendered since. `None` as soon as
    /// the widget is destroyed, even before the next frame.
    pub fn get(&self) -> Option<W> {
        if !self.state.spawned.get() {
            return None;
        }
        self.conditional.get()
    }

    pub fn apply(self, action: impl Fn(W) -> W + 'static) -> Self {
        let conditional = self.conditional.apply(action);
        Self {
            state: self.state,
            conditional,
        }
    }

    pub fn on_spawn(self, action: impl Fn() + 'static) -> Self {
        self.state.on_spawn.borrow_mut().push(Rc::new(action));
        self
    }

    pub fn on_destroy(self, action: impl Fn() + 'static) -> Self {
        self.state.on_destroy.borrow_mut().push(Rc::new(action));
        self
    }
}

impl<W: Closable + Clone, P: 'static> Optional<W, P> {
    /// Like [`new`](Optional::new), additionally destroying the widget when
    /// it asks to be closed.
    pub fn closable(factory: impl Fn(Option<&P>) -> W + 'static) -> Self {
        let optional = Self::new(factory);
        let state: Weak<SpawnState<P>> = Rc::downgrade(&optional.state);
        optional.apply(move |widget: W| {
            let state = state.clone();
            widget.on_close(Rc::new(move || {
                if let Some(state) = state.upgrade() {
                    state.destroy();
                }
            }));
            widget
        })
    }
}

impl<W: Widget + Clone, P: 'static> Drawable for Optional<W, P> {
    fn draw(&self) -> Result<Element> {
        Ok(self.conditional.render())
    }

    fn render_without_changes(&self) -> bool {
        true
    }
}

impl<W: Widget + Clone, P: 'static> Widget for Optional<W, P> {
    fn core(&self) -> &WidgetCore {
        &self.state.core
    }
}

impl<W, P> fmt::Debug for Optional<W, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optional")
            .field("name", &self.state.core.name())
            .field("spawned", &self.state.spawned.get())
            .field("generation", &self.state.generation.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Empty, empty};

    #[test]
    fn destroy_before_spawn_only_runs_callbacks() {
        let destroyed = Rc::new(Cell::new(0));
        let d = destroyed.clone();
        let o: Optional<Empty, ()> = optional(|_| empty()).on_destroy(move || d.set(d.get() + 1));
        o.destroy();
        assert_eq!(destroyed.get(), 1);
        assert!(!o.is_spawned());
    }

    #[test]
    fn respawn_rebuilds_with_new_properties() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        let o = optional(move |p: Option<&i32>| {
            c.borrow_mut().push(p.copied());
            empty()
        });

        o.spawn(1);
        o.conditional.draw().unwrap();
        let first = o.get().unwrap();
        o.conditional.draw().unwrap();
        assert!(first.core().ptr_eq(o.get().unwrap().core()));

        o.spawn(2);
        o.conditional.draw().unwrap();
        assert!(!first.core().ptr_eq(o.get().unwrap().core()));
        assert_eq!(*calls.borrow(), [Some(1), Some(2)]);
    }

    #[test]
    fn destroyed_widget_is_gone_before_next_draw() {
        let o: Optional<Empty, ()> = optional(|_| empty());
        o.spawn(());
        o.conditional.draw().unwrap();
        assert!(o.get().is_some());

        o.destroy();
        assert!(!o.is_spawned());
        assert!(o.get().is_none());
    }
}
