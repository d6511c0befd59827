//! Host bridge.
//!
//! The [`Runtime`] stands in for the rendering host. It keeps one slot per
//! mounted widget instance (an instance is a widget key under a parent
//! instance), hands each slot a [`Trigger`] whose listener records the payload
//! as the slot's state, and expands [`Element`] trees into [`Node`] trees.
//!
//! ```rust
//! use arbor_core::*;
//!
//! let runtime = Runtime::with_options(RuntimeOptions::default().with_lifecycle_logs(true));
//! let root = group().widget(empty()).render();
//! runtime.frame(&root).unwrap();
//! assert!(!runtime.needs_frame());
//! ```
//!
//! A frame expands the whole tree, but a managed widget only calls `draw()`
//! when its trigger fired since its last draw. Instances that were not
//! reached during a frame are unmounted when the frame ends.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};
use web_time::Instant;

use crate::effects::Dispose;
use crate::element::{Element, Node};
use crate::error::Result;
use crate::lifecycle::{Stage, WidgetState};
use crate::locals::Locals;
use crate::render::WidgetRender;
use crate::timers::{ENTER_DEBOUNCE, Debouncer, Timers};
use crate::trigger::{Payload, Trigger};
use crate::widget::{Key, Widget, WidgetRef};

new_key_type! {
    pub(crate) struct SlotKey;
}

/// Position of a widget instance in the rendered tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const ROOT: InstanceId = InstanceId(0);

    pub fn child(self, key: &Key) -> InstanceId {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        key.hash(&mut hasher);
        InstanceId(hasher.finish())
    }
}

#[derive(Clone)]
pub struct RuntimeOptions {
    /// Trace every lifecycle transition through `log`.
    pub lifecycle_logs: bool,
    pub enter_debounce: Duration,
    /// Called whenever a trigger asks for a new frame.
    pub on_request_frame: Option<Rc<dyn Fn()>>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            lifecycle_logs: false,
            enter_debounce: ENTER_DEBOUNCE,
            on_request_frame: None,
        }
    }
}

impl RuntimeOptions {
    pub fn with_lifecycle_logs(mut self, enabled: bool) -> Self {
        self.lifecycle_logs = enabled;
        self
    }

    pub fn with_enter_debounce(mut self, delay: Duration) -> Self {
        self.enter_debounce = delay;
        self
    }

    pub fn with_frame_request(mut self, request: impl Fn() + 'static) -> Self {
        self.on_request_frame = Some(Rc::new(request));
        self
    }
}

impl fmt::Debug for RuntimeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeOptions")
            .field("lifecycle_logs", &self.lifecycle_logs)
            .field("enter_debounce", &self.enter_debounce)
            .field("on_request_frame", &self.on_request_frame.is_some())
            .finish()
    }
}

struct Slot {
    instance: InstanceId,
    widget: WidgetRef,
    trigger: Trigger,
    state: Payload,
    drawn: Option<Drawn>,
    visited: u64,
    disposers: Vec<Dispose>,
}

struct Drawn {
    state: Payload,
    element: Element,
}

pub(crate) struct Attached {
    pub(crate) slot: SlotKey,
    pub(crate) fresh: bool,
}

#[derive(Clone)]
pub struct Runtime(Rc<RuntimeInner>);

struct RuntimeInner {
    options: RuntimeOptions,
    locals: Locals,
    timers: Timers,
    slots: RefCell<SlotMap<SlotKey, Slot>>,
    index: RefCell<HashMap<InstanceId, SlotKey>>,
    frame: Cell<u64>,
    frame_requested: Cell<bool>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self(Rc::new(RuntimeInner {
            options,
            locals: Locals::default(),
            timers: Timers::default(),
            slots: RefCell::new(SlotMap::with_key()),
            index: RefCell::new(HashMap::new()),
            frame: Cell::new(0),
            frame_requested: Cell::new(false),
        }))
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.0.options
    }

    pub fn locals(&self) -> &Locals {
        &self.0.locals
    }

    /// Make `value` readable from hook factories.
    pub fn provide<T: 'static>(&self, value: T) -> &Self {
        self.0.locals.provide(value);
        self.request_frame();
        self
    }

    pub fn timers(&self) -> &Timers {
        &self.0.timers
    }

    /// Move the timer clock to `now`, running whatever became due.
    pub fn advance(&self, now: Instant) -> usize {
        self.0.timers.advance(now)
    }

    /// A debouncer over this runtime's timers using the configured delay.
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::new(self.0.timers.clone(), self.0.options.enter_debounce)
    }

    pub fn needs_frame(&self) -> bool {
        self.0.frame_requested.get()
    }

    pub fn frame_count(&self) -> u64 {
        self.0.frame.get()
    }

    /// Number of mounted widget instances.
    pub fn mounted(&self) -> usize {
        self.0.slots.borrow().len()
    }

    /// Render one frame. Contract violations abort the frame before anything
    /// gets unmounted.
    pub fn frame(&self, root: &Element) -> Result<Node> {
        let frame = self.0.frame.get() + 1;
        self.0.frame.set(frame);
        self.0.frame_requested.set(false);
        let node = self.expand(root, InstanceId::ROOT, frame)?;
        self.sweep(frame);
        Ok(node)
    }

    /// Unmount everything, e.g. when the host tears the tree down.
    pub fn unmount_all(&self) {
        let keys: Vec<SlotKey> = self.0.slots.borrow().keys().collect();
        for key in keys {
            self.retire(key);
        }
    }

    pub(crate) fn expand(&self, element: &Element, parent: InstanceId, frame: u64) -> Result<Node> {
        Ok(match element {
            Element::Empty => Node::Empty,
            Element::Text(text) => Node::Text(text.clone()),
            Element::Tag(tag) => Node::Tag {
                name: tag.name.clone(),
                attributes: tag.attributes.clone(),
                children: tag
                    .children
                    .iter()
                    .map(|child| self.expand(child, parent, frame))
                    .collect::<Result<_>>()?,
            },
            Element::Fragment(children) => Node::Fragment(
                children
                    .iter()
                    .map(|child| self.expand(child, parent, frame))
                    .collect::<Result<_>>()?,
            ),
            Element::Widget(widget) => WidgetRender::new(self, widget, parent, frame).render()?,
        })
    }

    pub(crate) fn attach(&self, instance: InstanceId, widget: &WidgetRef, frame: u64) -> Attached {
        let existing = self.0.index.borrow().get(&instance).copied();
        if let Some(slot) = existing {
            let mut slots = self.0.slots.borrow_mut();
            if let Some(entry) = slots.get_mut(slot)
                && entry.widget.ptr_eq(widget)
            {
                if entry.visited == frame {
                    log::warn!(
                        "[{}]: rendered twice under the same parent; give it a distinct key",
                        widget.core().name()
                    );
                }
                entry.visited = frame;
                return Attached { slot, fresh: false };
            }
            drop(slots);
            // Another widget took over this key. The old slot is swept at the
            // end of the frame unless its widget shows up elsewhere.
            self.0.index.borrow_mut().remove(&instance);
        }
        if let Some(slot) = self.relocate(instance, widget, frame) {
            return Attached { slot, fresh: false };
        }

        let weak = Rc::downgrade(&self.0);
        let slot = self.0.slots.borrow_mut().insert_with_key(|key| Slot {
            instance,
            widget: widget.clone(),
            trigger: Trigger::new(listener(weak, key)),
            state: 0,
            drawn: None,
            visited: frame,
            disposers: Vec::new(),
        });
        self.0.index.borrow_mut().insert(instance, slot);
        Attached { slot, fresh: true }
    }

    /// Moves the slot of a widget that changed key or parent since the last
    /// frame, keeping its trigger, cached draw and lifecycle state.
    fn relocate(&self, instance: InstanceId, widget: &WidgetRef, frame: u64) -> Option<SlotKey> {
        let mut slots = self.0.slots.borrow_mut();
        let (slot, entry) = slots
            .iter_mut()
            .find(|(_, entry)| entry.visited != frame && entry.widget.ptr_eq(widget))?;
        let previous = std::mem::replace(&mut entry.instance, instance);
        entry.visited = frame;
        drop(slots);

        if self.0.options.lifecycle_logs {
            log::trace!("[{}]: moved to a new position", widget.core().name());
        }
        let mut index = self.0.index.borrow_mut();
        if index.get(&previous) == Some(&slot) {
            index.remove(&previous);
        }
        index.insert(instance, slot);
        Some(slot)
    }

    fn holds(&self, widget: &WidgetRef) -> bool {
        self.0
            .slots
            .borrow()
            .values()
            .any(|entry| entry.widget.ptr_eq(widget))
    }

    pub(crate) fn trigger(&self, slot: SlotKey) -> Option<Trigger> {
        self.0.slots.borrow().get(slot).map(|s| s.trigger.clone())
    }

    pub(crate) fn slot_state(&self, slot: SlotKey) -> Payload {
        self.0.slots.borrow().get(slot).map_or(0, |s| s.state)
    }

    /// The element from the last draw, if nothing fired since.
    pub(crate) fn cached_draw(&self, slot: SlotKey) -> Option<Element> {
        let slots = self.0.slots.borrow();
        let entry = slots.get(slot)?;
        entry
            .drawn
            .as_ref()
            .filter(|drawn| drawn.state == entry.state)
            .map(|drawn| drawn.element.clone())
    }

    pub(crate) fn store_draw(&self, slot: SlotKey, state: Payload, element: Element) {
        if let Some(entry) = self.0.slots.borrow_mut().get_mut(slot) {
            entry.drawn = Some(Drawn { state, element });
        }
    }

    pub(crate) fn store_disposers(&self, slot: SlotKey, disposers: Vec<Dispose>) {
        if let Some(entry) = self.0.slots.borrow_mut().get_mut(slot) {
            entry.disposers.extend(disposers);
        }
    }

    fn state_changed(&self, slot: SlotKey, payload: Payload) {
        if let Some(entry) = self.0.slots.borrow_mut().get_mut(slot) {
            entry.state = payload;
        }
        self.request_frame();
    }

    fn request_frame(&self) {
        self.0.frame_requested.set(true);
        if let Some(request) = &self.0.options.on_request_frame {
            request();
        }
    }

    fn sweep(&self, frame: u64) {
        let stale: Vec<SlotKey> = self
            .0
            .slots
            .borrow()
            .iter()
            .filter(|(_, slot)| slot.visited != frame)
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            self.retire(key);
        }
    }

    fn retire(&self, key: SlotKey) {
        let removed = self.0.slots.borrow_mut().remove(key);
        let Some(slot) = removed else {
            return;
        };
        if self.0.index.borrow().get(&slot.instance) == Some(&key) {
            self.0.index.borrow_mut().remove(&slot.instance);
        }
        if self.holds(&slot.widget) {
            // Still shown at another position; only this one goes away.
            for dispose in &slot.disposers {
                dispose.run();
            }
            return;
        }

        let core = slot.widget.core();
        core.fire(Stage::Unmount);
        core.transition(WidgetState::Unmounted, self.0.options.lifecycle_logs);
        for dispose in &slot.disposers {
            dispose.run();
        }
        slot.trigger.dispose();
        core.configurable().dispose_trigger();
    }
}

fn listener(runtime: Weak<RuntimeInner>, slot: SlotKey) -> impl Fn(Payload) + 'static {
    move |payload| {
        if let Some(inner) = runtime.upgrade() {
            Runtime(inner).state_changed(slot, payload);
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.0.options)
            .field("frame", &self.0.frame.get())
            .field("mounted", &self.mounted())
            .field("needs_frame", &self.needs_frame())
            .finish()
    }
}
