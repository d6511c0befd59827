//! # Widgets, Properties, and Triggers
//!
//! Arbor is the reactive core of a fluent widget DSL. Widgets are cheap
//! cloneable handles; their state lives in observable [`Property`] cells
//! owned by a [`Configurable`], and every change is turned into a
//! re-render request through a [`Trigger`].
//!
//! ## Properties
//!
//! ```rust
//! use arbor_core::*;
//!
//! let count = Property::new(0);
//! count.prevent(|next| *next >= 0);
//! count.set(2).set(-1);
//! assert_eq!(count.get(), Some(2));
//! assert_eq!(count.previous(), Some(0));
//! ```
//!
//! Setting an equal value is silent, a vetoed value leaves the property
//! untouched, and subscribers run in registration order after a commit.
//!
//! ## Widgets and frames
//!
//! The [`Runtime`] expands [`Element`] trees into [`Node`] trees. Managed
//! widgets (those with a typed configuration) only redraw when their trigger
//! fired; addons are rendered on every pass regardless.
//!
//! ```rust
//! use arbor_core::*;
//!
//! #[derive(Clone)]
//! struct Counter {
//!     core: WidgetCore,
//!     count: Property<u32>,
//! }
//!
//! impl Counter {
//!     fn new() -> Self {
//!         let core = WidgetCore::managed_of::<Counter>();
//!         let count = core.configurable().property(0);
//!         Self { core, count }
//!     }
//! }
//!
//! impl Drawable for Counter {
//!     fn draw(&self) -> Result<Element> {
//!         Ok(Element::tag("span").child(self.count.get().unwrap_or(0).to_string().into()))
//!     }
//! }
//!
//! impl Widget for Counter {
//!     fn core(&self) -> &WidgetCore {
//!         &self.core
//!     }
//! }
//!
//! let counter = Counter::new();
//! let runtime = Runtime::new();
//! let root = counter.render();
//! assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>0</span>");
//!
//! counter.count.set(5);
//! assert!(runtime.needs_frame());
//! assert_eq!(runtime.frame(&root).unwrap().to_string(), "<span>5</span>");
//! ```
//!
//! ## Branches
//!
//! [`Conditional`], [`When`], [`Hooked`] and [`Optional`] pick subtrees and
//! decide when their widgets are reused and when they are rebuilt.
//! [`Observable`] and [`Deferred`] memoise values and subtrees by their
//! inputs.

pub mod basic;
pub mod conditional;
pub mod configurable;
pub mod deferred;
pub mod effects;
pub mod element;
pub mod error;
pub mod event;
pub mod hooked;
pub mod hooks;
pub mod lifecycle;
pub mod locals;
pub mod memo;
pub mod optional;
pub mod prelude;
pub mod property;
mod render;
pub mod runtime;
pub mod tests;
pub mod timers;
pub mod trigger;
pub mod widget;

pub use basic::*;
pub use conditional::*;
pub use configurable::*;
pub use deferred::*;
pub use effects::*;
pub use element::*;
pub use error::*;
pub use event::*;
pub use hooked::*;
pub use hooks::*;
pub use lifecycle::*;
pub use locals::*;
pub use memo::{CacheKey, Observable};
pub use optional::*;
pub use property::*;
pub use runtime::*;
pub use timers::*;
pub use trigger::*;
pub use widget::*;
