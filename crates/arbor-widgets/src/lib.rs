//! Leaf widgets built on `arbor-core`.
//!
//! Every widget here keeps its reactive state in a typed configuration
//! (see [`HasConfiguration`](arbor_core::HasConfiguration)) and its
//! pass-through render attributes separately, so only property changes
//! cause redraws.

pub mod button;
pub mod dialog;
pub mod error;
pub mod label;
pub mod selector;

pub use button::*;
pub use dialog::*;
pub use error::*;
pub use label::*;
pub use selector::*;
