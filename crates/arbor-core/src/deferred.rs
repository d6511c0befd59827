use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::error::Result;
use crate::memo::Observable;
use crate::widget::{Drawable, Widget, WidgetCore, WidgetExt};

type Renderer = Rc<dyn Fn() -> Result<Element>>;

/// A subtree mounted under its own stable instance and rebuilt only when
/// its input values change.
///
/// Keep the `Deferred` in the parent and call [`update`](Deferred::update)
/// from the parent's `draw()`:
///
/// ```rust
/// use arbor_core::*;
///
/// let details: Deferred<u32> = defer();
/// let element = details.update(3, || Ok(Element::text("three")));
/// let node = Runtime::new().frame(&element).unwrap();
/// assert_eq!(node.text_content(), "three");
/// ```
pub struct Deferred<K> {
    core: WidgetCore,
    memo: Observable<K, Element>,
    pending: Rc<RefCell<Option<(K, Renderer)>>>,
}

impl<K> Clone for Deferred<K> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            memo: self.memo.clone(),
            pending: self.pending.clone(),
        }
    }
}

pub fn defer<K: PartialEq + Clone + 'static>() -> Deferred<K> {
    Deferred {
        core: WidgetCore::of::<Deferred<K>>(),
        memo: Observable::default(),
        pending: Rc::default(),
    }
}

impl<K: PartialEq + Clone + 'static> Deferred<K> {
    pub fn update(
        &self,
        values: K,
        renderer: impl Fn() -> Result<Element> + 'static,
    ) -> Element {
        *self.pending.borrow_mut() = Some((values, Rc::new(renderer)));
        self.render()
    }
}

impl<K: PartialEq + Clone + 'static> Drawable for Deferred<K> {
    fn draw(&self) -> Result<Element> {
        let pending = self.pending.borrow().clone();
        let Some((values, renderer)) = pending else {
            return Ok(Element::Empty);
        };
        let mut failure = None;
        let element = self.memo.render(values, || {
            renderer().unwrap_or_else(|error| {
                failure = Some(error);
                Element::Empty
            })
        });
        match failure {
            Some(error) => {
                self.memo.reset();
                Err(error)
            }
            None => Ok(element),
        }
    }
}

impl<K: PartialEq + Clone + 'static> Widget for Deferred<K> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl<K> fmt::Debug for Deferred<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.core.name())
            .finish()
    }
}
