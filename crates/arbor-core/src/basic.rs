//! Built-in structural widgets.

use std::cell::RefCell;
use std::rc::Rc;

use crate::element::Element;
use crate::error::Result;
use crate::widget::{Drawable, Widget, WidgetCore, WidgetRef};

/// Draws nothing. The default `else` branch of conditionals.
#[derive(Clone, Debug)]
pub struct Empty {
    core: WidgetCore,
}

pub fn empty() -> Empty {
    Empty {
        core: WidgetCore::of::<Empty>(),
    }
}

impl Drawable for Empty {
    fn draw(&self) -> Result<Element> {
        Ok(Element::Empty)
    }

    fn render_without_changes(&self) -> bool {
        true
    }
}

impl Widget for Empty {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

/// Renders its children one after another.
#[derive(Clone, Debug)]
pub struct Group {
    core: WidgetCore,
    children: Rc<RefCell<Vec<WidgetRef>>>,
}

pub fn group() -> Group {
    Group {
        core: WidgetCore::of::<Group>(),
        children: Rc::default(),
    }
}

impl Group {
    pub fn widget(self, child: impl Widget) -> Self {
        self.children.borrow_mut().push(WidgetRef::new(child));
        self
    }

    pub fn widgets<W: Widget>(self, children: impl IntoIterator<Item = W>) -> Self {
        self.children
            .borrow_mut()
            .extend(children.into_iter().map(WidgetRef::new));
        self
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drawable for Group {
    fn draw(&self) -> Result<Element> {
        Ok(Element::fragment(
            self.children
                .borrow()
                .iter()
                .map(|child| Element::Widget(child.clone())),
        ))
    }
}

impl Widget for Group {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}
