//! Modal dialog with a title, a content widget and a row of actions.
//!
//! A dialog is visible from the start; it is meant to be held by an
//! [`Optional`](arbor_core::Optional), which destroys it once it closes:
//!
//! ```rust
//! use arbor_core::*;
//! use arbor_widgets::*;
//!
//! let confirm: Optional<Dialog, String> = Optional::closable(|question: Option<&String>| {
//!     let question = question.cloned().unwrap_or_default();
//!     dialog("Confirm").widget(label(question))
//! });
//! let runtime = Runtime::new();
//! let root = confirm.render();
//!
//! confirm.spawn("Delete?".to_string());
//! let node = runtime.frame(&root).unwrap();
//! assert_eq!(node.find("label").unwrap().text_content(), "Delete?");
//!
//! confirm.get().unwrap().close();
//! assert!(!confirm.is_spawned());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use arbor_core::{
    Attributes, Closable, Configurable, Configuration, Debouncer, Drawable, Element,
    HasConfiguration, Property, Result, Widget, WidgetCore, WidgetExt, WidgetRef, handle_enter,
};

use crate::button::button;
use crate::label::label;

type KeyHandler = Rc<dyn Fn(&str)>;

pub struct DialogConfig {
    configurable: Configurable,
    pub visible: Property<bool>,
    pub title: Property<String>,
}

impl Configuration for DialogConfig {
    fn configurable(&self) -> &Configurable {
        &self.configurable
    }
}

#[derive(Clone)]
pub struct Dialog {
    core: WidgetCore,
    config: Rc<DialogConfig>,
    content: Rc<RefCell<Option<WidgetRef>>>,
    actions: Rc<RefCell<Vec<WidgetRef>>>,
    key_down: Rc<RefCell<Option<KeyHandler>>>,
    attributes: Attributes,
}

pub fn dialog(title: impl Into<String>) -> Dialog {
    let core = WidgetCore::managed_of::<Dialog>();
    let configurable = core.configurable().clone();
    let config = DialogConfig {
        visible: configurable.property(true),
        title: configurable.property(title.into()),
        configurable,
    };
    Dialog {
        core,
        config: Rc::new(config),
        content: Rc::default(),
        actions: Rc::default(),
        key_down: Rc::default(),
        attributes: Attributes::new(),
    }
}

impl Dialog {
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    pub fn widget(self, content: impl Widget + Clone) -> Self {
        *self.content.borrow_mut() = Some(content.to_ref());
        self.core.notify();
        self
    }

    pub fn action(self, action: impl Widget + Clone) -> Self {
        self.actions.borrow_mut().push(action.to_ref());
        self.core.notify();
        self
    }

    pub fn actions<W: Widget + Clone>(self, actions: impl IntoIterator<Item = W>) -> Self {
        actions
            .into_iter()
            .fold(self, |dialog, action| dialog.action(action))
    }

    pub fn title(&self) -> String {
        self.config.title.get().unwrap_or_default()
    }

    pub fn set_title(&self, title: impl Into<String>) -> &Self {
        self.config.title.set(title.into());
        self
    }

    pub fn open(&self) -> &Self {
        self.use_config(|c| &c.visible, |visible| {
            visible.set(true);
        })
    }

    pub fn close(&self) -> &Self {
        self.use_config(|c| &c.visible, |visible| {
            visible.set(false);
        })
    }

    pub fn is_visible(&self) -> bool {
        self.config.visible.get().unwrap_or(false)
    }

    pub fn on_open(self, action: impl Fn() + 'static) -> Self {
        self.config.visible.consume(move |visible| {
            if *visible {
                action();
            }
        });
        self
    }

    /// Run `action` through `debouncer` when Enter is pressed inside the
    /// dialog. Replaces any previous handler.
    pub fn submit_on_enter(self, debouncer: Debouncer, action: impl Fn() + 'static) -> Self {
        *self.key_down.borrow_mut() = Some(Rc::new(handle_enter(debouncer, action)));
        self
    }

    /// Host entry point for key presses.
    pub fn key_down(&self, key: &str) -> &Self {
        let handler = self.key_down.borrow().clone();
        if let Some(handler) = handler {
            handler(key);
        }
        self
    }
}

impl Closable for Dialog {
    fn on_close(&self, action: Rc<dyn Fn()>) {
        self.config.visible.consume(move |visible| {
            if !*visible {
                action();
            }
        });
    }
}

impl Drawable for Dialog {
    fn draw(&self) -> Result<Element> {
        if !self.is_visible() {
            return Ok(Element::Empty);
        }
        let content = self
            .content
            .borrow()
            .as_ref()
            .map(WidgetExt::render)
            .unwrap_or_default();
        let actions = self.actions.borrow().iter().map(WidgetExt::render).collect::<Vec<_>>();
        Ok(Element::tag("dialog")
            .attrs(self.attributes.clone())
            .child(Element::tag("header").child(Element::text(self.title())))
            .child(Element::tag("section").child(content))
            .child(Element::tag("footer").children(actions)))
    }
}

impl Widget for Dialog {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl HasConfiguration for Dialog {
    type Config = DialogConfig;

    fn configuration(&self) -> &DialogConfig {
        &self.config
    }
}

/// A dialog showing `notification` with a single button that closes it.
/// Enter presses the button.
pub fn information(
    debouncer: Debouncer,
    title: impl Into<String>,
    notification: impl Into<String>,
    button_label: impl Into<String>,
) -> Dialog {
    let ok = button(button_label);
    let information = dialog(title).widget(label(notification)).action(ok.clone());
    let visible = information.config.visible.clone();
    let ok = ok.on_click(move || {
        visible.set(false);
    });
    information.submit_on_enter(debouncer, move || {
        ok.click();
    })
}
