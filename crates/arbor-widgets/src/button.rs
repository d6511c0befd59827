use std::rc::Rc;

use arbor_core::{
    Attributes, Configurable, Configuration, Drawable, Element, Event, HasConfiguration, Property,
    Result, Widget, WidgetCore,
};

pub struct ButtonConfig {
    configurable: Configurable,
    pub label: Property<String>,
    pub disabled: Property<bool>,
    pub click: Event,
}

impl Configuration for ButtonConfig {
    fn configurable(&self) -> &Configurable {
        &self.configurable
    }
}

#[derive(Clone)]
pub struct Button {
    core: WidgetCore,
    config: Rc<ButtonConfig>,
    attributes: Attributes,
}

pub fn button(label: impl Into<String>) -> Button {
    let core = WidgetCore::managed_of::<Button>();
    let configurable = core.configurable().clone();
    let config = ButtonConfig {
        label: configurable.property(label.into()),
        disabled: configurable.property(false),
        click: Event::default(),
        configurable,
    };
    Button {
        core,
        config: Rc::new(config),
        attributes: Attributes::new(),
    }
}

impl Button {
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    pub fn on_click(self, action: impl Fn() + 'static) -> Self {
        self.config.click.handle(move |_| action());
        self
    }

    /// Runs the click handlers unless the button is disabled.
    pub fn click(&self) -> &Self {
        if self.is_disabled() {
            log::trace!("[{}]: click ignored while disabled", self.core.name());
            return self;
        }
        self.config.click.fire();
        self
    }

    pub fn label(&self) -> String {
        self.config.label.get().unwrap_or_default()
    }

    pub fn set_label(&self, label: impl Into<String>) -> &Self {
        self.config.label.set(label.into());
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.config.disabled.get().unwrap_or(false)
    }

    pub fn set_disabled(&self, disabled: bool) -> &Self {
        self.use_config(|c| &c.disabled, |property| {
            property.set(disabled);
        })
    }

    pub fn disable(&self) -> &Self {
        self.set_disabled(true)
    }

    pub fn enable(&self) -> &Self {
        self.set_disabled(false)
    }
}

impl Drawable for Button {
    fn draw(&self) -> Result<Element> {
        let mut tag = Element::tag("button").attrs(self.attributes.clone());
        if self.is_disabled() {
            tag = tag.attr("disabled", true);
        }
        Ok(tag.child(Element::text(self.label())))
    }
}

impl Widget for Button {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl HasConfiguration for Button {
    type Config = ButtonConfig;

    fn configuration(&self) -> &ButtonConfig {
        &self.config
    }
}
