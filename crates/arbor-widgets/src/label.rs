use std::rc::Rc;

use arbor_core::{
    Attributes, Configurable, Configuration, Drawable, Element, HasConfiguration, Property,
    Result, Widget, WidgetCore,
};

pub struct LabelConfig {
    configurable: Configurable,
    pub text: Property<String>,
}

impl Configuration for LabelConfig {
    fn configurable(&self) -> &Configurable {
        &self.configurable
    }
}

/// Static text whose content is a property.
#[derive(Clone)]
pub struct Label {
    core: WidgetCore,
    config: Rc<LabelConfig>,
    attributes: Attributes,
}

pub fn label(text: impl Into<String>) -> Label {
    let core = WidgetCore::managed_of::<Label>();
    let configurable = core.configurable().clone();
    let text = configurable.property(text.into());
    Label {
        core,
        config: Rc::new(LabelConfig { configurable, text }),
        attributes: Attributes::new(),
    }
}

impl Label {
    /// Pass-through attribute for the rendered tag. Not reactive.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    pub fn text(&self) -> String {
        self.config.text.get().unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) -> &Self {
        let text = text.into();
        self.use_config(|c| &c.text, move |property| {
            property.set(text);
        })
    }
}

impl Drawable for Label {
    fn draw(&self) -> Result<Element> {
        Ok(Element::tag("label")
            .attrs(self.attributes.clone())
            .child(Element::text(self.text())))
    }
}

impl Widget for Label {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl HasConfiguration for Label {
    type Config = LabelConfig;

    fn configuration(&self) -> &LabelConfig {
        &self.config
    }
}
