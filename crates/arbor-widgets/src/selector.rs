use std::cell::RefCell;
use std::fmt::Display;
use std::rc::{Rc, Weak};

use arbor_core::{
    Attributes, Configurable, Configuration, Drawable, Element, HasConfiguration, Property,
    Result, Widget, WidgetCore, WidgetExt,
};

use crate::error::WidgetError;

type Suggest<T> = Rc<dyn Fn(&T) -> String>;

#[derive(Clone, Debug, PartialEq)]
pub struct SelectorItem<T> {
    pub value: T,
    pub suggestion: String,
}

/// Selection state. `selected` and `selected_index` always describe the
/// same item: writing either one updates the other.
pub struct SelectorConfig<T: 'static> {
    configurable: Configurable,
    items: RefCell<Vec<SelectorItem<T>>>,
    suggest: Suggest<T>,
    pub selected: Property<T>,
    pub selected_index: Property<usize>,
    pub disabled: Property<bool>,
}

impl<T: 'static> Configuration for SelectorConfig<T> {
    fn configurable(&self) -> &Configurable {
        &self.configurable
    }
}

impl<T: Clone + PartialEq + 'static> SelectorConfig<T> {
    fn new(configurable: Configurable, first: T, items: Vec<SelectorItem<T>>, suggest: Suggest<T>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let selected = configurable.property(first);
            let selected_index = configurable.property(0usize);
            let disabled = configurable.property(false);

            let known = this.clone();
            selected.prevent(move |value: &T| {
                known
                    .upgrade()
                    .is_none_or(|config| config.position(value).is_some())
            });
            let bounds = this.clone();
            selected_index.prevent(move |index: &usize| {
                bounds
                    .upgrade()
                    .is_none_or(|config| *index < config.items.borrow().len())
            });

            let to_index = this.clone();
            selected.consume(move |value: &T| {
                if let Some(config) = to_index.upgrade() {
                    let index = config.position(value).unwrap_or(0);
                    config.selected_index.set(index);
                }
            });
            let to_value = this.clone();
            selected_index.consume(move |index: &usize| {
                if let Some(config) = to_value.upgrade() {
                    let value = config.items.borrow().get(*index).map(|item| item.value.clone());
                    if let Some(value) = value {
                        config.selected.set(value);
                    }
                }
            });

            Self {
                configurable,
                items: RefCell::new(items),
                suggest,
                selected,
                selected_index,
                disabled,
            }
        })
    }

    fn position(&self, value: &T) -> Option<usize> {
        self.items.borrow().iter().position(|item| item.value == *value)
    }

    fn item(&self, value: T) -> SelectorItem<T> {
        SelectorItem {
            suggestion: (self.suggest)(&value),
            value,
        }
    }

    pub fn items(&self) -> Vec<SelectorItem<T>> {
        self.items.borrow().clone()
    }
}

/// Pick one value out of a non-empty list.
#[derive(Clone)]
pub struct Selector<T: 'static> {
    core: WidgetCore,
    config: Rc<SelectorConfig<T>>,
    attributes: Attributes,
}

/// Selector over `available`, each shown through its `Display` form.
pub fn selector<T>(available: impl IntoIterator<Item = T>) -> Result<Selector<T>, WidgetError>
where
    T: Clone + PartialEq + Display + 'static,
{
    Selector::new(available, |value: &T| value.to_string())
}

impl<T: Clone + PartialEq + 'static> Selector<T> {
    /// The first available value starts out selected.
    pub fn new(
        available: impl IntoIterator<Item = T>,
        suggestion: impl Fn(&T) -> String + 'static,
    ) -> Result<Self, WidgetError> {
        let suggest: Suggest<T> = Rc::new(suggestion);
        let items = available
            .into_iter()
            .map(|value| SelectorItem {
                suggestion: suggest(&value),
                value,
            })
            .collect::<Vec<_>>();
        let Some(first) = items.first().map(|item| item.value.clone()) else {
            return Err(WidgetError::NoOptions);
        };
        let core = WidgetCore::managed_of::<Selector<T>>();
        let config = SelectorConfig::new(core.configurable().clone(), first, items, suggest);
        Ok(Self {
            core,
            config,
            attributes: Attributes::new(),
        })
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    /// Values that are not available are ignored.
    pub fn select(&self, value: T) -> &Self {
        self.lock(|| {
            self.config.selected.set(value);
        });
        self
    }

    pub fn select_index(&self, index: usize) -> &Self {
        self.lock(|| {
            self.config.selected_index.set(index);
        });
        self
    }

    /// Select the item shown as `suggestion`, or the first one if there is
    /// no such item.
    pub fn select_suggestion(&self, suggestion: &str) -> &Self {
        let index = self
            .config
            .items
            .borrow()
            .iter()
            .position(|item| item.suggestion == suggestion)
            .unwrap_or(0);
        self.select_index(index)
    }

    pub fn on_select(self, action: impl Fn(&T) + 'static) -> Self {
        self.config.selected.consume(action);
        self
    }

    pub fn selected(&self) -> Option<T> {
        self.config.selected.get()
    }

    pub fn selected_index(&self) -> usize {
        self.config.selected_index.get().unwrap_or(0)
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.config
            .items
            .borrow()
            .iter()
            .map(|item| item.suggestion.clone())
            .collect()
    }

    /// Replace the available values. The selection survives if its value is
    /// still available, otherwise the first value is selected. Notifies once.
    pub fn set_available(&self, values: impl IntoIterator<Item = T>) -> Result<&Self, WidgetError> {
        let config = &self.config;
        let items = values
            .into_iter()
            .map(|value| config.item(value))
            .collect::<Vec<_>>();
        if items.is_empty() {
            return Err(WidgetError::NoOptions);
        }

        config.configurable.pause_render();
        let index = config
            .selected
            .get()
            .and_then(|selected| items.iter().position(|item| item.value == selected))
            .unwrap_or(0);
        let value = items[index].value.clone();
        *config.items.borrow_mut() = items;
        config.selected.set(value);
        config.selected_index.set(index);
        config.configurable.notify_trigger();
        config.configurable.continue_render();
        Ok(self)
    }

    pub fn reset(&self) -> &Self {
        self.select_index(0)
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

impl<T: Clone + PartialEq + 'static> Drawable for Selector<T> {
    fn draw(&self) -> Result<Element> {
        let current = self.selected_index();
        let options = self
            .config
            .items
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let option = Element::tag("option");
                let option = if index == current {
                    option.attr("selected", true)
                } else {
                    option
                };
                option.child(Element::text(item.suggestion.clone()))
            })
            .collect::<Vec<_>>();
        let mut select = Element::tag("select").attrs(self.attributes.clone());
        if self.is_disabled() {
            select = select.attr("disabled", true);
        }
        Ok(select.children(options))
    }
}

impl<T: Clone + PartialEq + 'static> Widget for Selector<T> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
}

impl<T: Clone + PartialEq + 'static> HasConfiguration for Selector<T> {
    type Config = SelectorConfig<T>;

    fn configuration(&self) -> &SelectorConfig<T> {
        &self.config
    }
}
