use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A list of handlers invoked together, in registration order.
pub struct Event<T = ()> {
    handlers: Rc<RefCell<Vec<Rc<dyn Fn(&T)>>>>,
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self {
            handlers: Rc::default(),
        }
    }
}

pub fn event<T>() -> Event<T> {
    Event::default()
}

impl<T> Event<T> {
    pub fn handle(&self, handler: impl Fn(&T) + 'static) -> &Self {
        self.handlers.borrow_mut().push(Rc::new(handler));
        self
    }

    /// Handlers may register more handlers; those run from the next call.
    pub fn execute(&self, data: &T) {
        let handlers = self.handlers.borrow().clone();
        for handler in handlers {
            handler(data);
        }
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Event<()> {
    pub fn fire(&self) {
        self.execute(&());
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("handlers", &self.len()).finish()
    }
}
