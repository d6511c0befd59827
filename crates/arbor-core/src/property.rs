use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Veto<T> = Rc<dyn Fn(&T) -> bool>;
type Consumer<T> = Rc<dyn Fn(&T)>;
type Cleared = Rc<dyn Fn()>;

/// Observable value cell.
///
/// `Property<T>` is a cloneable handle; clones share the same cell. Writes go
/// through [`set`](Property::set):
///
/// - a value equal to the current one is stored silently, nothing fires and
///   `previous` stays put;
/// - otherwise every veto registered with [`prevent`](Property::prevent) is
///   asked first, and a single `false` drops the write without touching
///   any state;
/// - after a committed write the consumers run synchronously, in the order
///   they were registered.
///
/// ```rust
/// use arbor_core::Property;
///
/// let count = Property::new(0);
/// count.prevent(|v| *v >= 0);
/// count.set(-1);
/// assert_eq!(count.get(), Some(0));
/// count.set(2);
/// assert_eq!(count.previous(), Some(0));
/// ```
pub struct Property<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: Option<T>,
    previous: Option<T>,
    pending: Option<T>,
    before_update: Vec<Veto<T>>,
    after_update: Vec<Consumer<T>>,
    cleared: Vec<Cleared>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Property")
            .field("value", &inner.value)
            .field("previous", &inner.previous)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self::from_option(Some(value))
    }

    /// A property holding no value yet. The first write is treated as an
    /// initialisation.
    pub fn empty() -> Self {
        Self::from_option(None)
    }

    pub fn from_option(value: Option<T>) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            previous: None,
            pending: None,
            before_update: Vec::new(),
            after_update: Vec::new(),
            cleared: Vec::new(),
        })))
    }

    pub fn get(&self) -> Option<T> {
        self.0.borrow().value.clone()
    }

    pub fn previous(&self) -> Option<T> {
        self.0.borrow().previous.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().value.is_none()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.0.borrow().value.as_ref())
    }

    /// Same cell, not just an equal value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn set(&self, value: T) -> &Self {
        let vetoes = {
            let mut inner = self.0.borrow_mut();
            if inner.value.as_ref() == Some(&value) {
                inner.pending = Some(value.clone());
                inner.value = Some(value);
                return self;
            }
            inner.before_update.clone()
        };

        if vetoes.iter().any(|allow| !allow(&value)) {
            return self;
        }

        let consumers = {
            let mut inner = self.0.borrow_mut();
            // An empty cell is initialised, so `previous` ends up empty too.
            inner.previous = inner.value.take();
            inner.value = Some(value.clone());
            inner.pending = Some(value.clone());
            inner.after_update.clone()
        };
        for consumer in &consumers {
            consumer(&value);
        }
        self
    }

    /// Clone the current value, mutate the copy and write it back through
    /// [`set`](Property::set). Does nothing on an empty property.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> &Self {
        let Some(mut value) = self.get() else {
            return self;
        };
        f(&mut value);
        self.set(value)
    }

    /// Register a veto. Returning `false` rejects the incoming value.
    pub fn prevent(&self, allow: impl Fn(&T) -> bool + 'static) -> &Self {
        self.0.borrow_mut().before_update.push(Rc::new(allow));
        self
    }

    /// Register a consumer of committed values. If a value was already
    /// committed through [`set`](Property::set), the consumer is called with it
    /// right away.
    pub fn consume(&self, consumer: impl Fn(&T) + 'static) -> &Self {
        let consumer: Consumer<T> = Rc::new(consumer);
        let pending = {
            let mut inner = self.0.borrow_mut();
            inner.after_update.push(consumer.clone());
            inner.pending.clone()
        };
        if let Some(pending) = pending {
            consumer(&pending);
        }
        self
    }

    pub fn cleared(&self, action: impl Fn() + 'static) -> &Self {
        self.0.borrow_mut().cleared.push(Rc::new(action));
        self
    }

    pub fn clear(&self) -> &Self {
        let actions = {
            let mut inner = self.0.borrow_mut();
            inner.previous = inner.value.take();
            inner.pending = None;
            inner.cleared.clone()
        };
        for action in &actions {
            action();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&i32) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &i32| c.set(c.get() + 1))
    }

    #[test]
    fn equal_value_is_silent() {
        let p = Property::new(5);
        let (fired, consumer) = counter();
        p.consume(consumer);

        p.set(5).set(5);
        assert_eq!(fired.get(), 0);
        assert_eq!(p.previous(), None);
        assert_eq!(p.get(), Some(5));
    }

    #[test]
    fn veto_rejects_whole_assignment() {
        let p = Property::new(1);
        p.set(2);
        let (fired, consumer) = counter();
        p.consume(consumer);
        p.prevent(|v| *v != 3);

        p.set(3);
        assert_eq!(p.get(), Some(2));
        assert_eq!(p.previous(), Some(1));
        assert_eq!(fired.get(), 1, "only the replay on subscribe");
    }

    #[test]
    fn consumers_run_in_registration_order() {
        let p = Property::new(String::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let log = log.clone();
            p.consume(move |v: &String| log.borrow_mut().push(format!("{name}:{v}")));
        }

        p.set("x".into());
        assert_eq!(*log.borrow(), vec!["first:x", "second:x", "third:x"]);
    }

    #[test]
    fn consume_replays_last_committed_value() {
        let p = Property::new(0);
        let seen = Rc::new(Cell::new(-1));
        let s = seen.clone();
        p.consume(move |v| s.set(*v));
        assert_eq!(seen.get(), -1, "initial value is not a committed update");

        p.set(7);
        let late = Rc::new(Cell::new(-1));
        let l = late.clone();
        p.consume(move |v| l.set(*v));
        assert_eq!(late.get(), 7);
    }

    #[test]
    fn first_write_to_empty_property_initialises() {
        let p = Property::<i32>::empty();
        let (fired, consumer) = counter();
        p.consume(consumer);
        p.prevent(|v| *v < 100);

        p.set(100);
        assert!(p.is_empty());

        p.set(4);
        assert_eq!(p.get(), Some(4));
        assert_eq!(p.previous(), None);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn clear_moves_value_into_previous() {
        let p = Property::new(vec![1, 2]);
        let cleared = Rc::new(Cell::new(false));
        let c = cleared.clone();
        p.cleared(move || c.set(true));

        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.previous(), Some(vec![1, 2]));
        assert!(cleared.get());
    }

    #[test]
    fn consumer_may_write_back_into_other_property() {
        let a = Property::new(0);
        let b = Property::new(0);
        let b2 = b.clone();
        a.consume(move |v| {
            b2.set(v * 10);
        });
        let a2 = a.clone();
        b.consume(move |v| {
            a2.set(v / 10);
        });

        a.set(3);
        assert_eq!(b.get(), Some(30));
        assert_eq!(a.get(), Some(3));
    }

    #[test]
    fn update_goes_through_set() {
        let p = Property::new(vec![1]);
        let (fired, _) = counter();
        let f = fired.clone();
        p.consume(move |_| f.set(f.get() + 1));

        p.update(|v| v.push(2));
        assert_eq!(p.get(), Some(vec![1, 2]));
        assert_eq!(fired.get(), 1);
    }
}
