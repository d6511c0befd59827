//! Re-render requests.
//!
//! A [`Trigger`] wraps the host's "state changed, schedule a render" primitive.
//! The value handed to the listener carries no meaning beyond being distinct
//! from the previous one, so every trigger keeps its own sequence counter.
//!
//! Triggers can be merged with [`Trigger::connect`]. Merged triggers form one
//! group: notifying any member notifies all of them, and disposing any member
//! disposes the whole group. Groups are merged smaller-into-larger so long
//! chains of `connect` calls stay cheap.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

/// Opaque value pushed to a trigger's listener.
pub type Payload = u64;

type Listener = Rc<dyn Fn(Payload)>;

#[derive(Clone)]
pub struct Trigger(Rc<TriggerInner>);

struct TriggerInner {
    listener: RefCell<Option<Listener>>,
    sequence: Cell<Payload>,
    group: RefCell<Rc<Group>>,
}

#[derive(Default)]
struct Group {
    members: RefCell<SmallVec<[Weak<TriggerInner>; 2]>>,
}

impl Group {
    fn live(&self) -> Vec<Rc<TriggerInner>> {
        self.members
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl TriggerInner {
    fn fire(&self) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            let payload = self.sequence.get().wrapping_add(1);
            self.sequence.set(payload);
            listener(payload);
        }
    }
}

impl Trigger {
    pub fn new(listener: impl Fn(Payload) + 'static) -> Self {
        let group = Rc::new(Group::default());
        let inner = Rc::new(TriggerInner {
            listener: RefCell::new(Some(Rc::new(listener))),
            sequence: Cell::new(0),
            group: RefCell::new(group.clone()),
        });
        group.members.borrow_mut().push(Rc::downgrade(&inner));
        Self(inner)
    }

    fn group(&self) -> Rc<Group> {
        self.0.group.borrow().clone()
    }

    /// Notify every trigger in this trigger's group.
    pub fn notify(&self) -> &Self {
        for member in self.group().live() {
            member.fire();
        }
        self
    }

    /// Merge `other`'s group into this one. Merging is permanent.
    pub fn connect(&self, other: &Trigger) -> &Self {
        let ours = self.group();
        let theirs = other.group();
        if Rc::ptr_eq(&ours, &theirs) {
            return self;
        }
        let (keep, absorb) = if ours.members.borrow().len() >= theirs.members.borrow().len() {
            (ours, theirs)
        } else {
            (theirs, ours)
        };
        let moved = std::mem::take(&mut *absorb.members.borrow_mut());
        for member in moved {
            if let Some(trigger) = member.upgrade() {
                *trigger.group.borrow_mut() = keep.clone();
                keep.members.borrow_mut().push(member);
            }
        }
        self
    }

    pub fn is_connected(&self, other: &Trigger) -> bool {
        Rc::ptr_eq(&self.group(), &other.group())
    }

    /// Detach the listener of every trigger in the group. Notifications become
    /// no-ops afterwards.
    pub fn dispose(&self) -> &Self {
        for member in self.group().live() {
            member.listener.borrow_mut().take();
        }
        self
    }

    pub fn is_disposed(&self) -> bool {
        self.0.listener.borrow().is_none()
    }

    pub fn ptr_eq(&self, other: &Trigger) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("sequence", &self.0.sequence.get())
            .field("group", &self.group().members.borrow().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (Rc<RefCell<Vec<Payload>>>, Trigger) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        (seen, Trigger::new(move |p| s.borrow_mut().push(p)))
    }

    #[test]
    fn payloads_are_distinct() {
        let (seen, trigger) = recording();
        trigger.notify().notify().notify();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn connected_triggers_notify_together() {
        let (a_seen, a) = recording();
        let (b_seen, b) = recording();
        a.connect(&b);

        b.notify();
        assert_eq!(a_seen.borrow().len(), 1);
        assert_eq!(b_seen.borrow().len(), 1);

        a.notify();
        assert_eq!(a_seen.borrow().len(), 2);
        assert_eq!(b_seen.borrow().len(), 2);
    }

    #[test]
    fn connect_is_transitive() {
        let (a_seen, a) = recording();
        let (_, b) = recording();
        let (c_seen, c) = recording();
        a.connect(&b);
        c.connect(&b);

        assert!(a.is_connected(&c));
        c.notify();
        assert_eq!(a_seen.borrow().len(), 1);
        assert_eq!(c_seen.borrow().len(), 1);
    }

    #[test]
    fn dispose_cascades_through_group() {
        let (a_seen, a) = recording();
        let (b_seen, b) = recording();
        a.connect(&b);

        b.dispose();
        a.notify();
        b.notify();
        assert!(a.is_disposed());
        assert!(a_seen.borrow().is_empty());
        assert!(b_seen.borrow().is_empty());
    }

    #[test]
    fn dropped_member_is_skipped() {
        let (a_seen, a) = recording();
        {
            let (_, b) = recording();
            a.connect(&b);
        }
        a.notify();
        assert_eq!(a_seen.borrow().len(), 1);
    }
}
