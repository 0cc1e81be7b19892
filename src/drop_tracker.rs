use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct Ledger<T> {
    live: usize,
    dropped: Option<Vec<T>>,
}

/// Counts the tracked values still alive and, while tracking, records the
/// values dropped.
pub struct DropTracker<T> {
    ledger: Rc<RefCell<Ledger<T>>>,
}

impl<T: Clone> DropTracker<T> {
    pub fn new() -> Self {
        DropTracker {
            ledger: Rc::new(RefCell::new(Ledger {
                live: 0,
                dropped: None,
            })),
        }
    }

    pub fn wrap(&self, value: T) -> Tracked<T> {
        Tracked::new(value, &self.ledger)
    }

    pub fn wrap_iter<I: IntoIterator<Item = T>>(
        &self,
        values: I,
    ) -> impl Iterator<Item = Tracked<T>> {
        let ledger = Rc::clone(&self.ledger);
        values
            .into_iter()
            .map(move |value| Tracked::new(value, &ledger))
    }

    pub fn track<F: FnOnce() -> R, R>(&self, f: F) -> (Vec<T>, R) {
        self.ledger.borrow_mut().dropped = Some(Vec::new());
        let result = f();
        let dropped = self.ledger.borrow_mut().dropped.take().unwrap();
        (dropped, result)
    }

    pub fn live(&self) -> usize {
        self.ledger.borrow().live
    }
}

pub struct Tracked<T: Clone> {
    value: T,
    ledger: Rc<RefCell<Ledger<T>>>,
}

impl<T: Clone> Tracked<T> {
    fn new(value: T, ledger: &Rc<RefCell<Ledger<T>>>) -> Self {
        ledger.borrow_mut().live += 1;
        Tracked {
            value,
            ledger: Rc::clone(ledger),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Tracked::new(self.value.clone(), &self.ledger)
    }
}

impl<T: Clone> Drop for Tracked<T> {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.live = ledger
            .live
            .checked_sub(1)
            .expect("more values dropped than created");
        if let Some(ref mut dropped) = ledger.dropped {
            dropped.push(self.value.clone());
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Clone + Eq> Eq for Tracked<T> {}

impl<T: Clone + fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}
