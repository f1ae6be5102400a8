use std::fmt;

/// An observer notified when a completion signal fires.
///
/// Receives the error the endpoint faulted with (or `None` on graceful completion) and the state
/// value supplied when the callback was attached.
pub type CompletionCallback<E, S> = fn(Option<&E>, &S);

/// Number of slots allocated by the first attach. Every later growth doubles the capacity.
const INITIAL_CAPACITY: usize = 4;

/// A registered observer together with the opaque state it is invoked with.
pub(crate) struct CallbackEntry<E, S> {
    callback: CompletionCallback<E, S>,
    state: S,
}

impl<E, S> CallbackEntry<E, S> {
    pub(crate) fn invoke(&self, error: Option<&E>) {
        (self.callback)(error, &self.state);
    }
}

/// Ordered list of completion callbacks.
///
/// The length of the backing vector is the logical count of registered callbacks. The capacity
/// is allocated lazily, starts at [`INITIAL_CAPACITY`] and doubles whenever the list is full.
/// Clearing the list drops every entry immediately but keeps the capacity, so a pooled owner
/// does not reallocate on every cycle and does not keep callback state alive between cycles.
pub(crate) struct CallbackList<E, S> {
    entries: Vec<CallbackEntry<E, S>>,
}

impl<E, S> CallbackList<E, S> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, callback: CompletionCallback<E, S>, state: S) {
        if self.entries.len() == self.entries.capacity() {
            let additional = self.entries.capacity().max(INITIAL_CAPACITY);
            self.entries.reserve_exact(additional);
        }

        self.entries.push(CallbackEntry { callback, state });
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CallbackEntry<E, S>> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Drops every registered entry, retaining the allocated capacity.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E, S> fmt::Debug for CallbackList<E, S> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.capacity())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<usize>>>;

    fn record(_error: Option<&()>, state: &(Log, usize)) {
        state.0.borrow_mut().push(state.1);
    }

    #[test]
    fn new_list_is_empty_without_allocating() {
        let list = CallbackList::<(), ()>::new();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 0);
    }

    #[test]
    fn first_push_allocates_initial_capacity() {
        let mut list = CallbackList::<(), ()>::new();

        list.push(|_, _| {}, ());

        assert_eq!(list.len(), 1);
        assert_eq!(list.capacity(), INITIAL_CAPACITY);
    }

    #[test]
    fn growth_preserves_entries_and_order() {
        let log = Log::default();
        let mut list = CallbackList::<(), (Log, usize)>::new();

        for index in 0..(INITIAL_CAPACITY + 1) {
            list.push(record, (Rc::clone(&log), index));
        }

        assert_eq!(list.len(), INITIAL_CAPACITY + 1);
        assert_eq!(list.capacity(), INITIAL_CAPACITY * 2);

        for entry in list.iter() {
            entry.invoke(None);
        }

        assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clear_drops_entries_and_retains_capacity() {
        let log = Log::default();
        let mut list = CallbackList::<(), (Log, usize)>::new();

        for index in 0..3 {
            list.push(record, (Rc::clone(&log), index));
        }

        let capacity = list.capacity();
        assert_eq!(Rc::strong_count(&log), 4);

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.capacity(), capacity);
        assert_eq!(Rc::strong_count(&log), 1);
    }

    #[test]
    fn invoke_passes_error_and_state() {
        let seen = Rc::new(RefCell::new(None));
        let mut list = CallbackList::<&'static str, Rc<RefCell<Option<String>>>>::new();

        list.push(
            |error, seen| {
                *seen.borrow_mut() = error.map(|e| (*e).to_string());
            },
            Rc::clone(&seen),
        );

        for entry in list.iter() {
            entry.invoke(Some(&"connection reset"));
        }

        assert_eq!(seen.borrow().as_deref(), Some("connection reset"));
    }
}
