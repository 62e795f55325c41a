//! Histories of operations performed on a shared object.
use std::collections::HashMap;
use std::ops::Index;

/// An identifier for a process (or execution unit) performing operations.
pub type ProcessId = usize;

/// An identifier for an entry in a [`History`].
pub type EntryId = usize;

/// Something a process did to a shared object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action<T> {
    /// The process started performing an operation.
    Call(T),
    /// The operation the process had started has completed.
    Response(T),
}

/// The entry recording the start of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallEntry<T> {
    pub id: EntryId,
    pub operation: T,
    /// The id of the entry recording the completion of this operation.
    pub response: EntryId,
}

/// The entry recording the completion of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseEntry<T> {
    pub id: EntryId,
    pub operation: T,
}

/// An entry in a [`History`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry<T> {
    Call(CallEntry<T>),
    Response(ResponseEntry<T>),
}

impl<T> Entry<T> {
    pub fn id(&self) -> EntryId {
        match self {
            Entry::Call(call) => call.id,
            Entry::Response(response) => response.id,
        }
    }
}

/// A complete history of operations performed on a shared object, in the
/// order in which their calls and responses happened.
///
/// Entries can be temporarily removed from the history with [`lift`](History::lift),
/// and put back in their original positions with [`unlift`](History::unlift).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History<T> {
    entries: Vec<Entry<T>>,
    // The position each lifted entry occupied, indexed by entry id.
    removed_from: Vec<Option<usize>>,
}

impl<T> History<T> {
    /// Creates a history from the actions of each process, in the order in
    /// which they happened.
    ///
    /// # Panics
    ///
    /// Panics if a process calls an operation before its previous operation
    /// has responded, if a response has no matching call, or if some call
    /// never receives a response.
    pub fn from_actions(actions: Vec<(ProcessId, Action<T>)>) -> Self {
        let mut pending: HashMap<ProcessId, EntryId> = HashMap::new();
        let mut responses: Vec<Option<EntryId>> = vec![None; actions.len()];
        for (id, (process, action)) in actions.iter().enumerate() {
            match action {
                Action::Call(_) => {
                    if pending.insert(*process, id).is_some() {
                        panic!("Process {process} called an operation while another was pending");
                    }
                }
                Action::Response(_) => match pending.remove(process) {
                    Some(call) => responses[call] = Some(id),
                    None => panic!("Process {process} responded without a pending call"),
                },
            }
        }
        if let Some(process) = pending.keys().next() {
            panic!("Process {process} has an operation that never responded");
        }

        let entries = actions
            .into_iter()
            .enumerate()
            .map(|(id, (_, action))| match action {
                Action::Call(operation) => Entry::Call(CallEntry {
                    id,
                    operation,
                    response: responses[id].expect("Every call has a response"),
                }),
                Action::Response(operation) => Entry::Response(ResponseEntry { id, operation }),
            })
            .collect::<Vec<_>>();
        let removed_from = vec![None; entries.len()];
        Self {
            entries,
            removed_from,
        }
    }

    /// Returns the position of the entry with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the entry is not currently part of the history.
    pub fn index_of_id(&self, id: EntryId) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.id() == id)
            .unwrap_or_else(|| panic!("Entry {id} is not in the history"))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes the call entry at position `i`, along with its response, and
    /// returns both.
    ///
    /// # Panics
    ///
    /// Panics if the entry at position `i` is not a call.
    pub fn lift(&mut self, i: usize) -> (Entry<T>, Entry<T>) {
        let call = self.remove(i);
        let response_id = match &call {
            Entry::Call(call) => call.response,
            Entry::Response(response) => panic!("Cannot lift response entry {}", response.id),
        };
        let response = self.remove(self.index_of_id(response_id));
        (call, response)
    }

    /// Puts a previously lifted call and response back into the positions
    /// they were lifted from, and returns those positions.
    ///
    /// # Panics
    ///
    /// Panics if either entry was not lifted from this history.
    pub fn unlift(&mut self, call: Entry<T>, response: Entry<T>) -> (usize, usize) {
        let response_index = self.insert(response);
        let call_index = self.insert(call);
        (call_index, response_index)
    }

    fn insert(&mut self, entry: Entry<T>) -> usize {
        match self.removed_from[entry.id()].take() {
            Some(index) => {
                self.entries.insert(index, entry);
                index
            }
            None => panic!("Entry {} was never removed from the history", entry.id()),
        }
    }

    fn remove(&mut self, i: usize) -> Entry<T> {
        let entry = self.entries.remove(i);
        self.removed_from[entry.id()] = Some(i);
        entry
    }
}

impl<T> Index<usize> for History<T> {
    type Output = Entry<T>;

    fn index(&self, i: usize) -> &Self::Output {
        &self.entries[i]
    }
}
