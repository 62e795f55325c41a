//! A sequential specification of a FIFO queue.
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::specifications::Specification;

use QueueOperation::{Dequeue, Enqueue};

/// An operation on a queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueueOperation<T> {
    /// Append a value to the tail of the queue.
    Enqueue(T),
    /// Remove the head of the queue.
    ///
    /// The response carries the removed value, or `None` if the queue was
    /// observed to be empty. Only responses are ever applied to the
    /// specification, so the contents of the call are irrelevant.
    Dequeue(Option<T>),
}

/// A specification of an unbounded FIFO queue holding values of type `T`.
pub struct QueueSpecification<T> {
    data_type: PhantomData<T>,
}

impl<T: Clone + Debug + Eq + Hash> Specification for QueueSpecification<T> {
    type State = VecDeque<T>;
    type Operation = QueueOperation<T>;

    fn init() -> Self::State {
        VecDeque::new()
    }

    fn apply(operation: &Self::Operation, state: &Self::State) -> (bool, Self::State) {
        match operation {
            Enqueue(value) => {
                let mut new_state = state.clone();
                new_state.push_back(value.clone());
                (true, new_state)
            }
            Dequeue(Some(value)) => match state.front() {
                Some(head) if head == value => {
                    let mut new_state = state.clone();
                    new_state.pop_front();
                    (true, new_state)
                }
                _ => (false, state.clone()),
            },
            Dequeue(None) => (state.is_empty(), state.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Spec = QueueSpecification<u32>;

    mod apply {
        use super::*;

        #[test]
        fn enqueue_appends_to_tail() {
            let (_, state) = Spec::apply(&Enqueue(1), &Spec::init());
            let (is_valid, state) = Spec::apply(&Enqueue(2), &state);
            assert!(is_valid);
            assert_eq!(VecDeque::from([1, 2]), state);
        }

        #[test]
        fn dequeue_of_head_is_valid() {
            let (is_valid, state) = Spec::apply(&Dequeue(Some(1)), &VecDeque::from([1, 2]));
            assert!(is_valid);
            assert_eq!(VecDeque::from([2]), state);
        }

        #[test]
        fn dequeue_of_non_head_is_not_valid() {
            let (is_valid, state) = Spec::apply(&Dequeue(Some(2)), &VecDeque::from([1, 2]));
            assert!(!is_valid);
            assert_eq!(VecDeque::from([1, 2]), state);
        }

        #[test]
        fn empty_dequeue_is_valid_only_on_empty_queue() {
            assert!(Spec::apply(&Dequeue(None), &Spec::init()).0);
            assert!(!Spec::apply(&Dequeue(None), &VecDeque::from([1])).0);
        }
    }
}
