//! A sequential specification of a counter that supports reads and deltas.
use crate::specifications::Specification;

use CounterOperation::{Apply, Read};

/// An operation on a counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CounterOperation {
    /// Read the current value.
    ///
    /// If the return value of the operation is not-yet-known, then this can be
    /// represented as `Read(None)`.
    Read(Option<i32>),
    /// Add a delta to the current value, wrapping around on overflow.
    Apply(i32),
}

/// A specification of a 32-bit counter starting at `INITIAL`.
///
/// # Examples
///
/// ```
/// use procsync_utils::specifications::{CounterOperation::*, CounterSpecification};
/// use procsync_utils::Specification;
///
/// type Spec = CounterSpecification<10>;
///
/// let (is_valid, state) = Spec::apply(&Apply(5), &Spec::init());
/// assert!(is_valid);
/// assert_eq!(state, 15);
///
/// let (is_valid, _) = Spec::apply(&Read(Some(10)), &state);
/// assert!(!is_valid);
/// ```
pub struct CounterSpecification<const INITIAL: i32>;

impl<const INITIAL: i32> Specification for CounterSpecification<INITIAL> {
    type State = i32;
    type Operation = CounterOperation;

    fn init() -> Self::State {
        INITIAL
    }

    fn apply(operation: &Self::Operation, state: &Self::State) -> (bool, Self::State) {
        match operation {
            Read(value) => match value {
                Some(value) => (value == state, *state),
                None => panic!("Cannot apply `Read` with unknown return value"),
            },
            Apply(delta) => (true, state.wrapping_add(*delta)),
        }
    }
}
