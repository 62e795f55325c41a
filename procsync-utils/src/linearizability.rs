//! Checking [linearizability](https://en.wikipedia.org/wiki/Linearizability) of a
//! history of operations applied to a shared object.
//!
//! For more information, see the documentation of [`WGLChecker`] and [`History`].
use std::collections::HashSet;
use std::marker::PhantomData;

use crate::linearizability::history::{Entry, History};
use crate::specifications::Specification;

pub mod history;

/// A linearizability checker.
///
/// Implements the algorithm of Wing and Gong
/// [\[WG93\]](https://www.cs.cmu.edu/~wing/publications/WingGong93.pdf), with the
/// memoization introduced by Lowe
/// [\[L17\]](http://www.cs.ox.ac.uk/people/gavin.lowe/LinearizabiltyTesting/),
/// following the presentation of Horn and Kroening
/// [\[HK15\]](https://arxiv.org/abs/1504.00204).
///
/// The checker repeatedly picks the earliest pending call whose response can be
/// applied to the current state, removes the pair from the history and moves
/// on. When it reaches a response whose call has not been linearized yet, it
/// backtracks. Every (set of linearized calls, state) pair it has visited is
/// cached, so that no dead end is explored twice.
///
/// # Examples
///
/// Checking a history of concurrent deltas and reads against a counter.
///
/// ```
/// use procsync_utils::linearizability::history::{Action::{Call, Response}, History};
/// use procsync_utils::specifications::{CounterOperation::{Apply, Read}, CounterSpecification};
/// use procsync_utils::WGLChecker;
///
/// type Checker = WGLChecker<CounterSpecification<0>>;
///
/// // P0 |------------------| Apply(10)
/// // P1    |------|          Apply(-5)
/// // P2             |---|    Read(Some(-5))
/// let history = History::from_actions(vec![
///     (0, Call(Apply(10))),
///     (1, Call(Apply(-5))),
///     (1, Response(Apply(-5))),
///     (2, Call(Read(None))),
///     (2, Response(Read(Some(-5)))),
///     (0, Response(Apply(10))),
/// ]);
/// assert!(Checker::is_linearizable(history));
///
/// // Once both deltas have completed, no read can miss either of them.
/// // P0 |---|                Apply(10)
/// // P1       |---|          Apply(-5)
/// // P2             |---|    Read(Some(10))
/// let history = History::from_actions(vec![
///     (0, Call(Apply(10))),
///     (0, Response(Apply(10))),
///     (1, Call(Apply(-5))),
///     (1, Response(Apply(-5))),
///     (2, Call(Read(None))),
///     (2, Response(Read(Some(10)))),
/// ]);
/// assert!(!Checker::is_linearizable(history));
/// ```
pub struct WGLChecker<S: Specification> {
    data_type: PhantomData<S>,
}

type OperationEntry<S> = Entry<<S as Specification>::Operation>;
type LinearizedCall<S> = (
    (OperationEntry<S>, OperationEntry<S>),
    <S as Specification>::State,
);

impl<S: Specification> WGLChecker<S> {
    /// Returns whether the history of operations is linearizable with respect to the specification.
    pub fn is_linearizable(mut history: History<S::Operation>) -> bool {
        let mut state = S::init();
        let mut linearized = vec![false; history.len()];
        let mut calls: Vec<LinearizedCall<S>> = Vec::new();
        let mut cache: HashSet<(Vec<bool>, S::State)> = HashSet::new();
        let mut curr = 0;
        while !history.is_empty() {
            match &history[curr] {
                Entry::Call(call) => {
                    let response = match &history[history.index_of_id(call.response)] {
                        Entry::Response(response) => response,
                        Entry::Call(_) => panic!("Response of a call cannot be another call"),
                    };
                    let (is_valid, new_state) = S::apply(&response.operation, &state);
                    let mut is_new = false;
                    if is_valid {
                        let mut candidate = linearized.clone();
                        candidate[call.id] = true;
                        is_new = cache.insert((candidate, new_state.clone()));
                    }
                    if is_new {
                        linearized[call.id] = true;
                        calls.push((history.lift(curr), state));
                        state = new_state;
                        curr = 0;
                    } else {
                        curr += 1;
                    }
                }
                Entry::Response(_) => {
                    let Some(((call, response), old_state)) = calls.pop() else {
                        return false;
                    };
                    state = old_state;
                    linearized[call.id()] = false;
                    let (call_index, _) = history.unlift(call, response);
                    curr = call_index + 1;
                }
            }
        }
        true
    }
}
