#![allow(dead_code)]
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use procsync::{SharedRegister, WorkQueue};
use procsync_utils::linearizability::history::ProcessId;
use procsync_utils::specifications::{CounterOperation, QueueOperation};
use procsync_utils::{Action, History, Specification, WGLChecker};
use shuttle::rand::{rngs::ThreadRng, Rng};

pub const NUM_ITERATIONS: usize = 250;
pub const NUM_OPERATIONS: usize = 15;
pub const NUM_PREEMPTIONS: usize = 3;
pub const NUM_UNITS: usize = 3;

/// Asserts that the recorded history is linearizable with respect to `S`.
///
/// # Panics
///
/// Panics if the history is not linearizable.
pub fn assert_linearizable<S: Specification>(history: History<S::Operation>) {
    assert!(WGLChecker::<S>::is_linearizable(history));
}

/// An append-only log of the calls and responses of every unit.
pub struct Recorder<O> {
    actions: Arc<Mutex<Vec<(ProcessId, Action<O>)>>>,
}

impl<O: Clone + Debug> Recorder<O> {
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, unit: ProcessId, action: Action<O>) {
        self.actions.lock().unwrap().push((unit, action));
    }

    pub fn history(&self) -> History<O> {
        History::from_actions(self.actions.lock().unwrap().clone())
    }
}

/// A register that records the operations performed on it.
pub struct RecordingRegister {
    register: SharedRegister<i32>,
    recorder: Recorder<CounterOperation>,
}

impl RecordingRegister {
    pub fn new() -> Self {
        Self {
            register: SharedRegister::new(0),
            recorder: Recorder::new(),
        }
    }

    pub fn apply(&self, unit: ProcessId, delta: i32) {
        self.recorder
            .record(unit, Action::Call(CounterOperation::Apply(delta)));
        self.register.apply(delta);
        self.recorder
            .record(unit, Action::Response(CounterOperation::Apply(delta)));
    }

    pub fn read(&self, unit: ProcessId) -> i32 {
        self.recorder
            .record(unit, Action::Call(CounterOperation::Read(None)));
        let value = self.register.read();
        self.recorder
            .record(unit, Action::Response(CounterOperation::Read(Some(value))));
        value
    }

    pub fn perform_random_operation(&self, unit: ProcessId, rng: &mut ThreadRng) {
        if rng.gen_bool(0.5) {
            self.apply(unit, rng.gen_range(-5..=10));
        } else {
            self.read(unit);
        }
    }

    pub fn history(&self) -> History<CounterOperation> {
        self.recorder.history()
    }
}

/// A work queue that records the operations performed on it.
pub struct RecordingQueue {
    queue: WorkQueue<u32>,
    recorder: Recorder<QueueOperation<u32>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self {
            queue: WorkQueue::new(),
            recorder: Recorder::new(),
        }
    }

    pub fn enqueue(&self, unit: ProcessId, value: u32) {
        self.recorder
            .record(unit, Action::Call(QueueOperation::Enqueue(value)));
        self.queue.enqueue(value).unwrap();
        self.recorder
            .record(unit, Action::Response(QueueOperation::Enqueue(value)));
    }

    pub fn try_dequeue(&self, unit: ProcessId) -> Option<u32> {
        self.recorder
            .record(unit, Action::Call(QueueOperation::Dequeue(None)));
        let value = self.queue.try_dequeue();
        self.recorder
            .record(unit, Action::Response(QueueOperation::Dequeue(value)));
        value
    }

    pub fn history(&self) -> History<QueueOperation<u32>> {
        self.recorder.history()
    }
}
