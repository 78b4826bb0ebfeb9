//! Variable storage
//!
//! Current values plus per-name history ring buffers for lag access.
//! Only names with a configured positive capacity own a buffer; reads
//! never allocate.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::types::VarKey;

/// Fixed-capacity history of a single scalar, newest last.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    capacity: usize,
    data: VecDeque<f64>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    /// Push the newest value, dropping the oldest at capacity.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Value `lag` steps before the newest: `lag = 0` is the newest,
    /// `lag = 1` the one before it. Out-of-range lags yield `default`.
    pub fn get_by_lag(&self, lag: usize, default: f64) -> f64 {
        if lag >= self.data.len() {
            default
        } else {
            self.data[self.data.len() - 1 - lag]
        }
    }
}

/// Runtime state of a single variable.
#[derive(Debug, Clone)]
pub struct VariableState {
    value: f64,
    history: Option<RingBuffer>,
}

impl VariableState {
    fn update(&mut self, value: f64) {
        self.value = value;
        if let Some(history) = &mut self.history {
            history.push(value);
        }
    }

    fn get_with_lag(&self, lag: usize, default: f64) -> f64 {
        if lag == 0 {
            return self.value;
        }
        match &self.history {
            Some(history) => history.get_by_lag(lag, default),
            None => default,
        }
    }
}

/// Map from name to variable state, plus the per-name history capacity
/// the loader computed from the program's lag requirements.
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: IndexMap<VarKey, VariableState>,
    capacities: IndexMap<VarKey, usize>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the required history capacity for a name. Idempotent; must
    /// run before the first `set` for that name to take effect.
    pub fn configure_lag(&mut self, name: &str, capacity: usize) {
        self.capacities.insert(name.into(), capacity);
    }

    pub fn configured_capacity(&self, name: &str) -> usize {
        self.capacities.get(name).copied().unwrap_or(0)
    }

    /// Set the current value, creating state lazily and appending to the
    /// history buffer when the name owns one.
    pub fn set(&mut self, name: &str, value: f64) {
        if let Some(state) = self.vars.get_mut(name) {
            state.update(value);
        } else {
            let capacity = self.configured_capacity(name);
            let mut state = VariableState {
                value,
                history: (capacity > 0).then(|| RingBuffer::new(capacity)),
            };
            if let Some(history) = &mut state.history {
                history.push(value);
            }
            self.vars.insert(name.into(), state);
        }
    }

    /// Set the current value without touching history. Used to seed
    /// initial attribute values before the first cycle runs.
    pub fn init(&mut self, name: &str, value: f64) {
        if let Some(state) = self.vars.get_mut(name) {
            state.value = value;
        } else {
            let capacity = self.configured_capacity(name);
            let state = VariableState {
                value,
                history: (capacity > 0).then(|| RingBuffer::new(capacity)),
            };
            self.vars.insert(name.into(), state);
        }
    }

    /// Current value, or `None` for a never-written name. Never creates
    /// state.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).map(|s| s.value)
    }

    /// Value `lag` cycles back, `default` when history does not reach
    /// that far (or the name was never written).
    pub fn get_with_lag(&self, name: &str, lag: usize, default: f64) -> f64 {
        match self.vars.get(name) {
            Some(state) => state.get_with_lag(lag, default),
            None => default,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// History length currently held for a name (0 when no buffer).
    pub fn history_len(&self, name: &str) -> usize {
        self.vars
            .get(name)
            .and_then(|s| s.history.as_ref())
            .map_or(0, |h| h.len())
    }
}
