//! Cyclic execution engine
//!
//! Owns the clock, the variable store, every algorithm instance and the
//! dependency-ordered node list. Each cycle: tick the clock, step every
//! node in declared order, assemble the snapshot, and in realtime mode
//! sleep away the remaining budget. The declared order is both the
//! control-flow order and the commit order to the store, so later nodes
//! observe earlier nodes' writes of the same cycle.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{error, info, instrument, trace};

use procsim_dsl::{Callee, Expr, Stmt};

use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::error::{ConfigError, Error, Result};
use crate::loader::{self, ItemKind, ProgramConfig, ProgramItem};
use crate::node::{AlgorithmNode, ExpressionNode, Node};
use crate::program::{InstanceMap, ProgramInit};
use crate::registry::ProgramRegistry;
use crate::storage::VariableStore;
use crate::types::{ClockMode, Snapshot, VarKey};

/// The unified execution engine.
pub struct Engine {
    clock: Clock,
    store: VariableStore,
    registry: ProgramRegistry,
    instances: InstanceMap,
    nodes: Vec<Node>,
    /// Store keys emitted in every snapshot, in program order.
    persisted: Vec<VarKey>,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: ProgramConfig, registry: ProgramRegistry) -> Result<Self> {
        let clock = Clock::new(config.clock.clone())?;

        let mut store = VariableStore::new();
        for (key, &capacity) in &config.lag_capacities {
            store.configure_lag(key.as_str(), capacity);
        }

        let base_seed = config.seed.unwrap_or_else(rand::random);
        let mut instances = InstanceMap::new();
        let mut nodes = Vec::with_capacity(config.items.len());
        let mut persisted = Vec::new();

        for (index, item) in config.items.iter().enumerate() {
            match &item.kind {
                ItemKind::Algorithm { type_name } => {
                    let entry = registry.algorithm(type_name).ok_or_else(|| {
                        ConfigError::UnknownType {
                            name: item.name.clone(),
                            type_name: type_name.clone(),
                        }
                    })?;
                    let instance = (entry.build)(&ProgramInit {
                        name: item.name.clone(),
                        cycle_time: config.clock.cycle_time,
                        init_args: item.init_args.clone(),
                        seed: base_seed.wrapping_add(index as u64),
                    })?;

                    // Stored attributes are visible from cycle 0; seeding
                    // sets current values without a history entry.
                    for attr in instance.stored_attributes() {
                        let key = VarKey::attribute(&item.name, attr);
                        if let Some(value) = instance.attribute(attr) {
                            store.init(key.as_str(), value);
                        }
                        persisted.push(key);
                    }

                    nodes.push(Node::Algorithm(algorithm_node(item)?));
                    instances.insert(item.name.clone(), instance);
                }
                ItemKind::Variable => {
                    persisted.push(VarKey::from(item.name.as_str()));
                    nodes.push(Node::Expression(expression_node(item)?));
                }
            }
        }

        info!(
            nodes = nodes.len(),
            instances = instances.len(),
            keys = persisted.len(),
            "engine initialized"
        );

        Ok(Self {
            clock,
            store,
            registry,
            instances,
            nodes,
            persisted,
        })
    }

    /// Load a configuration file and build the engine from it.
    pub fn from_path(path: impl AsRef<Path>, registry: ProgramRegistry) -> Result<Self> {
        let config = loader::load_file(path, &registry)?;
        Self::new(config, registry)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// Store keys present in every snapshot, in program order.
    pub fn persisted_keys(&self) -> &[VarKey] {
        &self.persisted
    }

    /// Run one cycle: tick, step every node in declared order, assemble
    /// the snapshot. A node failure aborts the cycle and propagates with
    /// the node identity; no node is skipped.
    #[instrument(skip(self), fields(cycle = self.clock.cycle_count() + 1))]
    fn step_cycle(&mut self) -> Result<Snapshot> {
        let tick = self.clock.tick();

        for node in &self.nodes {
            trace!(node = node.name(), "stepping node");
            if let Err(source) = node.step(&mut self.store, &mut self.instances, &self.registry) {
                error!(node = node.name(), cycle = tick.cycle_count, %source, "node failed");
                return Err(Error::Node {
                    node: node.name().to_string(),
                    cycle: tick.cycle_count,
                    source,
                });
            }
        }

        let mut values = IndexMap::with_capacity(self.persisted.len());
        for key in &self.persisted {
            values.insert(key.clone(), self.store.get(key.as_str()).unwrap_or(0.0));
        }

        Ok(Snapshot {
            cycle_count: tick.cycle_count,
            sim_time: self.clock.sim_time(),
            need_sample: tick.need_sample,
            time_str: tick.time_str,
            values,
        })
    }

    /// Run exactly `n` cycles as fast as possible and return their
    /// snapshots. Never sleeps; wall-clock time does not affect any
    /// returned value.
    pub fn run_generator(&mut self, n: u64) -> Result<Vec<Snapshot>> {
        if n == 0 {
            return Err(ConfigError::InvalidCycleCount.into());
        }
        self.clock.set_mode(ClockMode::Generator);
        info!(cycles = n, "generator run");
        (0..n).map(|_| self.step_cycle()).collect()
    }

    /// Produce an unbounded stream of snapshots, one per real
    /// `cycle_time`, until cancelled. Cancellation is honored at cycle
    /// boundaries only; a pending sleep is interrupted, a running cycle
    /// is finished.
    pub fn run_realtime<F>(&mut self, cancel: &CancelToken, mut sink: F) -> Result<()>
    where
        F: FnMut(Snapshot),
    {
        self.clock.set_mode(ClockMode::Realtime);
        info!("realtime run");
        while !cancel.is_cancelled() {
            let snapshot = self.step_cycle()?;
            sink(snapshot);
            self.clock.sleep_remaining(cancel);
        }
        info!(cycle = self.clock.cycle_count(), "realtime run cancelled");
        Ok(())
    }
}

fn algorithm_node(item: &ProgramItem) -> Result<AlgorithmNode> {
    match &item.stmt {
        Stmt::Expr(Expr::Call {
            callee: Callee::Method { .. },
            args,
        }) => {
            let kwargs = args
                .iter()
                .filter_map(|arg| arg.keyword.clone().map(|k| (k, arg.value.clone())))
                .collect();
            Ok(AlgorithmNode::new(
                item.name.clone(),
                item.expression.clone(),
                kwargs,
            ))
        }
        _ => Err(ConfigError::MalformedItem {
            name: item.name.clone(),
            message: "algorithm item is not an execute() call".to_string(),
        }
        .into()),
    }
}

fn expression_node(item: &ProgramItem) -> Result<ExpressionNode> {
    match &item.stmt {
        Stmt::Assign { value, .. } => Ok(ExpressionNode::new(
            item.name.clone(),
            item.expression.clone(),
            value.clone(),
        )),
        Stmt::Expr(_) => Err(ConfigError::MalformedItem {
            name: item.name.clone(),
            message: "variable item is not an assignment".to_string(),
        }
        .into()),
    }
}
