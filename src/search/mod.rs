//! The MCTS engine: an arena-backed [`SearchTree`], driven by [`Simulator`]
//! and configured by [`SearchConfig`].
//!
//! Each call to [`SearchTree::run`] performs `config.iterations` rounds of
//! selection, expansion, rollout and backpropagation, exactly as described
//! in the module's invariants below. The tree is a DAG-free arena: edges
//! hold child [`NodeId`]s, nodes never point back to their parent, so
//! backpropagation walks the path collected during descent rather than
//! following parent pointers.

use log::trace;

use crate::error::{ConfigError, EngineError};
use crate::keys::{ActionKey, StateKey};
use crate::simulator::Simulator;

/// Whether backpropagated returns are discounted by `gamma^t` or summed raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Discounted,
    Undiscounted,
}

impl std::str::FromStr for ReturnType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discounted" => Ok(ReturnType::Discounted),
            "undiscounted" => Ok(ReturnType::Undiscounted),
            other => Err(ConfigError::InvalidReturnType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Configuration for one [`SearchTree::run`] call.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub iterations: u32,
    pub c: f64,
    pub gamma: f64,
    pub max_steps: u32,
    pub return_type: ReturnType,
    pub fixed_horizon_steps: Option<u32>,
}

impl SearchConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::GammaOutOfRange { gamma: self.gamma }.into());
        }
        Ok(())
    }
}

/// A rollout-time action-selection callback. Errors propagate out of
/// [`SearchTree::run`] unchanged.
pub trait RolloutPolicy {
    fn select_action(
        &mut self,
        state_key: StateKey,
        num_actions: usize,
    ) -> Result<ActionKey, anyhow::Error>;
}

impl<F> RolloutPolicy for F
where
    F: FnMut(StateKey, usize) -> Result<ActionKey, anyhow::Error>,
{
    fn select_action(
        &mut self,
        state_key: StateKey,
        num_actions: usize,
    ) -> Result<ActionKey, anyhow::Error> {
        self(state_key, num_actions)
    }
}

/// Statistics returned from a completed [`SearchTree::run`] call.
#[derive(Debug, Clone, Copy)]
pub struct RunResult {
    pub iterations_completed: u32,
}

/// Per-edge statistics at the root, for reporting.
#[derive(Debug, Clone, Copy)]
pub struct EdgeStats {
    pub visits: u64,
    pub total_value: f64,
    pub mean_value: f64,
}

/// A dense index into a [`SearchTree`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Edge {
    action: ActionKey,
    child: Option<NodeId>,
    visits: u64,
    total_value: f64,
}

#[derive(Debug, Clone)]
struct SearchNode {
    state_key: StateKey,
    terminal: bool,
    visits: u64,
    /// Populated lazily on first visit to this node: one edge per legal
    /// action. A node with `terminal` set, or whose simulator reports zero
    /// actions, ends up with an empty `children` — both are "terminal for
    /// search purposes".
    children: Vec<Edge>,
    initialized: bool,
}

impl SearchNode {
    fn effective_terminal(&self) -> bool {
        self.terminal || (self.initialized && self.children.is_empty())
    }

    fn fully_expanded(&self) -> bool {
        self.initialized && self.children.iter().all(|e| e.child.is_some())
    }
}

/// The MCTS tree: an arena of [`SearchNode`]s rooted at a given
/// `(state_key, terminal)` pair. One `run` call mutates the tree; it may be
/// re-queried for statistics afterward.
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
}

impl SearchTree {
    /// Allocates a tree rooted at `(root_state_key, root_terminal)`. The
    /// root has no edges until the first iteration of `run`.
    pub fn new(root_state_key: StateKey, root_terminal: bool) -> Self {
        let root_node = SearchNode {
            state_key: root_state_key,
            terminal: root_terminal,
            visits: 0,
            children: Vec::new(),
            initialized: false,
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
        }
    }

    fn ensure_initialized(&mut self, id: NodeId, sim: &impl Simulator) {
        let node = &mut self.nodes[id.index()];
        if node.initialized {
            return;
        }
        let num_actions = if node.terminal {
            0
        } else {
            sim.num_actions_by_key(node.state_key)
        };
        node.children = (0..num_actions)
            .map(|a| Edge {
                action: ActionKey(a as u32),
                child: None,
                visits: 0,
                total_value: 0.0,
            })
            .collect();
        node.initialized = true;
    }

    /// Runs `config.iterations` selection/expansion/rollout/backprop cycles
    /// against `sim`. On error from the simulator or the rollout policy, the
    /// run aborts; tree mutations already applied are left in place.
    pub fn run<S: Simulator>(
        &mut self,
        sim: &mut S,
        config: &SearchConfig,
        rollout_action: Option<ActionKey>,
        mut rollout_policy: Option<&mut dyn RolloutPolicy>,
    ) -> Result<RunResult, EngineError> {
        config.validate()?;
        let mut completed = 0;
        for _ in 0..config.iterations {
            self.run_iteration(sim, config, rollout_action, rollout_policy.as_deref_mut())?;
            completed += 1;
        }
        trace!("run complete: {completed} iterations");
        Ok(RunResult {
            iterations_completed: completed,
        })
    }

    fn run_iteration<S: Simulator>(
        &mut self,
        sim: &mut S,
        config: &SearchConfig,
        rollout_action: Option<ActionKey>,
        mut rollout_policy: Option<&mut dyn RolloutPolicy>,
    ) -> Result<(), EngineError> {
        let mut node_path: Vec<NodeId> = vec![self.root];
        let mut edge_path: Vec<(NodeId, ActionKey)> = Vec::new();
        let mut rewards: Vec<f64> = Vec::new();
        let mut steps_used: u32 = 0;

        self.ensure_initialized(self.root, &*sim);

        // 1. Selection.
        let mut current = self.root;
        loop {
            let node = &self.nodes[current.index()];
            if node.effective_terminal() || !node.fully_expanded() {
                break;
            }
            if !self.budget_remains(steps_used, config) {
                break;
            }
            let action = self.select_ucb(current, config.c);
            let state_key = node.state_key;
            let (_next_key, reward, _terminal) = sim.step_by_key(state_key, action)?;
            let child_id = self.nodes[current.index()].children[action.index()]
                .child
                .expect("fully_expanded edge always has a child");
            edge_path.push((current, action));
            rewards.push(reward);
            steps_used += 1;
            current = child_id;
            self.ensure_initialized(current, &*sim);
            node_path.push(current);
            trace!("selection: followed action {action} -> node {}", current.0);
        }

        // 2. Expansion.
        {
            let node = &self.nodes[current.index()];
            if !node.effective_terminal() && self.budget_remains(steps_used, config) {
                let action = node
                    .children
                    .iter()
                    .find(|e| e.child.is_none())
                    .map(|e| e.action);
                if let Some(action) = action {
                    let state_key = node.state_key;
                    let (next_key, reward, terminal) = sim.step_by_key(state_key, action)?;
                    let new_num_actions = if terminal {
                        0
                    } else {
                        sim.num_actions_by_key(next_key)
                    };
                    let new_node = SearchNode {
                        state_key: next_key,
                        terminal,
                        visits: 0,
                        children: (0..new_num_actions)
                            .map(|a| Edge {
                                action: ActionKey(a as u32),
                                child: None,
                                visits: 0,
                                total_value: 0.0,
                            })
                            .collect(),
                        initialized: true,
                    };
                    let new_id = NodeId(self.nodes.len() as u32);
                    self.nodes.push(new_node);
                    self.nodes[current.index()].children[action.index()].child = Some(new_id);
                    edge_path.push((current, action));
                    rewards.push(reward);
                    steps_used += 1;
                    current = new_id;
                    node_path.push(current);
                    trace!("expansion: action {action} -> new node {}", current.0);
                }
            }
        }

        // 3. Rollout. Does not materialize tree nodes; walks raw state keys.
        let mut rollout_key = self.nodes[current.index()].state_key;
        let mut rollout_done = self.nodes[current.index()].effective_terminal();
        let mut rollout_len = 0usize;
        while !rollout_done && self.budget_remains(steps_used, config) {
            let num_actions = sim.num_actions_by_key(rollout_key);
            if num_actions == 0 {
                break;
            }
            let action = if let Some(policy) = rollout_policy.as_deref_mut() {
                policy
                    .select_action(rollout_key, num_actions)
                    .map_err(EngineError::Policy)?
            } else if let Some(fixed) = rollout_action {
                ActionKey(fixed.0.min(num_actions as u32 - 1))
            } else {
                sim.sample_action_uniform(num_actions)
            };
            let (next_key, reward, terminal) = sim.step_by_key(rollout_key, action)?;
            rewards.push(reward);
            steps_used += 1;
            rollout_len += 1;
            rollout_key = next_key;
            rollout_done = terminal || sim.num_actions_by_key(next_key) == 0;
        }
        if rollout_len > 0 {
            trace!("rollout: {rollout_len} steps");
        }

        // 4. Backpropagation.
        let suffix_returns = suffix_returns(&rewards, config.gamma, config.return_type);
        for &node_id in &node_path {
            self.nodes[node_id.index()].visits += 1;
        }
        for (i, &(node_id, action)) in edge_path.iter().enumerate() {
            let edge = &mut self.nodes[node_id.index()].children[action.index()];
            edge.visits += 1;
            edge.total_value += suffix_returns[i];
        }

        Ok(())
    }

    fn budget_remains(&self, steps_used: u32, config: &SearchConfig) -> bool {
        if steps_used >= config.max_steps {
            return false;
        }
        if let Some(horizon) = config.fixed_horizon_steps {
            if steps_used >= horizon {
                return false;
            }
        }
        true
    }

    fn select_ucb(&self, id: NodeId, c: f64) -> ActionKey {
        let node = &self.nodes[id.index()];
        let parent_visits = (node.visits.max(1)) as f64;
        let mut best_score = f64::NEG_INFINITY;
        let mut best_action = node.children[0].action;
        for edge in &node.children {
            let score = if edge.visits == 0 {
                f64::INFINITY
            } else {
                edge.total_value / edge.visits as f64
                    + c * (parent_visits.ln() / edge.visits as f64).sqrt()
            };
            if score > best_score {
                best_score = score;
                best_action = edge.action;
            }
        }
        best_action
    }

    /// Argmax of child visit counts at the root; ties favor the lower
    /// action index. `None` if the root has no edges yet.
    pub fn best_root_action_by_visits(&self) -> Option<ActionKey> {
        let root = &self.nodes[self.root.index()];
        let mut best: Option<(u64, ActionKey)> = None;
        for edge in &root.children {
            if best.map_or(true, |(v, _)| edge.visits > v) {
                best = Some((edge.visits, edge.action));
            }
        }
        best.map(|(_, a)| a)
    }

    /// Argmax of mean value (`total_value / visits`) among root edges with
    /// at least one visit; ties favor the lower action index. `None` if no
    /// root edge has been visited.
    pub fn best_root_action_by_value(&self) -> Option<ActionKey> {
        let root = &self.nodes[self.root.index()];
        let mut best: Option<(f64, ActionKey)> = None;
        for edge in &root.children {
            if edge.visits == 0 {
                continue;
            }
            let mean = edge.total_value / edge.visits as f64;
            if best.map_or(true, |(v, _)| mean > v) {
                best = Some((mean, edge.action));
            }
        }
        best.map(|(_, a)| a)
    }

    /// Statistics for a root edge, for reporting.
    pub fn edge_stats(&self, action: ActionKey) -> Option<EdgeStats> {
        let root = &self.nodes[self.root.index()];
        root.children.get(action.index()).map(|e| EdgeStats {
            visits: e.visits,
            total_value: e.total_value,
            mean_value: if e.visits > 0 {
                e.total_value / e.visits as f64
            } else {
                0.0
            },
        })
    }

    /// The number of actions the root currently has edges for (0 before the
    /// first iteration, or if the root is terminal).
    pub fn root_edge_count(&self) -> usize {
        self.nodes[self.root.index()].children.len()
    }
}

/// `suffix_returns[i]` is the return contribution from reward index `i`
/// onward: `r_i` plus the (optionally discounted) suffix after it. Index 0
/// is the total return `G` from the root.
fn suffix_returns(rewards: &[f64], gamma: f64, return_type: ReturnType) -> Vec<f64> {
    let mut suffix = vec![0.0; rewards.len()];
    let mut acc = 0.0;
    for i in (0..rewards.len()).rev() {
        acc = rewards[i]
            + match return_type {
                ReturnType::Discounted => gamma * acc,
                ReturnType::Undiscounted => acc,
            };
        suffix[i] = acc;
    }
    suffix
}
