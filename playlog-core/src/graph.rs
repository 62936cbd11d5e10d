//! Pipeline graph definition and compilation
//!
//! A pipeline is an immutable set of tasks wired by "must complete before"
//! edges. Construction goes through [`PipelineBuilder`], which validates the
//! declaration; compilation derives a topologically sorted execution plan.
//! Nothing here registers globally — handing a pipeline to a scheduler is
//! the caller's concern.

use crate::schedule::Schedule;
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Errors that can occur while building or compiling a pipeline
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Circular dependency detected in pipeline")]
    CircularDependency,

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("Edge references unknown task: {0}")]
    UnknownTask(TaskId),

    #[error("Task depends on itself: {0}")]
    SelfDependency(TaskId),

    #[error("Pipeline must have exactly one root task, found {0}")]
    RootCount(usize),

    #[error("Pipeline must have exactly one leaf task, found {0}")]
    LeafCount(usize),
}

/// An immutable pipeline: tasks plus directed "must complete before" edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Human-readable name
    pub name: String,

    /// Recurrence declaration, consumed by the host scheduler
    pub schedule: Schedule,

    tasks: Vec<Task>,
    edges: Vec<(TaskId, TaskId)>,
}

impl Pipeline {
    /// All tasks in declaration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// All edges as (upstream, downstream) pairs
    pub fn edges(&self) -> &[(TaskId, TaskId)] {
        &self.edges
    }

    /// Look up a task by id
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Direct upstream dependencies of a task
    pub fn upstream_of(&self, id: &TaskId) -> Vec<&TaskId> {
        self.edges
            .iter()
            .filter(|(_, down)| down == id)
            .map(|(up, _)| up)
            .collect()
    }

    /// Direct downstream dependents of a task
    pub fn downstream_of(&self, id: &TaskId) -> Vec<&TaskId> {
        self.edges
            .iter()
            .filter(|(up, _)| up == id)
            .map(|(_, down)| down)
            .collect()
    }

    /// All transitive downstream dependents of a task
    pub fn descendants_of(&self, id: &TaskId) -> HashSet<TaskId> {
        let mut seen = HashSet::new();
        let mut frontier = VecDeque::from([id.clone()]);

        while let Some(current) = frontier.pop_front() {
            for down in self.downstream_of(&current) {
                if seen.insert(down.clone()) {
                    frontier.push_back(down.clone());
                }
            }
        }

        seen
    }

    /// Compile the pipeline into a topologically sorted execution plan
    pub fn compile(&self) -> Result<ExecutionPlan, GraphError> {
        // Kahn's algorithm; ready tasks are visited in declaration order so
        // the plan is deterministic.
        let mut indegree: HashMap<&TaskId, usize> =
            self.tasks.iter().map(|t| (&t.id, 0_usize)).collect();
        let mut children: HashMap<&TaskId, Vec<&TaskId>> = HashMap::new();

        for (up, down) in &self.edges {
            children.entry(up).or_default().push(down);
            *indegree
                .get_mut(down)
                .expect("edge endpoints validated at build time") += 1;
        }

        let mut ready: VecDeque<&TaskId> = self
            .tasks
            .iter()
            .filter(|t| indegree[&t.id] == 0)
            .map(|t| &t.id)
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());

        while let Some(id) = ready.pop_front() {
            order.push(id.clone());

            if let Some(downs) = children.get(id) {
                for down in downs {
                    let entry = indegree
                        .get_mut(*down)
                        .expect("edge endpoints validated at build time");
                    *entry -= 1;
                    if *entry == 0 {
                        ready.push_back(*down);
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            return Err(GraphError::CircularDependency);
        }

        Ok(ExecutionPlan {
            pipeline: self.name.clone(),
            order,
        })
    }
}

/// A compiled execution plan
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Name of the pipeline this plan was compiled from
    pub pipeline: String,

    /// Tasks in topologically sorted execution order
    pub order: Vec<TaskId>,
}

/// Builder for declaring a pipeline
pub struct PipelineBuilder {
    name: String,
    schedule: Schedule,
    tasks: Vec<Task>,
    edges: Vec<(TaskId, TaskId)>,
}

impl PipelineBuilder {
    /// Start declaring a pipeline with the given name and schedule
    pub fn new(name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            schedule,
            tasks: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a task
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Declare that `upstream` must complete before `downstream`
    pub fn edge(mut self, upstream: impl Into<TaskId>, downstream: impl Into<TaskId>) -> Self {
        self.edges.push((upstream.into(), downstream.into()));
        self
    }

    /// Wire every task in `upstream` before every task in `downstream`
    pub fn fan(mut self, upstream: &[&str], downstream: &[&str]) -> Self {
        for up in upstream {
            for down in downstream {
                self.edges.push((TaskId::from(*up), TaskId::from(*down)));
            }
        }
        self
    }

    /// Validate the declaration and produce an immutable pipeline.
    ///
    /// Checks duplicate ids, unknown edge endpoints, self-dependencies,
    /// acyclicity, and the single-start/single-end invariant.
    pub fn build(self) -> Result<Pipeline, GraphError> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(&task.id) {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
        }

        for (up, down) in &self.edges {
            if !ids.contains(up) {
                return Err(GraphError::UnknownTask(up.clone()));
            }
            if !ids.contains(down) {
                return Err(GraphError::UnknownTask(down.clone()));
            }
            if up == down {
                return Err(GraphError::SelfDependency(up.clone()));
            }
        }

        let pipeline = Pipeline {
            name: self.name,
            schedule: self.schedule,
            tasks: self.tasks,
            edges: self.edges,
        };

        // Rejects cycles.
        pipeline.compile()?;

        let roots = pipeline
            .tasks
            .iter()
            .filter(|t| pipeline.upstream_of(&t.id).is_empty())
            .count();
        if roots != 1 {
            return Err(GraphError::RootCount(roots));
        }

        let leaves = pipeline
            .tasks
            .iter()
            .filter(|t| pipeline.downstream_of(&t.id).is_empty())
            .count();
        if leaves != 1 {
            return Err(GraphError::LeafCount(leaves));
        }

        Ok(pipeline)
    }
}
