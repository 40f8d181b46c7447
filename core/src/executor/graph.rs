use std::collections::{HashMap, HashSet};

use crate::error::ExecutorError;
use crate::executor::types::TaskLike;

/// Task dependency graph (DAG)
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> Task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable sorting)
    insertion_order: Vec<String>,
}

impl<T: TaskLike> TaskGraph<T> {
    /// Construct task graph from task list
    pub fn from_tasks(tasks: &[T]) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::with_capacity(tasks.len());

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(ExecutorError::DuplicateTaskId(task.id().to_string()));
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task_id.clone());
            }

            nodes.insert(task_id.clone(), task.clone());
            edges.insert(task_id.clone(), dependencies);
            insertion_order.push(task_id);
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    /// Task ids in submission order.
    pub fn ids(&self) -> &[String] {
        &self.insertion_order
    }

    /// Check that every dependency names another task in the set.
    ///
    /// Tasks are visited in submission order so the reported error is deterministic.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        for task_id in &self.insertion_order {
            let Some(dependencies) = self.edges.get(task_id) else {
                continue;
            };
            for dep in dependencies {
                if dep == task_id {
                    return Err(ExecutorError::SelfDependency(task_id.clone()));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Kahn-style layering.
    ///
    /// Returns execution layers where tasks in the same layer can run in parallel.
    /// Members of a layer keep submission order. When tasks remain that can never
    /// reach in-degree zero, every one of them is named in the cycle error.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn layers(&self) -> Result<Vec<Vec<String>>, ExecutorError> {
        // edges[A] = [B, C] means A depends on B and C, so A's in-degree is 2.
        // Duplicate entries in a dependency list count once.
        let mut in_degree: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .map(|id| {
                let distinct: HashSet<&String> =
                    self.edges.get(id).into_iter().flatten().collect();
                (id.as_str(), distinct.len())
            })
            .collect();

        let mut layers: Vec<Vec<String>> = Vec::new();
        let mut placed: HashSet<String> = HashSet::new();

        loop {
            let current: Vec<String> = self
                .insertion_order
                .iter()
                .filter(|id| !placed.contains(id.as_str()) && in_degree.get(id.as_str()) == Some(&0))
                .cloned()
                .collect();

            if current.is_empty() {
                break;
            }

            for task_id in &current {
                placed.insert(task_id.clone());
            }

            for task_id in &current {
                let Some(dependents) = self.reverse_edges.get(task_id) else {
                    continue;
                };
                let distinct: HashSet<&String> = dependents.iter().collect();
                for dependent in distinct {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }

            layers.push(current);
        }

        if placed.len() != self.insertion_order.len() {
            let ids = self
                .insertion_order
                .iter()
                .filter(|id| !placed.contains(id.as_str()))
                .cloned()
                .collect();
            return Err(ExecutorError::CircularDependency { ids });
        }

        Ok(layers)
    }

    /// Every task that transitively depends on `task_id`.
    pub fn dependents_of(&self, task_id: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![task_id.to_string()];
        while let Some(id) = stack.pop() {
            if let Some(dependents) = self.reverse_edges.get(&id) {
                for dependent in dependents {
                    if seen.insert(dependent.clone()) {
                        stack.push(dependent.clone());
                    }
                }
            }
        }
        seen
    }
}

/// Build, validate and layer a task set in one step.
pub fn resolve_layers<T: TaskLike>(tasks: &[T]) -> Result<Vec<Vec<String>>, ExecutorError> {
    let graph = TaskGraph::from_tasks(tasks)?;
    graph.validate()?;
    graph.layers()
}
