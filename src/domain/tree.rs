//! Task hierarchy reconstruction
//!
//! The remote listing returns tasks and subtasks as one flat sequence where
//! each subtask carries a reference to its parent. [`TaskForest::build`]
//! rebuilds the parent/child structure in an arena indexed by position in
//! the listing, so traversal never depends on call-stack recursion and the
//! cycle guard is a plain visited set.
//!
//! Inconsistent remote data never aborts a build:
//! - a parent that is not part of the listing makes the child a root
//! - a parent cycle is cut at the first repeated task, which becomes a root
//! - a duplicated id keeps every record; children attach to the first one

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::task::Task;

/// Position of a task in the forest's arena
pub type NodeId = usize;

/// A structural problem found while rebuilding the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralIssue {
    #[error("Parent {parent_id} of task {task_id} is not in the listing; shown as top-level")]
    Orphan { task_id: String, parent_id: String },

    #[error("Circular parent reference at task {task_id}; branch cut and shown as top-level")]
    Cycle { task_id: String },

    #[error("Task {task_id} appears more than once in the listing")]
    DuplicateId { task_id: String },
}

impl StructuralIssue {
    /// Orphans are expected with partial listings; everything else means the
    /// remote data is inconsistent
    pub fn is_inconsistency(&self) -> bool {
        !matches!(self, StructuralIssue::Orphan { .. })
    }
}

/// One step of a pre-order traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: NodeId,
    pub depth: usize,
}

/// A task with its ordered subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<TaskNode>,
}

impl TaskNode {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            subtasks: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.subtasks.iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The rebuilt task hierarchy
#[derive(Debug, Default)]
pub struct TaskForest {
    tasks: Vec<Task>,
    parent: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
    roots: Vec<NodeId>,
    issues: Vec<StructuralIssue>,
}

impl TaskForest {
    /// Builds the forest from one flat listing, preserving listing order
    /// among siblings and ordering roots newest first
    pub fn build(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().collect();
        let n = tasks.len();
        let mut issues = Vec::new();
        let mut parent: Vec<Option<NodeId>> = vec![None; n];
        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); n];

        {
            let mut index: HashMap<&str, NodeId> = HashMap::with_capacity(n);
            for (idx, task) in tasks.iter().enumerate() {
                if index.contains_key(task.id.as_str()) {
                    issues.push(StructuralIssue::DuplicateId {
                        task_id: task.id.clone(),
                    });
                } else {
                    index.insert(task.id.as_str(), idx);
                }
            }

            for (idx, task) in tasks.iter().enumerate() {
                let Some(parent_id) = task.parent_id.as_deref() else {
                    continue;
                };
                match index.get(parent_id) {
                    Some(&p) if p == idx => issues.push(StructuralIssue::Cycle {
                        task_id: task.id.clone(),
                    }),
                    Some(&p) => {
                        parent[idx] = Some(p);
                        children[p].push(idx);
                    }
                    None => issues.push(StructuralIssue::Orphan {
                        task_id: task.id.clone(),
                        parent_id: parent_id.to_string(),
                    }),
                }
            }
        }

        let mut roots: Vec<NodeId> = (0..n).filter(|&idx| parent[idx].is_none()).collect();

        // Anything not reachable from a root hangs off a parent cycle
        let mut reached = vec![false; n];
        mark_reachable(&roots, &children, &mut reached);

        for start in 0..n {
            if reached[start] {
                continue;
            }

            let mut chain = HashSet::new();
            let mut current = start;
            while chain.insert(current) {
                match parent[current] {
                    Some(p) => current = p,
                    None => break,
                }
            }

            if let Some(p) = parent[current].take() {
                children[p].retain(|&c| c != current);
            }
            roots.push(current);
            issues.push(StructuralIssue::Cycle {
                task_id: tasks[current].id.clone(),
            });
            mark_reachable(&[current], &children, &mut reached);
        }

        roots.sort_by(|a, b| tasks[*b].created_at.cmp(&tasks[*a].created_at));

        for issue in &issues {
            if issue.is_inconsistency() {
                warn!("{}", issue);
            } else {
                debug!("{}", issue);
            }
        }

        Self {
            tasks,
            parent,
            children,
            roots,
            issues,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn task(&self, node: NodeId) -> &Task {
        &self.tasks[node]
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.children[node]
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent[node]
    }

    pub fn issues(&self) -> &[StructuralIssue] {
        &self.issues
    }

    /// Finds the first node carrying the given task id
    pub fn find(&self, task_id: &str) -> Option<NodeId> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    /// Pre-order traversal of the whole forest
    pub fn walk(&self) -> Vec<Visit> {
        self.walk_from(&self.roots)
    }

    /// Pre-order traversal starting at the given nodes (depth 0)
    ///
    /// A node reached twice is skipped with a warning instead of being
    /// expanded again.
    pub fn walk_from(&self, starts: &[NodeId]) -> Vec<Visit> {
        let mut visited = HashSet::with_capacity(self.tasks.len());
        let mut visits = Vec::with_capacity(self.tasks.len());
        let mut stack: Vec<Visit> = starts
            .iter()
            .rev()
            .map(|&node| Visit { node, depth: 0 })
            .collect();

        while let Some(visit) = stack.pop() {
            if !visited.insert(visit.node) {
                warn!(
                    task_id = %self.tasks[visit.node].id,
                    "Task reached twice while traversing; branch skipped"
                );
                continue;
            }
            visits.push(visit);
            for &child in self.children[visit.node].iter().rev() {
                stack.push(Visit {
                    node: child,
                    depth: visit.depth + 1,
                });
            }
        }

        visits
    }

    /// Keeps visits whose task matches, plus their ancestors for context
    pub fn retain_matching<F>(&self, visits: &[Visit], predicate: F) -> Vec<Visit>
    where
        F: Fn(&Task) -> bool,
    {
        let mut keep = vec![false; self.tasks.len()];
        for visit in visits.iter().rev() {
            let node = visit.node;
            keep[node] =
                predicate(&self.tasks[node]) || self.children[node].iter().any(|&c| keep[c]);
        }
        visits.iter().filter(|v| keep[v.node]).copied().collect()
    }

    /// Materializes pre-order visits into owned nested nodes
    pub fn to_nodes(&self, visits: &[Visit]) -> Vec<TaskNode> {
        let mut roots = Vec::new();
        let mut open: Vec<TaskNode> = Vec::new();

        for visit in visits {
            while open.len() > visit.depth {
                close_top(&mut open, &mut roots);
            }
            open.push(TaskNode::new(self.tasks[visit.node].clone()));
        }
        while !open.is_empty() {
            close_top(&mut open, &mut roots);
        }

        roots
    }

    /// Owned nested nodes for the whole forest
    pub fn into_nodes(self) -> Vec<TaskNode> {
        let visits = self.walk();
        self.to_nodes(&visits)
    }
}

fn close_top(open: &mut Vec<TaskNode>, roots: &mut Vec<TaskNode>) {
    if let Some(done) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.subtasks.push(done),
            None => roots.push(done),
        }
    }
}

fn mark_reachable(starts: &[NodeId], children: &[Vec<NodeId>], reached: &mut [bool]) {
    let mut stack: Vec<NodeId> = starts.to_vec();
    while let Some(node) = stack.pop() {
        if reached[node] {
            continue;
        }
        reached[node] = true;
        stack.extend(children[node].iter().copied());
    }
}
