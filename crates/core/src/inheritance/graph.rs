use crate::error::CycleError;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rescope_api::ProjectId;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
struct ProjectNode {
    id: ProjectId,
    /// False for ids that are only referenced as a parent.
    known: bool,
}

/// Ancestors of a project, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain {
    pub ancestors: Vec<ProjectId>,
    /// First id in the declared chain that is not a known project.
    pub missing: Option<ProjectId>,
}

/// Parent links between projects. Edges point from child to parent and never form a cycle.
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    graph: StableDiGraph<ProjectNode, ()>,
    index: HashMap<ProjectId, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, id: &ProjectId) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(ProjectNode {
            id: id.clone(),
            known: false,
        });
        self.index.insert(id.clone(), idx);
        idx
    }

    pub fn add_project(&mut self, id: &ProjectId) {
        let idx = self.node(id);
        self.graph[idx].known = true;
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.index
            .get(id)
            .map(|&idx| self.graph[idx].known)
            .unwrap_or(false)
    }

    /// Known projects, sorted.
    pub fn projects(&self) -> Vec<ProjectId> {
        let mut ids: Vec<_> = self
            .graph
            .node_weights()
            .filter(|n| n.known)
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Declared parent, whether or not it is a known project.
    pub fn parent_of(&self, id: &ProjectId) -> Option<ProjectId> {
        let &idx = self.index.get(id)?;
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .next()
            .map(|p| self.graph[p].id.clone())
    }

    /// Replace a project's parent link.
    ///
    /// A link that would close a cycle is rejected and the graph is left unchanged.
    /// On success the project is registered as known.
    pub fn set_parent(
        &mut self,
        project: &ProjectId,
        parent: Option<&ProjectId>,
    ) -> Result<(), CycleError> {
        if let Some(parent) = parent {
            let closes_cycle = parent == project
                || match (self.index.get(parent), self.index.get(project)) {
                    (Some(&p), Some(&c)) => has_path_connecting(&self.graph, p, c, None),
                    _ => false,
                };
            if closes_cycle {
                return Err(CycleError {
                    project: project.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let child = self.node(project);
        self.graph[child].known = true;
        let previous = self.detach(child);

        if let Some(parent) = parent {
            let p = self.node(parent);
            self.graph.add_edge(child, p, ());
        }
        for old in previous {
            self.prune(old);
        }
        Ok(())
    }

    /// Forget a project. Its children keep pointing at it and now see a missing ancestor.
    pub fn remove_project(&mut self, id: &ProjectId) {
        let Some(&idx) = self.index.get(id) else {
            return;
        };
        self.graph[idx].known = false;
        let previous = self.detach(idx);
        self.prune(idx);
        for old in previous {
            self.prune(old);
        }
    }

    pub fn ancestor_chain(&self, id: &ProjectId) -> Vec<ProjectId> {
        self.chain(id).ancestors
    }

    /// Walk parent links, stopping at the first unknown id.
    pub fn chain(&self, id: &ProjectId) -> AncestorChain {
        let mut chain = AncestorChain::default();
        let Some(&start) = self.index.get(id) else {
            return chain;
        };
        let mut visited = HashSet::from([start]);
        let mut current = start;
        while let Some(next) = self
            .graph
            .neighbors_directed(current, Direction::Outgoing)
            .next()
        {
            let node = &self.graph[next];
            if !node.known {
                chain.missing = Some(node.id.clone());
                break;
            }
            if !visited.insert(next) {
                break;
            }
            chain.ancestors.push(node.id.clone());
            current = next;
        }
        chain
    }

    pub fn children(&self, id: &ProjectId) -> Vec<ProjectId> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|c| self.graph[c].id.clone())
            .collect();
        out.sort();
        out
    }

    /// Every project that inherits from `id`, directly or transitively, sorted.
    pub fn descendants(&self, id: &ProjectId) -> Vec<ProjectId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(idx) = queue.pop_front() {
            for child in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if seen.insert(child) {
                    out.push(self.graph[child].id.clone());
                    queue.push_back(child);
                }
            }
        }
        out.sort();
        out
    }

    /// Drop outgoing edges of `idx`, returning the former targets.
    fn detach(&mut self, idx: NodeIndex) -> Vec<NodeIndex> {
        let edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges
            .into_iter()
            .map(|(edge, target)| {
                self.graph.remove_edge(edge);
                target
            })
            .collect()
    }

    /// Remove an unknown node nobody references any more.
    fn prune(&mut self, idx: NodeIndex) {
        let Some(node) = self.graph.node_weight(idx) else {
            return;
        };
        if node.known
            || self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_some()
        {
            return;
        }
        let id = node.id.clone();
        let previous = self.detach(idx);
        self.graph.remove_node(idx);
        self.index.remove(&id);
        for old in previous {
            self.prune(old);
        }
    }
}
