use std::collections::{BTreeMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Division, EmployeeId, FlatRow, PersonName};
use crate::domain::error::{DomainError, DomainResult};

/// Data payload for tree nodes representing employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub id: EmployeeId,
    pub name: PersonName,
    pub division: Option<Division>,
    /// Row attributes carried through unchanged so `flatten` can restore them.
    pub row: FlatRow,
}

impl NodeData {
    pub fn from_row(row: &FlatRow) -> Self {
        Self {
            id: row.id,
            name: row.name(),
            division: row.division,
            row: row.clone(),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct OrgNode {
    /// Employee data for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, ordered by id
    pub children: Vec<Index>,
}

/// One line of a structural outline: id, supervisor, direct reports.
pub type OutlineEntry = (EmployeeId, Option<EmployeeId>, Vec<EmployeeId>);

/// Arena-based forest of employee trees.
///
/// Rebuilt from the flat relation on every fetch; never the system of record.
/// Nodes are addressed through the arena and looked up by surrogate id.
#[derive(Debug, Default)]
pub struct Forest {
    arena: Arena<OrgNode>,
    roots: Vec<Index>,
    by_id: BTreeMap<EmployeeId, Index>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent`, or as a new root when `parent` is None.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> DomainResult<Index> {
        if self.by_id.contains_key(&data.id) {
            return Err(DomainError::DuplicateIdentity(data.id));
        }
        let id = data.id;
        let node = OrgNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }
        self.by_id.insert(id, node_idx);

        Ok(node_idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&OrgNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: EmployeeId) -> Option<Index> {
        self.by_id.get(&id).copied()
    }

    pub fn get(&self, id: EmployeeId) -> Option<&OrgNode> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn contains(&self, id: EmployeeId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_ids(&self) -> Vec<EmployeeId> {
        self.roots.iter().filter_map(|&idx| self.id_at(idx)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EmployeeId> + '_ {
        self.by_id.keys().copied()
    }

    fn id_at(&self, idx: Index) -> Option<EmployeeId> {
        self.arena.get(idx).map(|n| n.data.id)
    }

    pub fn supervisor_of(&self, id: EmployeeId) -> Option<EmployeeId> {
        self.get(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.id_at(p))
    }

    pub fn children_of(&self, id: EmployeeId) -> Vec<EmployeeId> {
        self.get(id)
            .map(|n| n.children.iter().filter_map(|&c| self.id_at(c)).collect())
            .unwrap_or_default()
    }

    /// Supervisors of `id` from the immediate one up to the root of its tree.
    pub fn chain_of_command(&self, id: EmployeeId) -> Vec<EmployeeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(idx) = current {
            let Some(node) = self.arena.get(idx) else {
                break;
            };
            chain.push(node.data.id);
            current = node.parent;
        }
        chain
    }

    /// Root of the tree containing `id`.
    pub fn root_of(&self, id: EmployeeId) -> Option<EmployeeId> {
        if !self.contains(id) {
            return None;
        }
        Some(self.chain_of_command(id).last().copied().unwrap_or(id))
    }

    /// True when `candidate` lies strictly below `ancestor`.
    #[instrument(level = "trace", skip(self))]
    pub fn is_descendant(&self, ancestor: EmployeeId, candidate: EmployeeId) -> bool {
        ancestor != candidate && self.chain_of_command(candidate).contains(&ancestor)
    }

    /// All ids below `id`, in pre-order.
    pub fn descendants(&self, id: EmployeeId) -> Vec<EmployeeId> {
        let Some(start) = self.index_of(id) else {
            return Vec::new();
        };
        TreeIterator::from_roots(self, vec![start])
            .skip(1)
            .map(|(_, node)| node.data.id)
            .collect()
    }

    /// Number of nodes in the subtree rooted at `idx`, including itself.
    pub fn subtree_size(&self, idx: Index) -> usize {
        TreeIterator::from_roots(self, vec![idx]).count()
    }

    /// Resolve a display name to exactly one employee.
    pub fn resolve_name(&self, name: &PersonName) -> DomainResult<EmployeeId> {
        let candidates: Vec<EmployeeId> = self
            .arena
            .iter()
            .filter(|(_, n)| &n.data.name == name)
            .map(|(_, n)| n.data.id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        match candidates.as_slice() {
            [] => Err(DomainError::NameNotFound(name.clone())),
            [one] => Ok(*one),
            _ => Err(DomainError::AmbiguousTarget {
                name: name.clone(),
                candidates,
            }),
        }
    }

    /// Pre-order traversal over all trees, roots in id order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::from_roots(self, self.roots.clone())
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::from_roots(self, &self.roots)
    }

    /// Post-order traversal of the subtree rooted at `idx`.
    pub fn subtree_postorder(&self, idx: Index) -> PostOrderIterator<'_> {
        PostOrderIterator::from_roots(self, &[idx])
    }

    /// Number of levels of the deepest tree; 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    /// Levels in the subtree rooted at `node_idx`; 0 for an unknown index.
    pub fn calculate_depth(&self, node_idx: Index) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(node_idx, 1)];
        while let Some((idx, level)) = stack.pop() {
            let Some(node) = self.get_node(idx) else {
                continue;
            };
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|&child| (child, level + 1)));
        }
        deepest
    }

    /// Ids of nodes without direct reports, in pre-order.
    pub fn leaf_ids(&self) -> Vec<EmployeeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id)
            .collect()
    }

    /// Back to flat rows, ordered by id, with parent pointers as ids.
    pub fn flatten(&self) -> Vec<FlatRow> {
        self.by_id
            .values()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| {
                let mut row = node.data.row.clone();
                let supervisor = node
                    .parent
                    .and_then(|p| self.arena.get(p))
                    .map(|p| (p.data.id, &p.data.name));
                row.set_supervisor(supervisor);
                row
            })
            .collect()
    }

    /// Structural summary in pre-order, used for equality and diagnostics.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.iter()
            .map(|(_, node)| {
                let parent = node.parent.and_then(|p| self.id_at(p));
                let children = node
                    .children
                    .iter()
                    .filter_map(|&c| self.id_at(c))
                    .collect();
                (node.data.id, parent, children)
            })
            .collect()
    }

    /// Check the arena invariants: every node reachable exactly once from a
    /// root, parent and child links agree.
    pub fn verify(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for (idx, node) in self.iter() {
            if !seen.insert(idx) {
                return Err(DomainError::CycleDetected(node.data.id));
            }
            for &child in &node.children {
                let linked_back = self.get_node(child).and_then(|c| c.parent) == Some(idx);
                if !linked_back {
                    let id = self.id_at(child).unwrap_or(node.data.id);
                    return Err(DomainError::MalformedRow {
                        id,
                        message: "child not linked back to its parent".to_string(),
                    });
                }
            }
        }
        match self.by_id.iter().find(|(_, idx)| !seen.contains(*idx)) {
            Some((&id, _)) => Err(DomainError::CycleDetected(id)),
            None => Ok(()),
        }
    }
}

impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        self.outline() == other.outline()
            && self.iter().zip(other.iter()).all(|((_, a), (_, b))| {
                a.data.name == b.data.name && a.data.division == b.data.division
            })
    }
}

pub struct TreeIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn from_roots(forest: &'a Forest, mut roots: Vec<Index>) -> Self {
        // Stack pops from the end: reverse for left-to-right traversal
        roots.reverse();
        Self {
            forest,
            stack: roots,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn from_roots(forest: &'a Forest, roots: &[Index]) -> Self {
        let stack = roots.iter().rev().map(|&r| (r, false)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, first: &str) -> NodeData {
        NodeData::from_row(&FlatRow::root(id, first, "Test"))
    }

    fn sample() -> Forest {
        let mut forest = Forest::new();
        let a = forest.insert_node(node(1, "A"), None).unwrap();
        let b = forest.insert_node(node(2, "B"), Some(a)).unwrap();
        forest.insert_node(node(3, "C"), Some(a)).unwrap();
        forest.insert_node(node(4, "D"), Some(b)).unwrap();
        forest.insert_node(node(5, "E"), None).unwrap();
        forest
    }

    #[test]
    fn given_forest_when_iterating_then_preorder_left_to_right() {
        let forest = sample();
        let ids: Vec<u64> = forest.iter().map(|(_, n)| n.data.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4, 3, 5]);
    }

    #[test]
    fn given_forest_when_iterating_postorder_then_children_first() {
        let forest = sample();
        let ids: Vec<u64> = forest.iter_postorder().map(|(_, n)| n.data.id.0).collect();
        assert_eq!(ids, vec![4, 2, 3, 1, 5]);
    }

    #[test]
    fn given_forest_when_querying_ancestry_then_follows_parent_links() {
        let forest = sample();
        assert_eq!(
            forest.chain_of_command(EmployeeId(4)),
            vec![EmployeeId(2), EmployeeId(1)]
        );
        assert!(forest.is_descendant(EmployeeId(1), EmployeeId(4)));
        assert!(!forest.is_descendant(EmployeeId(4), EmployeeId(1)));
        assert!(!forest.is_descendant(EmployeeId(1), EmployeeId(1)));
        assert_eq!(forest.root_of(EmployeeId(4)), Some(EmployeeId(1)));
        assert_eq!(forest.root_of(EmployeeId(5)), Some(EmployeeId(5)));
    }

    #[test]
    fn given_forest_when_measuring_then_reports_depth_and_leaves() {
        let forest = sample();
        assert_eq!(forest.depth(), 3);
        assert_eq!(
            forest.leaf_ids(),
            vec![EmployeeId(4), EmployeeId(3), EmployeeId(5)]
        );
        assert_eq!(forest.subtree_size(forest.roots()[0]), 4);
        assert!(forest.verify().is_ok());
    }

    #[test]
    fn given_duplicate_id_when_inserting_then_rejects() {
        let mut forest = sample();
        let result = forest.insert_node(node(3, "Again"), None);
        assert_eq!(result, Err(DomainError::DuplicateIdentity(EmployeeId(3))));
    }

    #[test]
    fn given_empty_forest_then_depth_zero() {
        let forest = Forest::new();
        assert_eq!(forest.depth(), 0);
        assert!(forest.is_empty());
        assert!(forest.flatten().is_empty());
    }
}
