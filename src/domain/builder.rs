//! Tree builder converting the flat employee/supervisor relation into a forest.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::arena::{Forest, NodeData};
use crate::domain::entities::{EmployeeId, FlatRow, ParentRef, PersonName};
use crate::domain::error::{DomainError, DomainResult};

/// What to do with a row whose supervisor cannot be found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedParentPolicy {
    /// Reject the whole relation.
    #[default]
    Error,
    /// Treat the row as the root of its own tree.
    Promote,
}

impl fmt::Display for UnresolvedParentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedParentPolicy::Error => f.write_str("error"),
            UnresolvedParentPolicy::Promote => f.write_str("promote"),
        }
    }
}

impl FromStr for UnresolvedParentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "promote" => Ok(Self::Promote),
            other => Err(format!("unknown unresolved-parent policy: {other}")),
        }
    }
}

/// Constructs forests from flat rows.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    policy: UnresolvedParentPolicy,
}

impl HierarchyBuilder {
    pub fn new(policy: UnresolvedParentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnresolvedParentPolicy {
        self.policy
    }

    /// Build the forest for an unordered set of rows.
    ///
    /// Fails on duplicate ids, self-parenting, ambiguous supervisor names,
    /// cycles, and (under [`UnresolvedParentPolicy::Error`]) rows whose
    /// supervisor does not exist. Roots and children are ordered by id.
    #[instrument(level = "debug", skip(self, rows), fields(rows = rows.len()))]
    pub fn build(&self, rows: &[FlatRow]) -> DomainResult<Forest> {
        let by_id = index_rows(rows)?;
        let names = index_names(rows);

        // Resolve every parent reference to a surrogate id
        let mut children: BTreeMap<EmployeeId, Vec<EmployeeId>> = BTreeMap::new();
        let mut roots = Vec::new();
        for (&id, row) in &by_id {
            match self.resolve_parent(row, &by_id, &names)? {
                Some(parent) => children.entry(parent).or_default().push(id),
                None => roots.push(id),
            }
        }

        // Cycle detection: if we have rows but no root nodes, there's a cycle
        if roots.is_empty() {
            if let Some(&first) = by_id.keys().next() {
                return Err(DomainError::CycleDetected(first));
            }
        }

        let mut forest = Forest::new();
        let mut visited = HashSet::new();
        for root in roots {
            self.build_tree(&mut forest, root, &by_id, &children, &mut visited)?;
        }

        // Rows never reached from a root hang off a cycle
        if let Some(&orphan) = by_id.keys().find(|id| !visited.contains(*id)) {
            return Err(DomainError::CycleDetected(orphan));
        }

        debug!(
            "build: {} nodes in {} trees",
            forest.len(),
            forest.roots().len()
        );
        Ok(forest)
    }

    fn resolve_parent(
        &self,
        row: &FlatRow,
        by_id: &BTreeMap<EmployeeId, &FlatRow>,
        names: &BTreeMap<PersonName, Vec<EmployeeId>>,
    ) -> DomainResult<Option<EmployeeId>> {
        let Some(parent_ref) = row.parent_ref()? else {
            return Ok(None);
        };

        let resolved = match &parent_ref {
            ParentRef::Id(parent) => by_id.contains_key(parent).then_some(*parent),
            ParentRef::Name(name) => match names.get(name).map(Vec::as_slice) {
                None | Some([]) => None,
                Some([one]) => Some(*one),
                Some(many) => {
                    return Err(DomainError::AmbiguousTarget {
                        name: name.clone(),
                        candidates: many.to_vec(),
                    })
                }
            },
        };

        match resolved {
            Some(parent) if parent == row.id => Err(DomainError::SelfReference(row.id)),
            Some(parent) => Ok(Some(parent)),
            None => match self.policy {
                UnresolvedParentPolicy::Error => Err(DomainError::UnresolvedParent {
                    employee: row.id,
                    parent: parent_ref.to_string(),
                }),
                UnresolvedParentPolicy::Promote => {
                    warn!(
                        "supervisor {} of {} not found, promoting to root",
                        parent_ref, row.id
                    );
                    Ok(None)
                }
            },
        }
    }

    fn build_tree(
        &self,
        forest: &mut Forest,
        root: EmployeeId,
        by_id: &BTreeMap<EmployeeId, &FlatRow>,
        children: &BTreeMap<EmployeeId, Vec<EmployeeId>>,
        visited: &mut HashSet<EmployeeId>,
    ) -> DomainResult<()> {
        let mut stack = vec![(root, None)];

        while let Some((current, parent_idx)) = stack.pop() {
            if !visited.insert(current) {
                return Err(DomainError::CycleDetected(current));
            }
            let row = by_id
                .get(&current)
                .ok_or(DomainError::EmployeeNotFound(current))?;
            let current_idx = forest.insert_node(NodeData::from_row(row), parent_idx)?;

            // Push in reverse so children are inserted in ascending id order
            if let Some(reports) = children.get(&current) {
                for &child in reports.iter().rev() {
                    stack.push((child, Some(current_idx)));
                }
            }
        }
        Ok(())
    }
}

fn index_rows(rows: &[FlatRow]) -> DomainResult<BTreeMap<EmployeeId, &FlatRow>> {
    let mut by_id = BTreeMap::new();
    for row in rows {
        if by_id.insert(row.id, row).is_some() {
            return Err(DomainError::DuplicateIdentity(row.id));
        }
    }
    Ok(by_id)
}

fn index_names(rows: &[FlatRow]) -> BTreeMap<PersonName, Vec<EmployeeId>> {
    let mut names: BTreeMap<PersonName, Vec<EmployeeId>> = BTreeMap::new();
    for row in rows {
        names.entry(row.name()).or_default().push(row.id);
    }
    for ids in names.values_mut() {
        ids.sort();
    }
    names
}
