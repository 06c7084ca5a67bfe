//! Layout engine: assigns a box to every employee of a forest.
//!
//! Two policies are available:
//!
//! - [`LayoutPolicy::Proportional`]: horizontal trees. Every root tree gets a
//!   band of the canvas height proportional to its node count. Inside a band
//!   a Reingold-Tilford contour pass spreads siblings along the vertical axis
//!   while depth runs left to right.
//! - [`LayoutPolicy::Stacked`]: top-down trees. A node whose direct reports
//!   are all leaves stacks them in a narrow column; any other node spreads its
//!   children side by side one level down.
//!
//! Both are pure functions of the forest, the configuration and the bounds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::Forest;
use crate::domain::entities::EmployeeId;
use crate::domain::geometry::{Bounds, Rect};

/// Minimum distance between neighbouring subtrees, in contour units.
const CONTOUR_SEPARATION: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPolicy {
    #[default]
    Proportional,
    Stacked,
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutPolicy::Proportional => f.write_str("proportional"),
            LayoutPolicy::Stacked => f.write_str("stacked"),
        }
    }
}

impl FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proportional" => Ok(Self::Proportional),
            "stacked" => Ok(Self::Stacked),
            other => Err(format!("unknown layout policy: {other}")),
        }
    }
}

/// Spacing constraints for the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub policy: LayoutPolicy,
    pub node_width: f64,
    pub node_height: f64,
    /// Vertical distance between a parent box and a spread row of children.
    pub level_gap: f64,
    /// Horizontal distance between neighbouring subtrees.
    pub sibling_gap: f64,
    /// Horizontal indent of a stacked column of leaves.
    pub stack_offset: f64,
    /// Vertical distance between stacked leaves.
    pub stack_gap: f64,
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            policy: LayoutPolicy::Proportional,
            node_width: 120.0,
            node_height: 40.0,
            level_gap: 40.0,
            sibling_gap: 16.0,
            stack_offset: 24.0,
            stack_gap: 8.0,
            margin: 20.0,
        }
    }
}

/// A laid-out employee box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: EmployeeId,
    pub label: String,
    pub depth: usize,
    pub rect: Rect,
}

/// Positioned nodes of a whole forest, in pre-order (render order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    nodes: Vec<PositionedNode>,
    index: BTreeMap<EmployeeId, usize>,
}

impl Layout {
    fn from_nodes(nodes: Vec<PositionedNode>) -> Self {
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        Self { nodes, index }
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn get(&self, id: EmployeeId) -> Option<&PositionedNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn rect_of(&self, id: EmployeeId) -> Option<Rect> {
        self.get(id).map(|n| n.rect)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Smallest rectangle covering every box.
    pub fn extent(&self) -> Option<Rect> {
        self.nodes.iter().map(|n| n.rect).reduce(|a, b| a.union(&b))
    }
}

/// Left and right boundary of a subtree per level, relative to its root.
#[derive(Debug, Clone)]
struct Contour {
    left: Vec<f64>,
    right: Vec<f64>,
}

impl Contour {
    fn leaf() -> Self {
        Self {
            left: vec![0.0],
            right: vec![0.0],
        }
    }

    /// Distance `next` must move right to clear `self` on every shared level.
    fn clearance(&self, next: &Contour) -> f64 {
        self.right
            .iter()
            .zip(&next.left)
            .map(|(r, l)| r - l + CONTOUR_SEPARATION)
            .fold(f64::MIN, f64::max)
    }

    /// Merge `next`, already placed at `offset`, to the right of `self`.
    fn absorb(self, next: &Contour, offset: f64) -> Contour {
        let levels = self.left.len().max(next.left.len());
        let left = (0..levels)
            .map(|l| self.left.get(l).copied().unwrap_or_else(|| next.left[l] + offset))
            .collect();
        let right = (0..levels)
            .map(|l| {
                next.right
                    .get(l)
                    .map(|r| r + offset)
                    .unwrap_or_else(|| self.right[l])
            })
            .collect();
        Contour { left, right }
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[instrument(level = "debug", skip(self, forest), fields(nodes = forest.len(), policy = %self.config.policy))]
    pub fn layout(&self, forest: &Forest, bounds: Bounds) -> Layout {
        let rects = match self.config.policy {
            LayoutPolicy::Proportional => self.proportional(forest, bounds),
            LayoutPolicy::Stacked => self.stacked(forest, bounds),
        };

        let mut depths: HashMap<Index, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(forest.len());
        for (idx, node) in forest.iter() {
            let depth = node
                .parent
                .and_then(|p| depths.get(&p))
                .map_or(0, |d| d + 1);
            depths.insert(idx, depth);
            if let Some(rect) = rects.get(&idx) {
                nodes.push(PositionedNode {
                    id: node.data.id,
                    label: node.data.name.to_string(),
                    depth,
                    rect: *rect,
                });
            }
        }
        debug!("layout: positioned {} nodes", nodes.len());
        Layout::from_nodes(nodes)
    }

    fn proportional(&self, forest: &Forest, bounds: Bounds) -> HashMap<Index, Rect> {
        let cfg = &self.config;
        let mut rects = HashMap::new();
        let total = forest.len();
        if total == 0 {
            return rects;
        }
        let usable_width = (bounds.width - 2.0 * cfg.margin - cfg.node_width).max(0.0);
        let mut band_top = 0.0;

        for &root in forest.roots() {
            let count = forest.subtree_size(root);
            let band_height = bounds.height * count as f64 / total as f64;

            // First walk: offsets of every child relative to its parent
            let relative = self.first_walk(forest, root);

            // Second walk: accumulate into absolute breadth and depth
            let mut placed: Vec<(Index, f64, usize)> = Vec::with_capacity(count);
            let mut breadth_of: HashMap<Index, (f64, usize)> = HashMap::new();
            let mut stack = vec![root];
            while let Some(idx) = stack.pop() {
                let Some(node) = forest.get_node(idx) else {
                    continue;
                };
                let (breadth, depth) = match node.parent.and_then(|p| breadth_of.get(&p)) {
                    Some(&(pb, pd)) => (pb + relative.get(&idx).copied().unwrap_or(0.0), pd + 1),
                    None => (0.0, 0),
                };
                breadth_of.insert(idx, (breadth, depth));
                placed.push((idx, breadth, depth));
                stack.extend(node.children.iter().rev().copied());
            }

            let max_depth = placed.iter().map(|&(_, _, d)| d).max().unwrap_or(0);
            let depth_step = if max_depth == 0 {
                0.0
            } else {
                usable_width / max_depth as f64
            };
            let available = (band_height - cfg.node_height).max(0.0);
            let (lo, hi) = match placed.iter().map(|&(_, b, _)| b).minmax_by(f64::total_cmp) {
                MinMaxResult::NoElements => (0.0, 0.0),
                MinMaxResult::OneElement(b) => (b, b),
                MinMaxResult::MinMax(lo, hi) => (lo, hi),
            };

            for (idx, breadth, depth) in placed {
                let y = if hi > lo {
                    band_top + (breadth - lo) / (hi - lo) * available
                } else {
                    band_top + available / 2.0
                };
                let x = cfg.margin + depth as f64 * depth_step;
                rects.insert(idx, Rect::new(x, y, cfg.node_width, cfg.node_height));
            }
            band_top += band_height;
        }
        rects
    }

    /// Children before parents: merge each child contour into its
    /// siblings' and record the child's offset from the parent.
    fn first_walk(&self, forest: &Forest, root: Index) -> HashMap<Index, f64> {
        let mut relative = HashMap::new();
        let mut contours: HashMap<Index, Contour> = HashMap::new();

        for (idx, node) in forest.subtree_postorder(root) {
            if node.children.is_empty() {
                contours.insert(idx, Contour::leaf());
                continue;
            }

            let mut merged: Option<Contour> = None;
            let mut positions = Vec::with_capacity(node.children.len());
            for &child in &node.children {
                let contour = contours.remove(&child).unwrap_or_else(Contour::leaf);
                let (offset, next) = match merged {
                    None => (0.0, contour),
                    Some(acc) => {
                        let offset = acc.clearance(&contour);
                        (offset, acc.absorb(&contour, offset))
                    }
                };
                merged = Some(next);
                positions.push((child, offset));
            }

            // Centre the parent over its first and last child
            let first = positions.first().map_or(0.0, |&(_, p)| p);
            let last = positions.last().map_or(0.0, |&(_, p)| p);
            let mid = (first + last) / 2.0;
            for (child, offset) in positions {
                relative.insert(child, offset - mid);
            }

            let children = merged.unwrap_or_else(Contour::leaf);
            let mut left = vec![0.0];
            left.extend(children.left.iter().map(|l| l - mid));
            let mut right = vec![0.0];
            right.extend(children.right.iter().map(|r| r - mid));
            contours.insert(idx, Contour { left, right });
        }
        relative
    }

    fn stacked(&self, forest: &Forest, bounds: Bounds) -> HashMap<Index, Rect> {
        let cfg = &self.config;
        let mut rects = HashMap::new();

        // Subtree widths, children before parents
        let mut widths: HashMap<Index, f64> = HashMap::new();
        for (idx, node) in forest.iter_postorder() {
            let width = if node.children.is_empty() {
                cfg.node_width
            } else if self.all_leaves(forest, &node.children) {
                cfg.stack_offset + cfg.node_width
            } else {
                self.row_width(&node.children, &widths).max(cfg.node_width)
            };
            widths.insert(idx, width);
        }

        let total = self.row_width(forest.roots(), &widths);
        let mut left = if total + 2.0 * cfg.margin <= bounds.width {
            (bounds.width - total) / 2.0
        } else {
            cfg.margin
        };
        for &root in forest.roots() {
            self.place_stacked(forest, root, left, cfg.margin, &widths, &mut rects);
            left += widths.get(&root).copied().unwrap_or(cfg.node_width) + cfg.sibling_gap;
        }
        rects
    }

    fn place_stacked(
        &self,
        forest: &Forest,
        root: Index,
        left: f64,
        top: f64,
        widths: &HashMap<Index, f64>,
        rects: &mut HashMap<Index, Rect>,
    ) {
        let cfg = &self.config;
        let mut pending = vec![(root, left, top)];

        while let Some((idx, left, top)) = pending.pop() {
            let Some(node) = forest.get_node(idx) else {
                continue;
            };
            let width = widths.get(&idx).copied().unwrap_or(cfg.node_width);

            if node.children.is_empty() {
                rects.insert(idx, Rect::new(left, top, cfg.node_width, cfg.node_height));
                continue;
            }

            if self.all_leaves(forest, &node.children) {
                rects.insert(idx, Rect::new(left, top, cfg.node_width, cfg.node_height));
                let step = cfg.node_height + cfg.stack_gap;
                for (i, &child) in node.children.iter().enumerate() {
                    let y = top + step * (i + 1) as f64;
                    rects.insert(
                        child,
                        Rect::new(left + cfg.stack_offset, y, cfg.node_width, cfg.node_height),
                    );
                }
                continue;
            }

            let x = left + (width - cfg.node_width) / 2.0;
            rects.insert(idx, Rect::new(x, top, cfg.node_width, cfg.node_height));

            let row = self.row_width(&node.children, widths);
            let mut child_left = left + (width - row) / 2.0;
            let child_top = top + cfg.node_height + cfg.level_gap;
            for &child in &node.children {
                pending.push((child, child_left, child_top));
                child_left +=
                    widths.get(&child).copied().unwrap_or(cfg.node_width) + cfg.sibling_gap;
            }
        }
    }

    fn all_leaves(&self, forest: &Forest, children: &[Index]) -> bool {
        children
            .iter()
            .all(|&c| forest.get_node(c).is_some_and(|n| n.children.is_empty()))
    }

    fn row_width(&self, items: &[Index], widths: &HashMap<Index, f64>) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let sum: f64 = items
            .iter()
            .map(|i| widths.get(i).copied().unwrap_or(self.config.node_width))
            .sum();
        sum + self.config.sibling_gap * (items.len() - 1) as f64
    }
}
