//! Structural properties of built forests

use std::collections::HashSet;

use rstest::rstest;

use comptrack::domain::{
    Bounds, EmployeeId, FlatRow, Forest, HierarchyBuilder, LayoutConfig, LayoutEngine,
    LayoutPolicy, UnresolvedParentPolicy,
};
use comptrack::util::testing::scenario_rows;

fn builder() -> HierarchyBuilder {
    HierarchyBuilder::new(UnresolvedParentPolicy::Error)
}

/// A wide and deep org: 1 root, `fanout` reports per manager, `depth` levels.
fn generated_rows(fanout: u64, depth: u32) -> Vec<FlatRow> {
    let mut rows = vec![FlatRow::root(1, "Root", "One")];
    let mut level = vec![1u64];
    let mut next = 2u64;
    for _ in 0..depth {
        let mut below = Vec::new();
        for &manager in &level {
            for _ in 0..fanout {
                rows.push(FlatRow::reporting_to(next, "Emp", &next.to_string(), manager));
                below.push(next);
                next += 1;
            }
        }
        level = below;
    }
    rows
}

fn chain_rows(len: u64) -> Vec<FlatRow> {
    let mut rows = vec![FlatRow::root(1, "Link", "1")];
    rows.extend((2..=len).map(|id| FlatRow::reporting_to(id, "Link", &id.to_string(), id - 1)));
    rows
}

fn cases() -> Vec<Vec<FlatRow>> {
    vec![scenario_rows(), generated_rows(3, 3), chain_rows(25)]
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
fn given_forest_when_flattening_and_rebuilding_then_identical(#[case] which: usize) {
    // Arrange
    let rows = &cases()[which];
    let forest = builder().build(rows).unwrap();

    // Act
    let rebuilt = builder().build(&forest.flatten()).unwrap();

    // Assert
    assert_eq!(rebuilt, forest);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
fn given_forest_when_walking_then_every_row_reached_exactly_once(#[case] which: usize) {
    // Arrange
    let rows = &cases()[which];

    // Act
    let forest = builder().build(rows).unwrap();

    // Assert
    let seen: Vec<EmployeeId> = forest.iter().map(|(_, n)| n.data.id).collect();
    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(seen.len(), rows.len());
    assert_eq!(unique.len(), rows.len());
    forest.verify().unwrap();
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
fn given_forest_when_following_supervisors_then_chain_ends_at_a_root(#[case] which: usize) {
    let forest: Forest = builder().build(&cases()[which]).unwrap();
    let roots: HashSet<_> = forest.root_ids().into_iter().collect();

    for id in forest.ids() {
        let chain = forest.chain_of_command(id);
        assert!(chain.len() <= forest.len());
        let top = forest.root_of(id).unwrap();
        assert!(roots.contains(&top));
        assert!(!forest.is_descendant(id, id));
    }
}

#[test]
fn given_same_rows_when_building_twice_then_outline_identical() {
    let rows = generated_rows(2, 4);
    let first = builder().build(&rows).unwrap();
    let second = builder().build(&rows).unwrap();
    assert_eq!(first.outline(), second.outline());
}

#[test]
fn given_generated_org_when_building_then_size_and_depth_match() {
    // Arrange: 1 + 3 + 9 + 27
    let rows = generated_rows(3, 3);

    // Act
    let forest = builder().build(&rows).unwrap();

    // Assert
    assert_eq!(forest.len(), 40);
    assert_eq!(forest.leaf_ids().len(), 27);
    assert_eq!(forest.descendants(EmployeeId(1)).len(), 39);
}

/// Far deeper than the call stack would allow for one frame per level.
const DEEP_CHAIN: u64 = 5_000;

#[rstest]
#[case(LayoutPolicy::Proportional)]
#[case(LayoutPolicy::Stacked)]
fn given_deep_chain_when_laying_out_then_every_node_placed(#[case] policy: LayoutPolicy) {
    // Arrange
    let forest = builder().build(&chain_rows(DEEP_CHAIN)).unwrap();
    let engine = LayoutEngine::new(LayoutConfig {
        policy,
        ..LayoutConfig::default()
    });

    // Act
    let layout = engine.layout(&forest, Bounds::new(1200.0, 800.0));

    // Assert
    assert_eq!(layout.len(), DEEP_CHAIN as usize);
    let bottom = layout.get(EmployeeId(DEEP_CHAIN)).unwrap();
    assert_eq!(bottom.depth, DEEP_CHAIN as usize - 1);
}

#[test]
fn given_deep_chain_when_measuring_depth_then_one_level_per_row() {
    let forest = builder().build(&chain_rows(DEEP_CHAIN)).unwrap();

    assert_eq!(forest.depth(), DEEP_CHAIN as usize);
    assert_eq!(forest.subtree_postorder(forest.roots()[0]).count(), DEEP_CHAIN as usize);
}
