//! Partitioner properties over generated rosters: every participant lands in
//! exactly one slot, slot order follows roster order, and overflow placement
//! alternates deterministically.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::types::{Participant, Role};
use layout_controller::config::Config;
use layout_controller::layout::{partition, LayoutConfig, Placement};
use lc_test_utils::{debate_roster, three_column_layout, TestParticipant};

fn arcs(roster: Vec<Participant>) -> Vec<Arc<Participant>> {
    roster.into_iter().map(Arc::new).collect()
}

/// Roles cycle through every tag plus "no role yet".
fn generated_roster(n: usize) -> Vec<Arc<Participant>> {
    let roles: Vec<Option<Role>> = Role::ALL
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None))
        .collect();

    (0..n)
        .map(|i| {
            let p = TestParticipant::new(format!("p{i}"));
            let p = match roles[i % roles.len()] {
                Some(role) => p.with_role(role),
                None => p,
            };
            Arc::new(p.build())
        })
        .collect()
}

#[test]
fn test_reference_scenario() {
    let config = LayoutConfig::builder()
        .slot("left")
        .slot("center")
        .slot("right")
        .map_role(Role::SideA, "left")
        .map_role(Role::SideB, "right")
        .map_role(Role::Arbiter, "center")
        .overflow_role(Role::Unassigned)
        .overflow_slot("left")
        .overflow_slot("right")
        .default_slot("center")
        .build()
        .unwrap();

    let roster = arcs(vec![
        TestParticipant::new("1").side_a().build(),
        TestParticipant::new("2").side_b().build(),
        TestParticipant::new("3").arbiter().build(),
        TestParticipant::new("4").with_role(Role::Unassigned).build(),
        TestParticipant::new("5").with_role(Role::Unassigned).build(),
    ]);

    let assignment = partition(&roster, &config);

    assert_eq!(assignment.slot("left").unwrap().ids(), vec!["1", "4"]);
    assert_eq!(assignment.slot("center").unwrap().ids(), vec!["3"]);
    assert_eq!(assignment.slot("right").unwrap().ids(), vec!["2", "5"]);
}

#[test]
fn test_debate_view() {
    let assignment = partition(&arcs(debate_roster()), &three_column_layout());

    let names: Vec<_> = assignment.slots().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["left", "center", "right"]);

    let left = assignment.slot("left").unwrap();
    assert_eq!(left.ids(), vec!["neg-1", "neg-2", "solo-1", "guest-1"]);
    assert!(left.hidden().is_empty());

    let center = assignment.slot("center").unwrap();
    assert_eq!(center.capacity, Some(2));
    assert_eq!(center.visible().len(), 2);
    assert_eq!(center.visible()[0].id.as_str(), "judge-1");
    assert_eq!(center.hidden().len(), 1);
    assert_eq!(center.hidden()[0].id.as_str(), "judge-3");

    assert_eq!(
        assignment.slot("right").unwrap().ids(),
        vec!["aff-1", "aff-2", "solo-2"]
    );

    // Media flags pass through unchanged
    assert!(left.participants[0].media.video_enabled);
    assert!(!left.participants[1].media.video_enabled);
}

#[test]
fn test_every_participant_placed_exactly_once() {
    let config = three_column_layout();

    for n in 0..40 {
        let roster = generated_roster(n);
        let assignment = partition(&roster, &config);

        assert_eq!(assignment.participant_count(), n, "roster size {n}");

        let mut seen = HashSet::new();
        for slot in assignment.slots() {
            for p in &slot.participants {
                assert!(seen.insert(p.id.clone()), "{} placed twice", p.id);
            }
        }
        for p in &roster {
            assert!(seen.contains(&p.id), "{} dropped", p.id);
        }
    }
}

#[test]
fn test_slot_order_follows_roster_order() {
    let config = three_column_layout();
    let roster = generated_roster(30);
    let position: HashMap<_, _> = roster
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();

    for slot in partition(&roster, &config).slots() {
        let indices: Vec<_> = slot.participants.iter().map(|p| position[&p.id]).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted, "slot {} out of roster order", slot.name);
    }
}

#[test]
fn test_overflow_alternates_fairly() {
    let config = three_column_layout();

    for n in 0..20usize {
        let roster = arcs(
            (0..n)
                .map(|i| TestParticipant::new(format!("s{i}")).solo().build())
                .collect(),
        );
        let assignment = partition(&roster, &config);

        let left = assignment.slot("left").unwrap();
        let right = assignment.slot("right").unwrap();
        assert_eq!(left.len(), n.div_ceil(2));
        assert_eq!(right.len(), n / 2);
        assert!(assignment.slot("center").unwrap().is_empty());

        for (k, p) in roster.iter().enumerate() {
            let expected = if k % 2 == 0 { "left" } else { "right" };
            assert_eq!(assignment.slot_of(&p.id), Some(expected));
        }
    }
}

#[test]
fn test_overflow_counter_ignores_fixed_roles() {
    let config = three_column_layout();
    let roster = arcs(vec![
        TestParticipant::new("u1").build(),
        TestParticipant::new("a1").side_a().build(),
        TestParticipant::new("b1").side_b().build(),
        TestParticipant::new("u2").build(),
    ]);

    let assignment = partition(&roster, &config);

    assert_eq!(assignment.slot("left").unwrap().ids(), vec!["u1", "a1"]);
    assert_eq!(assignment.slot("right").unwrap().ids(), vec!["b1", "u2"]);
}

#[test]
fn test_partition_is_deterministic() {
    let config = three_column_layout();
    let roster = generated_roster(25);

    let first = partition(&roster, &config);
    let second = partition(&roster.clone(), &config.clone());

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_unmapped_role_falls_back_to_default_slot() {
    let config = LayoutConfig::builder()
        .slot("left")
        .slot("stage")
        .slot("right")
        .map_role(Role::SideA, "left")
        .map_role(Role::SideB, "right")
        .overflow_slot("left")
        .overflow_slot("right")
        .default_slot("stage")
        .build()
        .unwrap();

    assert_eq!(config.placement(Some(Role::Arbiter)), Placement::Default("stage"));
    assert_eq!(config.placement(Some(Role::Solo)), Placement::Default("stage"));
    assert_eq!(config.placement(None), Placement::Overflow);

    let assignment = partition(&arcs(debate_roster()), &config);
    assert_eq!(
        assignment.slot("stage").unwrap().ids(),
        vec!["judge-1", "solo-1", "judge-2", "solo-2", "judge-3"]
    );
    assert_eq!(assignment.participant_count(), debate_roster().len());
}

#[test]
fn test_default_config_is_three_column_view() {
    let config = Config::from_vars(&HashMap::new()).unwrap();
    assert_eq!(config.layout, three_column_layout());
}
