use super::*;
use crate::test_fixtures::{state, three_scale_model};
use crate::model::{Scale, State};

fn link(graph: &ScaleGraph, source: StateNo, target: StateNo) -> Option<&Link> {
    graph
        .links
        .iter()
        .find(|link| link.source == source && link.target == target)
}

#[test]
fn finest_scale_links_are_filtered_and_classified() {
    let model = three_scale_model();
    let graphs = aggregate_model(&model, &LayoutConfig::default(), 0.1).expect("aggregate");
    assert_eq!(graphs.len(), 3);
    let finest = &graphs[0];

    assert_eq!(link(finest, 0, 0).map(|l| l.kind), Some(LinkKind::SelfLoop));
    assert_eq!(link(finest, 0, 1).map(|l| l.kind), Some(LinkKind::Bidirect));
    assert_eq!(link(finest, 1, 0).map(|l| l.kind), Some(LinkKind::Bidirect));
    assert_eq!(link(finest, 1, 3).map(|l| l.kind), Some(LinkKind::Bidirect));
    assert_eq!(link(finest, 3, 1).map(|l| l.kind), Some(LinkKind::Bidirect));
    // 2 -> 0 is 0.05, so the forward edge stays one-way.
    assert_eq!(link(finest, 0, 2).map(|l| l.kind), Some(LinkKind::Single));
    assert!(link(finest, 2, 0).is_none());
    assert!(link(finest, 2, 1).is_none());
    assert_eq!(finest.links.len(), 8);
}

#[test]
fn state_with_every_transition_below_threshold_emits_nothing() {
    let model = three_scale_model();
    let graphs = aggregate_model(&model, &LayoutConfig::default(), 0.95).expect("aggregate");
    let finest = &graphs[0];
    for state_no in 0..4 {
        assert_eq!(finest.links_from(state_no).count(), 0, "state {state_no}");
    }
    // The lone root still has its certain self-loop.
    assert_eq!(graphs[2].links.len(), 1);
    assert_eq!(graphs[2].links[0].kind, LinkKind::SelfLoop);
}

#[test]
fn threshold_is_inclusive() {
    let model = three_scale_model();
    let candidates = candidate_links(&model, 0, 0.3).expect("candidates");
    assert!(
        candidates
            .iter()
            .any(|c| c.source == 0 && c.target == 1 && c.probability == 0.3)
    );
}

#[test]
fn self_loop_is_self_at_zero_threshold() {
    let model = Model {
        scales: vec![Scale {
            are_these_initial_states: true,
            states: vec![state(5, 1.0, &[0.0])],
        }],
        ..Model::default()
    };
    let graphs = aggregate_model(&model, &LayoutConfig::default(), 0.0).expect("aggregate");
    assert_eq!(graphs[0].links.len(), 1);
    assert_eq!(graphs[0].links[0].kind, LinkKind::SelfLoop);
}

#[test]
fn bidirect_requires_both_directions_in_candidate_set() {
    let candidates = [
        CandidateLink {
            source: 1,
            target: 2,
            probability: 0.4,
        },
        CandidateLink {
            source: 2,
            target: 3,
            probability: 0.4,
        },
        CandidateLink {
            source: 2,
            target: 1,
            probability: 0.4,
        },
    ];
    let links = classify_links(&candidates);
    assert_eq!(links[0].kind, LinkKind::Bidirect);
    assert_eq!(links[1].kind, LinkKind::Single);
    assert_eq!(links[2].kind, LinkKind::Bidirect);
}

#[test]
fn nodes_carry_label_radius_and_color() {
    let model = three_scale_model();
    let config = LayoutConfig {
        max_node_radius: 10.0,
        ..LayoutConfig::default()
    };
    let graphs = aggregate_model(&model, &config, 0.1).expect("aggregate");
    let idle = graphs[0].node(0).expect("node 0");
    assert_eq!(idle.label, "idle");
    assert!((idle.radius - 3.0).abs() < 1e-12);
    assert_eq!(idle.color, crate::common::PALETTE[0]);
    let mid = graphs[1].node(11).expect("node 11");
    assert_eq!(mid.label, "11");
    assert_eq!(mid.initial_states, vec![2, 3]);
}

#[test]
fn invalid_threshold_and_vector_length_are_errors() {
    let model = three_scale_model();
    assert_eq!(
        aggregate_model(&model, &LayoutConfig::default(), 1.5).unwrap_err(),
        LayoutError::InvalidThreshold(1.5)
    );
    assert!(matches!(
        aggregate_model(&model, &LayoutConfig::default(), f64::NAN),
        Err(LayoutError::InvalidThreshold(_))
    ));

    let mut broken = three_scale_model();
    broken.scales[1].states[0] = State {
        transition_probabilities: vec![1.0],
        ..broken.scales[1].states[0].clone()
    };
    assert_eq!(
        candidate_links(&broken, 1, 0.1).unwrap_err(),
        LayoutError::TransitionLength {
            scale_ix: 1,
            state_no: 10,
            expected: 2,
            actual: 1,
        }
    );
    assert!(matches!(
        candidate_links(&model, 7, 0.1),
        Err(LayoutError::UnknownScale {
            scale_ix: 7,
            count: 3
        })
    ));
}
