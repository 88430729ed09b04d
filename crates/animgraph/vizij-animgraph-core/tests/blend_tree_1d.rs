use vizij_animgraph_core::{
    AnimTrack, AnimTree, BlendChildDef, BlendKind, BlendTreeDef, NodeIndex, ParamValue,
    ParameterStore, ParameterType, Point, TreeNode,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn tree_at(points: &[f32]) -> AnimTree {
    let children = points
        .iter()
        .enumerate()
        .map(|(i, p)| BlendChildDef::clip(format!("c{i}"), Point::Scalar(*p)))
        .collect();
    AnimTree::from_def("Blend", &BlendTreeDef::new(BlendKind::OneD, &["v"], children))
        .expect("valid tree")
}

fn params(v: f32) -> ParameterStore {
    let mut store = ParameterStore::new();
    store.define("v", ParameterType::Float, ParamValue::Float(v));
    store
}

fn child_weights(tree: &AnimTree) -> Vec<f32> {
    tree.node(tree.root())
        .and_then(TreeNode::as_blend)
        .expect("root is a blend node")
        .children()
        .iter()
        .map(|c| tree.node(*c).expect("child").weight())
        .collect()
}

fn weights(points: &[f32], v: f32) -> Vec<f32> {
    let mut tree = tree_at(points);
    tree.calculate_weights(&params(v));
    child_weights(&tree)
}

/// it should split weight between the two children bracketing the value
#[test]
fn interpolates_between_bracketing_children() {
    assert_eq!(weights(&[0.0, 1.0, 2.0], 0.5), vec![0.5, 0.5, 0.0]);
}

/// it should share weight evenly between children on the same point
#[test]
fn duplicate_points_share_weight() {
    assert_eq!(weights(&[0.0, 1.0, 1.0, 2.0], 1.0), vec![0.0, 0.5, 0.5, 0.0]);
}

/// it should split each side of the bracket evenly among children on the same point
#[test]
fn duplicate_points_share_their_side_of_the_bracket() {
    assert_eq!(weights(&[0.0, 0.0, 1.0], 0.5), vec![0.25, 0.25, 0.5]);
    assert_eq!(weights(&[0.0, 1.0, 1.0, 2.0], 0.5), vec![0.5, 0.25, 0.25, 0.0]);
    assert_eq!(weights(&[0.0, 1.0, 1.0, 2.0], 1.5), vec![0.0, 0.25, 0.25, 0.5]);
}

/// it should not clamp values below the first point
#[test]
fn below_range_leaves_everything_unweighted() {
    assert_eq!(weights(&[0.0, 5.0], -3.0), vec![0.0, 0.0]);
}

/// it should hand full weight to a child sitting exactly on the value
#[test]
fn exact_points_receive_full_weight() {
    let points = [0.0, 1.0, 2.0, 4.0];
    for (i, p) in points.iter().enumerate() {
        let w = weights(&points, *p);
        for (j, wj) in w.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            approx(*wj, expected, 1e-6);
        }
    }
}

/// it should keep within-range weights summing to one
#[test]
fn weights_partition_the_range() {
    let points = [-2.0, -0.5, 0.0, 3.0];
    for step in 0..=100 {
        let v = (-2.0 + step as f32 * 0.05).min(3.0);
        let sum: f32 = weights(&points, v).iter().sum();
        approx(sum, 1.0, 1e-6);
    }
}

/// it should sort children by point regardless of authored order
#[test]
fn authored_order_does_not_matter() {
    let mut tree = AnimTree::from_def(
        "Blend",
        &BlendTreeDef::new(
            BlendKind::OneD,
            &["v"],
            vec![
                BlendChildDef::clip("High", Point::Scalar(2.0)),
                BlendChildDef::clip("Low", Point::Scalar(0.0)),
            ],
        ),
    )
    .unwrap();
    tree.calculate_weights(&params(0.5));
    let low = tree.find(&["Low"]).unwrap();
    let high = tree.find(&["High"]).unwrap();
    approx(tree.effective_weight(low), 0.75, 1e-6);
    approx(tree.effective_weight(high), 0.25, 1e-6);
}

/// it should make every weighted clip loop in the same wall time
#[test]
fn synchronised_clips_share_a_cycle() {
    let mut tree = tree_at(&[0.0, 1.0, 2.0]);
    let durations = [1.5_f32, 0.8, 0.4];
    let clips: Vec<NodeIndex> = tree.clips().collect();
    for (clip, d) in clips.iter().zip(durations) {
        assert!(tree.set_track(*clip, Some(AnimTrack::shared("clip", d))));
    }

    for v in [0.2_f32, 0.7, 1.3, 1.9] {
        tree.calculate_weights(&params(v));
        let sum = tree
            .node(tree.root())
            .and_then(TreeNode::as_blend)
            .unwrap()
            .weighted_duration();
        for clip in &clips {
            let node = tree.node(*clip).unwrap();
            if node.weight() == 0.0 {
                continue;
            }
            let duration = tree.track(*clip).unwrap().duration;
            approx(duration / tree.playback_speed(*clip), sum, 1e-5);
        }
    }
}

/// it should leave speeds untouched while the value is out of range
#[test]
fn empty_sync_sum_keeps_unit_speed() {
    let mut tree = tree_at(&[0.0, 1.0]);
    let clips: Vec<NodeIndex> = tree.clips().collect();
    for clip in &clips {
        tree.set_track(*clip, Some(AnimTrack::shared("clip", 1.0)));
    }
    tree.calculate_weights(&params(7.0));
    for clip in &clips {
        assert_eq!(tree.node(*clip).unwrap().weighted_speed(), 1.0);
    }
}
