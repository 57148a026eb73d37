//! Growth applied to node dimensions from elapsed simulated time.
//!
//! Every node whose `stage` lies strictly below the gate time has its
//! `length` and `radius` changed by `rate(kind) * time * time_scale`.
//! Base nodes never grow.
//!
//! [`advance_growth`] is the incremental form used while a clock runs: it
//! only counts the part of each tick that lies past a node's stage, so
//! ticks in reverse retrace forward growth.

use tracing::debug;

use crate::{
    config::GrowthConfig,
    node::{LSystemGeneration, LSystemNode, NodeType},
};

/// Growth rate per [`NodeType`], indexed by ordinal.
const GROWTH_RATES: [f32; 6] = [0.0, 0.100, 0.050, 0.010, 0.005, 0.001];

/// Growth units per scaled time unit for `kind`.
pub fn growth_rate(kind: NodeType) -> f32 {
    GROWTH_RATES[kind.ordinal() as usize]
}

/// Changes the dimensions of every eligible node.
///
/// A node is eligible when `gate_time` is strictly greater than its
/// `stage` and its kind has a non-zero rate. Eligible nodes change by
/// `rate * delta * cfg.time_scale`; `delta` may be negative. If
/// `cfg.min_dimension` is set, both dimensions are clamped to it afterwards.
///
/// ### Parameters
/// - `generations` - History whose nodes are grown in place.
/// - `gate_time` - Time compared against each node's `stage`.
/// - `delta` - Signed amount of time to grow by.
/// - `cfg` - Time scale and optional dimension floor.
///
/// ### Returns
/// The number of nodes that were eligible.
pub fn apply_growth(
    generations: &mut [LSystemGeneration],
    gate_time: f64,
    delta: f64,
    cfg: &GrowthConfig,
) -> usize {
    let mut changed = 0;

    for node in generations.iter_mut().flatten() {
        let rate = growth_rate(node.kind);
        let past_stage = gate_time > f64::from(node.stage);
        if rate == 0.0 || !past_stage {
            continue;
        }
        grow(node, rate * delta as f32 * cfg.time_scale, cfg);
        changed += 1;
    }

    debug!(changed, gate_time, delta, "applied growth");
    changed
}

/// Grows every node by the part of `from..to` that lies past its stage.
///
/// Each node changes by `rate * (max(to, stage) - max(from, stage))`,
/// scaled by `cfg.time_scale`. Running an interval backwards (`to < from`)
/// undoes exactly what running it forwards did, so a clock that goes
/// forward and then back to its start returns every node to its starting
/// size (as long as the floor never clamped).
///
/// ### Parameters
/// - `generations` - History whose nodes are grown in place.
/// - `from` - Clock time growth was last applied at.
/// - `to` - Current clock time.
/// - `cfg` - Time scale and optional dimension floor.
///
/// ### Returns
/// The number of nodes whose dimensions changed.
pub fn advance_growth(
    generations: &mut [LSystemGeneration],
    from: f64,
    to: f64,
    cfg: &GrowthConfig,
) -> usize {
    let mut changed = 0;

    for node in generations.iter_mut().flatten() {
        let rate = growth_rate(node.kind);
        let stage = f64::from(node.stage);
        let span = to.max(stage) - from.max(stage);
        if rate == 0.0 || span == 0.0 {
            continue;
        }
        grow(node, rate * span as f32 * cfg.time_scale, cfg);
        changed += 1;
    }

    debug!(changed, from, to, "advanced growth");
    changed
}

fn grow(node: &mut LSystemNode, amount: f32, cfg: &GrowthConfig) {
    node.length += amount;
    node.radius += amount;

    if let Some(floor) = cfg.min_dimension {
        node.length = node.length.max(floor);
        node.radius = node.radius.max(floor);
    }
}

/// Grows every node whose stage has been passed by `elapsed_time`.
pub fn simulate_growth(
    generations: &mut [LSystemGeneration],
    elapsed_time: f64,
    cfg: &GrowthConfig,
) -> usize {
    apply_growth(generations, elapsed_time, elapsed_time, cfg)
}

/// Shrinks every node whose stage has been passed by `elapsed_time`.
pub fn simulate_negative_growth(
    generations: &mut [LSystemGeneration],
    elapsed_time: f64,
    cfg: &GrowthConfig,
) -> usize {
    apply_growth(generations, elapsed_time, -elapsed_time, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeType, stage: f32) -> LSystemNode {
        let mut n = LSystemNode::new_root(0, kind);
        n.stage = stage;
        n.length = 1.0;
        n.radius = 0.5;
        n
    }

    fn unclamped() -> GrowthConfig {
        GrowthConfig {
            min_dimension: None,
            ..GrowthConfig::default()
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn rates_follow_the_type_table() {
        assert_eq!(growth_rate(NodeType::Base), 0.0);
        assert_eq!(growth_rate(NodeType::Forward), 0.100);
        assert_eq!(growth_rate(NodeType::Branch), 0.050);
        assert_eq!(growth_rate(NodeType::Twig), 0.010);
        assert_eq!(growth_rate(NodeType::Leaf), 0.005);
        assert_eq!(growth_rate(NodeType::Decal), 0.001);
    }

    #[test]
    fn growth_increases_nodes_past_their_stage() {
        let mut gens = vec![vec![
            node(NodeType::Forward, 0.0),
            node(NodeType::Twig, 100.0),
        ]];
        let elapsed = 2_000_000.0; // scaled: 2.0

        let changed = simulate_growth(&mut gens, elapsed, &GrowthConfig::default());

        assert_eq!(changed, 2);
        assert!(approx(gens[0][0].length, 1.0 + 0.1 * 2.0));
        assert!(approx(gens[0][0].radius, 0.5 + 0.1 * 2.0));
        assert!(approx(gens[0][1].length, 1.0 + 0.01 * 2.0));
        assert!(approx(gens[0][1].radius, 0.5 + 0.01 * 2.0));
    }

    #[test]
    fn nodes_at_or_beyond_the_gate_are_unchanged() {
        let mut gens = vec![vec![
            node(NodeType::Forward, 5.0),
            node(NodeType::Leaf, 10.0),
        ]];

        let changed = simulate_growth(&mut gens, 5.0, &GrowthConfig::default());

        assert_eq!(changed, 0);
        assert_eq!(gens[0][0].length, 1.0);
        assert_eq!(gens[0][1].radius, 0.5);
    }

    #[test]
    fn base_nodes_never_grow() {
        let mut gens = vec![vec![node(NodeType::Base, 0.0)]];
        assert_eq!(simulate_growth(&mut gens, 1.0e9, &GrowthConfig::default()), 0);
        assert_eq!(gens[0][0], node(NodeType::Base, 0.0));
    }

    #[test]
    fn growth_spans_every_generation() {
        let mut gens = vec![
            vec![node(NodeType::Branch, 0.0)],
            vec![],
            vec![node(NodeType::Decal, 0.0), node(NodeType::Decal, 0.0)],
        ];

        assert_eq!(simulate_growth(&mut gens, 1.0e6, &GrowthConfig::default()), 3);
        assert!(approx(gens[2][1].length, 1.001));
    }

    #[test]
    fn negative_growth_mirrors_growth() {
        let mut gens = vec![vec![node(NodeType::Forward, 0.0)]];
        simulate_growth(&mut gens, 1.0e6, &unclamped());
        simulate_negative_growth(&mut gens, 1.0e6, &unclamped());

        assert!(approx(gens[0][0].length, 1.0));
        assert!(approx(gens[0][0].radius, 0.5));
    }

    #[test]
    fn unclamped_negative_growth_goes_below_zero() {
        let mut gens = vec![vec![node(NodeType::Forward, 0.0)]];

        // Shrinks by 0.1 * 10 = 1.0: radius 0.5 -> -0.5.
        simulate_negative_growth(&mut gens, 10.0e6, &unclamped());

        assert!(approx(gens[0][0].length, 0.0));
        assert!(approx(gens[0][0].radius, -0.5));
    }

    #[test]
    fn floor_clamps_negative_growth() {
        let mut gens = vec![vec![node(NodeType::Forward, 0.0)]];

        simulate_negative_growth(&mut gens, 10.0e6, &GrowthConfig::default());

        assert_eq!(gens[0][0].radius, 0.0);
        assert!(gens[0][0].length >= 0.0);
    }

    #[test]
    fn apply_growth_separates_gate_from_amount() {
        let mut gens = vec![vec![
            node(NodeType::Forward, 1.0),
            node(NodeType::Forward, 3.0),
        ]];
        let cfg = GrowthConfig {
            time_scale: 1.0,
            min_dimension: None,
        };

        // Gate at t = 2 passes only the first node; amount is the delta.
        let changed = apply_growth(&mut gens, 2.0, -0.5, &cfg);

        assert_eq!(changed, 1);
        assert!(approx(gens[0][0].length, 1.0 - 0.05));
        assert_eq!(gens[0][1].length, 1.0);
    }

    #[test]
    fn advance_growth_counts_only_time_past_the_stage() {
        let mut gens = vec![vec![
            node(NodeType::Forward, 2.5),
            node(NodeType::Forward, 10.0),
        ]];
        let cfg = GrowthConfig {
            time_scale: 1.0,
            min_dimension: None,
        };

        // 2.0 -> 3.0 crosses the first stage halfway.
        let changed = advance_growth(&mut gens, 2.0, 3.0, &cfg);

        assert_eq!(changed, 1);
        assert!(approx(gens[0][0].length, 1.0 + 0.1 * 0.5));
        assert_eq!(gens[0][1].length, 1.0);
    }

    #[test]
    fn advance_growth_reversed_interval_undoes_itself() {
        let mut gens = vec![vec![node(NodeType::Branch, 1.25), node(NodeType::Leaf, 0.0)]];
        let start = gens.clone();
        let cfg = GrowthConfig {
            time_scale: 1.0,
            min_dimension: None,
        };

        let mut t = 0.0;
        for _ in 0..20 {
            advance_growth(&mut gens, t, t + 0.1, &cfg);
            t += 0.1;
        }
        for _ in 0..20 {
            advance_growth(&mut gens, t, t - 0.1, &cfg);
            t -= 0.1;
        }

        for (a, b) in gens[0].iter().zip(&start[0]) {
            assert!((a.length - b.length).abs() < 1e-5, "{} vs {}", a.length, b.length);
            assert!((a.radius - b.radius).abs() < 1e-5);
        }
    }
}
