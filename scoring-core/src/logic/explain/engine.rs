use std::sync::Arc;

use super::types::{Attribution, FeatureContribution};
use crate::error::{Result, ScoringError};
use crate::logic::features::FeatureVector;
use crate::logic::model::{Forest, Node, Tree};

/// Exact per-prediction contributions (path-dependent TreeSHAP).
///
/// Each tree's background distribution is the training cover recorded at
/// every node. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Attributor {
    forest: Arc<Forest>,
    layout_hash: u32,
}

impl Attributor {
    pub fn new(forest: Arc<Forest>, layout_hash: u32) -> Self {
        Self { forest, layout_hash }
    }

    pub fn explain(&self, vector: &FeatureVector) -> Result<Attribution> {
        if vector.layout_hash() != self.layout_hash {
            return Err(ScoringError::LayoutMismatch {
                expected: self.layout_hash,
                actual: vector.layout_hash(),
            });
        }

        let phi = tree_shap(&self.forest, vector);
        let contributions = vector
            .feature_names()
            .iter()
            .zip(phi)
            .map(|(name, value)| FeatureContribution::new(name.as_str(), value))
            .collect();

        Ok(Attribution::new(contributions, self.forest.expected_margin()))
    }
}

/// Contributions for every feature of `vector`, summed over the forest
pub fn tree_shap(forest: &Forest, vector: &FeatureVector) -> Vec<f64> {
    let mut phi = vec![0.0; forest.num_features()];
    for tree in forest.trees() {
        let mut walk = ShapWalk {
            tree,
            vector,
            phi: &mut phi,
        };
        walk.recurse(0, &[], 0, 1.0, 1.0, None);
    }
    phi
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

struct ShapWalk<'a> {
    tree: &'a Tree,
    vector: &'a FeatureVector,
    phi: &'a mut [f64],
}

impl ShapWalk<'_> {
    fn recurse(
        &mut self,
        node: usize,
        parent_path: &[PathElement],
        unique_depth: usize,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        let tree = self.tree;
        let mut path = parent_path.to_vec();
        extend_path(&mut path, unique_depth, zero_fraction, one_fraction, feature);

        match tree.node(node) {
            Node::Leaf { value, .. } => {
                for i in 1..=unique_depth {
                    let weight = unwound_path_sum(&path, unique_depth, i);
                    let element = path[i];
                    if let Some(f) = element.feature {
                        self.phi[f] +=
                            weight * (element.one_fraction - element.zero_fraction) * value;
                    }
                }
            }
            Node::Split { feature: split, left, right, cover, .. } => {
                let split = *split;
                let hot = tree.next_node(node, self.vector.view()).unwrap_or(*left);
                let cold = if hot == *left { *right } else { *left };

                let (hot_zero, cold_zero) = if *cover > 0.0 {
                    (
                        tree.node(hot).cover() / cover,
                        tree.node(cold).cover() / cover,
                    )
                } else {
                    (0.5, 0.5)
                };

                // A feature seen earlier on the path is folded into one element
                let mut depth = unique_depth;
                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(index) = (0..=depth).find(|&k| path[k].feature == Some(split)) {
                    incoming_zero = path[index].zero_fraction;
                    incoming_one = path[index].one_fraction;
                    unwind_path(&mut path, depth, index);
                    depth -= 1;
                }

                self.recurse(hot, &path, depth + 1, hot_zero * incoming_zero, incoming_one, Some(split));
                self.recurse(cold, &path, depth + 1, cold_zero * incoming_zero, 0.0, Some(split));
            }
        }
    }
}

fn extend_path(
    path: &mut Vec<PathElement>,
    unique_depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path.truncate(unique_depth);
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if unique_depth == 0 { 1.0 } else { 0.0 },
    });

    let d = unique_depth as f64;
    for i in (0..unique_depth).rev() {
        let w = path[i].pweight;
        path[i + 1].pweight += one_fraction * w * (i as f64 + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * w * (d - i as f64) / (d + 1.0);
    }
}

fn unwind_path(path: &mut [PathElement], unique_depth: usize, index: usize) {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - i as f64) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - i as f64));
        }
    }

    for i in index..unique_depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

fn unwound_path_sum(path: &[PathElement], unique_depth: usize, index: usize) -> f64 {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        let share = (d - i as f64) / (d + 1.0);
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * share;
        } else if zero_fraction != 0.0 {
            total += (path[i].pweight / zero_fraction) / share;
        }
    }
    total
}
