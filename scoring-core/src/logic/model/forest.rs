//! Tree Ensemble - XGBoost native JSON model
//!
//! Loads `Booster.save_model("model.json")` output (gbtree, binary:logistic)
//! into a flat node representation that both the scorer and the attributor
//! walk. The JSON keeps per-node cover (`sum_hessian`), which exact
//! TreeSHAP needs and which ONNX exports drop.

use ndarray::ArrayView1;
use serde::Deserialize;

// ============================================================================
// XGBOOST JSON DOCUMENT
// ============================================================================

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: XgbLearner,
}

#[derive(Debug, Deserialize)]
struct XgbLearner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: XgbBooster,
    learner_model_param: XgbModelParam,
    objective: XgbObjective,
}

#[derive(Debug, Deserialize)]
struct XgbModelParam {
    base_score: String,
    num_feature: String,
    #[serde(default)]
    num_class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XgbObjective {
    name: String,
}

#[derive(Debug, Deserialize)]
struct XgbBooster {
    name: String,
    #[serde(default)]
    model: Option<XgbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct XgbTreeModel {
    trees: Vec<XgbTree>,
}

#[derive(Debug, Deserialize)]
struct XgbTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    sum_hessian: Vec<f64>,
}

/// `default_left` is ints in older dumps, bools in newer ones
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

/// One regression tree; node 0 is the root, children always follow parents
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    /// Cover-weighted mean leaf value below each node
    node_means: Vec<f64>,
}

impl Tree {
    /// Build from nodes, checking that every link points forward and in range
    pub fn new(nodes: Vec<Node>, num_features: usize) -> Result<Self, String> {
        if nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in nodes.iter().enumerate() {
            if let Node::Split { feature, left, right, .. } = node {
                if *feature >= num_features {
                    return Err(format!(
                        "node {} splits on feature {} but the model has {} features",
                        i, feature, num_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= i || child >= nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
        }

        let node_means = compute_node_means(&nodes);
        Ok(Self { nodes, node_means })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Expected output under the training distribution (cover-weighted)
    pub fn expected_value(&self) -> f64 {
        self.node_means[0]
    }

    /// Child taken by `x` at a split node
    pub fn next_node(&self, index: usize, x: ArrayView1<'_, f32>) -> Option<usize> {
        match &self.nodes[index] {
            Node::Leaf { .. } => None,
            Node::Split { feature, threshold, left, right, default_left, .. } => {
                let value = x[*feature];
                let go_left = if value.is_nan() { *default_left } else { value < *threshold };
                Some(if go_left { *left } else { *right })
            }
        }
    }

    /// Leaf value reached by `x`
    pub fn predict(&self, x: ArrayView1<'_, f32>) -> f64 {
        let mut index = 0;
        while let Some(next) = self.next_node(index, x) {
            index = next;
        }
        match &self.nodes[index] {
            Node::Leaf { value, .. } => *value,
            Node::Split { .. } => 0.0,
        }
    }
}

fn compute_node_means(nodes: &[Node]) -> Vec<f64> {
    let mut means = vec![0.0; nodes.len()];
    // Children have larger indices, so a reverse sweep sees them first
    for i in (0..nodes.len()).rev() {
        means[i] = match &nodes[i] {
            Node::Leaf { value, .. } => *value,
            Node::Split { left, right, cover, .. } => {
                let (lc, rc) = (nodes[*left].cover(), nodes[*right].cover());
                let total = if *cover > 0.0 { *cover } else { lc + rc };
                if total > 0.0 {
                    (lc * means[*left] + rc * means[*right]) / total
                } else {
                    0.5 * (means[*left] + means[*right])
                }
            }
        };
    }
    means
}

/// Gradient-boosted binary classifier: margin = base_margin + Σ tree outputs
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    base_margin: f64,
    num_features: usize,
    feature_names: Vec<String>,
}

impl Forest {
    pub fn new(trees: Vec<Tree>, base_margin: f64, num_features: usize) -> Self {
        Self {
            trees,
            base_margin,
            num_features,
            feature_names: Vec::new(),
        }
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self, String> {
        let doc: XgbDocument = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        let learner = doc.learner;

        if learner.objective.name != "binary:logistic" {
            return Err(format!(
                "unsupported objective '{}', expected binary:logistic",
                learner.objective.name
            ));
        }
        if learner.gradient_booster.name != "gbtree" {
            return Err(format!(
                "unsupported booster '{}', expected gbtree",
                learner.gradient_booster.name
            ));
        }
        if let Some(num_class) = &learner.learner_model_param.num_class {
            let classes: usize = parse_number(num_class, "num_class")?;
            if classes > 1 {
                return Err(format!("multiclass model ({} classes) is not supported", classes));
            }
        }

        let num_features: usize = parse_number(&learner.learner_model_param.num_feature, "num_feature")?;
        let base_score: f64 = parse_number(&learner.learner_model_param.base_score, "base_score")?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(format!("base_score {} is outside (0, 1)", base_score));
        }

        let raw_trees = learner
            .gradient_booster
            .model
            .ok_or_else(|| "gbtree model section is missing".to_string())?
            .trees;

        let trees = raw_trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| convert_tree(raw, num_features).map_err(|e| format!("tree {}: {}", i, e)))
            .collect::<Result<Vec<_>, _>>()?;

        if !learner.feature_names.is_empty() && learner.feature_names.len() != num_features {
            return Err(format!(
                "model lists {} feature names but num_feature is {}",
                learner.feature_names.len(),
                num_features
            ));
        }

        Ok(Self {
            trees,
            base_margin: logit(base_score),
            num_features,
            feature_names: learner.feature_names,
        })
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn base_margin(&self) -> f64 {
        self.base_margin
    }

    /// Feature names embedded by the trainer, empty when absent
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw log-odds output
    pub fn margin(&self, x: ArrayView1<'_, f32>) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Margin of the average input (bias of the attribution)
    pub fn expected_margin(&self) -> f64 {
        self.base_margin + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }
}

fn convert_tree(raw: XgbTree, num_features: usize) -> Result<Tree, String> {
    let n = raw.left_children.len();
    if raw.right_children.len() != n
        || raw.split_indices.len() != n
        || raw.split_conditions.len() != n
        || raw.default_left.len() != n
        || raw.sum_hessian.len() != n
    {
        return Err(format!("node arrays disagree in length (expected {})", n));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let (left, right) = (raw.left_children[i], raw.right_children[i]);
        let cover = raw.sum_hessian[i];

        if left < 0 {
            nodes.push(Node::Leaf {
                value: raw.split_conditions[i] as f64,
                cover,
            });
            continue;
        }

        let feature = usize::try_from(raw.split_indices[i])
            .map_err(|_| format!("node {} has negative split index", i))?;
        let right = usize::try_from(right).map_err(|_| format!("node {} has no right child", i))?;

        nodes.push(Node::Split {
            feature,
            threshold: raw.split_conditions[i],
            left: left as usize,
            right,
            default_left: raw.default_left[i].is_set(),
            cover,
        });
    }

    Tree::new(nodes, num_features)
}

/// Numbers are stored as strings, sometimes wrapped as `[5E-1]`
fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse::<T>()
        .map_err(|_| format!("{} '{}' is not a number", what, raw))
}

pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

// ============================================================================
// TESTS
// ============================================================================
