use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A node in a fitted decision tree. Children are indices into
/// [`DecisionTree::nodes`] and always point past their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Rows with `row[feature] <= threshold` go to `left`.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Fraction of training rows per class that reached this leaf.
    Leaf { distribution: Vec<f32> },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub n_classes: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features drawn per split.
    pub max_features: usize,
}

/// Gini-impurity classification tree stored as a flat node array with the
/// root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Grow a tree over `rows` (indices into `x`/`y`, duplicates allowed).
    pub(crate) fn grow<R: Rng>(
        x: &[Vec<f32>],
        y: &[usize],
        rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        let mut builder = Builder {
            x,
            y,
            params,
            features: (0..n_features).collect(),
        };
        Self {
            nodes: builder.build(rows, rng),
        }
    }

    /// Leaf class distribution reached by `row`.
    pub fn leaf_distribution(&self, row: &[f32]) -> &[f32] {
        let mut index = 0;
        while let Some(node) = self.nodes.get(index) {
            match node {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
        &[]
    }

    /// Longest root-to-leaf path; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                let next = depths[index] + 1;
                for child in [*left, *right] {
                    if let Some(slot) = depths.get_mut(child) {
                        *slot = next;
                        max = max.max(next);
                    }
                }
            }
        }
        max
    }

    /// Every child index points forward and in bounds, split features are
    /// below `n_features`, and leaves carry `n_classes` entries.
    pub fn is_well_formed(&self, n_features: usize, n_classes: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(index, node)| match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < n_features
                        && [*left, *right]
                            .iter()
                            .all(|&child| child > index && child < self.nodes.len())
                }
                TreeNode::Leaf { distribution } => distribution.len() == n_classes,
            })
    }
}

struct Builder<'a> {
    x: &'a [Vec<f32>],
    y: &'a [usize],
    params: &'a TreeParams,
    features: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f32,
    /// Weighted child impurity `n_left * gini_left + n_right * gini_right`.
    score: f64,
}

/// Outcome of trying to split one node's rows.
enum Grown {
    Leaf(TreeNode),
    Split {
        split: BestSplit,
        left_rows: Vec<usize>,
        right_rows: Vec<usize>,
    },
}

/// Rows still waiting to become the node at `index`.
struct Pending {
    index: usize,
    rows: Vec<usize>,
    depth: usize,
}

impl Builder<'_> {
    /// Depth-first growth with an explicit stack, left subtree first.
    fn build<R: Rng>(&mut self, rows: Vec<usize>, rng: &mut R) -> Vec<TreeNode> {
        let mut nodes = vec![placeholder()];
        let mut stack = vec![Pending {
            index: 0,
            rows,
            depth: 0,
        }];
        while let Some(Pending { index, rows, depth }) = stack.pop() {
            nodes[index] = match self.try_split(rows, depth, rng) {
                Grown::Split {
                    split,
                    left_rows,
                    right_rows,
                } => {
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(placeholder());
                    nodes.push(placeholder());
                    stack.push(Pending {
                        index: right,
                        rows: right_rows,
                        depth: depth + 1,
                    });
                    stack.push(Pending {
                        index: left,
                        rows: left_rows,
                        depth: depth + 1,
                    });
                    TreeNode::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    }
                }
                Grown::Leaf(leaf) => leaf,
            };
        }
        nodes
    }

    /// Partition `rows` on the best split, or return the leaf they form.
    fn try_split<R: Rng>(&mut self, rows: Vec<usize>, depth: usize, rng: &mut R) -> Grown {
        let counts = self.class_counts(&rows);
        let n = rows.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || n < self.params.min_samples_split.max(2) {
            return Grown::Leaf(leaf(&counts, n));
        }

        let Some(split) = self.find_split(&rows, &counts, rng) else {
            return Grown::Leaf(leaf(&counts, n));
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return Grown::Leaf(leaf(&counts, n));
        }
        Grown::Split {
            split,
            left_rows,
            right_rows,
        }
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.params.n_classes];
        for &i in rows {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Visit features in random order. After `max_features` non-constant
    /// features have been scored, stop as soon as a valid split exists.
    fn find_split<R: Rng>(
        &mut self,
        rows: &[usize],
        counts: &[usize],
        rng: &mut R,
    ) -> Option<BestSplit> {
        self.features.shuffle(rng);
        let parent_score = rows.len() as f64 * gini(counts, rows.len());
        let mut best: Option<BestSplit> = None;
        let mut visited = 0usize;
        let features = self.features.clone();
        for feature in features {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }
            let Some(candidate) = self.best_split_for_feature(rows, counts, feature) else {
                continue;
            };
            visited += 1;
            if candidate.score < parent_score - 1e-12
                && best.is_none_or(|b| candidate.score < b.score)
            {
                best = Some(candidate);
            }
        }
        best
    }

    /// Best threshold on one feature, or `None` if the feature is constant
    /// over `rows`.
    fn best_split_for_feature(
        &self,
        rows: &[usize],
        counts: &[usize],
        feature: usize,
    ) -> Option<BestSplit> {
        let mut sorted: Vec<(f32, usize)> =
            rows.iter().map(|&i| (self.x[i][feature], self.y[i])).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let first = sorted.first()?.0;
        let last = sorted.last()?.0;
        if first >= last {
            return None;
        }

        let n = sorted.len();
        let mut left = vec![0usize; counts.len()];
        let mut best: Option<BestSplit> = None;
        for pos in 1..n {
            left[sorted[pos - 1].1] += 1;
            let (lo, hi) = (sorted[pos - 1].0, sorted[pos].0);
            if lo >= hi {
                continue;
            }
            let right: Vec<usize> = counts.iter().zip(&left).map(|(c, l)| c - l).collect();
            let score = pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos);
            if best.is_none_or(|b| score < b.score) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
        best
    }
}

fn placeholder() -> TreeNode {
    TreeNode::Leaf {
        distribution: Vec::new(),
    }
}

fn leaf(counts: &[usize], n: usize) -> TreeNode {
    let total = n.max(1) as f32;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f32 / total).collect(),
    }
}

/// Gini impurity `1 - sum(p_i^2)` of a class histogram.
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(max_features: usize) -> TreeParams {
        TreeParams {
            n_classes: 2,
            max_depth: None,
            min_samples_split: 2,
            max_features,
        }
    }

    #[test]
    fn gini_of_pure_and_even_sets() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn splits_on_the_informative_feature() {
        // Feature 0 is noise, feature 1 separates the classes at 5.
        let x = vec![
            vec![3.0, 1.0],
            vec![1.0, 2.0],
            vec![2.0, 3.0],
            vec![3.0, 7.0],
            vec![1.0, 8.0],
            vec![2.0, 9.0],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::grow(&x, &y, (0..6).collect(), &params(2), &mut rng);
        match &tree.nodes[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 1);
                assert!((*threshold - 5.0).abs() < 1e-6);
            }
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }
        assert_eq!(tree.nodes.len(), 3);
        assert!(tree.is_well_formed(2, 2));
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_distribution(&[0.0, 2.5]), &[1.0, 0.0]);
        assert_eq!(tree.leaf_distribution(&[0.0, 6.0]), &[0.0, 1.0]);
    }

    #[test]
    fn inseparable_rows_become_a_mixed_leaf() {
        let x = vec![vec![1.0], vec![1.0], vec![1.0], vec![1.0]];
        let y = vec![0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::grow(&x, &y, (0..4).collect(), &params(1), &mut rng);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.leaf_distribution(&[1.0]), &[0.25, 0.75]);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32]).collect();
        let y = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let limited = TreeParams {
            max_depth: Some(2),
            ..params(1)
        };
        let mut rng = StdRng::seed_from_u64(5);
        let tree = DecisionTree::grow(&x, &y, (0..8).collect(), &limited, &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn deep_tree_fits_every_row_and_survives_json() {
        // Alternating labels on a single ordered feature force a long chain
        // of splits.
        let x: Vec<Vec<f32>> = (0..400).map(|i| vec![i as f32]).collect();
        let y: Vec<usize> = (0..400).map(|i| i % 2).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let tree = DecisionTree::grow(&x, &y, (0..400).collect(), &params(1), &mut rng);
        assert!(tree.is_well_formed(1, 2));
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(tree.leaf_distribution(row)[label], 1.0);
        }

        let text = serde_json::to_string(&tree).unwrap();
        let back: DecisionTree = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn depth_follows_chained_splits() {
        // Each split sends the left side to a leaf and the right side deeper.
        let mut nodes = Vec::new();
        for level in 0..300 {
            let base = 2 * level;
            nodes.push(TreeNode::Split {
                feature: 0,
                threshold: level as f32,
                left: base + 1,
                right: base + 2,
            });
            nodes.push(TreeNode::Leaf {
                distribution: vec![1.0, 0.0],
            });
        }
        nodes.push(TreeNode::Leaf {
            distribution: vec![0.0, 1.0],
        });
        let tree = DecisionTree { nodes };
        assert_eq!(tree.depth(), 300);
        assert!(tree.is_well_formed(1, 2));
        assert_eq!(tree.leaf_distribution(&[10.0]), &[1.0, 0.0]);
        assert_eq!(tree.leaf_distribution(&[1000.0]), &[0.0, 1.0]);
    }

    #[test]
    fn malformed_trees_are_detected() {
        let backwards = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(!backwards.is_well_formed(1, 2));
        assert!(!DecisionTree { nodes: Vec::new() }.is_well_formed(1, 2));
        let short_leaf = DecisionTree {
            nodes: vec![TreeNode::Leaf {
                distribution: vec![1.0],
            }],
        };
        assert!(!short_leaf.is_well_formed(1, 2));
    }
}
