use super::{DecisionTree, SplitRule, TreeNode};
use linfa::Float;
use std::fmt;

/// Struct to print a fitted decision tree in LaTex using tikz and forest.
///
/// ### Usage
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_cart::DecisionTree;
/// use ndarray::array;
///
/// let dataset = Dataset::new(array![[1.], [2.], [3.]], array![0usize, 0, 1]);
/// // Fit the tree
/// let tree = DecisionTree::params().fit(&dataset).unwrap();
/// // Export to tikz
/// let tikz = tree.export_to_tikz().with_legend();
/// let latex_tree = tikz.to_string();
/// // Now you can write latex_tree to the preferred destination
/// assert!(latex_tree.contains("x_{0} < 2.50"));
/// ```
pub struct Tikz<'a, F: Float> {
    legend: bool,
    complete: bool,
    tree: &'a DecisionTree<F>,
}

impl<'a, F: Float> Tikz<'a, F> {
    pub fn new(tree: &'a DecisionTree<F>) -> Self {
        Tikz {
            legend: false,
            complete: true,
            tree,
        }
    }

    fn format_node(&self, node: &TreeNode<F>) -> String {
        let depth = vec![""; node.depth() + 1].join("\t");
        match node {
            TreeNode::Terminal {
                prediction,
                n_samples,
                ..
            } => format!(
                "{}[Label: {} \\\\ Samples: {}]",
                depth, prediction, n_samples
            ),
            TreeNode::Internal {
                feature_idx,
                split,
                impurity_decrease,
                left,
                right,
                ..
            } => {
                let rule = match split {
                    SplitRule::Real { threshold } => {
                        format!("$x_{{{}}} < {:.2}$", feature_idx, threshold)
                    }
                    SplitRule::Categorical { left_categories } => {
                        let categories = left_categories
                            .iter()
                            .map(|category| category.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("$x_{{{}}} \\in \\{{{}\\}}$", feature_idx, categories)
                    }
                };

                let mut out = format!(
                    "{}[{} \\\\ Imp. ${:.2}$",
                    depth, rule, impurity_decrease
                );
                for child in [left, right].iter() {
                    out.push('\n');
                    out.push_str(&self.format_node(child));
                }
                out.push(']');

                out
            }
        }
    }

    fn legend(&self) -> String {
        if self.legend {
            let mut out = "\n".to_string();
            for (idx, feature_type) in self.tree.feature_types().iter().enumerate() {
                out.push_str(&format!("% $x_{{{}}}$: {}\n", idx, feature_type));
            }
            out
        } else {
            "".to_string()
        }
    }

    /// Whether a complete Tex document should be generated
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;

        self
    }

    /// Add a legend listing the type of every feature
    pub fn with_legend(mut self) -> Self {
        self.legend = true;

        self
    }
}

impl<'a, F: Float> fmt::Display for Tikz<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = if self.complete {
            String::from(
                r#"
\documentclass[margin=10pt]{standalone}
\usepackage{tikz,forest}
\usetikzlibrary{arrows.meta}

\forestset{
default preamble={
before typesetting nodes={
  !r.replace by={[, coordinate, append]}
},
where n children=0{
  tier=word,
}{
},
where level=0{}{
  if n=1{
    edge label={node[pos=.2, above] {Y}},
  }{
    edge label={node[pos=.2, above] {N}},
  }
},
for tree={
  edge+={thick, -Latex},
  s sep'+=2cm,
  draw,
  thick,
  edge path'={ (!u) -| (.parent)},
  align=center,
}
}
}

\begin{document}
"#,
            )
        } else {
            String::new()
        };

        out.push_str(&self.legend());
        out.push_str("\\begin{forest}\n");
        out.push_str(&self.format_node(self.tree.root_node()));
        out.push_str("\n\t\\end{forest}");
        if self.complete {
            out.push_str("\n\\end{document}");
        }

        write!(f, "{}", out)
    }
}
