use std::collections::VecDeque;
use std::iter::Iterator;

use super::TreeNode;
use linfa::Float;

/// Level-order (BFT) iterator of nodes in a decision tree, left children before right ones
pub struct NodeIter<'a, F> {
    queue: VecDeque<&'a TreeNode<F>>,
}

impl<'a, F> NodeIter<'a, F> {
    pub fn new(queue: VecDeque<&'a TreeNode<F>>) -> Self {
        NodeIter { queue }
    }
}

impl<'a, F: Float> Iterator for NodeIter<'a, F> {
    type Item = &'a TreeNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front().map(|node| {
            if let Some((left, right)) = node.children() {
                self.queue.push_back(left);
                self.queue.push_back(right);
            }

            node
        })
    }
}
