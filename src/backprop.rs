//! Reverse-mode traversal over the graph reachable from a root [`Value`].

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::Value;

impl Value {
    /// The entry point to backpropagation.
    ///
    /// Seeds this node's gradient with 1 and accumulates `d(self)/d(node)` into every
    /// node reachable from it. Gradients of the other nodes are added to, not
    /// overwritten, so calling this twice without [`Value::zero_grad`] in between
    /// accumulates the contributions of both calls.
    pub fn backprop(&self) {
        self.set_grad(1.);

        let topo = self.topo_order();
        debug!("backprop: {} nodes in topological order", topo.len());

        let mut processed = FxHashSet::default();
        for node in topo.iter().rev() {
            if processed.insert(node.id()) {
                trace!("processing {node}");
                node.op().backward(node.data(), node.grad());
            }
        }
    }

    /// Reset the gradient of every node reachable from this one, including itself.
    pub fn zero_grad(&self) {
        for node in self.topo_order() {
            node.set_grad(0.);
        }
    }

    /// Post-order depth-first traversal: every node comes after all of its operands,
    /// and each node appears once no matter how many paths lead to it.
    pub(crate) fn topo_order(&self) -> Vec<&Value> {
        let mut topo = vec![];
        let mut visited = FxHashSet::default();
        // (node, operands already pushed)
        let mut stack = vec![(self, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                trace!("topo[{}]: {node}", topo.len());
                topo.push(node);
                continue;
            }
            if !visited.insert(node.id()) {
                continue;
            }
            stack.push((node, true));
            // Reversed so the first operand is visited first.
            for operand in node.operands().rev() {
                if !visited.contains(&operand.id()) {
                    stack.push((operand, false));
                }
            }
        }
        topo
    }
}
