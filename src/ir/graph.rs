use thiserror::Error;

use crate::ir::node::{Node, NodeId, ValueId};
use crate::ir::op::Op;

/// Sink for the nodes a rewrite emits.
pub trait GraphBuilder {
    fn emit(&mut self, op: Op) -> Result<ValueId, GraphError>;
}

/// Append-only graph where every node produces exactly one value.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GraphError {
    pub message: String,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_op(&mut self, op: Op) -> Result<(NodeId, ValueId), GraphError> {
        let value_count = self.value_count();
        if let Some(missing) = op
            .input_values()
            .into_iter()
            .find(|value| value.0 >= value_count)
        {
            return Err(GraphError {
                message: format!(
                    "op references undefined value %{} (graph has {value_count} values)",
                    missing.0
                ),
            });
        }

        let node_id = NodeId(self.nodes.len());
        let value_id = ValueId(self.nodes.len());
        self.nodes.push(Node::new(node_id, op, value_id));
        Ok((node_id, value_id))
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.output.0)
            .max()
            .map_or(0, |max_id| max_id + 1)
    }
}

impl GraphBuilder for Graph {
    fn emit(&mut self, op: Op) -> Result<ValueId, GraphError> {
        self.add_op(op).map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DataType, TensorDescriptor};

    fn input(name: &str) -> Op {
        Op::Input {
            name: name.to_string(),
            desc: TensorDescriptor::new(vec![1, 4, 8, 8], DataType::Float32),
        }
    }

    #[test]
    fn each_op_has_single_output_value() {
        let mut graph = Graph::new();
        let (first_node, first_value) = graph.add_op(input("x")).expect("op add must succeed");
        let (second_node, second_value) = graph
            .add_op(Op::Output(first_value))
            .expect("op add must succeed");

        assert_eq!(graph.nodes[first_node.0].output, first_value);
        assert_eq!(graph.nodes[second_node.0].output, second_value);
        assert_ne!(first_value, second_value);
        assert_eq!(graph.value_count(), 2);
    }

    #[test]
    fn rejects_forward_references() {
        let mut graph = Graph::new();
        let err = graph
            .emit(Op::WinogradWeightTransform {
                weight: ValueId(3),
                tile_size: 2,
            })
            .expect_err("undefined input must be rejected");
        assert!(err.message.contains("%3"));
        assert!(graph.nodes.is_empty());
    }
}
