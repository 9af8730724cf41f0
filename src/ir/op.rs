use crate::ir::attrs::Conv2dAttrs;
use crate::ir::layout::LayoutTag;
use crate::ir::node::ValueId;
use crate::ir::tensor::TensorDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Input {
        name: String,
        desc: TensorDescriptor,
    },
    Parameter {
        name: String,
        desc: TensorDescriptor,
    },
    LayoutTransform {
        input: ValueId,
        src: LayoutTag,
        dst: LayoutTag,
    },
    /// Winograd kernel pre-transform. Produces `(alpha, alpha, CO, CI)`.
    WinogradWeightTransform {
        weight: ValueId,
        tile_size: usize,
    },
    Conv2d {
        data: ValueId,
        weight: ValueId,
        attrs: Box<Conv2dAttrs>,
    },
    /// Winograd convolution consuming an already transformed weight.
    Conv2dWinograd {
        data: ValueId,
        weight: ValueId,
        attrs: Box<Conv2dAttrs>,
    },
    Output(ValueId),
}

impl Op {
    pub fn input_values(&self) -> Vec<ValueId> {
        match self {
            Op::Conv2d { data, weight, .. } | Op::Conv2dWinograd { data, weight, .. } => {
                vec![*data, *weight]
            }
            Op::LayoutTransform { input, .. } => vec![*input],
            Op::WinogradWeightTransform { weight, .. } => vec![*weight],
            Op::Output(value) => vec![*value],
            Op::Input { .. } | Op::Parameter { .. } => Vec::new(),
        }
    }
}
