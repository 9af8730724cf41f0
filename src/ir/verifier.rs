use thiserror::Error;

use crate::ir::{Axis, BaseLayout, Conv2dAttrs, Graph, Op};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct VerifyError {
    pub message: String,
}

pub fn verify_graph(graph: &Graph) -> Result<(), VerifyError> {
    for (index, node) in graph.nodes.iter().enumerate() {
        if node.id.0 != index {
            return Err(err(format!(
                "Node id mismatch at index {index}: node.id={}",
                node.id.0
            )));
        }
        for input in node.op.input_values() {
            if input.0 >= node.output.0 {
                return Err(err(format!(
                    "Node {index} uses %{} before it is defined",
                    input.0
                )));
            }
        }
        let checked = match &node.op {
            Op::Conv2d { attrs, .. } => verify_conv_attrs(attrs, false),
            Op::Conv2dWinograd { attrs, .. } => verify_conv_attrs(attrs, true),
            Op::WinogradWeightTransform { tile_size: 0, .. } => {
                Err(err("Winograd weight transform needs a positive tile size"))
            }
            _ => Ok(()),
        };
        checked.map_err(|inner| err(format!("{} (at node {index})", inner.message)))?;
    }
    Ok(())
}

/// Checks that a conv node's attributes describe one coherent layout family.
pub fn verify_conv_attrs(attrs: &Conv2dAttrs, winograd: bool) -> Result<(), VerifyError> {
    if attrs.strides.contains(&0) || attrs.dilation.contains(&0) || attrs.groups == 0 {
        return Err(err(format!(
            "strides {:?}, dilation {:?} and groups {} must be positive",
            attrs.strides, attrs.dilation, attrs.groups
        )));
    }

    let data = attrs.data_layout;
    if !data.base().is_data_layout() {
        return Err(err(format!("data layout {data} is not a data layout")));
    }
    if let Some(block) = data.block()
        && block.axis != Axis::C
    {
        return Err(err(format!("data layout {data} must block the channel axis")));
    }

    let out = attrs.effective_out_layout();
    if out.base() != data.base() {
        return Err(err(format!(
            "out layout {out} does not share the base of data layout {data}"
        )));
    }
    if data.is_blocked() && !out.is_blocked() {
        return Err(err(format!(
            "blocked data layout {data} requires a blocked out layout, got {out}"
        )));
    }

    let kernel = attrs.kernel_layout;
    let kernel_fits = match (data.base(), kernel.base()) {
        (BaseLayout::Nchw, BaseLayout::Oihw) => true,
        (BaseLayout::Nchw, BaseLayout::Hwio) => winograd,
        (BaseLayout::Nhwc, BaseLayout::Hwio | BaseLayout::Hwoi) => true,
        _ => false,
    };
    if !kernel_fits {
        return Err(err(format!(
            "kernel layout {kernel} does not fit data layout {data}"
        )));
    }
    if let Some(block) = kernel.block()
        && block.axis != Axis::O
    {
        return Err(err(format!(
            "kernel layout {kernel} must block the output-channel axis"
        )));
    }

    if winograd {
        if attrs.is_dilated() {
            return Err(err(format!(
                "winograd node carries dilation {:?}",
                attrs.dilation
            )));
        }
        if attrs.tile_size.is_none() || attrs.channels.is_none() {
            return Err(err("winograd node needs tile_size and channels"));
        }
    }

    Ok(())
}

fn err(message: impl Into<String>) -> VerifyError {
    VerifyError {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AttrOverrides, DataType, LayoutTag, TensorDescriptor, ValueId};

    fn tag(text: &str) -> LayoutTag {
        text.parse().expect("layout")
    }

    #[test]
    fn accepts_blocked_channel_major_attrs() {
        let attrs = Conv2dAttrs::nchw().with_overrides(AttrOverrides::new().channels(32).layouts(
            tag("NCHW4c"),
            tag("OIHW4o"),
            tag("NCHW4c"),
        ));
        assert!(verify_conv_attrs(&attrs, false).is_ok());
    }

    #[test]
    fn rejects_mixed_families() {
        let attrs = Conv2dAttrs::new(tag("NHWC"), tag("OIHW"));
        let err = verify_conv_attrs(&attrs, false).expect_err("NHWC with OIHW");
        assert!(err.message.contains("does not fit"));
    }

    #[test]
    fn winograd_requires_tile_size() {
        let attrs = Conv2dAttrs::nchw().with_overrides(AttrOverrides::new().channels(8));
        assert!(verify_conv_attrs(&attrs, true).is_err());

        let attrs = attrs.with_overrides(AttrOverrides::new().tile_size(2));
        assert!(verify_conv_attrs(&attrs, true).is_ok());
    }

    #[test]
    fn graph_check_reports_offending_node() {
        let mut graph = Graph::new();
        let (_, data) = graph
            .add_op(Op::Input {
                name: "data".to_string(),
                desc: TensorDescriptor::new(vec![1, 16, 8, 8], DataType::Float16),
            })
            .expect("input");
        graph
            .add_op(Op::WinogradWeightTransform {
                weight: data,
                tile_size: 0,
            })
            .expect("transform");
        let err = verify_graph(&graph).expect_err("zero tile size");
        assert!(err.message.contains("at node 1"));

        graph.nodes.truncate(1);
        graph
            .add_op(Op::Conv2d {
                data,
                weight: ValueId(0),
                attrs: Box::new(Conv2dAttrs::nchw()),
            })
            .expect("conv");
        assert!(verify_graph(&graph).is_ok());
    }
}
