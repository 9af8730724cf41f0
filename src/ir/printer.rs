use crate::ir::{Conv2dAttrs, Graph, Op, ValueId};

pub fn print_graph(graph: &Graph) -> String {
    let mut lines = Vec::new();
    for node in &graph.nodes {
        lines.push(format!("%{} = {}", node.output.0, format_op(&node.op)));
    }
    lines.join("\n")
}

fn format_op(op: &Op) -> String {
    match op {
        Op::Input { name, desc } => format!("input {name} {desc}"),
        Op::Parameter { name, desc } => format!("parameter {name} {desc}"),
        Op::LayoutTransform { input, src, dst } => {
            format!("layout_transform {} {src}->{dst}", fmt_value(*input))
        }
        Op::WinogradWeightTransform { weight, tile_size } => format!(
            "winograd_weight_transform {} tile_size={tile_size}",
            fmt_value(*weight)
        ),
        Op::Conv2d {
            data,
            weight,
            attrs,
        } => format!(
            "conv2d {} {} {}",
            fmt_value(*data),
            fmt_value(*weight),
            fmt_attrs(attrs)
        ),
        Op::Conv2dWinograd {
            data,
            weight,
            attrs,
        } => format!(
            "conv2d_winograd_without_weight_transform {} {} {}",
            fmt_value(*data),
            fmt_value(*weight),
            fmt_attrs(attrs)
        ),
        Op::Output(value) => format!("output {}", fmt_value(*value)),
    }
}

fn fmt_attrs(attrs: &Conv2dAttrs) -> String {
    let mut parts = vec![
        format!("data_layout={}", attrs.data_layout),
        format!("kernel_layout={}", attrs.kernel_layout),
        format!("out_layout={}", attrs.effective_out_layout()),
        format!("strides={:?}", attrs.strides),
        format!("padding={:?}", attrs.padding),
        format!("dilation={:?}", attrs.dilation),
    ];
    if let Some([kernel_h, kernel_w]) = attrs.kernel_size {
        parts.push(format!("kernel_size=[{kernel_h}, {kernel_w}]"));
    }
    if let Some(channels) = attrs.channels {
        parts.push(format!("channels={channels}"));
    }
    if let Some(tile_size) = attrs.tile_size {
        parts.push(format!("tile_size={tile_size}"));
    }
    format!("[{}]", parts.join(", "))
}

fn fmt_value(value: ValueId) -> String {
    format!("%{}", value.0)
}

#[cfg(test)]
mod tests {
    use crate::ir::{Conv2dAttrs, DataType, Graph, Op, TensorDescriptor, print_graph};

    #[test]
    fn prints_one_line_per_node() {
        let mut graph = Graph::new();
        let (_, data) = graph
            .add_op(Op::Input {
                name: "data".to_string(),
                desc: TensorDescriptor::new(vec![1, 16, 8, 8], DataType::Float16),
            })
            .expect("input");
        let (_, kernel) = graph
            .add_op(Op::Parameter {
                name: "kernel".to_string(),
                desc: TensorDescriptor::new(vec![32, 16, 3, 3], DataType::Float16),
            })
            .expect("parameter");
        let mut attrs = Conv2dAttrs::nchw();
        attrs.kernel_size = Some([3, 3]);
        graph
            .add_op(Op::Conv2d {
                data,
                weight: kernel,
                attrs: Box::new(attrs),
            })
            .expect("conv");

        let printed = print_graph(&graph);
        let lines = printed.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "%0 = input data [1, 16, 8, 8]:float16");
        assert!(lines[2].starts_with("%2 = conv2d %0 %1 [data_layout=NCHW, kernel_layout=OIHW"));
        assert!(lines[2].contains("dilation=[1, 1], kernel_size=[3, 3]"));
    }
}
