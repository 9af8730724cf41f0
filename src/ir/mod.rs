pub mod attrs;
pub mod graph;
pub mod layout;
pub mod node;
pub mod op;
pub mod printer;
pub mod tensor;
pub mod verifier;

pub use attrs::{AttrOverrides, Conv2dAttrs};
pub use graph::{Graph, GraphBuilder, GraphError};
pub use layout::{
    Axis, AxisBlock, BaseLayout, HWIO_O, HWOI_O, LayoutError, LayoutPattern, LayoutTag, NCHW_C,
    NHWC_C, OIHW_O,
};
pub use node::{Node, NodeId, ValueId};
pub use op::Op;
pub use printer::print_graph;
pub use tensor::{DataType, TensorDescriptor, TensorError};
pub use verifier::{VerifyError, verify_conv_attrs, verify_graph};
