use tracing::debug;

use crate::alter::texture::Rewrite;
use crate::alter::{AlterError, AlterKind, Altered};
use crate::ir::{
    AttrOverrides, Axis, BaseLayout, GraphBuilder, HWIO_O, HWOI_O, LayoutPattern, LayoutTag,
    NCHW_C, NHWC_C, OIHW_O, Op, TensorDescriptor,
};

/// Inner block size texture kernels vectorise channels by.
pub const CHANNEL_BLOCK: usize = 4;

/// `channels mod 4`, or 4 when that remainder is zero.
pub fn derive_block(channels: usize) -> usize {
    match channels % CHANNEL_BLOCK {
        0 => CHANNEL_BLOCK,
        remainder => remainder,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBlocks {
    pub in_channel: usize,
    pub num_filter: usize,
}

impl ChannelBlocks {
    pub fn derive(in_channels: usize, out_channels: usize) -> Self {
        Self {
            in_channel: derive_block(in_channels),
            num_filter: derive_block(out_channels),
        }
    }

    /// Both channel counts split into whole blocks of [`CHANNEL_BLOCK`].
    pub fn is_favorable(&self) -> bool {
        self.in_channel == CHANNEL_BLOCK && self.num_filter == CHANNEL_BLOCK
    }
}

/// Data layout plus the kernel layouts a blocked template accepts with it.
#[derive(Debug, Clone, Copy)]
pub struct BlockedFamily {
    pub data: BaseLayout,
    pub data_pattern: LayoutPattern,
    pub kernels: &'static [(BaseLayout, LayoutPattern)],
}

pub const CHANNEL_MAJOR: BlockedFamily = BlockedFamily {
    data: BaseLayout::Nchw,
    data_pattern: NCHW_C,
    kernels: &[(BaseLayout::Oihw, OIHW_O)],
};

pub const CHANNEL_MINOR: BlockedFamily = BlockedFamily {
    data: BaseLayout::Nhwc,
    data_pattern: NHWC_C,
    kernels: &[(BaseLayout::Hwio, HWIO_O), (BaseLayout::Hwoi, HWOI_O)],
};

impl BlockedFamily {
    fn accepts_plain(&self, data: &LayoutTag, kernel: &LayoutTag) -> bool {
        *data == LayoutTag::plain(self.data)
            && !kernel.is_blocked()
            && self.kernels.iter().any(|(base, _)| *base == kernel.base())
    }

    /// Blocked data and output in the family's data pattern, with a blocked
    /// kernel the family accepts.
    fn accepts_blocked(&self, data: &LayoutTag, kernel: &LayoutTag, out: &LayoutTag) -> bool {
        self.data_pattern.matches(data)
            && self.data_pattern.matches(out)
            && self
                .kernels
                .iter()
                .any(|(_, pattern)| pattern.matches(kernel))
    }

    fn describe_blocked(&self) -> String {
        let kernels = self
            .kernels
            .iter()
            .map(|(_, pattern)| pattern.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        format!(
            "{pattern} data and output with {kernels} kernel",
            pattern = self.data_pattern
        )
    }
}

/// Rewrites a conv2d selected for a blocked-channel template.
///
/// Plain layouts are blocked when both channel counts split into whole
/// blocks, otherwise the node is left alone. Already-blocked layouts must
/// match the family's patterns and are passed through unchanged.
pub fn alter_blocked(
    family: &BlockedFamily,
    rewrite: &Rewrite<'_>,
    builder: &mut dyn GraphBuilder,
) -> Result<Option<Altered>, AlterError> {
    let request = rewrite.request;
    let attrs = request.attrs;

    if !family.accepts_plain(&attrs.data_layout, &attrs.kernel_layout) {
        let out_layout = attrs.effective_out_layout();
        if !family.accepts_blocked(&attrs.data_layout, &attrs.kernel_layout, &out_layout) {
            return Err(rewrite.violation(format!(
                "expected plain {} data or {}, got {} data with {} kernel and {} output",
                family.data,
                family.describe_blocked(),
                attrs.data_layout,
                attrs.kernel_layout,
                out_layout
            )));
        }

        debug!(
            template = rewrite.template,
            data_layout = %attrs.data_layout,
            kernel_layout = %attrs.kernel_layout,
            "conv2d already blocked; passing through"
        );
        let value = builder.emit(Op::Conv2d {
            data: request.data,
            weight: request.kernel,
            attrs: Box::new(attrs.clone()),
        })?;
        return Ok(Some(Altered {
            value,
            attrs: attrs.clone(),
            kind: AlterKind::PassThrough,
            workload: None,
        }));
    }

    let data_dims = request.data_desc.dims4()?;
    let kernel_dims = request.kernel_desc.dims4()?;
    let kernel_base = attrs.kernel_layout.base();
    let in_channels = rewrite.extent(family.data, data_dims, Axis::C)?;
    let out_channels = rewrite.extent(kernel_base, kernel_dims, Axis::O)?;

    let blocks = ChannelBlocks::derive(in_channels, out_channels);
    if !blocks.is_favorable() {
        debug!(
            template = rewrite.template,
            in_channels,
            out_channels,
            "channel counts leave ragged blocks; keeping conv2d layout"
        );
        return Ok(None);
    }

    let data_layout = family.data_pattern.with_block(blocks.in_channel)?;
    let kernel_layout = LayoutTag::blocked(kernel_base, Axis::O, blocks.num_filter)?;
    let out_layout = family.data_pattern.with_block(blocks.num_filter)?;
    let new_attrs = attrs.with_overrides(
        AttrOverrides::new()
            .channels(out_channels)
            .layouts(data_layout, kernel_layout, out_layout),
    );

    let new_data = TensorDescriptor::new(
        data_layout.shape_for(data_dims),
        request.data_desc.dtype,
    );
    let new_kernel = TensorDescriptor::new(
        kernel_layout.shape_for(kernel_dims),
        request.kernel_desc.dtype,
    );
    let workload = rewrite.register(rewrite.template, new_data, new_kernel);

    let value = builder.emit(Op::Conv2d {
        data: request.data,
        weight: request.kernel,
        attrs: Box::new(new_attrs.clone()),
    })?;
    Ok(Some(Altered {
        value,
        attrs: new_attrs,
        kind: AlterKind::Blocked,
        workload: Some(workload),
    }))
}
