use tracing::{debug, warn};

use crate::alter::blocking::{CHANNEL_BLOCK, ChannelBlocks};
use crate::alter::texture::Rewrite;
use crate::alter::{AlterError, AlterKind, Altered, ConvRequest};
use crate::ir::{
    AttrOverrides, BaseLayout, Conv2dAttrs, GraphBuilder, HWIO_O, LayoutTag, NCHW_C, OIHW_O, Op,
    TensorDescriptor,
};

const WINOGRAD_WORKLOAD: &str = "conv2d_nchw_winograd_without_weight_transform";

/// Picks the Winograd output tile size for a data tensor.
pub trait TileSizeOracle: Send + Sync {
    fn tile_size(&self, data: &TensorDescriptor) -> usize;
}

/// F(4x4) when the height (dim 2 of NCHW or NCHWc data) is a multiple of 8,
/// F(2x2) otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTileSize;

impl TileSizeOracle for DefaultTileSize {
    fn tile_size(&self, data: &TensorDescriptor) -> usize {
        match data.shape.get(2) {
            Some(height) if height % 8 == 0 => 4,
            _ => 2,
        }
    }
}

pub fn workload_name(acc32: bool) -> String {
    let suffix = if acc32 { "_acc_32" } else { "" };
    format!("{WINOGRAD_WORKLOAD}{suffix}.image2d")
}

fn dilation_supported(attrs: &Conv2dAttrs) -> bool {
    if attrs.is_dilated() {
        warn!(
            dilation = ?attrs.dilation,
            "Does not support weight pre-transform for dilated convolution."
        );
        return false;
    }
    true
}

/// Extent of a transformed weight axis, `kernel + tile_size - 1`.
fn alpha(kernel: usize, tile_size: usize, template: &str) -> Result<usize, AlterError> {
    kernel
        .checked_add(tile_size)
        .and_then(|extent| extent.checked_sub(1))
        .filter(|_| tile_size > 0)
        .ok_or_else(|| AlterError::ContractViolation {
            template: template.to_string(),
            message: format!(
                "no winograd weight extent for kernel {kernel} with tile size {tile_size}"
            ),
        })
}

fn require_plain_nchw(attrs: &Conv2dAttrs, template: &str) -> Result<(), AlterError> {
    if attrs.data_layout == LayoutTag::plain(BaseLayout::Nchw)
        && attrs.kernel_layout == LayoutTag::plain(BaseLayout::Oihw)
    {
        return Ok(());
    }
    Err(AlterError::ContractViolation {
        template: template.to_string(),
        message: format!(
            "winograd expects NCHW data with OIHW kernel, got {} with {}",
            attrs.data_layout, attrs.kernel_layout
        ),
    })
}

/// Default rule for an instance with no tuning record: only a Winograd
/// implementation is rewritten, and no workload is registered.
pub fn alter_untuned(
    oracle: &dyn TileSizeOracle,
    implementation: &str,
    request: &ConvRequest<'_>,
    builder: &mut dyn GraphBuilder,
) -> Result<Option<Altered>, AlterError> {
    if !implementation.contains("winograd") {
        debug!(
            implementation,
            "no tuning record for conv2d; leaving it unchanged"
        );
        return Ok(None);
    }

    let attrs = request.attrs;
    if !dilation_supported(attrs) {
        return Ok(None);
    }
    require_plain_nchw(attrs, implementation)?;
    let [out_channels, _, _, _] = request.kernel_desc.dims4()?;

    let tile_size = oracle.tile_size(request.data_desc);
    let weight = builder.emit(Op::WinogradWeightTransform {
        weight: request.kernel,
        tile_size,
    })?;
    let new_attrs = attrs.with_overrides(
        AttrOverrides::new()
            .tile_size(tile_size)
            .channels(out_channels),
    );
    let value = builder.emit(Op::Conv2dWinograd {
        data: request.data,
        weight,
        attrs: Box::new(new_attrs.clone()),
    })?;
    Ok(Some(Altered {
        value,
        attrs: new_attrs,
        kind: AlterKind::UntunedWinograd,
        workload: None,
    }))
}

/// Rewrites a conv2d tuned with a Winograd template into Winograd without
/// weight transform, fed by a weight pre-transformed at compile time.
pub fn alter_tuned(
    oracle: &dyn TileSizeOracle,
    acc32: bool,
    rewrite: &Rewrite<'_>,
    builder: &mut dyn GraphBuilder,
) -> Result<Option<Altered>, AlterError> {
    let request = rewrite.request;
    let attrs = request.attrs;
    if !dilation_supported(attrs) {
        return Ok(None);
    }

    let name = workload_name(acc32);
    let tile_size = oracle.tile_size(request.data_desc);
    if request.data_desc.rank() == 5 {
        return alter_prepacked(&name, tile_size, rewrite, builder);
    }

    require_plain_nchw(attrs, rewrite.template)?;
    let [batch, in_channels, height, width] = request.data_desc.dims4()?;
    let [out_channels, _, kernel_h, kernel_w] = request.kernel_desc.dims4()?;
    let alpha_h = alpha(kernel_h, tile_size, rewrite.template)?;
    let alpha_w = alpha(kernel_w, tile_size, rewrite.template)?;

    // (alpha, alpha, CO, CI)
    let pretransformed = builder.emit(Op::WinogradWeightTransform {
        weight: request.kernel,
        tile_size,
    })?;
    let overrides = AttrOverrides::new()
        .tile_size(tile_size)
        .channels(out_channels);

    let blocks = ChannelBlocks::derive(in_channels, out_channels);
    if !blocks.is_favorable() {
        debug!(
            in_channels,
            out_channels,
            "channel counts leave ragged blocks; keeping winograd unblocked"
        );
        let weight = builder.emit(Op::LayoutTransform {
            input: pretransformed,
            src: LayoutTag::plain(BaseLayout::Hwoi),
            dst: LayoutTag::plain(BaseLayout::Hwio),
        })?;
        let new_weight = TensorDescriptor::new(
            vec![alpha_h, alpha_w, in_channels, out_channels],
            request.kernel_desc.dtype,
        );
        let workload = rewrite.register(&name, request.data_desc.clone(), new_weight);
        let new_attrs = attrs.with_overrides(overrides);
        let value = builder.emit(Op::Conv2dWinograd {
            data: request.data,
            weight,
            attrs: Box::new(new_attrs.clone()),
        })?;
        return Ok(Some(Altered {
            value,
            attrs: new_attrs,
            kind: AlterKind::Winograd { blocked: false },
            workload: Some(workload),
        }));
    }

    let data_layout = NCHW_C.with_block(blocks.in_channel)?;
    let kernel_layout = HWIO_O.with_block(blocks.num_filter)?;
    let out_layout = NCHW_C.with_block(blocks.num_filter)?;
    let weight = builder.emit(Op::LayoutTransform {
        input: pretransformed,
        src: LayoutTag::plain(BaseLayout::Hwoi),
        dst: kernel_layout,
    })?;

    let new_data = TensorDescriptor::new(
        data_layout.shape_for([batch, in_channels, height, width]),
        request.data_desc.dtype,
    );
    let new_weight = TensorDescriptor::new(
        kernel_layout.shape_for([alpha_h, alpha_w, in_channels, out_channels]),
        request.kernel_desc.dtype,
    );
    let workload = rewrite.register(&name, new_data, new_weight);

    let new_attrs =
        attrs.with_overrides(overrides.layouts(data_layout, kernel_layout, out_layout));
    let value = builder.emit(Op::Conv2dWinograd {
        data: request.data,
        weight,
        attrs: Box::new(new_attrs.clone()),
    })?;
    Ok(Some(Altered {
        value,
        attrs: new_attrs,
        kind: AlterKind::Winograd { blocked: true },
        workload: Some(workload),
    }))
}

/// Data already carries a blocked channel layout from an earlier rewrite.
fn alter_prepacked(
    name: &str,
    tile_size: usize,
    rewrite: &Rewrite<'_>,
    builder: &mut dyn GraphBuilder,
) -> Result<Option<Altered>, AlterError> {
    let request = rewrite.request;
    let attrs = request.attrs;
    let packed_data = NCHW_C.with_block(CHANNEL_BLOCK)?;
    let packed_kernel = OIHW_O.with_block(CHANNEL_BLOCK)?;
    if attrs.data_layout != packed_data || attrs.kernel_layout != packed_kernel {
        return Err(rewrite.violation(format!(
            "rank-5 winograd input expects {packed_data} data with {packed_kernel} kernel, got {} with {}",
            attrs.data_layout, attrs.kernel_layout
        )));
    }

    let [_, in_chunks, _, _, in_block] = request.data_desc.dims5()?;
    let [out_chunks, _, kernel_h, kernel_w, out_block] = request.kernel_desc.dims5()?;
    let alpha_h = alpha(kernel_h, tile_size, rewrite.template)?;
    let alpha_w = alpha(kernel_w, tile_size, rewrite.template)?;
    let (Some(in_channels), Some(out_channels)) = (
        in_chunks.checked_mul(in_block),
        out_chunks.checked_mul(out_block),
    ) else {
        return Err(rewrite.violation(format!(
            "channel count overflows for data {} and kernel {}",
            request.data_desc, request.kernel_desc
        )));
    };

    let unpacked = builder.emit(Op::LayoutTransform {
        input: request.kernel,
        src: packed_kernel,
        dst: LayoutTag::plain(BaseLayout::Oihw),
    })?;
    let pretransformed = builder.emit(Op::WinogradWeightTransform {
        weight: unpacked,
        tile_size,
    })?;
    let weight = builder.emit(Op::LayoutTransform {
        input: pretransformed,
        src: LayoutTag::plain(BaseLayout::Hwoi),
        dst: HWIO_O.with_block(CHANNEL_BLOCK)?,
    })?;

    let new_weight = TensorDescriptor::new(
        vec![alpha_h, alpha_w, in_channels, out_chunks, out_block],
        request.kernel_desc.dtype,
    );
    let workload = rewrite.register(name, request.data_desc.clone(), new_weight);

    let new_attrs = attrs.with_overrides(
        AttrOverrides::new()
            .tile_size(tile_size)
            .channels(out_channels),
    );
    let value = builder.emit(Op::Conv2dWinograd {
        data: request.data,
        weight,
        attrs: Box::new(new_attrs.clone()),
    })?;
    Ok(Some(Altered {
        value,
        attrs: new_attrs,
        kind: AlterKind::Winograd { blocked: true },
        workload: Some(workload),
    }))
}
