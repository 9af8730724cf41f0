use tracing::debug;

use crate::alter::blocking::{self, CHANNEL_MAJOR, CHANNEL_MINOR};
use crate::alter::winograd::{self, DefaultTileSize, TileSizeOracle};
use crate::alter::{AlterError, AlterStrategy, Altered, ConvRequest};
use crate::ir::{Axis, BaseLayout, GraphBuilder, TensorDescriptor};
use crate::tuning::{Target, TuningCache, TuningConfig, TuningContext, WorkloadKey, WorkloadSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFamily {
    Winograd { acc32: bool },
    /// `conv2d_nchwc` and `depthwise_conv2d_nchwc`.
    ChannelMajor,
    /// `conv2d_nhwc` and `depthwise_conv2d_nhwc`.
    ChannelMinor,
}

impl TemplateFamily {
    pub fn classify(template: &str) -> Option<Self> {
        if template.contains("conv2d_nchw_winograd") {
            Some(TemplateFamily::Winograd {
                acc32: template.contains("acc_32"),
            })
        } else if template.contains("conv2d_nchwc") {
            Some(TemplateFamily::ChannelMajor)
        } else if template.contains("conv2d_nhwc") {
            Some(TemplateFamily::ChannelMinor)
        } else {
            None
        }
    }
}

/// One committed rewrite: the node, its tuned template and the config every
/// rewritten workload is registered with.
pub struct Rewrite<'a> {
    pub request: &'a ConvRequest<'a>,
    pub target: &'a Target,
    pub cache: &'a dyn TuningCache,
    pub template: &'a str,
    pub config: &'a TuningConfig,
}

impl Rewrite<'_> {
    pub fn register(
        &self,
        template: &str,
        data: TensorDescriptor,
        kernel: TensorDescriptor,
    ) -> WorkloadKey {
        let workload = WorkloadKey::conv2d(
            template,
            data,
            kernel,
            self.request.attrs,
            self.request.out_dtype,
        );
        debug!(
            compile_target = %self.target,
            template,
            tensors = ?workload.tensors,
            "registering rewritten workload"
        );
        self.cache
            .update(self.target, workload.clone(), self.config.clone());
        workload
    }

    pub fn violation(&self, message: String) -> AlterError {
        AlterError::ContractViolation {
            template: self.template.to_string(),
            message,
        }
    }

    pub fn extent(&self, base: BaseLayout, dims: [usize; 4], axis: Axis) -> Result<usize, AlterError> {
        base.extent(dims, axis)
            .ok_or_else(|| self.violation(format!("{base} has no '{}' axis", axis.letter())))
    }
}

/// Alter strategy for texture-memory GPUs (Adreno): blocked channel layouts
/// of 4 and Winograd weight pre-transform.
pub struct TextureConvAlter<T = DefaultTileSize> {
    tile_sizes: T,
}

impl Default for TextureConvAlter<DefaultTileSize> {
    fn default() -> Self {
        Self::new(DefaultTileSize)
    }
}

impl<T: TileSizeOracle> TextureConvAlter<T> {
    pub fn new(tile_sizes: T) -> Self {
        Self { tile_sizes }
    }
}

impl<T: TileSizeOracle> AlterStrategy for TextureConvAlter<T> {
    fn name(&self) -> &str {
        "texture"
    }

    fn alter(
        &self,
        request: &ConvRequest<'_>,
        target: &Target,
        ctx: &TuningContext<'_>,
        builder: &mut dyn GraphBuilder,
    ) -> Result<Option<Altered>, AlterError> {
        let (workload, config) = match ctx.source {
            WorkloadSource::GraphBest(best) => match best.next_best() {
                Some(tuned) => (tuned.workload, tuned.config),
                None => {
                    debug!("graph-best records exhausted; leaving conv2d unchanged");
                    return Ok(None);
                }
            },
            WorkloadSource::Selector(selector) => {
                let selection = selector.select(
                    request.attrs,
                    request.data_desc,
                    request.kernel_desc,
                    request.out_dtype,
                    target,
                )?;
                let Some(workload) = selection.workload else {
                    return winograd::alter_untuned(
                        &self.tile_sizes,
                        &selection.name,
                        request,
                        builder,
                    );
                };
                let config = ctx.cache.query(target, &workload);
                (workload, config)
            }
        };

        let rewrite = Rewrite {
            request,
            target,
            cache: ctx.cache,
            template: &workload.template,
            config: &config,
        };
        match TemplateFamily::classify(&workload.template) {
            Some(TemplateFamily::Winograd { acc32 }) => {
                winograd::alter_tuned(&self.tile_sizes, acc32, &rewrite, builder)
            }
            Some(TemplateFamily::ChannelMajor) => {
                blocking::alter_blocked(&CHANNEL_MAJOR, &rewrite, builder)
            }
            Some(TemplateFamily::ChannelMinor) => {
                blocking::alter_blocked(&CHANNEL_MINOR, &rewrite, builder)
            }
            None => {
                debug!(
                    template = %workload.template,
                    "template has no layout rewrite"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateFamily;

    #[test]
    fn classifies_template_names() {
        assert_eq!(
            TemplateFamily::classify("conv2d_nchw_winograd.image2d"),
            Some(TemplateFamily::Winograd { acc32: false })
        );
        assert_eq!(
            TemplateFamily::classify("conv2d_nchw_winograd_acc_32.image2d"),
            Some(TemplateFamily::Winograd { acc32: true })
        );
        assert_eq!(
            TemplateFamily::classify("depthwise_conv2d_nchwc.image2d"),
            Some(TemplateFamily::ChannelMajor)
        );
        assert_eq!(
            TemplateFamily::classify("conv2d_nhwc_acc32.image2d"),
            Some(TemplateFamily::ChannelMinor)
        );
        assert_eq!(TemplateFamily::classify("conv2d_nchw.cuda"), None);
    }
}
