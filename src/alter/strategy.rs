use std::sync::Arc;

use tracing::debug;

use crate::alter::{AlterError, AlterFlags, TextureConvAlter};
use crate::ir::{
    Conv2dAttrs, DataType, GraphBuilder, TensorDescriptor, ValueId, verify_conv_attrs,
};
use crate::tuning::{Target, TuningContext, WorkloadKey};

/// A pending conv2d node as seen by the pass.
#[derive(Debug, Clone, Copy)]
pub struct ConvRequest<'a> {
    pub attrs: &'a Conv2dAttrs,
    pub data: ValueId,
    pub kernel: ValueId,
    pub data_desc: &'a TensorDescriptor,
    pub kernel_desc: &'a TensorDescriptor,
    pub out_dtype: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterKind {
    /// Fresh blocked-channel conv2d.
    Blocked,
    /// Already-blocked conv2d re-emitted with its attributes unchanged.
    PassThrough,
    /// Winograd without weight transform over a pre-transformed weight.
    Winograd { blocked: bool },
    /// Winograd rewrite of an instance that has no tuning record.
    UntunedWinograd,
}

impl AlterKind {
    pub fn is_winograd(self) -> bool {
        matches!(self, AlterKind::Winograd { .. } | AlterKind::UntunedWinograd)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Altered {
    pub value: ValueId,
    pub attrs: Conv2dAttrs,
    pub kind: AlterKind,
    /// Post-rewrite workload registered in the tuning cache, if any.
    pub workload: Option<WorkloadKey>,
}

pub trait AlterStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when the node should be left as it is.
    fn alter(
        &self,
        request: &ConvRequest<'_>,
        target: &Target,
        ctx: &TuningContext<'_>,
        builder: &mut dyn GraphBuilder,
    ) -> Result<Option<Altered>, AlterError>;
}

/// Maps target keys (device or kind) to alter strategies.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    entries: Vec<(String, Arc<dyn AlterStrategy>)>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("adreno", Arc::new(TextureConvAlter::default()));
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, strategy: Arc<dyn AlterStrategy>) {
        self.entries.push((key.into(), strategy));
    }

    #[must_use]
    pub fn find(&self, target: &Target) -> Option<Arc<dyn AlterStrategy>> {
        target.keys().into_iter().find_map(|key| {
            self.entries
                .iter()
                .find(|(entry_key, _)| entry_key == key)
                .map(|(_, strategy)| Arc::clone(strategy))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Conv2d alter pass bound to one target. The strategy is resolved once, at
/// construction.
pub struct ConvAlterPass {
    target: Target,
    strategy: Option<Arc<dyn AlterStrategy>>,
    flags: AlterFlags,
}

impl ConvAlterPass {
    pub fn new(target: Target, registry: &StrategyRegistry) -> Self {
        Self::with_flags(target, registry, AlterFlags::from_env())
    }

    pub fn with_flags(target: Target, registry: &StrategyRegistry, flags: AlterFlags) -> Self {
        let strategy = registry.find(&target);
        Self {
            target,
            strategy,
            flags,
        }
    }

    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy.as_deref().map(|strategy| strategy.name())
    }

    pub fn alter(
        &self,
        request: &ConvRequest<'_>,
        ctx: &TuningContext<'_>,
        builder: &mut dyn GraphBuilder,
    ) -> Result<Option<Altered>, AlterError> {
        let Some(strategy) = self.strategy.as_deref() else {
            debug!(compile_target = %self.target, "no conv2d alter strategy registered");
            return Ok(None);
        };

        let altered = strategy.alter(request, &self.target, ctx, builder)?;
        if self.flags.debug_verify
            && let Some(altered) = &altered
        {
            verify_conv_attrs(&altered.attrs, altered.kind.is_winograd())?;
        }
        Ok(altered)
    }
}
