use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::{Conv2dAttrs, DataType, TensorDescriptor};

/// Identifies one tunable computation: template plus the exact argument
/// shapes and scalar parameters it was tuned for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadKey {
    pub template: String,
    pub tensors: Vec<TensorDescriptor>,
    pub strides: [usize; 2],
    pub padding: [usize; 4],
    pub dilation: [usize; 2],
    pub out_dtype: DataType,
}

impl WorkloadKey {
    pub fn conv2d(
        template: impl Into<String>,
        data: TensorDescriptor,
        kernel: TensorDescriptor,
        attrs: &Conv2dAttrs,
        out_dtype: DataType,
    ) -> Self {
        Self {
            template: template.into(),
            tensors: vec![data, kernel],
            strides: attrs.strides,
            padding: attrs.padding,
            dilation: attrs.dilation,
            out_dtype,
        }
    }
}

/// Opaque tuning record. The pass copies it between keys without looking
/// inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningConfig {
    #[serde(default)]
    pub knobs: BTreeMap<String, i64>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl TuningConfig {
    /// Returned by caches that have no entry for a workload.
    pub fn fallback() -> Self {
        Self {
            knobs: BTreeMap::new(),
            is_fallback: true,
        }
    }

    #[must_use]
    pub fn with_knob(mut self, name: impl Into<String>, value: i64) -> Self {
        self.knobs.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunedWorkload {
    pub workload: WorkloadKey,
    pub config: TuningConfig,
}
