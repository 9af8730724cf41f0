use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

use crate::ir::{Conv2dAttrs, DataType, TensorDescriptor};
use crate::tuning::{Target, TunedWorkload, TuningCache, WorkloadKey};

/// Implementation chosen for a conv node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    /// `None` when the implementation was never tuned for this instance.
    pub workload: Option<WorkloadKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SelectError {
    pub message: String,
}

pub trait ImplementationSelector {
    fn select(
        &self,
        attrs: &Conv2dAttrs,
        data: &TensorDescriptor,
        kernel: &TensorDescriptor,
        out_dtype: DataType,
        target: &Target,
    ) -> Result<Selection, SelectError>;
}

/// Always selects the same implementation. When `tuned`, the workload key is
/// built from the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSelector {
    name: String,
    tuned: bool,
}

impl StaticSelector {
    pub fn tuned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tuned: true,
        }
    }

    pub fn untuned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tuned: false,
        }
    }
}

impl ImplementationSelector for StaticSelector {
    fn select(
        &self,
        attrs: &Conv2dAttrs,
        data: &TensorDescriptor,
        kernel: &TensorDescriptor,
        out_dtype: DataType,
        _target: &Target,
    ) -> Result<Selection, SelectError> {
        if self.name.is_empty() {
            return Err(SelectError {
                message: "no implementation name configured".to_string(),
            });
        }
        let workload = self.tuned.then(|| {
            WorkloadKey::conv2d(
                self.name.clone(),
                data.clone(),
                kernel.clone(),
                attrs,
                out_dtype,
            )
        });
        Ok(Selection {
            name: self.name.clone(),
            workload,
        })
    }
}

/// Best configurations already decided for a whole graph, handed out one
/// conv node at a time.
pub trait GraphBestLookup {
    fn next_best(&self) -> Option<TunedWorkload>;
}

#[derive(Debug, Default)]
pub struct GraphBestRecords {
    records: Mutex<VecDeque<TunedWorkload>>,
}

impl GraphBestRecords {
    pub fn new(records: impl IntoIterator<Item = TunedWorkload>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        match self.records.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl GraphBestLookup for GraphBestRecords {
    fn next_best(&self) -> Option<TunedWorkload> {
        match self.records.lock() {
            Ok(mut guard) => guard.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

pub enum WorkloadSource<'a> {
    GraphBest(&'a dyn GraphBestLookup),
    Selector(&'a dyn ImplementationSelector),
}

/// Where a pass invocation reads workload keys and configs from, and where
/// it registers rewritten workloads.
pub struct TuningContext<'a> {
    pub source: WorkloadSource<'a>,
    pub cache: &'a dyn TuningCache,
}

impl<'a> TuningContext<'a> {
    pub fn with_selector(
        selector: &'a dyn ImplementationSelector,
        cache: &'a dyn TuningCache,
    ) -> Self {
        Self {
            source: WorkloadSource::Selector(selector),
            cache,
        }
    }

    pub fn with_graph_best(best: &'a dyn GraphBestLookup, cache: &'a dyn TuningCache) -> Self {
        Self {
            source: WorkloadSource::GraphBest(best),
            cache,
        }
    }
}
