//! JSON request describing one conv2d instance, as consumed by the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alter::{AlterError, AlterFlags, Altered, ConvAlterPass, ConvRequest, StrategyRegistry};
use crate::ir::{
    Conv2dAttrs, DataType, Graph, GraphBuilder, Op, TensorDescriptor, verify_graph,
};
use crate::tuning::{StaticSelector, Target, TuningCache, TuningContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterRequest {
    pub target: Target,
    /// Implementation the selector reports for the node.
    pub implementation: String,
    #[serde(default = "tuned_by_default")]
    pub tuned: bool,
    pub attrs: Conv2dAttrs,
    pub data: TensorDescriptor,
    pub kernel: TensorDescriptor,
    /// Falls back to `attrs.out_dtype`, then to the data dtype.
    #[serde(default)]
    pub out_dtype: Option<DataType>,
}

fn tuned_by_default() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Alter(#[from] AlterError),
}

#[derive(Debug)]
pub struct AlterOutcome {
    pub graph: Graph,
    pub altered: Option<Altered>,
}

impl AlterRequest {
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn out_dtype(&self) -> DataType {
        self.out_dtype
            .or(self.attrs.out_dtype)
            .unwrap_or(self.data.dtype)
    }

    fn selector(&self) -> StaticSelector {
        if self.tuned {
            StaticSelector::tuned(self.implementation.clone())
        } else {
            StaticSelector::untuned(self.implementation.clone())
        }
    }

    /// Builds a graph holding the data and kernel, runs the pass over the
    /// conv2d and appends an output for the rewritten node, if any.
    pub fn run(
        &self,
        registry: &StrategyRegistry,
        cache: &dyn TuningCache,
        flags: AlterFlags,
    ) -> Result<AlterOutcome, RequestError> {
        let mut graph = Graph::new();
        let data = graph
            .emit(Op::Input {
                name: "data".to_string(),
                desc: self.data.clone(),
            })
            .map_err(AlterError::from)?;
        let kernel = graph
            .emit(Op::Parameter {
                name: "kernel".to_string(),
                desc: self.kernel.clone(),
            })
            .map_err(AlterError::from)?;

        let request = ConvRequest {
            attrs: &self.attrs,
            data,
            kernel,
            data_desc: &self.data,
            kernel_desc: &self.kernel,
            out_dtype: self.out_dtype(),
        };
        let selector = self.selector();
        let ctx = TuningContext::with_selector(&selector, cache);
        let pass = ConvAlterPass::with_flags(self.target.clone(), registry, flags);

        let altered = pass.alter(&request, &ctx, &mut graph)?;
        if let Some(altered) = &altered {
            graph
                .emit(Op::Output(altered.value))
                .map_err(AlterError::from)?;
        }
        if flags.debug_verify {
            verify_graph(&graph).map_err(AlterError::from)?;
        }
        Ok(AlterOutcome { graph, altered })
    }
}
