use thiserror::Error;

use crate::ir::{GraphError, LayoutError, TensorError, VerifyError};
use crate::tuning::SelectError;

/// Hard failures of a rewrite attempt. Rewrites that simply do not apply are
/// reported as `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum AlterError {
    #[error("layout contract violated for '{template}': {message}")]
    ContractViolation { template: String, message: String },
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("invalid tensor: {0}")]
    Tensor(#[from] TensorError),
    #[error("graph rejected rewritten node: {0}")]
    Graph(#[from] GraphError),
    #[error("implementation selection failed: {0}")]
    Select(#[from] SelectError),
    #[error("rewritten attributes failed verification: {0}")]
    Verify(#[from] VerifyError),
}
