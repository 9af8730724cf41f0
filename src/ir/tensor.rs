use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float16,
    Float32,
    Int8,
    Int32,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Float16 => "float16",
            DataType::Float32 => "float32",
            DataType::Int8 => "int8",
            DataType::Int32 => "int32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TensorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "float16" => Ok(DataType::Float16),
            "float32" => Ok(DataType::Float32),
            "int8" => Ok(DataType::Int8),
            "int32" => Ok(DataType::Int32),
            other => Err(TensorError {
                message: format!("unknown dtype '{other}'"),
            }),
        }
    }
}

/// Shape and element type of a tensor flowing into the pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TensorDescriptor {
    pub shape: Vec<usize>,
    pub dtype: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TensorError {
    pub message: String,
}

impl TensorDescriptor {
    pub fn new(shape: Vec<usize>, dtype: DataType) -> Self {
        Self { shape, dtype }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn dims4(&self) -> Result<[usize; 4], TensorError> {
        self.dims::<4>()
    }

    pub fn dims5(&self) -> Result<[usize; 5], TensorError> {
        self.dims::<5>()
    }

    fn dims<const N: usize>(&self) -> Result<[usize; N], TensorError> {
        <[usize; N]>::try_from(self.shape.as_slice()).map_err(|_| TensorError {
            message: format!(
                "expected rank-{N} tensor, got shape {:?} ({})",
                self.shape, self.dtype
            ),
        })
    }
}

impl fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.shape, self.dtype)
    }
}
