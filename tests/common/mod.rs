// Shared fixtures for the integration tests.
// Included through `mod common;`.
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use conv_alter::alter::{
    AlterError, AlterFlags, Altered, ConvAlterPass, ConvRequest, StrategyRegistry,
};
use conv_alter::ir::{Conv2dAttrs, DataType, Graph, GraphBuilder, Op, TensorDescriptor};
use conv_alter::tuning::{Target, TuningContext};

pub fn adreno() -> Target {
    Target::new("opencl").with_device("adreno")
}

pub fn f16(shape: &[usize]) -> TensorDescriptor {
    TensorDescriptor::new(shape.to_vec(), DataType::Float16)
}

pub fn strict_flags() -> AlterFlags {
    AlterFlags {
        debug_verify: true,
        persist_tuning: false,
    }
}

/// Runs the default adreno pass over one conv2d and returns the graph it
/// emitted into along with the outcome.
pub fn alter_conv(
    ctx: &TuningContext<'_>,
    attrs: &Conv2dAttrs,
    data: &TensorDescriptor,
    kernel: &TensorDescriptor,
) -> (Graph, Result<Option<Altered>, AlterError>) {
    let mut graph = Graph::new();
    let data_value = graph
        .emit(Op::Input {
            name: "data".to_string(),
            desc: data.clone(),
        })
        .expect("input should be accepted");
    let kernel_value = graph
        .emit(Op::Parameter {
            name: "kernel".to_string(),
            desc: kernel.clone(),
        })
        .expect("parameter should be accepted");

    let request = ConvRequest {
        attrs,
        data: data_value,
        kernel: kernel_value,
        data_desc: data,
        kernel_desc: kernel,
        out_dtype: DataType::Float16,
    };
    let pass = ConvAlterPass::with_flags(adreno(), &StrategyRegistry::with_defaults(), strict_flags());
    let outcome = pass.alter(&request, ctx, &mut graph);
    (graph, outcome)
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local subscriber and returns its formatted log
/// lines.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = match buffer.0.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    (result, String::from_utf8_lossy(&bytes).into_owned())
}
