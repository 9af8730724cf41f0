//! # conv-alter
//!
//! Layout-alteration pass for 2D convolutions on texture-memory GPU
//! targets. Each conv2d is rewritten to the layout its tuned implementation
//! wants, and the tuning config is re-registered under the rewritten
//! workload.
//!
//! ## Pipeline
//!
//! ```text
//! Conv2d node (attrs + data/kernel descriptors)
//!    │
//!    ▼  tuning::TuningContext  (graph-best record or selector + cache)
//! Workload key + tuning config
//!    │
//!    ▼  alter::ConvAlterPass  (strategy resolved per target)
//! Blocked conv2d / Winograd over pre-transformed weight / unchanged
//!    │
//!    ▼  tuning::TuningCache::update
//! Config registered under the rewritten workload
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use conv_alter::alter::{AlterFlags, StrategyRegistry};
//! use conv_alter::request::AlterRequest;
//! use conv_alter::tuning::TuningLog;
//!
//! let text = std::fs::read_to_string("request.json").unwrap();
//! let request = AlterRequest::from_json(&text).unwrap();
//! let log = TuningLog::new();
//! let outcome = request
//!     .run(&StrategyRegistry::with_defaults(), &log, AlterFlags::default())
//!     .unwrap();
//! println!("{}", conv_alter::ir::print_graph(&outcome.graph));
//! ```

#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args,
    clippy::too_many_lines,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::module_name_repetitions
)]

pub mod alter;
pub mod diagnostics;
pub mod ir;
pub mod request;
pub mod tuning;
