//! Benchmarks for the conv2d alter pass.
//!
//! Run with:
//! ```sh
//! cargo bench
//! ```
//!
//! Each benchmark covers one rewrite family so that regressions can be
//! attributed to a specific path (layout parsing, blocked rewrite, Winograd
//! rewrite, or the tuning log).

use conv_alter::alter::{AlterFlags, StrategyRegistry};
use conv_alter::ir::LayoutTag;
use conv_alter::request::AlterRequest;
use conv_alter::tuning::TuningLog;

// ── Shared request fixtures ───────────────────────────────────────────────────

const BLOCKED_REQUEST: &str = r#"{
    "target": "opencl -device=adreno",
    "implementation": "conv2d_nchwc.image2d",
    "attrs": {"data_layout": "NCHW", "kernel_layout": "OIHW"},
    "data": {"shape": [1, 64, 56, 56], "dtype": "float16"},
    "kernel": {"shape": [128, 64, 3, 3], "dtype": "float16"}
}"#;

const WINOGRAD_REQUEST: &str = r#"{
    "target": "opencl -device=adreno",
    "implementation": "conv2d_nchw_winograd_acc_32.image2d",
    "attrs": {"data_layout": "NCHW", "kernel_layout": "OIHW"},
    "data": {"shape": [1, 64, 56, 56], "dtype": "float16"},
    "kernel": {"shape": [128, 64, 3, 3], "dtype": "float16"}
}"#;

const LAYOUT_TAGS: [&str; 6] = ["NCHW", "NCHW4c", "OIHW4o", "NHWC4c", "HWIO4o", "HWOI4o"];

// ── Helpers ───────────────────────────────────────────────────────────────────

fn request(text: &str) -> AlterRequest {
    AlterRequest::from_json(text).expect("bench request should parse")
}

fn time_bench(label: &str, iters: u32, mut f: impl FnMut()) {
    let start = std::time::Instant::now();
    for _ in 0..iters {
        f();
    }
    println!("{} ×{}: {:?} avg", label, iters, start.elapsed() / iters);
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    let flags = AlterFlags {
        debug_verify: false,
        persist_tuning: false,
    };
    let registry = StrategyRegistry::with_defaults();

    time_bench("layout parse (6 tags)", 10_000, || {
        for tag in LAYOUT_TAGS {
            let _ = tag.parse::<LayoutTag>();
        }
    });

    time_bench("request parse", 10_000, || {
        let _ = request(BLOCKED_REQUEST);
    });

    let blocked = request(BLOCKED_REQUEST);
    time_bench("alter (blocked nchwc)", 10_000, || {
        let log = TuningLog::new();
        blocked.run(&registry, &log, flags).expect("alter failed");
    });

    let winograd = request(WINOGRAD_REQUEST);
    time_bench("alter (winograd acc_32)", 10_000, || {
        let log = TuningLog::new();
        winograd.run(&registry, &log, flags).expect("alter failed");
    });

    let shared_log = TuningLog::new();
    time_bench("alter (shared log, 1k records)", 1_000, || {
        blocked.run(&registry, &shared_log, flags).expect("alter failed");
    });
}
