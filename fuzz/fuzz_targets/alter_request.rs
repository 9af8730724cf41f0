#![no_main]

use conv_alter::alter::{AlterFlags, StrategyRegistry};
use conv_alter::request::AlterRequest;
use conv_alter::tuning::TuningLog;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(request) = AlterRequest::from_json(text) else {
        return;
    };
    let flags = AlterFlags {
        debug_verify: true,
        persist_tuning: false,
    };
    let log = TuningLog::new();
    let _ = request.run(&StrategyRegistry::with_defaults(), &log, flags);
});
