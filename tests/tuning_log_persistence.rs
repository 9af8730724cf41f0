mod common;

use common::{adreno, alter_conv, f16};
use conv_alter::ir::{Conv2dAttrs, DataType};
use conv_alter::tuning::{
    StaticSelector, Target, TuningCache, TuningConfig, TuningContext, TuningLog, WorkloadKey,
};

#[test]
fn saved_log_reloads_rewritten_workloads() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tuning.json");

    let attrs = Conv2dAttrs::nchw();
    let data = f16(&[1, 16, 32, 32]);
    let kernel = f16(&[32, 16, 3, 3]);
    let config = TuningConfig::default().with_knob("tile_oc", 4);
    let log = TuningLog::new();
    log.update(
        &adreno(),
        WorkloadKey::conv2d(
            "conv2d_nchwc.image2d",
            data.clone(),
            kernel.clone(),
            &attrs,
            DataType::Float16,
        ),
        config.clone(),
    );
    let selector = StaticSelector::tuned("conv2d_nchwc.image2d");
    let ctx = TuningContext::with_selector(&selector, &log);
    let (_, outcome) = alter_conv(&ctx, &attrs, &data, &kernel);
    let workload = outcome
        .expect("alter")
        .and_then(|altered| altered.workload)
        .expect("workload registered");

    log.save(&path).expect("save");
    let reloaded = TuningLog::load(&path).expect("load");

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.query(&adreno(), &workload), config);
    assert_eq!(reloaded.records(), log.records());
}

#[test]
fn missing_log_loads_as_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let log = TuningLog::load(&dir.path().join("absent.json")).expect("load");
    assert!(log.is_empty());
}

#[test]
fn malformed_log_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"records\": [ { \"target\": 3 } ] }").expect("write");

    let err = TuningLog::load(&path).expect_err("malformed log must fail");
    assert!(err.to_string().contains("malformed tuning log"));
}

#[test]
fn saved_log_is_readable_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tuning.json");
    let log = TuningLog::new();
    let target: Target = "opencl -device=adreno".parse().expect("target");
    log.update(
        &target,
        WorkloadKey::conv2d(
            "conv2d_nhwc.image2d",
            f16(&[1, 8, 8, 4]),
            f16(&[3, 3, 4, 8]),
            &Conv2dAttrs::nchw(),
            DataType::Float16,
        ),
        TuningConfig::default(),
    );
    log.save(&path).expect("save");

    let text = std::fs::read_to_string(&path).expect("read");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["records"][0]["target"], "opencl -device=adreno");
    assert_eq!(
        value["records"][0]["workload"]["template"],
        "conv2d_nhwc.image2d"
    );
}
