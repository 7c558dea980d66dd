//! End-to-end sweeps against `/bin/sh` scripts standing in for the estimator.
//!
//! The script receives `-f <trace> -gamma <value>` as `$1..$4`.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use hh_bench::bench::sweep::progress_bar;
use hh_bench::data::export::{load_sweep, save_sweep_json};
use hh_bench::{
    sweep, EstimatorConfig, HarnessError, ProcessRunner, RowMapping, SweepConfig, SweepPlan,
    SweepResult,
};
use tempfile::TempDir;

fn shell(script: &str) -> EstimatorConfig {
    EstimatorConfig {
        program: PathBuf::from("/bin/sh"),
        trace_flag: "-f".into(),
        parameter_flag: "-gamma".into(),
        extra_args: vec!["-c".into(), script.into(), "hh".into()],
    }
}

fn write_trace(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("trace.dmp");
    std::fs::write(&path, "1 40\n2 1500\n").unwrap();
    path
}

fn run(script: &str, trace: &Path, grid: Vec<f64>, mapping: RowMapping, trials: usize) -> SweepResult {
    let plan = SweepPlan::new(trace, grid, mapping, trials).unwrap();
    let mut runner = ProcessRunner::new(shell(script), Some(Duration::from_secs(10)));
    sweep(&mut runner, &plan, &progress_bar(plan.total_trials(), false)).unwrap()
}

#[test]
fn scenario_a_single_trial() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let res = run(
        r"printf 'Method\tUpdates\tSpace\nALG1\t10.0\t100\n'",
        &trace,
        vec![1.0],
        RowMapping::new([("ALG1", 1)]).unwrap(),
        1,
    );
    let rec = res.get("ALG1", 1.0).unwrap();
    assert_eq!((rec.updates_per_ms, rec.space_bytes), (10.0, 100.0));
    assert_eq!(rec.trials, 1);
}

#[test]
fn scenario_b_mean_over_successes_only() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let counter = dir.path().join("calls");
    let script = format!(
        r#"n=$(cat "{c}" 2>/dev/null || echo 0); n=$((n+1)); echo $n > "{c}";
if [ "$n" -eq 1 ]; then printf 'Method\tUpdates\tSpace\nALG1\t10.0\t100\n'; else echo 'Unable to load file'; exit 1; fi"#,
        c = counter.display()
    );
    let res = run(&script, &trace, vec![1.0], RowMapping::new([("ALG1", 1)]).unwrap(), 2);

    let rec = res.get("ALG1", 1.0).unwrap();
    assert_eq!((rec.updates_per_ms, rec.space_bytes), (10.0, 100.0));
    assert_eq!(rec.trials, 1);
    assert_eq!(res.points[0].attempted, 2);
    assert_eq!(res.points[0].located, 1);
}

#[test]
fn scenario_c_failed_point_has_no_entry() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let script = r#"if [ "$4" = "1" ]; then printf 'Method\tUpdates\tSpace\nALG1\t12.5\t64\n'; else echo 'Error! Total update time 0 not positive'; fi"#;
    let res = run(script, &trace, vec![1.0, 2.0], RowMapping::new([("ALG1", 1)]).unwrap(), 3);

    assert_eq!(res.parameters(), vec![1.0, 2.0]);
    assert_eq!(res.get("ALG1", 1.0).unwrap().trials, 3);
    assert!(res.get("ALG1", 2.0).is_none());
    assert!(res.points[1].records.is_empty());
    assert_eq!(res.points[1].missing, vec!["ALG1".to_string()]);
}

#[test]
fn algorithms_come_back_in_mapping_order() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let script = r"printf 'noise\nMethod\tUpdates/ms\tSpace\nIMSUM\t1\t10\nDIMSUM++\t2\t20\nDIMSUM\t3\t30\n'";
    let mapping = RowMapping::new([("DIMSUM", 3), ("IMSUM", 1), ("DIMSUM++", 2)]).unwrap();
    let res = run(script, &trace, vec![8.0, 0.8, 2.0], mapping, 1);

    assert_eq!(res.parameters(), vec![8.0, 0.8, 2.0]);
    for point in &res.points {
        let names: Vec<&str> = point.records.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["DIMSUM", "IMSUM", "DIMSUM++"]);
        assert_eq!(point.records["DIMSUM"].space_bytes, 30.0);
    }
}

#[test]
fn invalid_mapping_is_rejected_before_launch() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let marker = dir.path().join("launched");

    let mut cfg = SweepConfig::default();
    cfg.trace_path = trace;
    cfg.algorithm_row_mapping.clear();
    cfg.algorithm_row_mapping.insert("A".into(), 1);
    cfg.algorithm_row_mapping.insert("B".into(), 1);
    cfg.estimator = shell(&format!("touch '{}'", marker.display()));

    assert!(matches!(cfg.plan(), Err(HarnessError::InvalidMapping(_))));
    assert!(!marker.exists());
}

#[test]
fn missing_estimator_aborts_the_sweep() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let plan = SweepPlan::new(&trace, vec![1.0, 2.0], RowMapping::new([("A", 1)]).unwrap(), 3).unwrap();
    let estimator = EstimatorConfig {
        program: dir.path().join("no-such-hh"),
        ..EstimatorConfig::default()
    };
    let mut runner = ProcessRunner::new(estimator, None);
    let err = sweep(&mut runner, &plan, &progress_bar(6, false)).unwrap_err();
    assert!(matches!(err, HarnessError::ProcessLaunch { .. }));
}

#[test]
fn timed_out_trial_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let script = r#"if [ "$4" = "2" ]; then exec sleep 5; fi; printf 'Method\tU\tS\nA\t4\t8\n'"#;
    let plan = SweepPlan::new(&trace, vec![1.0, 2.0], RowMapping::new([("A", 1)]).unwrap(), 1).unwrap();
    let mut runner = ProcessRunner::new(shell(script), Some(Duration::from_millis(200)));
    let res = sweep(&mut runner, &plan, &progress_bar(2, false)).unwrap();

    assert_eq!(res.get("A", 1.0).unwrap().updates_per_ms, 4.0);
    assert!(res.get("A", 2.0).is_none());
    assert_eq!(res.points[1].timed_out, 1);
}

#[test]
fn estimator_error_row_is_a_failed_trial_and_json_reloads() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(&dir);
    let script = r"printf 'Error! Total update time 0 not positive\nMethod\tUpdates/ms\tSpace\nALS\tinf\t4096\nCMH\t5.5\t128\n'";
    let res = run(script, &trace, vec![1.0], RowMapping::new([("ALS", 1), ("CMH", 2)]).unwrap(), 2);

    assert!(res.get("ALS", 1.0).is_none());
    assert_eq!(res.points[0].missing, vec!["ALS".to_string()]);
    assert_eq!(res.get("CMH", 1.0).unwrap().trials, 2);

    let path = dir.path().join("sweep.json");
    save_sweep_json(&res, &path).unwrap();
    assert_eq!(load_sweep(&path).unwrap(), res);
}
