use std::path::{Path, PathBuf};
use tempfile::TempDir;
use txbench_bench::stores::DIR_PREFIX;
use txbench_bench::workloads::{KvWorkload, QlWorkload};
use txbench_bench::{prepare, Backend, BenchResult, BenchmarkConfig, Scenario, TxWorkload};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn quick_config(base: &Path) -> BenchmarkConfig {
    BenchmarkConfig {
        base_path: base.to_path_buf(),
        ..BenchmarkConfig::quick()
    }
}

fn bench_dirs(base: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(base)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .map_or(false, |name| name.to_string_lossy().starts_with(DIR_PREFIX))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn run_times(
    backend: Backend,
    scenario: Scenario,
    config: &BenchmarkConfig,
    times: usize,
) -> BenchResult<()> {
    let mut workload = prepare(backend, scenario, config)?;
    for _ in 0..times {
        workload.run_once()?;
    }
    Ok(())
}

#[test]
fn test_every_workload_runs_repeatedly() {
    let base = TempDir::new().unwrap();
    let config = quick_config(base.path());

    for scenario in Scenario::ALL {
        for backend in Backend::ALL {
            if let Err(e) = run_times(backend, scenario, &config, 25) {
                panic!("{}/{} failed: {}", scenario.group_name(), backend, e);
            }
        }
    }
}

#[test]
fn test_workloads_clean_up_after_themselves() {
    let base = TempDir::new().unwrap();
    let config = quick_config(base.path());

    for scenario in Scenario::ALL {
        for backend in Backend::ALL {
            run_times(backend, scenario, &config, 3).unwrap();
        }
    }

    assert!(bench_dirs(base.path()).is_empty());
}

#[test]
fn test_keep_dirs_leaves_directories_behind() {
    let base = TempDir::new().unwrap();
    let config = BenchmarkConfig {
        keep_dirs: true,
        ..quick_config(base.path())
    };

    run_times(Backend::Ql, Scenario::EmptyRw, &config, 1).unwrap();
    run_times(Backend::Kv, Scenario::EmptyRw, &config, 1).unwrap();

    let dirs = bench_dirs(base.path());
    assert_eq!(dirs.len(), 2);
    assert!(dirs.iter().any(|dir| dir.join("ql.db").is_file()));
    assert!(dirs.iter().any(|dir| dir.join("db").is_file()));
}

#[test]
fn test_rw_counters_continue_across_runs() {
    let base = TempDir::new().unwrap();
    let config = quick_config(base.path());

    let mut ql = QlWorkload::prepare(Scenario::PopulatedRw, &config).unwrap();
    let mut kv = KvWorkload::prepare(Scenario::PopulatedRw, &config).unwrap();
    for _ in 0..100 {
        ql.run_once().unwrap();
        kv.run_once().unwrap();
    }
    assert_eq!(ql.next_index(), 100);
    assert_eq!(kv.next_index(), 100);
}

#[test]
fn test_populated_ro_with_default_sized_fixture() {
    let base = TempDir::new().unwrap();
    let config = BenchmarkConfig {
        base_path: base.path().to_path_buf(),
        ..BenchmarkConfig::default()
    };
    assert_eq!(config.probe_key(), "key500");

    for backend in Backend::ALL {
        run_times(backend, Scenario::PopulatedRo, &config, 10).unwrap();
    }
}

#[test]
fn test_durable_and_relaxed_configs_both_run() {
    let base = TempDir::new().unwrap();
    for durable in [true, false] {
        let config = BenchmarkConfig {
            durable,
            ..quick_config(base.path())
        };
        for backend in Backend::ALL {
            run_times(backend, Scenario::PopulatedRw, &config, 5).unwrap();
        }
    }
}

#[cfg(unix)]
#[test]
fn test_permissions_on_disk() {
    use txbench::fs::{mode_of, DEFAULT_FILE_PERM, DEFAULT_PATH_PERM};

    let base = TempDir::new().unwrap();
    let config = quick_config(base.path());

    let kv = KvWorkload::prepare(Scenario::EmptyRo, &config).unwrap();
    let dir = kv.context().dir();
    assert_eq!(mode_of(dir).unwrap(), DEFAULT_PATH_PERM);
    assert_eq!(mode_of(&dir.join("db")).unwrap(), DEFAULT_FILE_PERM);

    let ql = QlWorkload::prepare(Scenario::EmptyRo, &config).unwrap();
    let dir = ql.context().dir();
    assert_eq!(mode_of(dir).unwrap(), DEFAULT_PATH_PERM);
    assert_eq!(mode_of(&dir.join("ql.db")).unwrap(), DEFAULT_FILE_PERM);
}
