//! The measured transaction bodies, one per backend and scenario.
//!
//! Preparing a workload does all the setup (directory, database, fixture)
//! so that [`TxWorkload::run_once`] is the only thing left inside the timed
//! loop.

use crate::config::BenchmarkConfig;
use crate::error::BenchResult;
use crate::fixtures::{
    create_kv_bucket, create_ql_schema, insert_ql_row, kv_bucket_mut, populate_kv, populate_ql,
    probe_kv, probe_ql, put_kv_pair,
};
use crate::stores::{create_kv_db, create_ql_db, KvContext, QlContext};
use std::fmt;
use txbench::TxMode;

/// Database engine under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// SQLite through rusqlite
    Ql,
    /// redb
    Kv,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Ql, Backend::Kv];

    /// Function name inside a benchmark group
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ql => "ql",
            Backend::Kv => "kv",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single measured transaction does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Read-only transaction with an empty body
    EmptyRo,
    /// Read-write transaction with an empty body
    EmptyRw,
    /// Read-only transaction looking up one fixture entry
    PopulatedRo,
    /// Read-write transaction inserting one new entry
    PopulatedRw,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::EmptyRo,
        Scenario::EmptyRw,
        Scenario::PopulatedRo,
        Scenario::PopulatedRw,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::EmptyRo => "EmptyRO",
            Scenario::EmptyRw => "EmptyRW",
            Scenario::PopulatedRo => "RO",
            Scenario::PopulatedRw => "RW",
        }
    }

    /// Criterion group name, e.g. `Tx/EmptyRO`
    pub fn group_name(&self) -> String {
        format!("Tx/{}", self.name())
    }

    pub fn mode(&self) -> TxMode {
        match self {
            Scenario::EmptyRo | Scenario::PopulatedRo => TxMode::ReadOnly,
            Scenario::EmptyRw | Scenario::PopulatedRw => TxMode::ReadWrite,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A prepared database plus the transaction to repeat against it.
pub trait TxWorkload {
    fn backend(&self) -> Backend;

    fn scenario(&self) -> Scenario;

    /// Runs exactly one transaction of the scenario.
    fn run_once(&mut self) -> BenchResult<()>;
}

/// Workload against the SQLite-backed database
pub struct QlWorkload {
    ctx: QlContext,
    scenario: Scenario,
    probe_key: String,
    probe_value: String,
    next_index: u64,
}

impl QlWorkload {
    pub fn prepare(scenario: Scenario, config: &BenchmarkConfig) -> BenchResult<QlWorkload> {
        let ctx = create_ql_db(config)?;
        match scenario {
            Scenario::EmptyRo | Scenario::EmptyRw => {}
            Scenario::PopulatedRo => {
                ctx.db()
                    .with_rw_tx(|tx| populate_ql(tx, config.fixture_size))?;
            }
            Scenario::PopulatedRw => {
                ctx.db().with_rw_tx(create_ql_schema)?;
            }
        }
        log::debug!("Prepared {} workload for {}", scenario, Backend::Ql);

        Ok(QlWorkload {
            ctx,
            scenario,
            probe_key: config.probe_key(),
            probe_value: config.probe_value(),
            next_index: 0,
        })
    }

    pub fn context(&self) -> &QlContext {
        &self.ctx
    }

    /// Index of the row the next read-write run inserts
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}

impl TxWorkload for QlWorkload {
    fn backend(&self) -> Backend {
        Backend::Ql
    }

    fn scenario(&self) -> Scenario {
        self.scenario
    }

    fn run_once(&mut self) -> BenchResult<()> {
        let db = self.ctx.db();
        match self.scenario {
            Scenario::EmptyRo => db.with_ro_tx(|_| Ok(()))?,
            Scenario::EmptyRw => db.with_rw_tx(|_| Ok(()))?,
            Scenario::PopulatedRo => {
                let (key, value) = (&self.probe_key, &self.probe_value);
                db.with_ro_tx(|tx| probe_ql(tx, key, value))?;
            }
            Scenario::PopulatedRw => {
                let i = self.next_index;
                db.with_rw_tx(|tx| insert_ql_row(tx, i))?;
                self.next_index += 1;
            }
        }
        Ok(())
    }
}

/// Workload against the redb-backed database
pub struct KvWorkload {
    ctx: KvContext,
    scenario: Scenario,
    probe_key: String,
    probe_value: String,
    next_index: u64,
}

impl KvWorkload {
    pub fn prepare(scenario: Scenario, config: &BenchmarkConfig) -> BenchResult<KvWorkload> {
        let ctx = create_kv_db(config)?;
        match scenario {
            Scenario::EmptyRo | Scenario::EmptyRw => {}
            Scenario::PopulatedRo => {
                ctx.db()
                    .with_rw_tx(|tx| populate_kv(tx, config.fixture_size))?;
            }
            Scenario::PopulatedRw => {
                ctx.db().with_rw_tx(|tx| create_kv_bucket(tx).map(|_| ()))?;
            }
        }
        log::debug!("Prepared {} workload for {}", scenario, Backend::Kv);

        Ok(KvWorkload {
            ctx,
            scenario,
            probe_key: config.probe_key(),
            probe_value: config.probe_value(),
            next_index: 0,
        })
    }

    pub fn context(&self) -> &KvContext {
        &self.ctx
    }

    /// Index of the pair the next read-write run puts
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}

impl TxWorkload for KvWorkload {
    fn backend(&self) -> Backend {
        Backend::Kv
    }

    fn scenario(&self) -> Scenario {
        self.scenario
    }

    fn run_once(&mut self) -> BenchResult<()> {
        let db = self.ctx.db();
        match self.scenario {
            Scenario::EmptyRo => db.with_ro_tx(|_| Ok(()))?,
            Scenario::EmptyRw => db.with_rw_tx(|_| Ok(()))?,
            Scenario::PopulatedRo => {
                let (key, value) = (&self.probe_key, &self.probe_value);
                db.with_ro_tx(|tx| probe_kv(tx, key, value))?;
            }
            Scenario::PopulatedRw => {
                let i = self.next_index;
                db.with_rw_tx(|tx| {
                    let mut bucket = kv_bucket_mut(tx)?;
                    put_kv_pair(&mut bucket, i)
                })?;
                self.next_index += 1;
            }
        }
        Ok(())
    }
}

/// Prepare the workload for one backend and scenario
pub fn prepare(
    backend: Backend,
    scenario: Scenario,
    config: &BenchmarkConfig,
) -> BenchResult<Box<dyn TxWorkload>> {
    let workload: Box<dyn TxWorkload> = match backend {
        Backend::Ql => Box::new(QlWorkload::prepare(scenario, config)?),
        Backend::Kv => Box::new(KvWorkload::prepare(scenario, config)?),
    };
    Ok(workload)
}

/// A workload that is only prepared the first time it is asked for.
///
/// Criterion skips the closures of filtered-out benchmarks, so holding one of
/// these instead of a prepared workload keeps those runs from building
/// databases and fixtures they never use.
pub struct LazyWorkload {
    backend: Backend,
    scenario: Scenario,
    config: BenchmarkConfig,
    workload: Option<Box<dyn TxWorkload>>,
}

impl LazyWorkload {
    pub fn new(backend: Backend, scenario: Scenario, config: &BenchmarkConfig) -> LazyWorkload {
        LazyWorkload {
            backend,
            scenario,
            config: config.clone(),
            workload: None,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.workload.is_some()
    }

    /// Prepares the workload on first use and returns it.
    pub fn get(&mut self) -> BenchResult<&mut Box<dyn TxWorkload>> {
        let workload = match self.workload.take() {
            Some(workload) => workload,
            None => prepare(self.backend, self.scenario, &self.config)?,
        };
        Ok(self.workload.insert(workload))
    }
}
