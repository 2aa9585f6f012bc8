//! The provisioning pipeline
//!
//! A strictly linear sequence of gated stages: system packages, engine
//! install, wheel build (skipped on a cache hit), dependency install,
//! static analysis, tests. The first fatal error halts the run; advisory
//! findings are aggregated without affecting control flow.
//!
//! Stages block until completion. There are no timeouts and no retries;
//! an unbounded stall in a collaborator stalls the whole run.

use crate::cache::{CacheEntry, CacheKey, WheelStore};
use crate::engine::{EngineDescriptor, EngineInstaller};
use crate::error::{WheelwrightError, WheelwrightResult};
use crate::manifest;
use crate::toolchain::{
    Analyzer, DependencyInstaller, OnViolation, Ruleset, SystemInstaller, TestRunner, WheelBuilder,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// The ordered pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageId {
    /// OS-level build prerequisites
    SystemPackages,
    /// Pinned simulation engine install
    Engine,
    /// Wheel build into the cache (skipped on hit)
    WheelBuild,
    /// Python dependency set install
    Dependencies,
    /// Two-pass static analysis
    Analysis,
    /// Test suite with coverage
    Tests,
}

impl StageId {
    /// Execution order; every entry gates the next
    pub const ORDER: [StageId; 6] = [
        StageId::SystemPackages,
        StageId::Engine,
        StageId::WheelBuild,
        StageId::Dependencies,
        StageId::Analysis,
        StageId::Tests,
    ];

    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::SystemPackages => "system packages",
            Self::Engine => "engine install",
            Self::WheelBuild => "wheel build",
            Self::Dependencies => "dependency install",
            Self::Analysis => "static analysis",
            Self::Tests => "tests",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Non-fatal stage result
///
/// Fatal failures are `Err` at the pipeline level; everything that lets
/// the run continue lands here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage completed cleanly
    Passed,
    /// Stage did not need to run
    Skipped { reason: String },
    /// Stage reported findings that do not gate the run
    Advisory { findings: u32 },
}

/// One executed stage
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Which stage ran
    pub stage: StageId,
    /// How it ended
    pub outcome: StageOutcome,
    /// Wall-clock duration
    pub duration: Duration,
}

/// Summary of a completed pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Short run identifier
    pub run_id: String,
    /// The engine build that was installed
    pub engine: String,
    /// The computed wheel cache key
    pub cache_key: String,
    /// Whether the wheel build was skipped on a cache hit
    pub cache_hit: bool,
    /// Requirement specifiers in the dependency set
    pub requirement_count: usize,
    /// Total advisory findings across the run
    pub advisory_findings: u32,
    /// Per-stage reports in execution order
    pub stages: Vec<StageReport>,
}

/// Everything a run needs to know before it starts
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Project root the analyzer and test runner operate in
    pub project_dir: PathBuf,
    /// Dependency manifest files, in cache-key order
    pub manifests: Vec<PathBuf>,
    /// OS packages to install first
    pub system_packages: Vec<String>,
    /// Selected engine matrix entry
    pub engine: EngineDescriptor,
    /// The one package installed without a version pin
    pub extra_package: Option<String>,
    /// Fail-fast analyzer ruleset
    pub gate: Ruleset,
    /// Report-only analyzer ruleset
    pub advisory: Ruleset,
    /// Cache namespace token
    pub namespace: String,
    /// Drop any existing entry for this key and rebuild
    pub fresh: bool,
}

/// The external collaborators a run drives
pub struct Collaborators {
    pub system: Box<dyn SystemInstaller>,
    pub engine: Box<dyn EngineInstaller>,
    pub wheels: Box<dyn WheelBuilder>,
    pub deps: Box<dyn DependencyInstaller>,
    pub analyzer: Box<dyn Analyzer>,
    pub tests: Box<dyn TestRunner>,
    pub store: Box<dyn WheelStore>,
}

/// Mutable state threaded through the stages of one run
#[derive(Default)]
struct RunState {
    find_links: Option<PathBuf>,
    cache_hit: bool,
    advisory_findings: u32,
}

/// Executes the provisioning pipeline
pub struct Provisioner {
    plan: ProvisionPlan,
    c: Collaborators,
}

impl Provisioner {
    /// Create a provisioner from a plan and its collaborators
    pub fn new(plan: ProvisionPlan, collaborators: Collaborators) -> Self {
        Self {
            plan,
            c: collaborators,
        }
    }

    /// Run the full pipeline
    ///
    /// Returns the run report on success; the first fatal stage failure
    /// aborts the remainder and surfaces as the error.
    pub async fn run(&self) -> WheelwrightResult<RunReport> {
        let run_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let key = CacheKey::compute(&self.plan.namespace, &self.plan.manifests)?;
        let deps = manifest::read_dependency_set(&self.plan.manifests)?;

        info!(
            "Run {}: engine {}, {} requirement(s), cache key {}",
            run_id,
            self.plan.engine,
            deps.len(),
            key
        );

        let mut state = RunState::default();
        let mut stages = Vec::with_capacity(StageId::ORDER.len());

        for stage in StageId::ORDER {
            let start = Instant::now();
            let outcome = self.run_stage(stage, &key, &mut state).await?;
            let duration = start.elapsed();

            match &outcome {
                StageOutcome::Passed => debug!("Stage '{}' passed in {:?}", stage, duration),
                StageOutcome::Skipped { reason } => info!("Stage '{}' skipped: {}", stage, reason),
                StageOutcome::Advisory { findings } => {
                    state.advisory_findings += findings;
                    warn!("Stage '{}' reported {} advisory finding(s)", stage, findings);
                }
            }

            stages.push(StageReport {
                stage,
                outcome,
                duration,
            });
        }

        Ok(RunReport {
            run_id,
            engine: self.plan.engine.to_string(),
            cache_key: key.to_string(),
            cache_hit: state.cache_hit,
            requirement_count: deps.len(),
            advisory_findings: state.advisory_findings,
            stages,
        })
    }

    async fn run_stage(
        &self,
        stage: StageId,
        key: &CacheKey,
        state: &mut RunState,
    ) -> WheelwrightResult<StageOutcome> {
        match stage {
            StageId::SystemPackages => {
                self.c.system.install(&self.plan.system_packages).await?;
                Ok(StageOutcome::Passed)
            }
            StageId::Engine => {
                self.c.engine.install(&self.plan.engine).await?;
                Ok(StageOutcome::Passed)
            }
            StageId::WheelBuild => self.wheel_build(key, state).await,
            StageId::Dependencies => {
                self.c
                    .deps
                    .install(&self.plan.manifests, state.find_links.as_deref())
                    .await?;
                if let Some(ref package) = self.plan.extra_package {
                    self.c.deps.install_unpinned(package).await?;
                }
                Ok(StageOutcome::Passed)
            }
            StageId::Analysis => self.analysis().await,
            StageId::Tests => {
                let report = self.c.tests.run_tests(&self.plan.project_dir).await?;
                if report.passed() {
                    Ok(StageOutcome::Passed)
                } else {
                    Err(WheelwrightError::TestsFailed {
                        code: report.exit_code,
                    })
                }
            }
        }
    }

    /// The cache-gated wheel build
    ///
    /// The build runs only on a miss. This is the pipeline's single most
    /// important optimization: a hit must skip the build entirely.
    async fn wheel_build(
        &self,
        key: &CacheKey,
        state: &mut RunState,
    ) -> WheelwrightResult<StageOutcome> {
        if self.plan.fresh {
            if self.c.store.get(key).await?.is_some() {
                info!("Dropping entry {} (--fresh)", key);
                self.c.store.remove(key).await?;
            }
        } else if let Some(entry) = self.c.store.get(key).await? {
            state.find_links = Some(entry.path.clone());
            state.cache_hit = true;
            return Ok(StageOutcome::Skipped {
                reason: format!("cache hit for {}", key),
            });
        }

        let staged = self.c.store.staging_dir().await?;

        // A prefix match is advisory: its wheels were built from other
        // manifest contents and may be stale, so the build still runs in
        // full. Seeding just saves rebuilding wheels that carried over.
        if let Some(near) = self.c.store.get_by_prefix(&key.restore_prefix()).await? {
            warn!(
                "Restored near-matching entry {} ({} wheels, may be stale)",
                near.key, near.wheel_count
            );
            seed_wheelhouse(&near, &staged).await?;
        }

        if let Err(e) = self.c.wheels.build_wheels(&self.plan.manifests, &staged).await {
            let _ = fs::remove_dir_all(&staged).await;
            return Err(e);
        }

        let entry = self.c.store.put(key, &staged).await?;
        state.find_links = Some(entry.path);
        Ok(StageOutcome::Passed)
    }

    /// Two analyzer passes: gate first, advisory second
    async fn analysis(&self) -> WheelwrightResult<StageOutcome> {
        let gate = self
            .c
            .analyzer
            .analyze(&self.plan.project_dir, &self.plan.gate)
            .await?;
        if gate.findings > 0 && self.plan.gate.on_violation == OnViolation::Abort {
            error!("{}", gate.output.trim_end());
            return Err(WheelwrightError::AnalysisGate {
                count: gate.findings,
            });
        }

        let advisory = self
            .c
            .analyzer
            .analyze(&self.plan.project_dir, &self.plan.advisory)
            .await?;
        if advisory.findings > 0 {
            info!("{}", advisory.output.trim_end());
            Ok(StageOutcome::Advisory {
                findings: advisory.findings,
            })
        } else {
            Ok(StageOutcome::Passed)
        }
    }
}

/// Copy the wheel files of a near-matching entry into a staging dir
async fn seed_wheelhouse(near: &CacheEntry, staged: &Path) -> WheelwrightResult<()> {
    let mut entries = fs::read_dir(&near.path)
        .await
        .map_err(|e| WheelwrightError::io("reading near-match entry", e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| WheelwrightError::io("iterating near-match entry", e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|x| x == "whl") {
            if let Some(name) = path.file_name() {
                fs::copy(&path, staged.join(name))
                    .await
                    .map_err(|e| WheelwrightError::io("seeding wheelhouse", e))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FsWheelStore;
    use crate::toolchain::{AnalysisReport, TestReport};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Calls = Arc<Mutex<Vec<String>>>;

    fn record(calls: &Calls, what: impl Into<String>) {
        calls.lock().unwrap().push(what.into());
    }

    struct StubSystem(Calls);

    #[async_trait]
    impl SystemInstaller for StubSystem {
        async fn install(&self, packages: &[String]) -> WheelwrightResult<()> {
            record(&self.0, format!("system({})", packages.len()));
            Ok(())
        }
        async fn is_available(&self) -> bool {
            true
        }
        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct StubEngine(Calls);

    #[async_trait]
    impl EngineInstaller for StubEngine {
        async fn install(&self, descriptor: &EngineDescriptor) -> WheelwrightResult<()> {
            record(&self.0, format!("engine({})", descriptor.artifact_id()));
            Ok(())
        }
        async fn is_available(&self) -> bool {
            true
        }
        fn installer_name(&self) -> String {
            "stub".to_string()
        }
    }

    struct StubBuilder(Calls);

    #[async_trait]
    impl WheelBuilder for StubBuilder {
        async fn build_wheels(&self, _: &[PathBuf], dest: &Path) -> WheelwrightResult<()> {
            record(&self.0, "build");
            fs::write(dest.join("fake-1.0-py3-none-any.whl"), b"wheel").await.unwrap();
            Ok(())
        }
    }

    struct StubDeps(Calls);

    #[async_trait]
    impl DependencyInstaller for StubDeps {
        async fn install(
            &self,
            _: &[PathBuf],
            find_links: Option<&Path>,
        ) -> WheelwrightResult<()> {
            record(
                &self.0,
                format!("install(find_links={})", find_links.is_some()),
            );
            Ok(())
        }
        async fn install_unpinned(&self, package: &str) -> WheelwrightResult<()> {
            record(&self.0, format!("unpinned({})", package));
            Ok(())
        }
    }

    struct StubAnalyzer {
        calls: Calls,
        gate_findings: u32,
        advisory_findings: u32,
    }

    #[async_trait]
    impl Analyzer for StubAnalyzer {
        async fn analyze(&self, _: &Path, ruleset: &Ruleset) -> WheelwrightResult<AnalysisReport> {
            let (label, findings) = match ruleset.on_violation {
                OnViolation::Abort => ("gate", self.gate_findings),
                OnViolation::Report => ("advisory", self.advisory_findings),
            };
            record(&self.calls, format!("analyze({})", label));
            Ok(AnalysisReport {
                findings,
                output: format!("{} finding(s)", findings),
            })
        }
        async fn is_available(&self) -> bool {
            true
        }
    }

    struct StubTests {
        calls: Calls,
        exit_code: i32,
    }

    #[async_trait]
    impl TestRunner for StubTests {
        async fn run_tests(&self, _: &Path) -> WheelwrightResult<TestReport> {
            record(&self.calls, "tests");
            Ok(TestReport {
                exit_code: self.exit_code,
            })
        }
        async fn is_available(&self) -> bool {
            true
        }
    }

    struct Harness {
        temp: TempDir,
        calls: Calls,
        plan: ProvisionPlan,
    }

    impl Harness {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let runtime = temp.path().join("requirements.txt");
            std::fs::write(&runtime, "numpy==1.19.5\npandas==1.1.5\n").unwrap();
            let dev = temp.path().join("requirements-dev.txt");
            std::fs::write(&dev, "pytest==6.2.2\n").unwrap();

            let plan = ProvisionPlan {
                project_dir: temp.path().to_path_buf(),
                manifests: vec![runtime, dev],
                system_packages: vec!["build-essential".to_string()],
                engine: EngineDescriptor {
                    version: "9.2.0".to_string(),
                    sha: "921312fa1d".to_string(),
                    install_version: "9-2-0".to_string(),
                },
                extra_package: Some("energy-pandas".to_string()),
                gate: Ruleset::gate(vec!["E9".to_string(), "F82".to_string()]),
                advisory: Ruleset::advisory(10, 127),
                namespace: "pip".to_string(),
                fresh: false,
            };

            Self {
                temp,
                calls: Calls::default(),
                plan,
            }
        }

        fn store(&self) -> FsWheelStore {
            FsWheelStore::new(self.temp.path().join("wheels"))
        }

        fn provisioner(&self, gate_findings: u32, advisory_findings: u32, exit_code: i32) -> Provisioner {
            let calls = self.calls.clone();
            Provisioner::new(
                self.plan.clone(),
                Collaborators {
                    system: Box::new(StubSystem(calls.clone())),
                    engine: Box::new(StubEngine(calls.clone())),
                    wheels: Box::new(StubBuilder(calls.clone())),
                    deps: Box::new(StubDeps(calls.clone())),
                    analyzer: Box::new(StubAnalyzer {
                        calls: calls.clone(),
                        gate_findings,
                        advisory_findings,
                    }),
                    tests: Box::new(StubTests { calls, exit_code }),
                    store: Box::new(self.store()),
                },
            )
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn key(&self) -> CacheKey {
            CacheKey::compute("pip", &self.plan.manifests).unwrap()
        }
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let h = Harness::new();
        let report = h.provisioner(0, 0, 0).run().await.unwrap();

        assert_eq!(
            h.calls(),
            vec![
                "system(1)",
                "engine(9.2.0+921312fa1d)",
                "build",
                "install(find_links=true)",
                "unpinned(energy-pandas)",
                "analyze(gate)",
                "analyze(advisory)",
                "tests",
            ]
        );
        assert!(!report.cache_hit);
        assert_eq!(report.requirement_count, 3);
        assert_eq!(report.stages.len(), 6);
    }

    #[tokio::test]
    async fn miss_publishes_entry_then_hit_skips_build() {
        let h = Harness::new();
        let key = h.key();

        let first = h.provisioner(0, 0, 0).run().await.unwrap();
        assert!(!first.cache_hit);
        assert!(h.store().get(&key).await.unwrap().is_some());

        let second = h.provisioner(0, 0, 0).run().await.unwrap();
        assert!(second.cache_hit);

        // One build across both runs: the hit skipped it entirely
        let builds = h.calls().iter().filter(|c| *c == "build").count();
        assert_eq!(builds, 1);

        let wheel_stage = second
            .stages
            .iter()
            .find(|s| s.stage == StageId::WheelBuild)
            .unwrap();
        assert!(matches!(wheel_stage.outcome, StageOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn changed_manifest_misses_and_publishes_new_entry() {
        let h = Harness::new();
        h.provisioner(0, 0, 0).run().await.unwrap();
        let old_key = h.key();

        // New manifest contents produce a new key, never an overwrite
        std::fs::write(&h.plan.manifests[0], "numpy==1.20.0\n").unwrap();
        let report = h.provisioner(0, 0, 0).run().await.unwrap();
        let new_key = h.key();

        assert!(!report.cache_hit);
        assert_ne!(old_key, new_key);
        assert!(h.store().get(&old_key).await.unwrap().is_some());
        assert!(h.store().get(&new_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn gate_failure_halts_before_tests() {
        let h = Harness::new();
        let err = h.provisioner(2, 0, 0).run().await.unwrap_err();

        assert!(matches!(err, WheelwrightError::AnalysisGate { count: 2 }));
        let calls = h.calls();
        assert!(calls.contains(&"analyze(gate)".to_string()));
        assert!(!calls.contains(&"analyze(advisory)".to_string()));
        assert!(!calls.contains(&"tests".to_string()));
    }

    #[tokio::test]
    async fn advisory_findings_never_fail_the_run() {
        let h = Harness::new();
        let report = h.provisioner(0, 17, 0).run().await.unwrap();

        assert_eq!(report.advisory_findings, 17);
        let analysis = report
            .stages
            .iter()
            .find(|s| s.stage == StageId::Analysis)
            .unwrap();
        assert_eq!(analysis.outcome, StageOutcome::Advisory { findings: 17 });
        assert!(h.calls().contains(&"tests".to_string()));
    }

    #[tokio::test]
    async fn failing_tests_are_fatal() {
        let h = Harness::new();
        let err = h.provisioner(0, 0, 1).run().await.unwrap_err();
        assert!(matches!(err, WheelwrightError::TestsFailed { code: 1 }));
    }

    #[tokio::test]
    async fn fresh_drops_entry_and_rebuilds() {
        let mut h = Harness::new();
        h.provisioner(0, 0, 0).run().await.unwrap();

        h.plan.fresh = true;
        h.provisioner(0, 0, 0).run().await.unwrap();

        let builds = h.calls().iter().filter(|c| *c == "build").count();
        assert_eq!(builds, 2);
    }

    #[tokio::test]
    async fn hit_path_end_to_end_with_advisories() {
        let h = Harness::new();
        h.provisioner(0, 0, 0).run().await.unwrap();

        // Manifests unchanged: hit, no build, advisory findings reported,
        // tests pass, run succeeds
        let report = h.provisioner(0, 4, 0).run().await.unwrap();
        assert!(report.cache_hit);
        assert_eq!(report.advisory_findings, 4);
        let builds = h.calls().iter().filter(|c| *c == "build").count();
        assert_eq!(builds, 1);
    }
}
