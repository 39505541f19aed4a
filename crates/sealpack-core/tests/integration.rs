use sealpack_core::env::{HostEnvironment, Requirements};
use sealpack_core::pipeline::{Pipeline, PipelinePlan, PipelineReport, State, Toolchain};
use sealpack_core::tools::{Compiler, Launcher, ManifestContext, PatchRequest, Patcher, Registrar};
use sealpack_core::{ARTIFACT_FILE, BLOB_FILE, Error, PipelineError, STAGED_SCRIPT_FILE, Stage};
use std::cell::Cell;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// "Compiles" by copying the staged script into the blob, so identical
/// sources yield identical blobs.
#[derive(Default)]
struct CopyCompiler {
    calls: Cell<usize>,
    fail: bool,
}

impl Compiler for CopyCompiler {
    fn compile(&self, workspace: &Path, config_file: &str) -> sealpack_core::Result<()> {
        self.calls.set(self.calls.get() + 1);
        assert!(workspace.join(config_file).is_file(), "config written first");
        if self.fail {
            return Err(Error::BuildTool {
                message: "`runtime` exited with code 1".into(),
                stderr: "SyntaxError".into(),
            });
        }
        fs::copy(workspace.join(STAGED_SCRIPT_FILE), workspace.join(BLOB_FILE)).unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct AppendPatcher {
    calls: Cell<usize>,
    fail: Cell<bool>,
}

impl Patcher for AppendPatcher {
    fn patch(&self, workspace: &Path, request: &PatchRequest<'_>) -> sealpack_core::Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(Error::PatchTool {
                message: "`postject` exited with code 1".into(),
                stderr: "resource section not found".into(),
            });
        }
        let mut bytes = fs::read(workspace.join(request.artifact)).unwrap();
        bytes.extend(fs::read(workspace.join(request.blob)).unwrap());
        fs::write(workspace.join(request.artifact), bytes).unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct CountingRegistrar {
    calls: Cell<usize>,
    fail: bool,
}

impl Registrar for CountingRegistrar {
    fn register(&self, _context: &ManifestContext) -> sealpack_core::Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(Error::Registration {
                message: "developer mode disabled".into(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Reports a fixed exit code without spawning anything.
#[derive(Default)]
struct FakeLauncher {
    calls: Cell<usize>,
    exit_code: i32,
}

impl Launcher for FakeLauncher {
    fn run(&self, artifact: &Path, _args: &[OsString]) -> sealpack_core::Result<i32> {
        self.calls.set(self.calls.get() + 1);
        assert!(artifact.is_file(), "launching a missing artifact");
        match self.exit_code {
            0 => Ok(0),
            code => Err(Error::ChildProcess { code: Some(code) }),
        }
    }
}

#[derive(Default)]
struct Fakes {
    compiler: CopyCompiler,
    patcher: AppendPatcher,
    registrar: CountingRegistrar,
    launcher: FakeLauncher,
}

impl Fakes {
    fn toolchain(&self) -> Toolchain<'_> {
        Toolchain {
            compiler: &self.compiler,
            patcher: &self.patcher,
            registrar: &self.registrar,
            launcher: &self.launcher,
        }
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(source: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.js"), source).unwrap();
        fs::write(dir.path().join("host-runtime"), b"HOST\n").unwrap();
        Self { dir }
    }

    fn write_source(&self, source: &str) {
        fs::write(self.dir.path().join("index.js"), source).unwrap();
    }

    fn workspace(&self) -> PathBuf {
        self.dir.path().join("dist")
    }

    fn artifact(&self) -> PathBuf {
        self.workspace().join(ARTIFACT_FILE)
    }

    fn plan(&self) -> PipelinePlan {
        PipelinePlan {
            workspace: self.workspace(),
            script: self.dir.path().join("index.js"),
            host_binary: self.dir.path().join("host-runtime"),
            manifest: ManifestContext {
                manifest: self.dir.path().join("AppxManifest.xml"),
            },
            requirements: requirements(),
        }
    }

    fn run(&self, fakes: &Fakes) -> Result<PipelineReport, PipelineError> {
        self.run_on(fakes, supported_host())
    }

    fn run_on(&self, fakes: &Fakes, host: HostEnvironment) -> Result<PipelineReport, PipelineError> {
        Pipeline::new(self.plan(), host, fakes.toolchain()).run(&["--verbose".into()])
    }
}

fn requirements() -> Requirements {
    Requirements {
        target_os: "windows".into(),
        min_runtime_major: 20,
    }
}

fn supported_host() -> HostEnvironment {
    HostEnvironment {
        os: "windows".into(),
        runtime_version: semver_version(22),
    }
}

fn semver_version(major: u64) -> sealpack_core::env::Version {
    sealpack_core::env::Version::new(major, 0, 0)
}

#[test]
fn fresh_workspace_builds_registers_and_launches() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();

    let report = project.run(&fakes).expect("pipeline succeeds");

    assert!(report.rebuilt);
    assert!(report.registered);
    assert_eq!(report.previous_digest, None);
    assert_eq!(report.exit_code, 0);
    assert_eq!(
        report.states,
        vec![
            State::Idle,
            State::Staged,
            State::Built,
            State::Registered,
            State::Running,
            State::Done
        ]
    );
    assert!(project.artifact().is_file());
    assert_eq!(fakes.registrar.calls.get(), 1);
    assert_eq!(fakes.launcher.calls.get(), 1);
}

#[test]
fn second_identical_run_skips_embed_and_registration() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();

    let first = project.run(&fakes).unwrap();
    let bytes_before = fs::read(project.artifact()).unwrap();
    let mtime_before = fs::metadata(project.artifact()).unwrap().modified().unwrap();

    let second = project.run(&fakes).unwrap();

    assert!(!second.rebuilt);
    assert!(!second.registered);
    assert_eq!(second.previous_digest.as_deref(), Some(first.digest.as_str()));
    assert_eq!(second.digest, first.digest);
    assert_eq!(
        second.states,
        vec![State::Idle, State::Staged, State::Skipped, State::Running, State::Done]
    );

    assert_eq!(fs::read(project.artifact()).unwrap(), bytes_before);
    assert_eq!(
        fs::metadata(project.artifact()).unwrap().modified().unwrap(),
        mtime_before
    );

    // The blob is still recompiled every run; only embedding is skipped.
    assert_eq!(fakes.compiler.calls.get(), 2);
    assert_eq!(fakes.patcher.calls.get(), 1);
    assert_eq!(fakes.registrar.calls.get(), 1);
    assert_eq!(fakes.launcher.calls.get(), 2);
}

#[test]
fn registration_follows_rebuilds_across_skip_then_change() {
    let project = Project::new("v1();\n");
    let fakes = Fakes::default();

    let mut rebuilt = Vec::new();
    for source in ["v1();\n", "v1();\n", "v2();\n", "v2();\n", "v3();\n"] {
        project.write_source(source);
        rebuilt.push(project.run(&fakes).unwrap().rebuilt);
    }

    assert_eq!(rebuilt, vec![true, false, true, false, true]);
    assert_eq!(fakes.registrar.calls.get(), 3);
    assert_eq!(fakes.patcher.calls.get(), 3);
    assert_eq!(fakes.launcher.calls.get(), 5);
}

#[test]
fn changed_source_writes_a_new_artifact() {
    let project = Project::new("v1();\n");
    let fakes = Fakes::default();

    project.run(&fakes).unwrap();
    let before = fs::read(project.artifact()).unwrap();

    project.write_source("v2();\n");
    let report = project.run(&fakes).unwrap();

    assert!(report.rebuilt);
    let after = fs::read(project.artifact()).unwrap();
    assert_ne!(after, before);
    assert!(after.starts_with(b"HOST\n"));
    assert!(String::from_utf8_lossy(&after).ends_with("v2();\n"));
}

#[test]
fn compiler_failure_never_reaches_registrar_or_launcher() {
    let project = Project::new("broken(\n");
    let fakes = Fakes {
        compiler: CopyCompiler {
            fail: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let err = project.run(&fakes).unwrap_err();

    assert_eq!(err.stage, Stage::Assemble);
    assert!(matches!(err.source, Error::BuildTool { .. }));
    assert_eq!(fakes.patcher.calls.get(), 0);
    assert_eq!(fakes.registrar.calls.get(), 0);
    assert_eq!(fakes.launcher.calls.get(), 0);
    assert!(!project.artifact().exists());
}

#[test]
fn patch_failure_never_reaches_registrar_or_launcher() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();
    fakes.patcher.fail.set(true);

    let err = project.run(&fakes).unwrap_err();

    assert_eq!(err.stage, Stage::Assemble);
    assert!(matches!(err.source, Error::PatchTool { .. }));
    assert_eq!(fakes.patcher.calls.get(), 1);
    assert_eq!(fakes.registrar.calls.get(), 0);
    assert_eq!(fakes.launcher.calls.get(), 0);
}

#[test]
fn rerun_after_patch_failure_rebuilds_and_registers() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();

    fakes.patcher.fail.set(true);
    project.run(&fakes).unwrap_err();

    fakes.patcher.fail.set(false);
    let report = project.run(&fakes).unwrap();

    assert!(report.rebuilt);
    assert!(report.registered);
    assert_eq!(report.previous_digest, None);
    assert_eq!(fakes.patcher.calls.get(), 2);
    assert_eq!(fakes.registrar.calls.get(), 1);
    assert!(String::from_utf8_lossy(&fs::read(project.artifact()).unwrap()).ends_with("main();\n"));
}

#[test]
fn deleted_artifact_is_rebuilt_and_registered() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();

    project.run(&fakes).unwrap();
    fs::remove_file(project.artifact()).unwrap();
    let report = project.run(&fakes).unwrap();

    assert!(report.rebuilt);
    assert_eq!(fakes.registrar.calls.get(), 2);
    assert_eq!(fakes.launcher.calls.get(), 2);
    assert!(project.artifact().is_file());
}

#[test]
fn registration_failure_aborts_before_launch_but_keeps_artifact() {
    let project = Project::new("main();\n");
    let fakes = Fakes {
        registrar: CountingRegistrar {
            fail: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let err = project.run(&fakes).unwrap_err();

    assert_eq!(err.stage, Stage::Register);
    assert!(matches!(err.source, Error::Registration { .. }));
    assert_eq!(fakes.launcher.calls.get(), 0);
    assert!(project.artifact().is_file());
}

#[test]
fn unsupported_environment_fails_before_any_side_effect() {
    let project = Project::new("main();\n");
    let fakes = Fakes::default();

    let linux = HostEnvironment {
        os: "linux".into(),
        runtime_version: semver_version(22),
    };
    let err = project.run_on(&fakes, linux).unwrap_err();
    assert_eq!(err.stage, Stage::Environment);
    assert!(matches!(err.source, Error::Environment(_)));

    let old_runtime = HostEnvironment {
        os: "windows".into(),
        runtime_version: semver_version(18),
    };
    let err = project.run_on(&fakes, old_runtime).unwrap_err();
    assert_eq!(err.stage, Stage::Environment);

    assert!(!project.workspace().exists());
    assert_eq!(fakes.compiler.calls.get(), 0);
}

#[test]
fn missing_script_fails_in_staging() {
    let project = Project::new("main();\n");
    fs::remove_file(project.dir.path().join("index.js")).unwrap();
    let fakes = Fakes::default();

    let err = project.run(&fakes).unwrap_err();

    assert_eq!(err.stage, Stage::Staging);
    assert!(matches!(err.source, Error::Io { .. }));
    assert_eq!(fakes.compiler.calls.get(), 0);
}

#[test]
fn non_zero_child_exit_is_reported_with_its_code() {
    let project = Project::new("process.exit(3);\n");
    let fakes = Fakes {
        launcher: FakeLauncher {
            exit_code: 3,
            ..Default::default()
        },
        ..Default::default()
    };

    let err = project.run(&fakes).unwrap_err();

    assert_eq!(err.stage, Stage::Launch);
    assert_eq!(err.child_exit_code(), Some(3));
    // The build itself succeeded and stays usable.
    assert_eq!(fakes.registrar.calls.get(), 1);
    assert!(project.artifact().is_file());
}

#[test]
fn staged_script_carries_bootstrap_config() {
    let project = Project::new("main();\n");
    project.run(&Fakes::default()).unwrap();

    let staged = fs::read_to_string(project.workspace().join(STAGED_SCRIPT_FILE)).unwrap();
    let first_line = staged.lines().next().unwrap();

    assert!(first_line.starts_with("const __sealpack = Object.freeze("));
    assert!(first_line.contains("\"packaged\":true"));
    assert!(staged.ends_with("main();\n"));
}
