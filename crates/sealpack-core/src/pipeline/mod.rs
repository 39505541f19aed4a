//! Pipeline orchestrator.
//!
//! Runs the fixed sequence environment gate → stage → assemble →
//! [register] → launch. Steps run strictly one after another; the first
//! failure aborts the run, wrapped with the stage it came from. Nothing is
//! retried and nothing is rolled back: every partial state is safely
//! rebuilt by the next run.

pub mod report;
pub mod state;

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::ARTIFACT_FILE;
use crate::build::{self, Assembler};
use crate::env::{HostEnvironment, Requirements};
use crate::error::{Error, PipelineError, Stage};
use crate::tools::{Compiler, Launcher, ManifestContext, Patcher, Registrar};

pub use report::{PipelineReport, render_summary};
pub use state::State;

/// Inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub workspace: PathBuf,
    pub script: PathBuf,
    pub host_binary: PathBuf,
    pub manifest: ManifestContext,
    pub requirements: Requirements,
}

/// External collaborators, one per step that leaves the process.
#[derive(Clone, Copy)]
pub struct Toolchain<'a> {
    pub compiler: &'a dyn Compiler,
    pub patcher: &'a dyn Patcher,
    pub registrar: &'a dyn Registrar,
    pub launcher: &'a dyn Launcher,
}

pub struct Pipeline<'a> {
    plan: PipelinePlan,
    environment: HostEnvironment,
    tools: Toolchain<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(plan: PipelinePlan, environment: HostEnvironment, tools: Toolchain<'a>) -> Self {
        Self {
            plan,
            environment,
            tools,
        }
    }

    /// Build the artifact if needed and run it with `args`.
    ///
    /// Resolves only when the artifact exits with code 0; any other exit
    /// surfaces as [`Error::ChildProcess`] under [`Stage::Launch`].
    pub fn run(&self, args: &[OsString]) -> Result<PipelineReport, PipelineError> {
        let mut progress = Progress::new();

        self.environment
            .check(&self.plan.requirements)
            .map_err(at(Stage::Environment))?;

        let workspace = std::path::absolute(&self.plan.workspace)
            .map_err(|e| Error::io_at("resolve", &self.plan.workspace, e))
            .map_err(at(Stage::Staging))?;

        build::stage(&workspace, &self.plan.script).map_err(at(Stage::Staging))?;
        progress.advance(State::Staged);

        let assembly = Assembler::new(self.tools.compiler, self.tools.patcher)
            .assemble(&workspace, &self.plan.host_binary)
            .map_err(at(Stage::Assemble))?;

        let mut report = PipelineReport::new(assembly.previous.as_ref(), &assembly.current);
        report.rebuilt = assembly.rebuilt;

        if assembly.rebuilt {
            progress.advance(State::Built);
            self.tools
                .registrar
                .register(&self.plan.manifest)
                .map_err(at(Stage::Register))?;
            report.registered = true;
            progress.advance(State::Registered);
        } else {
            progress.advance(State::Skipped);
        }

        progress.advance(State::Running);
        let artifact = workspace.join(ARTIFACT_FILE);
        report.exit_code = self
            .tools
            .launcher
            .run(&artifact, args)
            .map_err(at(Stage::Launch))?;
        progress.advance(State::Done);

        report.states = progress.into_states();
        info!(rebuilt = report.rebuilt, exit_code = report.exit_code, "pipeline finished");

        Ok(report)
    }
}

fn at(stage: Stage) -> impl FnOnce(Error) -> PipelineError {
    move |source| PipelineError::new(stage, source)
}

/// Records visited states and enforces the transition table.
struct Progress {
    states: Vec<State>,
}

impl Progress {
    fn new() -> Self {
        Self {
            states: vec![State::Idle],
        }
    }

    fn current(&self) -> State {
        self.states.last().copied().unwrap_or(State::Idle)
    }

    fn advance(&mut self, next: State) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(next),
            "invalid pipeline transition {current} -> {next}"
        );
        debug!(from = %current, to = %next, "pipeline transition");
        self.states.push(next);
    }

    fn into_states(self) -> Vec<State> {
        self.states
    }
}
