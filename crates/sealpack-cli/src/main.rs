use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sealpack_core::env::HostEnvironment;
use sealpack_core::pipeline::{Pipeline, PipelinePlan, Toolchain, render_summary};
use sealpack_core::settings::Settings;
use sealpack_core::tools::{
    CommandPatcher, CommandRegistrar, ManifestContext, ProcessLauncher, RuntimeCompiler,
};
use sealpack_core::{Error, PipelineError, Stage, TOOL_NAME};

mod args;

fn main() {
    // Logs go to stderr; stdout belongs to the launched artifact.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = args::Args::parse();

    let code = match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{TOOL_NAME}: {err:#}");
            exit_code_for(&err)
        }
    };

    std::process::exit(code);
}

fn run(args: args::Args) -> Result<i32> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let config_path = std::env::var_os(args::CONFIG_ENV).map(std::path::PathBuf::from);
    let settings =
        Settings::discover(config_path.as_deref(), &cwd).context("failed to load configuration")?;

    let requirements = settings.requirements();
    let gate = |source: Error| PipelineError::new(Stage::Environment, source);

    // The OS is checked before the runtime is looked up or run.
    requirements.check_host_os().map_err(gate)?;
    let runtime = which::which(&settings.runtime)
        .map_err(|e| Error::Environment(format!("runtime `{}` not found: {e}", settings.runtime)))
        .map_err(gate)?;
    let environment = HostEnvironment::detect(&runtime).map_err(gate)?;

    let compiler = RuntimeCompiler::new(&runtime, settings.compiler_args.clone());
    let patcher = CommandPatcher::new(&settings.patcher)?;
    let registrar = CommandRegistrar::new(&settings.registrar.command)?;
    let launcher = ProcessLauncher::new();

    let plan = PipelinePlan {
        workspace: settings.workspace.clone(),
        script: settings.script.clone(),
        host_binary: runtime,
        manifest: ManifestContext {
            manifest: settings.registrar.manifest.clone(),
        },
        requirements,
    };
    let tools = Toolchain {
        compiler: &compiler,
        patcher: &patcher,
        registrar: &registrar,
        launcher: &launcher,
    };

    let report = Pipeline::new(plan, environment, tools).run(&args.forward)?;
    info!("{}", render_summary(&report));

    Ok(report.exit_code)
}

/// A failing artifact passes its own exit code through; every other
/// failure exits with 1.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<PipelineError>()
        .and_then(PipelineError::child_exit_code)
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
