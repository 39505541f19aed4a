use std::ffi::OsString;

use clap::Parser;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SEALPACK_CONFIG";

#[derive(Debug, Parser)]
#[command(
    name = "sealpack",
    version,
    about = "Build, embed, register and launch a packaged script executable",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Arguments forwarded verbatim to the packaged artifact
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub forward: Vec<OsString>,
}
