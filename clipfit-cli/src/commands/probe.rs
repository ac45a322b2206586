//! `probe` command: show what ffprobe reports for one input.

use anyhow::{Result, bail};
use clipfit_core::check_dependency;
use clipfit_core::external::ffprobe_executor::ensure_allowed_input;
use clipfit_core::external::{CrateFfprobeExecutor, FfprobeExecutor};

use crate::cli::ProbeArgs;
use crate::output;

/// Runs the `probe` command.
pub fn run_probe(args: &ProbeArgs) -> Result<()> {
    let input_path = &args.input_path;
    if !input_path.is_file() {
        bail!("Input file '{}' does not exist", input_path.display());
    }
    ensure_allowed_input(input_path)?;
    check_dependency("ffprobe")?;

    let info = CrateFfprobeExecutor::new().probe_media_info(input_path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        output::print_media_info(input_path, &info);
    }
    Ok(())
}
