pub mod audit;
pub mod build;
pub mod console;
pub mod dispatch;
pub mod init;

use serde::Serialize;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::{self, TextView};
use crate::ui;

/// Print a command's final response. Text summaries respect `--quiet`;
/// JSON is always printed.
fn emit<T: Serialize + TextView>(value: &T, flags: &GlobalFlags) -> anyhow::Result<()> {
    if flags.format == OutputFormat::Json || ui::prefs().summary {
        output::output(value, flags.format)?;
    }
    Ok(())
}
