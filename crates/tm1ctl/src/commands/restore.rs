//! `restore`: upload a local backup set and restore a database from it.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tm1ctl_config::Config;
use tm1ctl_core::{DatabaseApi, FolderCheck, Restore, RestoreStage};

use crate::cli::{GlobalOpts, RestoreArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: RestoreArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let rest = config::rest_client(global)?;
    let overrides = config::overrides(global, Some(&args.database));
    let api = DatabaseApi::resolve(&rest, cfg, &overrides)?;

    let folder_check = if args.strict_folder_check {
        FolderCheck::CreateOnNotFound
    } else {
        FolderCheck::CreateOnAnyFailure
    };

    let spinner = spinner(global.quiet);
    let progress = spinner.clone();
    let result = Restore::new(&api)
        .folder_check(folder_check)
        .on_progress(move |stage| {
            if stage != RestoreStage::Done {
                progress.set_message(stage.to_string());
            }
        })
        .run(&args.backupset)
        .await;
    spinner.finish_and_clear();

    let report = result?;
    if let Some(warning) = &report.cleanup_warning {
        let msg = format!("warning: {warning}");
        if output::should_color() {
            eprintln!("{}", msg.yellow());
        } else {
            eprintln!("{msg}");
        }
    }
    output::print_output(
        &format!(
            "Restored database '{}' from '{}' ({} bytes uploaded).",
            args.database,
            args.backupset.display(),
            report.bytes_uploaded
        ),
        global.quiet,
    );
    Ok(())
}

/// Spinner on stderr; hidden when quiet or not attached to a terminal.
fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
