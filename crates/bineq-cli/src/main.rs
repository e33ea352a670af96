use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bineq_core::batch::{
    BatchOptions, CancellationToken, batch_exit_status, load_manifest, run_batch,
    write_batch_reports,
};
use bineq_core::config::CompareConfig;
use bineq_core::report::model::ToolInfo;
use bineq_core::report::render::{self, ReportFormat};

mod args;

use args::{Args, BatchArgs, Command, CompareArgs, ConfigArgs, OutputFormat};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let code = match args.command {
        Command::Compare(cmd) => run_compare(cmd)?,
        Command::Batch(cmd) => run_batch_cmd(cmd)?,
    };

    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn tool_info(commit: Option<String>) -> ToolInfo {
    ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit,
    }
}

/// File values first, then flag overrides. Non-empty lists replace.
fn load_config(settings: &ConfigArgs) -> Result<CompareConfig> {
    let mut config = match &settings.config_file {
        Some(path) => CompareConfig::from_json_file(path)?,
        None => CompareConfig::default(),
    };

    if !settings.watch_class.is_empty() {
        config.class_watch_list = settings.watch_class.clone();
    }
    if !settings.search.is_empty() {
        config.search_terms = settings.search.clone();
    }
    if let Some(v) = settings.size_tolerance {
        config.size_tolerance_percent = v;
    }
    if let Some(v) = settings.size_warn {
        config.size_warn_percent = v;
    }
    if let Some(v) = settings.missing_ratio {
        config.size_critical_ratio = v;
    }
    if let Some(v) = settings.timeout_secs {
        config.introspect_timeout_secs = v;
    }
    Ok(config)
}

fn run_compare(cmd: CompareArgs) -> Result<i32> {
    let config = load_config(&cmd.settings)?;
    let result = bineq_core::compare(&cmd.baseline, &cmd.candidate, &config, tool_info(cmd.commit));

    let format = match cmd.format {
        OutputFormat::Json => ReportFormat::Machine,
        OutputFormat::Text => ReportFormat::Human,
    };

    if let Some(path) = &cmd.json_out {
        render::write_report(&result, ReportFormat::Machine, path)?;
    }
    if let Some(path) = &cmd.text_out {
        render::write_report(&result, ReportFormat::Human, path)?;
    }

    match &cmd.out {
        Some(path) => render::write_report(&result, format, path)?,
        None => print!("{}", render::render(&result, format)?),
    }

    Ok(result.exit_code())
}

fn run_batch_cmd(cmd: BatchArgs) -> Result<i32> {
    let config = load_config(&cmd.settings)?;
    let jobs = load_manifest(&cmd.manifest)?;
    let options = BatchOptions {
        workers: cmd.jobs,
        fail_fast: cmd.fail_fast,
    };

    let entries = run_batch(
        &jobs,
        &config,
        &tool_info(cmd.commit),
        &options,
        &CancellationToken::new(),
    )?;

    if let Some(dir) = &cmd.out_dir {
        write_batch_reports(&entries, dir)?;
        info!(dir = %dir.display(), "wrote batch reports");
    }

    for entry in &entries {
        match entry.result() {
            Some(r) => println!("{:<32} {:<10} exit {}", entry.component, r.rating(), r.exit_code()),
            None => println!("{:<32} {:<10} exit 1", entry.component, "SKIPPED"),
        }
    }

    Ok(batch_exit_status(&entries))
}
