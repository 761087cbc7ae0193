use std::{io, process::ExitCode};

use clap::Parser;
use lang_backport::{
   backport::{self, RunSummary},
   config::BackportConfig,
   error::Result,
   style,
   types::Args,
};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize diagnostic logging on stderr; `--log-level` wins over `RUST_LOG`
fn init_logging(log_level: Option<&str>) {
   let filter = match log_level.map(str::to_lowercase).as_deref() {
      Some(level @ ("off" | "error" | "warn" | "info" | "debug" | "trace")) => EnvFilter::new(level),
      Some("warning") => EnvFilter::new("warn"),
      Some(other) => {
         style::warn(&format!("Invalid log level '{other}', using 'warn'"));
         EnvFilter::new("warn")
      },
      None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
   };

   fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .with_target(false)
      .init();
}

/// Load config from args or the repository default
fn load_config_from_args(args: &Args) -> Result<BackportConfig> {
   let mut config = if let Some(ref config_path) = args.config {
      BackportConfig::from_file(config_path)?
   } else {
      BackportConfig::load(&args.dir)?
   };
   args.apply_overrides(&mut config);
   Ok(config)
}

fn print_summary(summary: &RunSummary) {
   let mut parts = Vec::new();
   if summary.applied() > 0 {
      parts.push(format!("{} applied", summary.applied()));
   }
   if summary.printed() > 0 {
      parts.push(format!("{} printed", summary.printed()));
   }
   if summary.skipped() > 0 {
      parts.push(format!("{} skipped", summary.skipped()));
   }
   if summary.failed() > 0 {
      parts.push(style::error(&format!("{} failed", summary.failed())));
   }
   if parts.is_empty() {
      parts.push("no language files".to_string());
   }
   style::print_info(&parts.join(", "));
}

fn run(args: &Args) -> Result<RunSummary> {
   let config = load_config_from_args(args)?;
   tracing::debug!(?config, "resolved config");

   let stdout = io::stdout();
   let mut out = stdout.lock();
   backport::run(&args.dir, &config, &args.languages, args.action(), &mut out)
}

fn main() -> ExitCode {
   let args = Args::parse();
   init_logging(args.log_level.as_deref());

   match run(&args) {
      Ok(summary) => {
         print_summary(&summary);
         if summary.is_success() {
            ExitCode::SUCCESS
         } else {
            ExitCode::FAILURE
         }
      },
      Err(err) => {
         eprintln!("{} {err}", style::error(style::icons::ERROR));
         ExitCode::FAILURE
      },
   }
}
