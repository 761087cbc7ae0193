use std::path::PathBuf;

use clap::Parser;

use crate::{backport::Action, config::BackportConfig};

// CLI Args
#[derive(Parser, Debug)]
#[command(
   author,
   version,
   about = "Backport translations from upstream to a release branch, skipping strings whose \
            source text changed",
   long_about = None
)]
pub struct Args {
   /// Languages to backport, e.g. `dutch` (default: every language file)
   #[arg(value_name = "LANGUAGE")]
   pub languages: Vec<String>,

   /// Only show the rewritten diff; do not apply
   #[arg(long)]
   pub diff: bool,

   /// Repository to operate in
   #[arg(long, default_value = ".")]
   pub dir: PathBuf,

   /// Path to config file (default: `$LANG_BACKPORT_CONFIG`, then
   /// `.lang-backport.toml` in the repository)
   #[arg(long)]
   pub config: Option<PathBuf>,

   /// Revision to backport from (default: upstream/master)
   #[arg(long)]
   pub upstream: Option<String>,

   /// Revision the release branch sits on (default: HEAD)
   #[arg(long)]
   pub base: Option<String>,

   /// Diagnostic log level (off, error, warn, info, debug, trace); overrides
   /// `RUST_LOG`
   #[arg(long)]
   pub log_level: Option<String>,
}

impl Default for Args {
   fn default() -> Self {
      Self {
         languages: vec![],
         diff:      false,
         dir:       PathBuf::from("."),
         config:    None,
         upstream:  None,
         base:      None,
         log_level: None,
      }
   }
}

impl Args {
   pub const fn action(&self) -> Action {
      if self.diff { Action::Print } else { Action::Apply }
   }

   /// Apply CLI overrides to config
   pub fn apply_overrides(&self, config: &mut BackportConfig) {
      if let Some(ref upstream) = self.upstream {
         config.upstream_ref.clone_from(upstream);
      }
      if let Some(ref base) = self.base {
         config.base_ref.clone_from(base);
      }
   }
}
