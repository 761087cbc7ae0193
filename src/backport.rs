//! Backport flow for one run.
//!
//! 1. Diff the reference file and blacklist every identifier it touches
//! 2. Resolve the target language files
//! 3. Diff and filter every target in parallel against the shared blacklist
//! 4. In target order: print or apply each surviving patch
use std::{
   io::Write,
   path::{Path, PathBuf},
};

use rayon::prelude::*;

use crate::{
   blacklist::Blacklist,
   config::BackportConfig,
   error::{BackportError, Result},
   filter::{FilterStats, FilteredDiff, filter_diff},
   git::{apply_patch, diff_file, discover_language_files},
   style,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
   /// `git apply --recount` each rewritten patch
   Apply,
   /// Write each rewritten patch to the output instead of applying it
   Print,
}

#[derive(Debug)]
pub enum FileOutcome {
   Applied(FilterStats),
   Printed(FilterStats),
   /// Nothing survived filtering; the file was left alone
   Skipped,
   /// Input-contract violation; only this file was abandoned
   Failed(BackportError),
}

#[derive(Debug)]
pub struct FileReport {
   pub file:    PathBuf,
   pub outcome: FileOutcome,
}

#[derive(Debug, Default)]
pub struct RunSummary {
   pub blacklisted: usize,
   pub reports:     Vec<FileReport>,
}

impl RunSummary {
   fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
      self.reports.iter().filter(|r| pred(&r.outcome)).count()
   }

   pub fn applied(&self) -> usize {
      self.count(|o| matches!(o, FileOutcome::Applied(_)))
   }

   pub fn printed(&self) -> usize {
      self.count(|o| matches!(o, FileOutcome::Printed(_)))
   }

   pub fn skipped(&self) -> usize {
      self.count(|o| matches!(o, FileOutcome::Skipped))
   }

   pub fn failed(&self) -> usize {
      self.count(|o| matches!(o, FileOutcome::Failed(_)))
   }

   pub fn is_success(&self) -> bool {
      self.failed() == 0
   }
}

/// Blacklist built from the upstream changes to the reference file.
pub fn build_blacklist(dir: &Path, config: &BackportConfig) -> Result<Blacklist> {
   let diff = diff_file(dir, &config.revision_range(), &config.reference_file)
      .map_err(|e| e.for_file(&config.reference_file))?;
   let blacklist =
      Blacklist::from_reference_diff(&diff).map_err(|e| e.for_file(&config.reference_file))?;
   tracing::trace!(identifiers = ?blacklist.iter().collect::<Vec<_>>(), "blacklisted identifiers");
   Ok(blacklist)
}

/// Explicit language names, or every discovered language file when none are
/// given.
pub fn resolve_targets(
   dir: &Path,
   config: &BackportConfig,
   languages: &[String],
) -> Result<Vec<PathBuf>> {
   if languages.is_empty() {
      discover_language_files(dir, config)
   } else {
      Ok(languages.iter().map(|name| config.language_path(name)).collect())
   }
}

/// Diff one target and filter it against the blacklist.
pub fn prepare_file(
   dir: &Path,
   range: &str,
   file: &Path,
   blacklist: &Blacklist,
) -> Result<Option<FilteredDiff>> {
   let diff = diff_file(dir, range, file).map_err(|e| e.for_file(file))?;
   filter_diff(&diff, blacklist).map_err(|e| e.for_file(file))
}

/// Path shown to the user, relative to the first language directory when
/// possible (`unfinished/klingon.txt` rather than `src/lang/unfinished/...`).
fn display_name(file: &Path, config: &BackportConfig) -> String {
   config
      .language_dirs
      .first()
      .and_then(|root| file.strip_prefix(root).ok())
      .unwrap_or(file)
      .display()
      .to_string()
}

/// Run a full backport. Apply failures and git errors abort the run;
/// malformed per-file diffs are recorded and the run moves on.
pub fn run(
   dir: &Path,
   config: &BackportConfig,
   languages: &[String],
   action: Action,
   out: &mut impl Write,
) -> Result<RunSummary> {
   let blacklist = build_blacklist(dir, config)?;
   style::print_info(&format!(
      "{} identifier(s) changed in {} between {}",
      blacklist.len(),
      config.reference_file.display(),
      config.revision_range()
   ));

   let targets = resolve_targets(dir, config, languages)?;
   let range = config.revision_range();

   let prepared: Vec<_> = targets
      .par_iter()
      .map(|file| prepare_file(dir, &range, file, &blacklist))
      .collect();

   let mut summary = RunSummary { blacklisted: blacklist.len(), reports: Vec::new() };

   for (file, result) in targets.into_iter().zip(prepared) {
      let name = display_name(&file, config);
      eprintln!("Backporting {} ...", style::bold(&name));

      let outcome = match result {
         Ok(None) => {
            eprintln!("  {}", style::dim("no changes survive; skipped"));
            FileOutcome::Skipped
         },
         Ok(Some(filtered)) => {
            let stats = filtered.stats;
            match action {
               Action::Print => {
                  out.write_all(filtered.to_patch().as_bytes())?;
                  FileOutcome::Printed(stats)
               },
               Action::Apply => {
                  apply_patch(dir, &file, &filtered.to_patch())?;
                  eprintln!(
                     "  {} {} hunk(s) applied, {} blacklisted line(s) reverted",
                     style::success(style::icons::SUCCESS),
                     stats.kept_hunks,
                     stats.reverted()
                  );
                  FileOutcome::Applied(stats)
               },
            }
         },
         Err(err) if err.is_file_local() => {
            eprintln!("  {} {err}", style::error(style::icons::ERROR));
            FileOutcome::Failed(err)
         },
         Err(err) => return Err(err),
      };

      tracing::info!(file = %file.display(), ?outcome, "processed language file");
      summary.reports.push(FileReport { file, outcome });
   }

   Ok(summary)
}
