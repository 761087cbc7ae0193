//! Selective rewriting of a per-language diff.
//!
//! Modifications to blacklisted identifiers are reverted: additions vanish and
//! removals turn back into context, so the old translation stays in place.
//! Hunks left without any real change are dropped as a whole because
//! `git apply` rejects hunks that change nothing. Hunk line counts are left
//! stale on purpose; the patch must be applied with `--recount`.
use crate::{
   blacklist::Blacklist,
   diff::{Boundary, DiffLine, classify_stream},
   error::{BackportError, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
   pub kept_hunks:         usize,
   pub dropped_hunks:      usize,
   /// Non-blacklisted additions and removals carried over
   pub kept_modifications: usize,
   /// Blacklisted removals rewritten as context
   pub reverted_removals:  usize,
   /// Blacklisted additions omitted
   pub dropped_additions:  usize,
}

impl FilterStats {
   pub const fn reverted(&self) -> usize {
      self.reverted_removals + self.dropped_additions
   }
}

/// A rewritten diff with at least one surviving hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDiff {
   pub lines: Vec<String>,
   pub stats: FilterStats,
}

impl FilteredDiff {
   /// Render as patch text, newline-terminated as `git apply` expects.
   pub fn to_patch(&self) -> String {
      let mut patch = self.lines.join("\n");
      patch.push('\n');
      patch
   }
}

/// Scanner state: committed output, the hunk being built, and whether that
/// hunk holds a real modification yet.
struct HunkScanner<'b> {
   blacklist:  &'b Blacklist,
   output:     Vec<String>,
   hunk:       Vec<String>,
   has_change: bool,
   /// Inside an `@@` hunk (as opposed to the preamble before any marker)
   in_hunk:    bool,
   /// Number of input lines consumed since the current marker
   body_lines: usize,
   stats:      FilterStats,
}

impl<'b> HunkScanner<'b> {
   fn new(blacklist: &'b Blacklist) -> Self {
      Self {
         blacklist,
         output: Vec::new(),
         hunk: Vec::new(),
         // Keeps the preamble (`diff --git`, `index`, ...) before the first marker
         has_change: true,
         in_hunk: false,
         body_lines: 0,
         stats: FilterStats::default(),
      }
   }

   fn feed(&mut self, line_number: usize, line: DiffLine<'_>) -> Result<()> {
      match line {
         DiffLine::Boundary(boundary) => self.boundary(line_number, boundary),
         DiffLine::Context(line) => {
            self.body_lines += 1;
            self.hunk.push(line.to_string());
            Ok(())
         },
         DiffLine::Addition { line, identifier } | DiffLine::Removal { line, identifier } => {
            if !self.in_hunk {
               return Err(BackportError::MalformedDiff {
                  line_number,
                  reason: "modification line outside of a hunk",
               });
            }
            self.body_lines += 1;

            if !self.blacklist.contains(identifier) {
               self.hunk.push(line.to_string());
               self.has_change = true;
               self.stats.kept_modifications += 1;
            } else if let Some(content) = line.strip_prefix('-') {
               self.hunk.push(format!(" {content}"));
               self.stats.reverted_removals += 1;
            } else {
               self.stats.dropped_additions += 1;
            }
            Ok(())
         },
      }
   }

   fn boundary(&mut self, line_number: usize, boundary: Boundary<'_>) -> Result<()> {
      self.close_hunk(line_number)?;

      match boundary {
         Boundary::HunkStart(marker) => {
            self.hunk.push(marker.to_string());
            self.in_hunk = true;
         },
         Boundary::Header(header) => self.output.push(header.to_string()),
         Boundary::Separator | Boundary::EndOfStream => {},
      }
      Ok(())
   }

   fn close_hunk(&mut self, line_number: usize) -> Result<()> {
      if self.in_hunk && self.body_lines == 0 {
         return Err(BackportError::MalformedDiff {
            line_number,
            reason: "hunk marker without body",
         });
      }

      if self.has_change {
         self.output.append(&mut self.hunk);
         if self.in_hunk {
            self.stats.kept_hunks += 1;
         }
      } else {
         if self.in_hunk {
            self.stats.dropped_hunks += 1;
         }
         self.hunk.clear();
      }

      self.has_change = false;
      self.in_hunk = false;
      self.body_lines = 0;
      Ok(())
   }

   fn finish(self) -> Option<FilteredDiff> {
      debug_assert!(self.hunk.is_empty(), "end of stream must close the last hunk");
      (self.stats.kept_hunks > 0).then(|| FilteredDiff { lines: self.output, stats: self.stats })
   }
}

/// Rewrite `diff` so that only modifications of non-blacklisted identifiers
/// remain.
///
/// Returns `Ok(None)` when no hunk survives: the file has nothing to backport
/// and must not be touched.
pub fn filter_diff(diff: &str, blacklist: &Blacklist) -> Result<Option<FilteredDiff>> {
   let mut scanner = HunkScanner::new(blacklist);
   for (line_number, line) in classify_stream(diff) {
      scanner.feed(line_number, line?)?;
   }

   let filtered = scanner.finish();
   match &filtered {
      Some(result) => tracing::debug!(
         kept = result.stats.kept_hunks,
         dropped = result.stats.dropped_hunks,
         reverted = result.stats.reverted(),
         "filtered diff"
      ),
      None => tracing::debug!("no hunk survived filtering"),
   }
   Ok(filtered)
}
