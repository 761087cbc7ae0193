//! Line classification for single-file unified diffs of identifier-keyed
//! text files (`<identifier>:<payload>` per line).
use crate::error::{BackportError, Result};

/// Lines that close the hunk being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary<'a> {
   /// `---` / `+++` file header
   Header(&'a str),
   /// `@@ ... @@` hunk marker
   HunkStart(&'a str),
   /// Blank separator emitted by the diff provider; not part of patch syntax
   Separator,
   /// Sentinel appended after the last input line
   EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
   Boundary(Boundary<'a>),
   Context(&'a str),
   Addition { line: &'a str, identifier: &'a str },
   Removal { line: &'a str, identifier: &'a str },
}

impl<'a> DiffLine<'a> {
   /// Identifier of an addition or removal
   pub const fn identifier(&self) -> Option<&'a str> {
      match self {
         Self::Addition { identifier, .. } | Self::Removal { identifier, .. } => Some(*identifier),
         _ => None,
      }
   }
}

pub fn is_file_header(line: &str) -> bool {
   line.starts_with("---") || line.starts_with("+++")
}

/// Key of an entry: everything before the first `:`.
pub fn identifier_of(content: &str) -> Option<&str> {
   content.split_once(':').map(|(identifier, _)| identifier)
}

/// Classify one raw diff line. `line_number` is 1-based and only used for
/// error reporting.
pub fn classify(line: &str, line_number: usize) -> Result<DiffLine<'_>> {
   if line.is_empty() {
      return Ok(DiffLine::Boundary(Boundary::Separator));
   }
   if line.starts_with("@@") {
      return Ok(DiffLine::Boundary(Boundary::HunkStart(line)));
   }
   if is_file_header(line) {
      return Ok(DiffLine::Boundary(Boundary::Header(line)));
   }

   let (is_addition, content) = if let Some(content) = line.strip_prefix('+') {
      (true, content)
   } else if let Some(content) = line.strip_prefix('-') {
      (false, content)
   } else {
      return Ok(DiffLine::Context(line));
   };

   let identifier = identifier_of(content).ok_or_else(|| BackportError::MissingIdentifier {
      line_number,
      line: line.to_string(),
   })?;

   Ok(if is_addition {
      DiffLine::Addition { line, identifier }
   } else {
      DiffLine::Removal { line, identifier }
   })
}

/// Split on `\n` only. Unlike `str::lines`, a trailing `\r` stays part of the
/// line so CRLF content survives the rewrite byte for byte.
pub fn split_lines(diff: &str) -> impl Iterator<Item = &str> {
   diff.split_inclusive('\n').map(|line| line.strip_suffix('\n').unwrap_or(line))
}

/// Classify a whole diff, numbering lines from 1 and closing the stream with
/// an [`Boundary::EndOfStream`] sentinel.
pub fn classify_stream(diff: &str) -> impl Iterator<Item = (usize, Result<DiffLine<'_>>)> {
   let eos_number = split_lines(diff).count() + 1;
   split_lines(diff)
      .enumerate()
      .map(|(idx, line)| (idx + 1, classify(line, idx + 1)))
      .chain(std::iter::once((eos_number, Ok(DiffLine::Boundary(Boundary::EndOfStream)))))
}
