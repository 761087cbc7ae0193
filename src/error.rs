use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackportError {
   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("Line {line_number} has no identifier before ':': {line:?}")]
   MissingIdentifier { line_number: usize, line: String },

   #[error("Diff is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
   InvalidUtf8 { valid_up_to: usize },

   #[error("Malformed diff at line {line_number}: {reason}")]
   MalformedDiff { line_number: usize, reason: &'static str },

   #[error("git apply --recount failed for {} ({}): {stderr}", file.display(), describe_status(*status))]
   ApplyFailed {
      file:   PathBuf,
      status: Option<i32>,
      stderr: String,
   },

   #[error("{}: {source}", file.display())]
   InFile {
      file:   PathBuf,
      #[source]
      source: Box<Self>,
   },

   #[error("Invalid configuration: {0}")]
   ConfigError(String),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("Failed to parse config: {0}")]
   TomlError(#[from] toml::de::Error),
}

fn describe_status(status: Option<i32>) -> String {
   status.map_or_else(|| "killed by signal".to_string(), |code| format!("exit status {code}"))
}

impl BackportError {
   /// Attach the file being processed, unless the error already names one.
   pub fn for_file(self, file: impl Into<PathBuf>) -> Self {
      match self {
         Self::ApplyFailed { .. } | Self::InFile { .. } | Self::GitError(_) => self,
         other => Self::InFile { file: file.into(), source: Box::new(other) },
      }
   }

   /// Whether the error only invalidates the file it was raised for.
   ///
   /// Input-contract violations stop that file; anything else stops the run.
   pub fn is_file_local(&self) -> bool {
      match self {
         Self::MissingIdentifier { .. } | Self::MalformedDiff { .. } | Self::InvalidUtf8 { .. } => {
            true
         },
         Self::InFile { source, .. } => source.is_file_local(),
         _ => false,
      }
   }
}

pub type Result<T> = std::result::Result<T, BackportError>;
