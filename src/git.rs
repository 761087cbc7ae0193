use std::{
   io::Write,
   path::{Path, PathBuf},
   process::{Command, Stdio},
};

use crate::{
   config::BackportConfig,
   error::{BackportError, Result},
};

/// Unified diff of a single file between two revisions.
///
/// `range` is a `<base>..<upstream>` spec. User config cannot switch the
/// output to colored or external-tool diffs. Output that is not valid UTF-8
/// is rejected rather than decoded lossily.
pub fn diff_file(dir: &Path, range: &str, path: &Path) -> Result<String> {
   tracing::debug!(%range, path = %path.display(), "git diff");
   let output = Command::new("git")
      .args(["diff", "--no-color", "--no-ext-diff"])
      .arg(range)
      .arg("--")
      .arg(path)
      .current_dir(dir)
      .output()
      .map_err(|e| BackportError::GitError(format!("Failed to run git diff: {e}")))?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BackportError::GitError(format!(
         "git diff {range} -- {} failed: {}",
         path.display(),
         stderr.trim()
      )));
   }

   String::from_utf8(output.stdout).map_err(|e| BackportError::InvalidUtf8 {
      valid_up_to: e.utf8_error().valid_up_to(),
   })
}

/// Apply a rewritten patch to the working tree, recounting hunk sizes.
///
/// `file` only labels the error.
pub fn apply_patch(dir: &Path, file: &Path, patch: &str) -> Result<()> {
   let mut child = Command::new("git")
      .args(["apply", "--recount"])
      .current_dir(dir)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| BackportError::GitError(format!("Failed to spawn git apply: {e}")))?;

   if let Some(mut stdin) = child.stdin.take() {
      stdin
         .write_all(patch.as_bytes())
         .map_err(|e| BackportError::GitError(format!("Failed to write patch: {e}")))?;
   }

   let output = child
      .wait_with_output()
      .map_err(|e| BackportError::GitError(format!("Failed to wait for git apply: {e}")))?;

   if !output.status.success() {
      return Err(BackportError::ApplyFailed {
         file:   file.to_path_buf(),
         status: output.status.code(),
         stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
   }

   Ok(())
}

/// Language files directly inside the configured directories, relative to
/// `dir`. Each directory's listing is sorted; missing directories are skipped.
pub fn discover_language_files(dir: &Path, config: &BackportConfig) -> Result<Vec<PathBuf>> {
   let mut files = Vec::new();

   for lang_dir in &config.language_dirs {
      let absolute = dir.join(lang_dir);
      if !absolute.is_dir() {
         tracing::debug!(dir = %absolute.display(), "language directory missing, skipping");
         continue;
      }

      let mut found = Vec::new();
      for entry in std::fs::read_dir(&absolute)? {
         let entry = entry?;
         if !entry.file_type()?.is_file() {
            continue;
         }
         let path = entry.path();
         if path.extension().is_some_and(|ext| ext == config.language_extension.as_str()) {
            found.push(lang_dir.join(entry.file_name()));
         }
      }
      found.sort();
      files.extend(found);
   }

   Ok(files)
}


#[cfg(test)]
mod tests {
   use super::{test_repo::*, *};

   #[test]
   fn test_diff_file_between_revisions() {
      let repo = init(&[("src/lang/dutch.txt", "STR_1:Een\nSTR_2:Twee\n")], &[(
         "src/lang/dutch.txt",
         "STR_1:Een\nSTR_2:Twee!\n",
      )]);

      let diff = diff_file(repo.path(), "HEAD..upstream", Path::new("src/lang/dutch.txt")).unwrap();
      assert!(diff.contains("--- a/src/lang/dutch.txt"));
      assert!(diff.contains("-STR_2:Twee\n"));
      assert!(diff.contains("+STR_2:Twee!\n"));
   }

   #[test]
   fn test_diff_file_ignores_color_config() {
      let repo = init(&[("a.txt", "STR_1:a\n")], &[("a.txt", "STR_1:b\n")]);
      git(repo.path(), &["config", "color.diff", "always"]);

      let diff = diff_file(repo.path(), "HEAD..upstream", Path::new("a.txt")).unwrap();
      assert!(!diff.contains('\x1b'));
      assert!(diff.contains("\n-STR_1:a\n+STR_1:b\n"));
   }

   #[test]
   fn test_diff_file_rejects_invalid_utf8() {
      let repo = init(&[("a.txt", "STR_1:a\n")], &[]);
      commit_upstream(repo.path(), "a.txt", b"STR_1:\xe9t\xe9\n");

      let err = diff_file(repo.path(), "HEAD..upstream", Path::new("a.txt")).unwrap_err();
      assert!(matches!(err, BackportError::InvalidUtf8 { .. }));
   }

   #[test]
   fn test_diff_file_bad_revision() {
      let repo = init(&[("a.txt", "STR_1:a\n")], &[]);
      let err = diff_file(repo.path(), "HEAD..no-such-branch", Path::new("a.txt")).unwrap_err();
      assert!(matches!(err, BackportError::GitError(_)));
   }

   #[test]
   fn test_apply_patch_recounts() {
      let repo = init(&[("lang/a.txt", "STR_1:a\nSTR_2:b\nSTR_3:c\n")], &[]);
      // Counts in the marker are deliberately wrong
      let patch =
         "--- a/lang/a.txt\n+++ b/lang/a.txt\n@@ -1,9 +1,9 @@\n STR_1:a\n-STR_2:b\n+STR_2:B\n STR_3:c\n";
      apply_patch(repo.path(), Path::new("lang/a.txt"), patch).unwrap();
      let contents = std::fs::read_to_string(repo.path().join("lang/a.txt")).unwrap();
      assert_eq!(contents, "STR_1:a\nSTR_2:B\nSTR_3:c\n");
   }

   #[test]
   fn test_apply_patch_failure_reports_file() {
      let repo = init(&[("lang/a.txt", "STR_1:a\n")], &[]);
      let patch = "--- a/lang/a.txt\n+++ b/lang/a.txt\n@@ -1 +1 @@\n-STR_1:zzz\n+STR_1:b\n";
      let err = apply_patch(repo.path(), Path::new("lang/a.txt"), patch).unwrap_err();
      match err {
         BackportError::ApplyFailed { file, status, .. } => {
            assert_eq!(file, PathBuf::from("lang/a.txt"));
            assert_ne!(status, Some(0));
         },
         other => panic!("unexpected error: {other}"),
      }
   }

   #[test]
   fn test_discover_language_files() {
      let tmp = tempfile::tempdir().unwrap();
      write(tmp.path(), "src/lang/english.txt", "");
      write(tmp.path(), "src/lang/dutch.txt", "");
      write(tmp.path(), "src/lang/README.md", "");
      write(tmp.path(), "src/lang/unfinished/klingon.txt", "");

      let files = discover_language_files(tmp.path(), &BackportConfig::default()).unwrap();
      assert_eq!(files, vec![
         PathBuf::from("src/lang/dutch.txt"),
         PathBuf::from("src/lang/english.txt"),
         PathBuf::from("src/lang/unfinished/klingon.txt"),
      ]);
   }

   #[test]
   fn test_discover_skips_missing_dirs() {
      let tmp = tempfile::tempdir().unwrap();
      let files = discover_language_files(tmp.path(), &BackportConfig::default()).unwrap();
      assert!(files.is_empty());
   }
}
