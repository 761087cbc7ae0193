use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BackportError, Result};

/// File looked up in the repository root when no config path is given
pub const REPO_CONFIG_FILE: &str = ".lang-backport.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackportConfig {
   /// Revision the release branch currently sits on
   pub base_ref: String,

   /// Revision translations are backported from (overridden by
   /// `LANG_BACKPORT_UPSTREAM`)
   pub upstream_ref: String,

   /// Source-language file; every identifier it changes is blacklisted
   pub reference_file: PathBuf,

   /// Directories scanned for language files, in order. The first one is
   /// where explicitly named languages are looked up.
   pub language_dirs: Vec<PathBuf>,

   pub language_extension: String,
}

impl Default for BackportConfig {
   fn default() -> Self {
      Self {
         base_ref:           "HEAD".to_string(),
         upstream_ref:       "upstream/master".to_string(),
         reference_file:     PathBuf::from("src/lang/english.txt"),
         language_dirs:      vec![PathBuf::from("src/lang"), PathBuf::from("src/lang/unfinished")],
         language_extension: "txt".to_string(),
      }
   }
}

impl BackportConfig {
   /// Load config for the repository at `repo_dir`.
   ///
   /// Lookup order: `LANG_BACKPORT_CONFIG`, then `.lang-backport.toml` in the
   /// repository, then built-in defaults. Environment variables override
   /// file values:
   /// - `LANG_BACKPORT_UPSTREAM` overrides `upstream_ref`
   /// - `LANG_BACKPORT_BASE` overrides `base_ref`
   pub fn load(repo_dir: &Path) -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("LANG_BACKPORT_CONFIG") {
         Some(PathBuf::from(custom_path))
      } else {
         let candidate = repo_dir.join(REPO_CONFIG_FILE);
         candidate.exists().then_some(candidate)
      };

      match config_path {
         Some(path) => Self::from_file(&path),
         None => {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
         },
      }
   }

   /// Load config from specific file
   pub fn from_file(path: &Path) -> Result<Self> {
      tracing::debug!(path = %path.display(), "loading config");
      let contents = std::fs::read_to_string(path).map_err(|e| {
         BackportError::ConfigError(format!("Failed to read {}: {e}", path.display()))
      })?;
      let mut config = Self::from_toml(&contents)?;
      config.apply_env_overrides();
      Ok(config)
   }

   pub fn from_toml(contents: &str) -> Result<Self> {
      let config: Self = toml::from_str(contents)?;
      config.validate()?;
      Ok(config)
   }

   fn apply_env_overrides(&mut self) {
      if let Ok(upstream) = std::env::var("LANG_BACKPORT_UPSTREAM") {
         self.upstream_ref = upstream;
      }
      if let Ok(base) = std::env::var("LANG_BACKPORT_BASE") {
         self.base_ref = base;
      }
   }

   fn validate(&self) -> Result<()> {
      if self.language_dirs.is_empty() {
         return Err(BackportError::ConfigError("language_dirs must not be empty".to_string()));
      }
      if self.language_extension.is_empty() || self.language_extension.starts_with('.') {
         return Err(BackportError::ConfigError(format!(
            "language_extension must be a bare extension like \"txt\", got {:?}",
            self.language_extension
         )));
      }
      Ok(())
   }

   /// Path of an explicitly named language, e.g. `dutch` or `dutch.txt`.
   pub fn language_path(&self, name: &str) -> PathBuf {
      let suffix = format!(".{}", self.language_extension);
      let file_name =
         if name.ends_with(&suffix) { name.to_string() } else { format!("{name}{suffix}") };
      // validate() guarantees at least one directory
      self.language_dirs[0].join(file_name)
   }

   /// `git diff` range spec, `<base>..<upstream>`.
   pub fn revision_range(&self) -> String {
      format!("{}..{}", self.base_ref, self.upstream_ref)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_defaults() {
      let config = BackportConfig::default();
      assert_eq!(config.revision_range(), "HEAD..upstream/master");
      assert_eq!(config.reference_file, PathBuf::from("src/lang/english.txt"));
      assert_eq!(config.language_dirs.len(), 2);
   }

   #[test]
   fn test_from_toml_partial() {
      let config = BackportConfig::from_toml(
         r#"
upstream_ref = "origin/main"
language_dirs = ["lang"]
"#,
      )
      .unwrap();
      assert_eq!(config.upstream_ref, "origin/main");
      assert_eq!(config.base_ref, "HEAD");
      assert_eq!(config.language_dirs, vec![PathBuf::from("lang")]);
   }

   #[test]
   fn test_from_toml_unknown_field() {
      let err = BackportConfig::from_toml("upstream = \"x\"").unwrap_err();
      assert!(matches!(err, BackportError::TomlError(_)));
   }

   #[test]
   fn test_from_toml_rejects_empty_dirs() {
      let err = BackportConfig::from_toml("language_dirs = []").unwrap_err();
      assert!(matches!(err, BackportError::ConfigError(_)));
   }

   #[test]
   fn test_from_toml_rejects_dotted_extension() {
      let err = BackportConfig::from_toml("language_extension = \".txt\"").unwrap_err();
      assert!(matches!(err, BackportError::ConfigError(_)));
   }

   #[test]
   fn test_language_path() {
      let config = BackportConfig::default();
      assert_eq!(config.language_path("dutch"), PathBuf::from("src/lang/dutch.txt"));
      assert_eq!(config.language_path("dutch.txt"), PathBuf::from("src/lang/dutch.txt"));
   }

   #[test]
   fn test_from_file_missing() {
      let dir = tempfile::tempdir().unwrap();
      let err = BackportConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
      assert!(matches!(err, BackportError::ConfigError(_)));
   }
}
