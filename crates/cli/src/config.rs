//! Configuration for the `ptpack` binary.
//!
//! Sources, lowest priority first: built-in defaults, `ptpack.toml` in the
//! working directory (or the file given with `--config`), then `PTPACK_*`
//! environment variables. Command-line flags are applied on top by `main`.
use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;

use record::DEFAULT_POOL_LIMIT;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ptpack.toml";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the two dictionary tables.
    pub dict_dir: PathBuf,
    /// Feature scores per record.
    pub num_scores: usize,
    /// Lexical scores per record, stored after the feature scores.
    pub num_lex_scores: usize,
    /// Sync the pack file after every appended group.
    pub pack_sync: bool,
    /// Bound on each free list of the decode pool.
    pub pool_limit: usize,
}

impl Settings {
    /// Loads settings from defaults, the config file and the environment.
    ///
    /// A missing `ptpack.toml` is fine; a missing file named explicitly is an
    /// error. The result is not validated: callers apply their overrides
    /// first and then call [`Settings::validate`].
    pub fn new(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let env = Environment::with_prefix("PTPACK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let mut cfg_builder = Config::builder()
            .set_default("dict_dir", "dict")?
            .set_default("num_scores", 4)?
            .set_default("num_lex_scores", 0)?
            .set_default("pack_sync", false)?
            .set_default("pool_limit", DEFAULT_POOL_LIMIT as u64)?;

        cfg_builder = match config_path {
            Some(path) => cfg_builder.add_source(File::from(path.as_ref())),
            None => cfg_builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        let cfg = cfg_builder.add_source(env).build()?;
        cfg.try_deserialize()
    }

    /// Total scores stored per record.
    pub fn score_count(&self) -> usize {
        self.num_scores + self.num_lex_scores
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.score_count() == 0 {
            return Err(ConfigError::Message(
                "num_scores + num_lex_scores must be greater than zero".to_string(),
            ));
        }
        if self.dict_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message("dict_dir cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("ptpack.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "dict_dir = \"/tmp/tables\"\nnum_scores = 2\npack_sync = true\n",
        );

        let settings = Settings::new(Some(&path)).unwrap();
        assert_eq!(settings.dict_dir, PathBuf::from("/tmp/tables"));
        assert_eq!(settings.num_scores, 2);
        assert_eq!(settings.num_lex_scores, 0);
        assert!(settings.pack_sync);
        assert_eq!(settings.pool_limit, DEFAULT_POOL_LIMIT);
    }

    #[test]
    fn zero_scores_load_but_fail_validation() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "num_scores = 0\nnum_lex_scores = 0\n");
        let mut settings = Settings::new(Some(&path)).unwrap();
        assert!(settings.validate().is_err());

        settings.num_lex_scores = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Settings::new(Some(dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn score_count_adds_lexical_scores() {
        let settings = Settings {
            dict_dir: "d".into(),
            num_scores: 4,
            num_lex_scores: 2,
            pack_sync: false,
            pool_limit: 8,
        };
        assert_eq!(settings.score_count(), 6);
        assert!(settings.validate().is_ok());
    }
}
