use std::env;
use std::path::PathBuf;

/// Import configuration
///
/// Built from the environment with [`ImportConfig::from_env`], then adjusted
/// with the builder methods (the CLI applies its flags this way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Snapshot file backing the store. `None` keeps the store in memory.
    pub store_path: Option<PathBuf>,

    /// Directory receiving a copy of every committed file
    pub archive_dir: Option<PathBuf>,

    /// Recorded as the creator of each imported run
    pub creator: String,

    /// Run the whole import, then roll it back
    pub dry_run: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new("unknown")
    }
}

impl ImportConfig {
    pub const STORE_VAR: &'static str = "PMTM_STORE";
    pub const ARCHIVE_DIR_VAR: &'static str = "PMTM_ARCHIVE_DIR";
    pub const CREATOR_VAR: &'static str = "PMTM_CREATOR";

    /// Create an in-memory, non-archiving configuration
    pub fn new(creator: &str) -> Self {
        Self {
            store_path: None,
            archive_dir: None,
            creator: creator.to_string(),
            dry_run: false,
        }
    }

    /// Read `PMTM_STORE`, `PMTM_ARCHIVE_DIR` and the creator from
    /// `PMTM_CREATOR`, `USER` or `LOGNAME`, first one set wins.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let creator = [Self::CREATOR_VAR, "USER", "LOGNAME"]
            .iter()
            .find_map(|name| set(*name))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            store_path: set(Self::STORE_VAR).map(PathBuf::from),
            archive_dir: set(Self::ARCHIVE_DIR_VAR).map(PathBuf::from),
            ..Self::new(&creator)
        }
    }

    /// Set the snapshot file
    pub fn store_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the archive directory
    pub fn archive_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ImportConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.creator, "unknown");
        assert!(config.store_path.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_environment_layer() {
        let config = ImportConfig::from_lookup(lookup(&[
            ("PMTM_STORE", "/var/lib/pmtm/results.db"),
            ("PMTM_ARCHIVE_DIR", "/var/lib/pmtm/files"),
            ("USER", "alice"),
            ("LOGNAME", "bob"),
        ]));
        assert_eq!(config.store_path, Some(PathBuf::from("/var/lib/pmtm/results.db")));
        assert_eq!(config.archive_dir, Some(PathBuf::from("/var/lib/pmtm/files")));
        assert_eq!(config.creator, "alice");
    }

    #[test]
    fn test_creator_precedence() {
        let config = ImportConfig::from_lookup(lookup(&[
            ("PMTM_CREATOR", "importer"),
            ("USER", "alice"),
        ]));
        assert_eq!(config.creator, "importer");

        let config = ImportConfig::from_lookup(lookup(&[("USER", " "), ("LOGNAME", "bob")]));
        assert_eq!(config.creator, "bob");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ImportConfig::from_lookup(lookup(&[("PMTM_STORE", "a.db")]))
            .store_path("b.db")
            .archive_dir("archive")
            .creator("carol")
            .dry_run(true);
        assert_eq!(config.store_path, Some(PathBuf::from("b.db")));
        assert_eq!(config.archive_dir, Some(PathBuf::from("archive")));
        assert_eq!(config.creator, "carol");
        assert!(config.dry_run);
    }
}
