use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{self, Path};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub root_paths: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// Appended to a duplicate's path to name its backup sibling.
    pub backup_suffix: String,
    /// Delete the backup once a member is committed. Off unless asked for.
    pub remove_backups: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            remove_backups: false,
        }
    }
}

impl AppConfig {
    pub fn with_root_paths(root_paths: Vec<String>) -> Self {
        Self {
            root_paths,
            ..Self::default()
        }
    }

    /// The backup must be a sibling of the member, so the suffix can neither be
    /// empty nor name another directory.
    pub fn validate(&self) -> Result<(), Error> {
        let reason = if self.backup_suffix.is_empty() {
            "must not be empty"
        } else if self.backup_suffix.chars().any(path::is_separator) {
            "must not contain a path separator"
        } else {
            return Ok(());
        };

        Err(Error::InvalidBackupSuffix {
            suffix: self.backup_suffix.clone(),
            reason,
        })
    }
}

pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("CLONE_DUPER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("root_paths")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Remove directories that are subdirectories of other directories in the list.
/// Order of the surviving roots is preserved.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);

        if result
            .iter()
            .any(|kept| dir_path.starts_with(Path::new(kept)))
        {
            continue;
        }

        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_backup_suffix() {
        let with_suffix = |suffix: &str| AppConfig {
            backup_suffix: suffix.to_string(),
            ..AppConfig::default()
        };

        assert!(AppConfig::default().validate().is_ok());
        assert!(with_suffix(".orig").validate().is_ok());
        assert!(matches!(
            with_suffix("").validate(),
            Err(Error::InvalidBackupSuffix { .. })
        ));
        assert!(matches!(
            with_suffix("/sub").validate(),
            Err(Error::InvalidBackupSuffix { .. })
        ));
        let nested = format!(".bak{}old", std::path::MAIN_SEPARATOR);
        assert!(matches!(
            with_suffix(&nested).validate(),
            Err(Error::InvalidBackupSuffix { .. })
        ));
    }

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec![
            "/home/user/photos".to_string(),
            "/home/user/docs".to_string(),
            "/var/data".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(
            result,
            vec![
                "/home/user/photos".to_string(),
                "/home/user/docs".to_string(),
                "/var/data".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            "/home/user".to_string(),
            "/home/user/docs".to_string(),
            "/var/data".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&"/home/user".to_string()));
        assert!(result.contains(&"/var/data".to_string()));
        // /home/user/docs should be removed as it's under /home/user
        assert!(!result.contains(&"/home/user/docs".to_string()));
    }

    #[test]
    fn test_non_overlapping_parent_after_children() {
        let dirs = vec![
            "/data/a".to_string(),
            "/data/b".to_string(),
            "/data".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["/data".to_string()]);
    }

    #[test]
    fn test_non_overlapping_duplicate_entry() {
        let dirs = vec!["/data".to_string(), "/data".to_string()];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["/data".to_string()]);
    }

    #[test]
    fn test_non_overlapping_sibling_prefix_is_not_nested() {
        // Path::starts_with compares whole components
        let dirs = vec!["/data".to_string(), "/database".to_string()];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backup_suffix, ".bak");
        assert!(!config.remove_backups);
        assert!(config.root_paths.is_empty());
    }
}
