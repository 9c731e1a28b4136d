use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::storytag_config::{StorytagToml, find_config_file};
use crate::tagging::{CategoryDef, PassOptions, TaggingScheme};
use crate::tracker::{DEFAULT_API_URL, TrackerSettings};

pub const ENV_PROJECT_ID: &str = "PIVOTAL_TRACKER_PROJECT_ID";
pub const ENV_API_TOKEN: &str = "PIVOTAL_TRACKER_API_TOKEN";
pub const ENV_STORY_PREFIX: &str = "PIVOTAL_TRACKER_STORY_PREFIX";
pub const ENV_CATEGORIES: &str = "PIVOTAL_TRACKER_CATEGORIES";
pub const ENV_API_URL: &str = "PIVOTAL_TRACKER_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_PAGE_SIZE: u32 = 500;

/// Values given on the command line; they win over env and file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub project_id: Option<String>,
    pub prefix: Option<String>,
    pub categories: Vec<String>,
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
    pub max_pages: Option<u32>,
}

/// Runtime configuration for one tagging pass.
///
/// Merges, from lowest to highest priority:
/// 1. storytag.toml
/// 2. environment variables (including `.env`)
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub tracker: TrackerSettings,
    pub scheme: TaggingScheme,
    pub pass: PassOptions,
    /// The config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and the usual file locations.
    pub fn load(cwd: &Path, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let config_file = find_config_file(cli.config_path.as_deref(), cwd);
        let toml = match &config_file {
            Some(path) => StorytagToml::load(path)?,
            None => StorytagToml::default(),
        };
        let mut config = Self::resolve(&toml, cli, |name| std::env::var(name).ok())?;
        config.config_file = config_file;
        Ok(config)
    }

    /// Merge the three layers. `env` looks up a variable by name.
    pub fn resolve<F>(toml: &StorytagToml, cli: &CliOverrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| non_empty(env(name));

        let project_id = non_empty(cli.project_id.clone())
            .or_else(|| lookup(ENV_PROJECT_ID))
            .or_else(|| non_empty(toml.tracker.project_id.clone()));
        let api_token = lookup(ENV_API_TOKEN);
        let prefix = non_empty(cli.prefix.clone())
            .or_else(|| lookup(ENV_STORY_PREFIX))
            .or_else(|| non_empty(toml.tagging.prefix.clone()));
        let categories = if !cli.categories.is_empty() {
            parse_categories(cli.categories.iter().map(String::as_str))?
        } else if let Some(raw) = lookup(ENV_CATEGORIES) {
            parse_categories(raw.split(','))?
        } else {
            normalize_file_categories(&toml.tagging.categories)?
        };
        reject_duplicate_codes(&categories)?;

        let mut missing = Vec::new();
        if project_id.is_none() {
            missing.push(ENV_PROJECT_ID.to_string());
        }
        if api_token.is_none() {
            missing.push(ENV_API_TOKEN.to_string());
        }
        if prefix.is_none() && categories.is_empty() {
            missing.push(format!("{} (or {})", ENV_STORY_PREFIX, ENV_CATEGORIES));
        }

        let (Some(project_id), Some(api_token)) = (project_id, api_token) else {
            return Err(ConfigError::Missing { names: missing });
        };
        let scheme = match (prefix, categories.is_empty()) {
            (Some(_), false) => return Err(ConfigError::ConflictingScheme),
            (Some(prefix), true) => TaggingScheme::Prefix(prefix),
            (None, false) => TaggingScheme::Categorized(categories),
            (None, true) => return Err(ConfigError::Missing { names: missing }),
        };

        if !project_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                name: ENV_PROJECT_ID.to_string(),
                message: format!("'{}' is not a numeric project id", project_id),
            });
        }

        let api_url = non_empty(cli.api_url.clone())
            .or_else(|| lookup(ENV_API_URL))
            .or_else(|| non_empty(toml.tracker.api_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let defaults = PassOptions::default();
        let page_size = cli
            .page_size
            .or(toml.tracker.page_size)
            .unwrap_or(defaults.page_size);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                name: "page_size".to_string(),
                message: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, page_size),
            });
        }
        let max_pages = cli
            .max_pages
            .or(toml.tracker.max_pages)
            .unwrap_or(defaults.max_pages);
        if max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_pages".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let timeout_secs = toml.tracker.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let timeout = Duration::from_secs(timeout_secs);

        Ok(Self {
            tracker: TrackerSettings {
                api_url,
                project_id,
                api_token,
                timeout,
            },
            scheme,
            pass: PassOptions {
                page_size,
                max_pages,
                dry_run: false,
            },
            config_file: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse `CODE=label` entries, ignoring blanks.
fn parse_categories<'a, I>(entries: I) -> Result<Vec<CategoryDef>, ConfigError>
where
    I: IntoIterator<Item = &'a str>,
{
    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            CategoryDef::parse(entry).ok_or_else(|| ConfigError::InvalidCategory {
                entry: entry.to_string(),
            })
        })
        .collect()
}

/// Apply the `CODE=label` rules to categories read from storytag.toml.
fn normalize_file_categories(defs: &[CategoryDef]) -> Result<Vec<CategoryDef>, ConfigError> {
    defs.iter()
        .map(|def| {
            def.normalized().ok_or_else(|| ConfigError::InvalidCategory {
                entry: format!("{}={}", def.code, def.label),
            })
        })
        .collect()
}

fn reject_duplicate_codes(defs: &[CategoryDef]) -> Result<(), ConfigError> {
    for (i, def) in defs.iter().enumerate() {
        if defs[..i].iter().any(|earlier| earlier.code == def.code) {
            return Err(ConfigError::InvalidValue {
                name: ENV_CATEGORIES.to_string(),
                message: format!("category code '{}' is listed more than once", def.code),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_PROJECT_ID, "1234"),
            (ENV_API_TOKEN, "tok"),
            (ENV_STORY_PREFIX, "PROJ"),
        ]
    }

    #[test]
    fn test_resolve_from_env() {
        let config =
            Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env_of(&base_env()))
                .unwrap();
        assert_eq!(config.tracker.project_id, "1234");
        assert_eq!(config.tracker.api_token, "tok");
        assert_eq!(config.tracker.api_url, DEFAULT_API_URL);
        assert_eq!(config.scheme, TaggingScheme::Prefix("PROJ".to_string()));
        assert_eq!(config.pass, PassOptions::default());
    }

    #[test]
    fn test_missing_everything_names_all_settings() {
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env_of(&[]))
            .unwrap_err();
        match err {
            ConfigError::Missing { names } => {
                assert_eq!(names.len(), 3);
                assert_eq!(names[0], ENV_PROJECT_ID);
                assert_eq!(names[1], ENV_API_TOKEN);
                assert!(names[2].contains(ENV_STORY_PREFIX));
            }
            other => panic!("Expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let env = env_of(&[
            (ENV_PROJECT_ID, "1234"),
            (ENV_API_TOKEN, "  "),
            (ENV_STORY_PREFIX, "PROJ"),
        ]);
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref names } if names == &[ENV_API_TOKEN]));
    }

    #[test]
    fn test_missing_scheme_only() {
        let env = env_of(&[(ENV_PROJECT_ID, "1"), (ENV_API_TOKEN, "t")]);
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CATEGORIES));
    }

    #[test]
    fn test_categories_from_env() {
        let env = env_of(&[
            (ENV_PROJECT_ID, "1"),
            (ENV_API_TOKEN, "t"),
            (ENV_CATEGORIES, "API=api, UI=frontend,"),
        ]);
        let config = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap();
        assert_eq!(
            config.scheme,
            TaggingScheme::Categorized(vec![
                CategoryDef::new("API", "api"),
                CategoryDef::new("UI", "frontend"),
            ])
        );
    }

    #[test]
    fn test_malformed_category_is_rejected() {
        let env = env_of(&[
            (ENV_PROJECT_ID, "1"),
            (ENV_API_TOKEN, "t"),
            (ENV_CATEGORIES, "API"),
        ]);
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCategory { .. }));
    }

    #[test]
    fn test_prefix_and_categories_conflict() {
        let mut env = base_env();
        env.push((ENV_CATEGORIES, "API=api"));
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env_of(&env))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingScheme));
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let toml = StorytagToml::parse(
            r#"
            [tracker]
            project_id = "1"
            page_size = 100
            max_pages = 4

            [tagging]
            prefix = "FILE"
            "#,
        )
        .unwrap();
        let cli = CliOverrides {
            project_id: Some("3".to_string()),
            prefix: Some("CLI".to_string()),
            page_size: Some(50),
            ..Default::default()
        };
        let env = env_of(&[
            (ENV_PROJECT_ID, "2"),
            (ENV_API_TOKEN, "t"),
            (ENV_STORY_PREFIX, "ENV"),
        ]);
        let config = Config::resolve(&toml, &cli, env).unwrap();
        assert_eq!(config.tracker.project_id, "3");
        assert_eq!(config.scheme, TaggingScheme::Prefix("CLI".to_string()));
        assert_eq!(config.pass.page_size, 50);
        assert_eq!(config.pass.max_pages, 4);
    }

    #[test]
    fn test_env_overrides_file() {
        let toml = StorytagToml::parse(
            "[tracker]\nproject_id = \"1\"\napi_url = \"http://file\"\n[tagging]\nprefix = \"FILE\"",
        )
        .unwrap();
        let env = env_of(&[
            (ENV_PROJECT_ID, "2"),
            (ENV_API_TOKEN, "t"),
            (ENV_API_URL, "http://env"),
        ]);
        let config = Config::resolve(&toml, &CliOverrides::default(), env).unwrap();
        assert_eq!(config.tracker.project_id, "2");
        assert_eq!(config.tracker.api_url, "http://env");
        assert_eq!(config.scheme, TaggingScheme::Prefix("FILE".to_string()));
    }

    #[test]
    fn test_cli_categories_replace_file_categories() {
        let toml = StorytagToml::parse(
            "[[tagging.categories]]\ncode = \"OLD\"\nlabel = \"old\"",
        )
        .unwrap();
        let cli = CliOverrides {
            categories: vec!["NEW=new".to_string()],
            ..Default::default()
        };
        let env = env_of(&[(ENV_PROJECT_ID, "1"), (ENV_API_TOKEN, "t")]);
        let config = Config::resolve(&toml, &cli, env).unwrap();
        assert_eq!(
            config.scheme,
            TaggingScheme::Categorized(vec![CategoryDef::new("NEW", "new")])
        );
    }

    #[test]
    fn test_non_numeric_project_id_is_rejected() {
        let env = env_of(&[
            (ENV_PROJECT_ID, "../admin"),
            (ENV_API_TOKEN, "t"),
            (ENV_STORY_PREFIX, "P"),
        ]);
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_page_size_bounds() {
        for bad in [0, 501] {
            let cli = CliOverrides {
                page_size: Some(bad),
                ..Default::default()
            };
            let err = Config::resolve(&StorytagToml::default(), &cli, env_of(&base_env()))
                .unwrap_err();
            assert!(err.to_string().contains("page_size"));
        }
    }

    #[test]
    fn test_zero_max_pages_is_rejected() {
        let cli = CliOverrides {
            max_pages: Some(0),
            ..Default::default()
        };
        assert!(Config::resolve(&StorytagToml::default(), &cli, env_of(&base_env())).is_err());
    }

    #[test]
    fn test_file_category_with_empty_code_is_rejected() {
        let toml = StorytagToml::parse(
            r#"
            [[tagging.categories]]
            code = ""
            label = "misc"

            [[tagging.categories]]
            code = "API"
            label = "api"
            "#,
        )
        .unwrap();
        let env = env_of(&[(ENV_PROJECT_ID, "1"), (ENV_API_TOKEN, "t")]);
        let err = Config::resolve(&toml, &CliOverrides::default(), env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCategory { ref entry } if entry == "=misc"));
    }

    #[test]
    fn test_file_categories_are_trimmed() {
        let toml = StorytagToml::parse(
            "[[tagging.categories]]\ncode = \" API \"\nlabel = \" api \"",
        )
        .unwrap();
        let env = env_of(&[(ENV_PROJECT_ID, "1"), (ENV_API_TOKEN, "t")]);
        let config = Config::resolve(&toml, &CliOverrides::default(), env).unwrap();
        assert_eq!(
            config.scheme,
            TaggingScheme::Categorized(vec![CategoryDef::new("API", "api")])
        );
    }

    #[test]
    fn test_duplicate_category_codes_are_rejected() {
        let env = env_of(&[
            (ENV_PROJECT_ID, "1"),
            (ENV_API_TOKEN, "t"),
            (ENV_CATEGORIES, "API=api,API=backend"),
        ]);
        let err = Config::resolve(&StorytagToml::default(), &CliOverrides::default(), env)
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let toml = StorytagToml::parse("[tracker]\ntimeout_secs = 0").unwrap();
        let err = Config::resolve(&toml, &CliOverrides::default(), env_of(&base_env()))
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[tracker]\npage_size = 10\n").unwrap();
        let cli = CliOverrides {
            config_path: Some(path.clone()),
            project_id: Some("5".to_string()),
            prefix: Some("P".to_string()),
            ..Default::default()
        };
        // The token can only come from the process environment here.
        match Config::load(dir.path(), &cli) {
            Ok(config) => {
                assert_eq!(config.pass.page_size, 10);
                assert_eq!(config.config_file, Some(path));
            }
            Err(ConfigError::Missing { names }) => assert_eq!(names, vec![ENV_API_TOKEN]),
            Err(other) => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let cli = CliOverrides {
            config_path: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        assert!(matches!(
            Config::load(dir.path(), &cli),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
