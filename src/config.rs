use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::{CanoaError, Result};

#[derive(Debug, Parser)]
#[command(name = "canoa", version, about = "Browse a Jira board from the terminal")]
pub struct Cli {
    /// Read JIRA_* settings from this dotenv file
    #[arg(long, value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    /// Board id, overriding JIRA_BOARD_ID
    #[arg(long, value_name = "ID")]
    pub board: Option<String>,

    /// Write logs here instead of the cache directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub user: String,
    pub token: String,
    pub board_id: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("board_id", &self.board_id)
            .finish_non_exhaustive()
    }
}

/// `[jira]` table of the optional config file
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    jira: JiraTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JiraTable {
    host: Option<String>,
    user: Option<String>,
    token: Option<String>,
    board_id: Option<String>,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("canoa").join("config.toml"))
}

impl Config {
    /// Gather settings from the flags, the environment, the dotenv file and
    /// the config file, in that order of precedence.
    pub fn load(cli: &Cli) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let dotenv = read_env_file(&cli.env_file)?;
        let file = match config_path() {
            Some(path) => read_config_file(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli.board.as_deref(), &env, &dotenv, &file)
    }

    fn resolve(
        board_flag: Option<&str>,
        env: &HashMap<String, String>,
        dotenv: &HashMap<String, String>,
        file: &FileConfig,
    ) -> Result<Self> {
        let lookup = |var: &str, from_file: &Option<String>| -> Result<String> {
            [env.get(var), dotenv.get(var), from_file.as_ref()]
                .into_iter()
                .flatten()
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CanoaError::Config(format!("{var} is not set")))
        };

        let board_id = match board_flag.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => lookup("JIRA_BOARD_ID", &file.jira.board_id)?,
        };

        Ok(Self {
            host: normalize_host(&lookup("JIRA_HOST", &file.jira.host)?)?,
            user: lookup("JIRA_USER", &file.jira.user)?,
            token: lookup("JIRA_TOKEN", &file.jira.token)?,
            board_id,
        })
    }
}

/// Parse a dotenv file without touching the process environment. A missing
/// file yields no values.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(err) if err.not_found() => return Ok(HashMap::new()),
        Err(err) => {
            return Err(CanoaError::Config(format!("{}: {}", path.display(), err)));
        }
    };

    entries
        .map(|entry| entry.map_err(|err| CanoaError::Config(format!("{}: {}", path.display(), err))))
        .collect()
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(err) => return Err(err.into()),
    };

    toml::from_str(&content)
        .map_err(|err| CanoaError::Config(format!("{}: {}", path.display(), err)))
}

/// Turn user input like `acme.atlassian.net/` into `https://acme.atlassian.net`.
pub fn normalize_host(raw: &str) -> Result<String> {
    let invalid = || CanoaError::Config(format!("JIRA_HOST is not a valid URL: {raw}"));
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut candidate = trimmed.to_string();
    if candidate.starts_with("https://https//") {
        candidate = candidate.replacen("https://https//", "https://", 1);
    } else if candidate.starts_with("http://http//") {
        candidate = candidate.replacen("http://http//", "http://", 1);
    }

    if let Some(rest) = candidate.strip_prefix("https//") {
        candidate = format!("https://{rest}");
    } else if let Some(rest) = candidate.strip_prefix("http//") {
        candidate = format!("http://{rest}");
    } else if !candidate.starts_with("https://") && !candidate.starts_with("http://") {
        candidate = format!("https://{candidate}");
    }

    let parsed = reqwest::Url::parse(&candidate).map_err(|_| invalid())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        vars(&[
            ("JIRA_HOST", "acme.atlassian.net"),
            ("JIRA_USER", "ada@example.com"),
            ("JIRA_TOKEN", "secret"),
            ("JIRA_BOARD_ID", "42"),
        ])
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("canoa-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn resolves_from_environment() {
        let config =
            Config::resolve(None, &full_env(), &HashMap::new(), &FileConfig::default()).unwrap();
        assert_eq!(config.host, "https://acme.atlassian.net");
        assert_eq!(config.user, "ada@example.com");
        assert_eq!(config.token, "secret");
        assert_eq!(config.board_id, "42");
    }

    #[test]
    fn board_flag_wins_over_everything() {
        let config =
            Config::resolve(Some("7"), &full_env(), &HashMap::new(), &FileConfig::default())
                .unwrap();
        assert_eq!(config.board_id, "7");
    }

    #[test]
    fn environment_beats_dotenv_beats_config_file() {
        let env = vars(&[("JIRA_USER", "from-env")]);
        let dotenv = vars(&[
            ("JIRA_USER", "from-dotenv"),
            ("JIRA_TOKEN", "dotenv-token"),
            ("JIRA_HOST", "dotenv.example.com"),
        ]);
        let file = FileConfig {
            jira: JiraTable {
                host: Some("file.example.com".into()),
                user: Some("from-file".into()),
                token: Some("file-token".into()),
                board_id: Some("99".into()),
            },
        };

        let config = Config::resolve(None, &env, &dotenv, &file).unwrap();
        assert_eq!(config.user, "from-env");
        assert_eq!(config.token, "dotenv-token");
        assert_eq!(config.host, "https://dotenv.example.com");
        assert_eq!(config.board_id, "99");
    }

    #[test]
    fn empty_values_fall_through() {
        let mut env = full_env();
        env.insert("JIRA_TOKEN".into(), "   ".into());
        let dotenv = vars(&[("JIRA_TOKEN", "dotenv-token")]);
        let config = Config::resolve(None, &env, &dotenv, &FileConfig::default()).unwrap();
        assert_eq!(config.token, "dotenv-token");
    }

    #[test]
    fn missing_value_names_the_variable() {
        let mut env = full_env();
        env.remove("JIRA_TOKEN");
        let err = Config::resolve(None, &env, &HashMap::new(), &FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("JIRA_TOKEN"), "{err}");
    }

    #[test]
    fn debug_output_hides_the_token() {
        let config =
            Config::resolve(None, &full_env(), &HashMap::new(), &FileConfig::default()).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("acme.atlassian.net"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn normalizes_hosts() {
        assert_eq!(normalize_host("acme.atlassian.net").unwrap(), "https://acme.atlassian.net");
        assert_eq!(normalize_host("https://acme.atlassian.net/").unwrap(), "https://acme.atlassian.net");
        assert_eq!(normalize_host("https//acme.atlassian.net").unwrap(), "https://acme.atlassian.net");
        assert_eq!(normalize_host("https://https//acme.atlassian.net").unwrap(), "https://acme.atlassian.net");
        assert_eq!(normalize_host("http://localhost:8080").unwrap(), "http://localhost:8080");
        assert!(normalize_host("   ").is_err());
        assert!(normalize_host("https://").is_err());
    }

    #[test]
    fn reads_dotenv_file() {
        let path = temp_file("dotenv", "JIRA_HOST=acme.atlassian.net\n# comment\nJIRA_USER=\"ada@example.com\"\n");
        let values = read_env_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(values.get("JIRA_HOST").map(String::as_str), Some("acme.atlassian.net"));
        assert_eq!(values.get("JIRA_USER").map(String::as_str), Some("ada@example.com"));
        assert_eq!(values.len(), 2);
        assert!(std::env::var("JIRA_HOST").map_or(true, |v| v != "acme.atlassian.net"));
    }

    #[test]
    fn missing_files_are_not_errors() {
        let missing = std::env::temp_dir().join("canoa-definitely-missing-file");
        assert!(read_env_file(&missing).unwrap().is_empty());
        assert!(read_config_file(&missing).unwrap().jira.host.is_none());
    }

    #[test]
    fn reads_jira_table_from_config_file() {
        let path = temp_file("config.toml", "[jira]\nhost = \"acme.atlassian.net\"\nboard_id = \"12\"\n");
        let file = read_config_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(file.jira.host.as_deref(), Some("acme.atlassian.net"));
        assert_eq!(file.jira.board_id.as_deref(), Some("12"));
        assert!(file.jira.token.is_none());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let path = temp_file("bad.toml", "[jira\nhost = ");
        let result = read_config_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(CanoaError::Config(_))));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["canoa"]);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert!(cli.board.is_none());
        assert!(cli.log_file.is_none());

        let cli = Cli::parse_from(["canoa", "--board", "7", "--log-file", "/tmp/canoa.log"]);
        assert_eq!(cli.board.as_deref(), Some("7"));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/canoa.log")));
    }
}
