use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::Deserialize;

use crate::category::CategorySlugs;
use crate::filename::{DeriverOptions, DEFAULT_POSTS_ROOT};
use crate::identity::DEFAULT_TOKENINFO_URL;
use crate::publisher::PublishOptions;
use crate::store::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use crate::text_utils::{parse_utc_offset, FallbackZone};

pub const ENV_GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const ENV_GITHUB_REPO: &str = "GITHUB_REPO";
pub const ENV_BRANCH: &str = "BRANCH";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Posts with embedded images can be large; the Contents API itself accepts files up to 100 MB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Server {
    pub address: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8787,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Deserialize, Default, Debug)]
pub struct Github {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub api_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
pub struct Auth {
    pub google_client_id: Option<String>,
    pub tokeninfo_url: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Publishing {
    pub posts_root: String,
    pub category_routing: bool,
    pub strict_iso_dates: bool,
    pub probe_errors_as_absent: bool,
    /// Zone for non ISO dates, e.g. "+09:00". Process local zone when absent.
    pub fallback_utc_offset: Option<String>,
}

impl Default for Publishing {
    fn default() -> Self {
        Self {
            posts_root: DEFAULT_POSTS_ROOT.to_string(),
            category_routing: true,
            strict_iso_dates: true,
            probe_errors_as_absent: true,
            fallback_utc_offset: None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub github: Github,
    pub auth: Auth,
    pub publishing: Publishing,
    pub categories: HashMap<String, String>,
    pub log: Option<Log>,
    /// Only ever read from the environment
    #[serde(skip)]
    pub github_token: Option<String>,
}

/// The four values the service cannot start without.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub google_client_id: String,
    pub github_repo: String,
    pub branch: String,
    pub github_token: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Environment values win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
        where
            F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = non_empty(lookup(ENV_GOOGLE_CLIENT_ID)) {
            self.auth.google_client_id = Some(client_id);
        }
        if let Some(repo) = non_empty(lookup(ENV_GITHUB_REPO)) {
            self.github.repo = Some(repo);
        }
        if let Some(branch) = non_empty(lookup(ENV_BRANCH)) {
            self.github.branch = Some(branch);
        }
        self.github_token = non_empty(lookup(ENV_GITHUB_TOKEN));
    }

    pub fn credentials(&self) -> io::Result<Credentials> {
        let fields = (
            non_empty(self.auth.google_client_id.clone()),
            non_empty(self.github.repo.clone()),
            non_empty(self.github.branch.clone()),
            non_empty(self.github_token.clone()),
        );

        match fields {
            (Some(google_client_id), Some(github_repo), Some(branch), Some(github_token)) => Ok(Credentials {
                google_client_id,
                github_repo,
                branch,
                github_token,
            }),
            (client_id, repo, branch, token) => {
                let missing: Vec<&str> = [
                    (client_id.is_none(), ENV_GOOGLE_CLIENT_ID),
                    (repo.is_none(), ENV_GITHUB_REPO),
                    (branch.is_none(), ENV_BRANCH),
                    (token.is_none(), ENV_GITHUB_TOKEN),
                ].iter().filter(|(is_missing, _)| *is_missing).map(|(_, name)| *name).collect();

                Err(io::Error::new(ErrorKind::InvalidInput,
                                   format!("Missing required configuration: {}", missing.join(", "))))
            }
        }
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn user_agent(&self) -> &str {
        self.github.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn tokeninfo_url(&self) -> &str {
        self.auth.tokeninfo_url.as_deref().unwrap_or(DEFAULT_TOKENINFO_URL)
    }

    pub fn category_slugs(&self) -> CategorySlugs {
        CategorySlugs::with_overrides(&self.categories)
    }

    pub fn deriver_options(&self) -> io::Result<DeriverOptions> {
        let fallback_zone = match self.publishing.fallback_utc_offset {
            None => FallbackZone::Local,
            Some(ref offset) => match parse_utc_offset(offset) {
                Ok(offset) => FallbackZone::Fixed(offset),
                Err(e) => return Err(io::Error::new(ErrorKind::InvalidData, e)),
            },
        };

        Ok(DeriverOptions {
            posts_root: self.publishing.posts_root.clone(),
            category_routing: self.publishing.category_routing,
            strict_iso_dates: self.publishing.strict_iso_dates,
            fallback_zone,
        })
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            probe_errors_as_absent: self.publishing.probe_errors_as_absent,
        }
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    match (exe_dir, path.to_str()) {
        (Some(exe_dir), Some(str_path)) => {
            PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy()))
        }
        _ => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
