use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use lifelog_uploader::config::{parse_config, read_config, Config};

use crate::config_data::write_sample_cfg;
use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    if let Some(exe_dir) = exe_dir {
        if exe_dir.join(CFG_FILE_NAME).exists() {
            return Some(exe_dir.join(CFG_FILE_NAME));
        }
    }

    if let Ok(cur_dir) = env::current_dir() {
        if cur_dir.join(CFG_FILE_NAME).exists() {
            return Some(cur_dir.join(CFG_FILE_NAME));
        }
    }

    let cfg_dir = dirs::config_dir()?;
    if cfg_dir.join(CFG_FILE_NAME).exists() {
        return Some(cfg_dir.join(CFG_FILE_NAME));
    }

    None
}

/// Reads the configuration file, if any, then applies the environment on top of it.
pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = cfg_path.or_else(get_config_path);

    let mut config = match config_path {
        Some(ref path) => {
            println!("Reading config from {}", path.display());
            read_config(path)?
        }
        None => {
            println!("No {} found. Using defaults and environment", CFG_FILE_NAME);
            parse_config("")?
        }
    };

    config.apply_env(|key| env::var(key).ok());

    if let Some(mut log) = config.log {
        let location = match log.location {
            Some(location) => location,
            None => dirs::cache_dir()
                .ok_or_else(|| anyhow!("Could not find user cache dir for the log files"))?
                .join("lifelog-uploader").join("log").join("server.log"),
        };
        println!("Log enabled. Files will be written in {}", location.display());
        log.location = Some(location);
        config.log = Some(log);
    } else {
        println!("Log disabled. Using stdout");
    }

    // Fail early instead of on the first request
    config.credentials().context("Set them in the environment or in the configuration file")?;
    config.deriver_options()?;

    Ok(config)
}

pub(crate) fn generate_cfg(config_path: &Option<PathBuf>) -> Result<PathBuf> {
    let path: PathBuf = match config_path {
        Some(path) => path.clone(),
        None => dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find user config dir"))?
            .join(CFG_FILE_NAME),
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    println!("Writing sample config to {}", path.display());
    write_sample_cfg(&path).with_context(|| format!("Error writing {}", path.display()))?;

    Ok(path)
}
