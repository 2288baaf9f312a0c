use chronotask_core::{Config, ConfigError};

use super::{paths, CmdResult};

pub fn get(key: &str) -> CmdResult {
    let paths = paths()?;
    let config = Config::load_from(&paths.config_file())?;
    match config.get(key) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Err(ConfigError::UnknownKey(key.to_string()).into()),
    }
}

pub fn set(key: &str, value: &str) -> CmdResult {
    let paths = paths()?;
    let file = paths.config_file();
    let mut config = Config::load_from(&file)?;
    config.set(key, value)?;
    config.save_to(&file)?;
    tracing::debug!(key, value, "config updated");
    println!("{key} = {value}");
    Ok(())
}
