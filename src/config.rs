use std::env;
use std::str::FromStr;

use log::LevelFilter;

use crate::search::PATH_KEY;

pub const LOG_KEY: &str = "MINISH_LOG";

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

/// Settings read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// `:`-separated directories searched for programs.
	pub search_path: String,
	pub log_level: LevelFilter,
}

impl Default for Config {
	fn default() -> Config {
		Config { search_path: String::new(), log_level: DEFAULT_LOG_LEVEL }
	}
}

impl Config {
	pub fn from_env() -> Config {
		Config::from_vars(env::var(PATH_KEY).ok(), env::var(LOG_KEY).ok())
	}

	fn from_vars(path: Option<String>, log_level: Option<String>) -> Config {
		let log_level = log_level
			.and_then(|l| LevelFilter::from_str(l.trim()).ok())
			.unwrap_or(DEFAULT_LOG_LEVEL);
		Config { search_path: path.unwrap_or_default(), log_level }
	}
}
