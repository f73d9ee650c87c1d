use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Sends log records to stderr. Only the first call installs a logger.
pub fn init(level: LevelFilter) {
	let config = ConfigBuilder::new()
		.set_time_level(LevelFilter::Off)
		.set_target_level(LevelFilter::Off)
		.build();
	if TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto).is_ok() {
		debug!("logging at {}", level);
	}
}
