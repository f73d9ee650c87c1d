use std::path::{Path, PathBuf};

use crate::error::NotFound;

pub const PATH_KEY: &str = "PATH";

/// Finds the file to execute for `program`.
///
/// A program that already names an existing path is returned unchanged, so
/// `./a.out` or `/bin/ls` bypass the search. Otherwise each `:`-separated
/// directory of `search_path` is tried in order and the first existing
/// `directory/program` wins.
pub fn resolve(program: &str, search_path: &str) -> Result<PathBuf, NotFound> {
	if program.is_empty() {
		return Err(NotFound { program: program.to_owned() });
	}
	if Path::new(program).exists() {
		return Ok(PathBuf::from(program));
	}
	for dir in search_path.split(':') {
		let candidate = PathBuf::from(format!("{}/{}", dir, program));
		if candidate.exists() {
			trace!("resolved {} to {}", program, candidate.display());
			return Ok(candidate);
		}
	}
	Err(NotFound { program: program.to_owned() })
}
