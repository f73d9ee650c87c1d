use std::io;

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

/// The program named neither an existing path nor a file in any search directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no such program {program}")]
pub struct NotFound {
	pub program: String,
}

/// Redirection operator, as it appears in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator { Input, Output, Pipe }

impl Operator {
	pub fn from_token(token: &str) -> Option<Operator> {
		match token {
			"<" => Some(Operator::Input),
			">" => Some(Operator::Output),
			"|" => Some(Operator::Pipe),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Operator::Input => "<",
			Operator::Output => ">",
			Operator::Pipe => "|",
		}
	}
}

/// Rejected command line. Nothing has been spawned when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPipeline {
	#[error("empty command in segment {segment}")]
	EmptyCommand { segment: usize },
	#[error("missing target after '{}'", .operator.as_str())]
	MissingTarget { operator: Operator },
	#[error("input redirection only allowed on the first command (segment {segment})")]
	MisplacedInput { segment: usize },
	#[error("output redirection only allowed on the last command (segment {segment})")]
	MisplacedOutput { segment: usize },
}

#[derive(Debug, Error)]
pub enum SpawnError {
	#[error("fork failed: {0}")]
	ForkFailed(#[source] Errno),
	#[error("{context}: {source}")]
	Io {
		context: String,
		#[source]
		source: io::Error,
	},
	#[error(transparent)]
	NoSuchProgram(#[from] NotFound),
}

impl SpawnError {
	pub fn io<C: Into<String>, E: Into<io::Error>>(context: C, source: E) -> SpawnError {
		SpawnError::Io { context: context.into(), source: source.into() }
	}

	/// Status a child terminates with after failing to replace its image.
	pub fn exit_code(&self) -> i32 {
		match *self {
			SpawnError::NoSuchProgram(_) => 127,
			SpawnError::ForkFailed(_) | SpawnError::Io { .. } => 126,
		}
	}
}

#[derive(Debug, Error)]
#[error("failed to reap {program} (pid {pid}): {source}")]
pub struct ReapError {
	pub pid: Pid,
	pub program: String,
	#[source]
	pub source: Errno,
}

#[derive(Debug, Error)]
pub enum PipelineError {
	#[error(transparent)]
	Malformed(#[from] MalformedPipeline),
	#[error("pipe: {0}")]
	Pipe(#[source] Errno),
	#[error(transparent)]
	Spawn(#[from] SpawnError),
	#[error(transparent)]
	Reap(#[from] ReapError),
}
