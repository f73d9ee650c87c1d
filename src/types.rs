use std::path::PathBuf;

/// One program invocation. `arguments[0]` is the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub program: String,
	pub arguments: Vec<String>,
	pub input: Option<PathBuf>,
	pub output: Option<PathBuf>,
}

impl Segment {
	pub fn new(arguments: Vec<String>) -> Segment {
		assert!(!arguments.is_empty());
		Segment { program: arguments[0].clone(), arguments, input: None, output: None }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	pub segments: Vec<Segment>,
}
