use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::PathBuf;

use nix::fcntl::OFlag;
use nix::unistd;

use crate::types::{Pipeline, Segment};

/// Where a launched program's stdin or stdout goes.
#[derive(Debug)]
pub enum Stream {
	Inherit,
	File(PathBuf),
	Pipe(OwnedFd),
}

impl Stream {
	fn redirect_or_inherit(target: Option<PathBuf>) -> Stream {
		target.map_or(Stream::Inherit, Stream::File)
	}

	pub fn pipe_fd(&self) -> Option<RawFd> {
		match *self {
			Stream::Pipe(ref fd) => Some(fd.as_raw_fd()),
			_ => None,
		}
	}
}

/// Everything needed to start one segment. Pipe ends are owned here, so
/// dropping a spec closes this process's copy of them.
#[derive(Debug)]
pub struct LaunchSpec {
	pub program: String,
	pub arguments: Vec<String>,
	pub stdin: Stream,
	pub stdout: Stream,
}

impl LaunchSpec {
	pub fn pipe_fds(&self) -> impl Iterator<Item = RawFd> {
		self.stdin.pipe_fd().into_iter().chain(self.stdout.pipe_fd())
	}
}

/// Chains the segments of `pipeline` with N-1 close-on-exec pipes.
///
/// Segment *i* reads from pipe *i-1* and writes to pipe *i*; the first
/// segment's stdin and the last segment's stdout fall back to their
/// redirection file, or to the inherited stream.
pub fn build(pipeline: Pipeline) -> nix::Result<Vec<LaunchSpec>> {
	let n = pipeline.segments.len();
	let mut readers: Vec<Option<OwnedFd>> = Vec::with_capacity(n);
	let mut writers: Vec<Option<OwnedFd>> = Vec::with_capacity(n);
	readers.push(None);
	for _ in 1 .. n {
		let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
		writers.push(Some(write));
		readers.push(Some(read));
	}
	writers.push(None);

	let specs = pipeline.segments.into_iter().zip(readers).zip(writers)
		.map(|((segment, reader), writer)| {
			let Segment { program, arguments, input, output } = segment;
			let stdin = reader.map_or_else(|| Stream::redirect_or_inherit(input), Stream::Pipe);
			let stdout = writer.map_or_else(|| Stream::redirect_or_inherit(output), Stream::Pipe);
			LaunchSpec { program, arguments, stdin, stdout }
		})
		.collect();
	Ok(specs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::File;
	use std::io::{Read, Write};
	use crate::parser::scan;

	fn specs_for(words: &[&str]) -> Vec<LaunchSpec> {
		let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
		build(scan(&tokens).unwrap()).unwrap()
	}

	#[test]
	fn single_segment_inherits_both_ends() {
		let specs = specs_for(&["ls", "-l"]);
		assert_eq!(specs.len(), 1);
		assert!(matches!(specs[0].stdin, Stream::Inherit));
		assert!(matches!(specs[0].stdout, Stream::Inherit));
		assert_eq!(specs[0].arguments, ["ls", "-l"]);
	}

	#[test]
	fn redirect_files_bind_to_outer_ends() {
		let specs = specs_for(&["cat", "<", "in", "|", "cat", ">", "out"]);
		match specs[0].stdin {
			Stream::File(ref p) => assert_eq!(p, &PathBuf::from("in")),
			ref other => panic!("unexpected stdin {:?}", other),
		}
		assert!(matches!(specs[0].stdout, Stream::Pipe(_)));
		assert!(matches!(specs[1].stdin, Stream::Pipe(_)));
		match specs[1].stdout {
			Stream::File(ref p) => assert_eq!(p, &PathBuf::from("out")),
			ref other => panic!("unexpected stdout {:?}", other),
		}
	}

	#[test]
	fn three_segments_use_two_pipes() {
		let specs = specs_for(&["a", "|", "b", "|", "c"]);
		assert_eq!(specs.len(), 3);
		assert!(matches!(specs[0].stdin, Stream::Inherit));
		assert!(matches!(specs[2].stdout, Stream::Inherit));

		let fds: Vec<RawFd> = specs.iter().flat_map(LaunchSpec::pipe_fds).collect();
		assert_eq!(fds.len(), 4);
		let mut unique = fds.clone();
		unique.sort();
		unique.dedup();
		assert_eq!(unique.len(), 4);
	}

	#[test]
	fn pipe_ends_are_close_on_exec() {
		let specs = specs_for(&["a", "|", "b"]);
		for fd in specs.iter().flat_map(LaunchSpec::pipe_fds) {
			let flags = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_GETFD).unwrap();
			assert!(nix::fcntl::FdFlag::from_bits_truncate(flags).contains(nix::fcntl::FdFlag::FD_CLOEXEC));
		}
	}

	#[test]
	fn adjacent_segments_share_a_byte_stream() {
		let mut specs = specs_for(&["producer", "|", "consumer"]);
		let consumer = specs.pop().unwrap();
		let producer = specs.pop().unwrap();
		let (writer, reader) = match (producer.stdout, consumer.stdin) {
			(Stream::Pipe(w), Stream::Pipe(r)) => (File::from(w), File::from(r)),
			_ => panic!("segments are not piped together"),
		};

		let mut writer = writer;
		for chunk in ["first ", "second ", "third"] {
			writer.write_all(chunk.as_bytes()).unwrap();
		}
		drop(writer);

		let mut received = String::new();
		let mut reader = reader;
		reader.read_to_string(&mut received).unwrap();
		assert_eq!(received, "first second third");
	}
}
