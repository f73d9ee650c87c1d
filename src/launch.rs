use std::ffi::CString;
use std::os::raw::c_char;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;

use nix::errno::Errno;
use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::unistd::{self, ForkResult};

use crate::error::SpawnError;
use crate::job::Child;
use crate::search;
use crate::wiring::{LaunchSpec, Stream};

/// Permission bits of files created by `<` or `>`.
pub const REDIRECT_MODE: u32 = 0o600;

// What a child prints and exits with when it cannot run its program.
struct Failure {
	message: Vec<u8>,
	code: i32,
}

impl Failure {
	fn new(err: &SpawnError) -> Failure {
		Failure { message: format!("minish: {}\n", err).into_bytes(), code: err.exit_code() }
	}
}

enum Wiring {
	Inherit,
	Pipe(RawFd),
	File { path: CString, context: Vec<u8> },
	Invalid(Failure),
}

impl Wiring {
	fn new(stream: &Stream) -> Wiring {
		match *stream {
			Stream::Inherit => Wiring::Inherit,
			Stream::Pipe(ref fd) => Wiring::Pipe(fd.as_raw_fd()),
			Stream::File(ref path) => match CString::new(path.as_os_str().as_bytes()) {
				Ok(c_path) => Wiring::File {
					path: c_path,
					context: format!("minish: {}: ", path.display()).into_bytes(),
				},
				Err(e) => Wiring::Invalid(Failure::new(&SpawnError::io(path.display().to_string(), e))),
			},
		}
	}
}

struct Image {
	path: CString,
	// Keeps the strings `argv` points into alive.
	_arguments: Vec<CString>,
	argv: Vec<*const c_char>,
	context: Vec<u8>,
}

impl Image {
	fn new(spec: &LaunchSpec, search_path: &str) -> Result<Image, SpawnError> {
		let path = search::resolve(&spec.program, search_path)?;
		let path = CString::new(path.into_os_string().into_vec())
			.map_err(|e| SpawnError::io(spec.program.as_str(), e))?;
		let arguments = spec.arguments.iter()
			.map(|a| CString::new(a.as_bytes()))
			.collect::<Result<Vec<CString>, _>>()
			.map_err(|e| SpawnError::io(spec.program.as_str(), e))?;
		let argv = arguments.iter().map(|a| a.as_ptr()).chain(Some(ptr::null())).collect();
		Ok(Image {
			path,
			_arguments: arguments,
			argv,
			context: format!("minish: {}: ", spec.program).into_bytes(),
		})
	}
}

/// Everything the child needs, built before forking. Between `fork` and
/// `exec` the child neither allocates nor takes locks, since another thread
/// of the parent may have held the allocator or stderr lock at fork time.
struct Prepared {
	pending: Vec<RawFd>,
	stdin: Wiring,
	stdout: Wiring,
	image: Result<Image, Failure>,
}

impl Prepared {
	fn new(spec: &LaunchSpec, search_path: &str, pending: &[LaunchSpec]) -> Prepared {
		Prepared {
			pending: pending.iter().flat_map(LaunchSpec::pipe_fds).collect(),
			stdin: Wiring::new(&spec.stdin),
			stdout: Wiring::new(&spec.stdout),
			image: Image::new(spec, search_path).map_err(|e| Failure::new(&e)),
		}
	}
}

fn write_stderr(bytes: &[u8]) {
	let mut rest = bytes;
	while !rest.is_empty() {
		let n = unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
		if n < 0 && Errno::last() == Errno::EINTR {
			continue;
		}
		if n <= 0 {
			return;
		}
		rest = &rest[n as usize ..];
	}
}

fn fail(failure: &Failure) -> ! {
	write_stderr(&failure.message);
	unsafe { libc::_exit(failure.code) }
}

fn die(context: &[u8], errno: Errno) -> ! {
	write_stderr(context);
	write_stderr(errno.desc().as_bytes());
	write_stderr(b"\n");
	unsafe { libc::_exit(126) }
}

// Makes `fd` the descriptor `target`. When they are already the same, dup2
// would do nothing, so only the close-on-exec flag is cleared.
fn move_fd(fd: RawFd, target: RawFd) -> nix::Result<()> {
	if fd == target {
		fcntl::fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
		return Ok(());
	}
	unistd::dup2(fd, target)?;
	unistd::close(fd)
}

fn wire(wiring: &Wiring, target: RawFd) {
	match *wiring {
		Wiring::Inherit => {},
		Wiring::Pipe(fd) => if let Err(e) = move_fd(fd, target) {
			die(b"minish: dup2: ", e)
		},
		// Read-write, created if absent, never truncated.
		Wiring::File { ref path, ref context } => {
			let mode = Mode::from_bits_truncate(REDIRECT_MODE as libc::mode_t);
			let result = fcntl::open(path.as_c_str(), OFlag::O_RDWR | OFlag::O_CREAT, mode)
				.and_then(|fd| move_fd(fd, target));
			if let Err(e) = result {
				die(context, e)
			}
		},
		Wiring::Invalid(ref failure) => fail(failure),
	}
}

fn exec_child(prepared: &Prepared) -> ! {
	for &fd in &prepared.pending {
		let _ = unistd::close(fd);
	}
	wire(&prepared.stdin, libc::STDIN_FILENO);
	wire(&prepared.stdout, libc::STDOUT_FILENO);
	// Ignored dispositions survive exec, and the Rust runtime ignores SIGPIPE.
	if let Err(e) = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
		die(b"minish: signal: ", e)
	}
	match prepared.image {
		Ok(ref image) => {
			unsafe { libc::execv(image.path.as_ptr(), image.argv.as_ptr()) };
			die(&image.context, Errno::last())
		},
		Err(ref failure) => fail(failure),
	}
}

/// Forks a process for `spec` and returns without waiting for it.
///
/// `pending` holds the specs of segments not launched yet; their pipe ends
/// are closed in the child before it executes the program. The parent's
/// copies of this segment's pipe ends are closed when `spec` is dropped on
/// return.
///
/// The program is resolved before forking. Failures past that point, a
/// missing program included, surface as the child's exit status: 127 when
/// the program was not found, 126 otherwise.
pub fn launch(spec: LaunchSpec, search_path: &str, pending: &[LaunchSpec]) -> Result<Child, SpawnError> {
	let prepared = Prepared::new(&spec, search_path, pending);
	match unsafe { unistd::fork() } {
		Err(e) => Err(SpawnError::ForkFailed(e)),
		Ok(ForkResult::Child) => exec_child(&prepared),
		Ok(ForkResult::Parent { child }) => {
			debug!("spawned {} as pid {}", spec.program, child);
			Ok(Child::new(child, spec.program))
		},
	}
}
