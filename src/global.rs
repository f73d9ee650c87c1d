use std::io::{self, IsTerminal};
use std::os::unix::io::{AsFd, RawFd};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::termios::{self, SetArg, Termios};
use nix::unistd::{self, Pid};

use crate::config::Config;

const TERMINAL: RawFd = libc::STDIN_FILENO;

fn tcgetpgrp(fd: RawFd) -> nix::Result<Pid> {
	Errno::result(unsafe { libc::tcgetpgrp(fd) }).map(Pid::from_raw)
}

fn tcsetpgrp(fd: RawFd, pgid: Pid) -> nix::Result<()> {
	Errno::result(unsafe { libc::tcsetpgrp(fd, pgid.as_raw()) }).map(drop)
}

/// Shell-wide state, passed explicitly to the read loop and to evaluation.
pub struct Session {
	pub config: Config,
	/// Whether stdin is a terminal; prompts are shown only then.
	pub interactive: bool,
	pub shell_pgid: Pid,
	tmodes: Option<Termios>,
}

impl Session {
	/// A session that never touches the terminal.
	pub fn new(config: Config) -> Session {
		Session { config, interactive: false, shell_pgid: unistd::getpgrp(), tmodes: None }
	}

	/// Sets up the session, taking the terminal if stdin is one.
	///
	/// A shell started in the background stops itself with SIGTTIN until it
	/// is moved to the foreground.
	pub fn init(config: Config) -> nix::Result<Session> {
		let mut session = Session::new(config);
		if !io::stdin().is_terminal() {
			return Ok(session);
		}
		session.interactive = true;

		loop {
			let pgid = unistd::getpgrp();
			if tcgetpgrp(TERMINAL)? == pgid {
				session.shell_pgid = pgid;
				break;
			}
			signal::killpg(pgid, Signal::SIGTTIN)?;
		}
		tcsetpgrp(TERMINAL, session.shell_pgid)?;
		session.tmodes = Some(termios::tcgetattr(io::stdin().as_fd())?);
		debug!("interactive session, process group {}", session.shell_pgid);
		Ok(session)
	}

	/// Puts back the terminal modes saved at startup, in case a program left
	/// them changed.
	pub fn restore_terminal(&self) {
		if let Some(ref tmodes) = self.tmodes {
			if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSADRAIN, tmodes) {
				warn!("failed to restore terminal modes: {}", e);
			}
		}
	}
}
