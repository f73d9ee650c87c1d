use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::Pid;

use crate::error::ReapError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Termination {
	Exited(i32),
	Signaled(Signal),
}

trait WaitStatusExt {
	fn termination(self) -> Option<Termination>;
}

impl WaitStatusExt for WaitStatus {
	fn termination(self) -> Option<Termination> {
		match self {
			WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
			WaitStatus::Signaled(_, signal, _) => Some(Termination::Signaled(signal)),
			_ => None,
		}
	}
}

/// A forked child that has not been reaped yet.
///
/// Reaping consumes the handle, so a child can be reaped at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct Child {
	pid: Pid,
	program: String,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExitReport {
	pub pid: Pid,
	pub program: String,
	pub termination: Termination,
}

impl ExitReport {
	pub fn success(&self) -> bool {
		self.termination == Termination::Exited(0)
	}

	/// Shell-style status: the exit code, or 128 plus the signal number.
	pub fn code(&self) -> i32 {
		match self.termination {
			Termination::Exited(code) => code,
			Termination::Signaled(signal) => 128 + signal as i32,
		}
	}
}

impl Child {
	pub fn new(pid: Pid, program: String) -> Child {
		Child { pid, program }
	}

	pub fn pid(&self) -> Pid {
		self.pid
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	/// Blocks until the child terminates.
	pub fn reap(self) -> Result<ExitReport, ReapError> {
		loop {
			match wait::waitpid(self.pid, None) {
				Ok(status) => if let Some(termination) = status.termination() {
					debug!("reaped {} (pid {}): {:?}", self.program, self.pid, termination);
					return Ok(ExitReport { pid: self.pid, program: self.program, termination });
				},
				Err(Errno::EINTR) => {},
				Err(e) => return Err(ReapError { pid: self.pid, program: self.program, source: e }),
			}
		}
	}
}

/// Reaps `children` in launch order, one report per child.
///
/// A failed reap does not stop the others from being reaped; the first
/// failure is returned once all of them have been waited for.
pub fn supervise(children: Vec<Child>) -> Result<Vec<ExitReport>, ReapError> {
	let mut reports = Vec::with_capacity(children.len());
	let mut first_error = None;
	for child in children {
		match child.reap() {
			Ok(report) => reports.push(report),
			Err(e) => {
				warn!("{}", e);
				if first_error.is_none() {
					first_error = Some(e);
				}
			},
		}
	}
	match first_error {
		Some(e) => Err(e),
		None => Ok(reports),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::launch::launch;
	use crate::wiring::{LaunchSpec, Stream};

	fn spawn(script: &str) -> Child {
		let spec = LaunchSpec {
			program: "sh".to_owned(),
			arguments: vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()],
			stdin: Stream::Inherit,
			stdout: Stream::Inherit,
		};
		launch(spec, "/bin:/usr/bin", &[]).unwrap()
	}

	#[test]
	fn one_report_per_child_in_launch_order() {
		// The slow child is first, so completion order differs from launch order.
		let children = vec![spawn("sleep 0.2; exit 1"), spawn("exit 0"), spawn("exit 7")];
		let pids: Vec<Pid> = children.iter().map(Child::pid).collect();

		let reports = supervise(children).unwrap();
		assert_eq!(reports.len(), 3);
		assert_eq!(reports.iter().map(|r| r.pid).collect::<Vec<_>>(), pids);
		assert_eq!(reports.iter().map(ExitReport::code).collect::<Vec<_>>(), [1, 0, 7]);
		assert!(!reports[0].success());
		assert!(reports[1].success());
	}

	#[test]
	fn signal_termination_is_reported() {
		let report = spawn("kill -KILL $$").reap().unwrap();
		assert_eq!(report.termination, Termination::Signaled(Signal::SIGKILL));
		assert_eq!(report.code(), 128 + 9);
		assert!(!report.success());
	}

	#[test]
	fn reaping_unknown_child_fails_but_others_are_reaped() {
		let real = spawn("exit 0");
		let real_pid = real.pid();
		let bogus = Child::new(Pid::from_raw(i32::MAX), "ghost".to_owned());

		let err = supervise(vec![bogus, real]).unwrap_err();
		assert_eq!(err.program, "ghost");
		assert_eq!(err.source, Errno::ECHILD);
		// Already reaped by supervise, so a second wait finds no such child.
		assert_eq!(wait::waitpid(real_pid, None), Err(Errno::ECHILD));
	}

	#[test]
	fn empty_supervision_is_empty() {
		assert!(supervise(vec![]).unwrap().is_empty());
	}
}
