use std::io::{self, Write};

use nix::sys::signal::Signal;

use crate::builtin::{Builtin, Outcome};
use crate::error::{PipelineError, SpawnError};
use crate::global::Session;
use crate::job::{self, Child, ExitReport, Termination};
use crate::launch;
use crate::parser;
use crate::wiring::{self, LaunchSpec};

// Launches left to right with `launch_one`, which gets each spec together
// with the ones still pending. On a failure the remaining specs are dropped,
// closing their pipe ends so already running segments see EOF or EPIPE.
fn spawn_commands<F>(mut specs: Vec<LaunchSpec>, mut launch_one: F) -> (Vec<Child>, Option<SpawnError>)
	where F: FnMut(LaunchSpec, &[LaunchSpec]) -> Result<Child, SpawnError>
{
	let mut children = Vec::with_capacity(specs.len());
	specs.reverse();
	while let Some(spec) = specs.pop() {
		match launch_one(spec, &specs) {
			Ok(child) => children.push(child),
			Err(e) => return (children, Some(e)),
		}
	}
	(children, None)
}

fn run_specs<F>(specs: Vec<LaunchSpec>, launch_one: F) -> Result<Vec<ExitReport>, PipelineError>
	where F: FnMut(LaunchSpec, &[LaunchSpec]) -> Result<Child, SpawnError>
{
	let (children, spawn_error) = spawn_commands(specs, launch_one);
	let reports = job::supervise(children);
	if let Some(e) = spawn_error {
		return Err(e.into());
	}
	Ok(reports?)
}

/// Runs the pipeline described by `tokens` and waits for all of its processes.
///
/// Reports come back in segment order. Every launched process is reaped,
/// even when a later segment could not be forked.
pub fn run_pipeline(tokens: &[String], search_path: &str) -> Result<Vec<ExitReport>, PipelineError> {
	let pipeline = parser::scan(tokens)?;
	let specs = wiring::build(pipeline).map_err(PipelineError::Pipe)?;
	run_specs(specs, |spec, pending| launch::launch(spec, search_path, pending))
}

fn report_failures(reports: &[ExitReport]) {
	let mut stderr = io::stderr();
	for report in reports {
		match report.termination {
			Termination::Signaled(Signal::SIGPIPE) | Termination::Exited(0) => {},
			Termination::Signaled(signal) => {
				let _ = writeln!(stderr, "{}: terminated by {}", report.program, signal.as_str());
			},
			Termination::Exited(code) => debug!("{} exited with {}", report.program, code),
		}
	}
}

pub enum EvalResult {
	Done(i32),
	Exit(i32),
}

/// Evaluates one tokenized line: a builtin when token 0 names one, otherwise
/// a pipeline of external programs. The status is that of the last segment.
pub fn eval(session: &mut Session, tokens: &[String]) -> EvalResult {
	let name = match tokens.first() {
		Some(name) => name,
		None => return EvalResult::Done(0),
	};

	if let Some(builtin) = Builtin::lookup(name) {
		let stdout = io::stdout();
		let stderr = io::stderr();
		let outcome = builtin.run(&mut stdout.lock(), &mut stderr.lock(), &tokens[1 ..]);
		return match outcome {
			Outcome::Status(s) => EvalResult::Done(s),
			Outcome::Exit(code) => EvalResult::Exit(code),
		};
	}

	// Anything still buffered would otherwise show up after the children's output.
	let _ = io::stdout().flush();
	let status = match run_pipeline(tokens, &session.config.search_path) {
		Ok(reports) => {
			report_failures(&reports);
			reports.last().map_or(0, ExitReport::code)
		},
		Err(e) => {
			let _ = writeln!(io::stderr(), "minish: {}", e);
			1
		},
	};
	session.restore_terminal();
	EvalResult::Done(status)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use crate::error::MalformedPipeline;
	use nix::errno::Errno;
	use nix::sys::wait;
	use nix::unistd::Pid;

	const SEARCH_PATH: &str = "/bin:/usr/bin";

	fn toks(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| w.to_string()).collect()
	}

	fn specs_for(words: &[&str]) -> Vec<LaunchSpec> {
		wiring::build(parser::scan(&toks(words)).unwrap()).unwrap()
	}

	// Launches the first `forks` segments for real and fails every later fork.
	fn failing_after(forks: usize) -> impl FnMut(LaunchSpec, &[LaunchSpec]) -> Result<Child, SpawnError> {
		let mut launched = 0;
		move |spec: LaunchSpec, pending: &[LaunchSpec]| {
			if launched == forks {
				return Err(SpawnError::ForkFailed(Errno::EAGAIN));
			}
			launched += 1;
			launch::launch(spec, SEARCH_PATH, pending)
		}
	}

	fn session() -> Session {
		Session::new(Config { search_path: SEARCH_PATH.to_owned(), ..Config::default() })
	}

	#[test]
	fn malformed_line_spawns_nothing() {
		match run_pipeline(&toks(&["true", "|", "|", "true"]), SEARCH_PATH) {
			Err(PipelineError::Malformed(MalformedPipeline::EmptyCommand { segment: 1 })) => {},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn fork_failure_releases_launched_writer() {
		// `yes` only stops once every read end of its pipe is gone.
		let (children, error) = spawn_commands(specs_for(&["yes", "|", "cat", "|", "true"]), failing_after(1));
		assert!(matches!(error, Some(SpawnError::ForkFailed(Errno::EAGAIN))));
		assert_eq!(children.len(), 1);
		let reports = job::supervise(children).unwrap();
		assert_eq!(reports[0].program, "yes");
		assert_eq!(reports[0].termination, Termination::Signaled(Signal::SIGPIPE));
	}

	#[test]
	fn fork_failure_still_reaps_launched_segments() {
		let mut pids: Vec<Pid> = vec![];
		let mut launch_one = failing_after(2);
		let result = run_specs(specs_for(&["true", "|", "cat", "|", "cat", "|", "true"]), |spec, pending| {
			let child = launch_one(spec, pending)?;
			pids.push(child.pid());
			Ok(child)
		});
		assert!(matches!(result, Err(PipelineError::Spawn(SpawnError::ForkFailed(Errno::EAGAIN)))));
		assert_eq!(pids.len(), 2);
		for pid in pids {
			assert_eq!(wait::waitpid(pid, None), Err(Errno::ECHILD));
		}
	}

	#[test]
	fn status_is_last_segment() {
		let mut session = session();
		match eval(&mut session, &toks(&["false", "|", "true"])) {
			EvalResult::Done(0) => {},
			_ => panic!("expected status 0"),
		}
		match eval(&mut session, &toks(&["true", "|", "false"])) {
			EvalResult::Done(1) => {},
			_ => panic!("expected status 1"),
		}
	}

	#[test]
	fn empty_line_is_success() {
		assert!(matches!(eval(&mut session(), &[]), EvalResult::Done(0)));
	}

	#[test]
	fn exit_builtin_ends_session() {
		assert!(matches!(eval(&mut session(), &toks(&["exit", "3"])), EvalResult::Exit(3)));
	}

	#[test]
	fn malformed_line_reports_status_1() {
		assert!(matches!(eval(&mut session(), &toks(&["ls", ">"])), EvalResult::Done(1)));
	}
}
