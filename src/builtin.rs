use std::env;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin { Help, Exit, Pwd, Cd }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Status(i32),
	Exit(i32),
}

const TABLE: &[(Builtin, &str, &str)] = &[
	(Builtin::Help, "?", "show this help menu"),
	(Builtin::Exit, "exit", "exit the command shell"),
	(Builtin::Pwd, "pwd", "show the current working directory"),
	(Builtin::Cd, "cd", "change the current working directory to $arg"),
];

fn builtin_help(out: &mut dyn Write, _: &mut dyn Write, _: &[String]) -> Outcome {
	for &(_, name, doc) in TABLE {
		let _ = writeln!(out, "{} - {}", name, doc);
	}
	Outcome::Status(0)
}

fn builtin_exit(_: &mut dyn Write, err: &mut dyn Write, args: &[String]) -> Outcome {
	match args.first() {
		None => Outcome::Exit(0),
		Some(code) => match code.parse() {
			Ok(code) => Outcome::Exit(code),
			Err(_) => {
				let _ = writeln!(err, "exit: {}: numeric argument required", code);
				Outcome::Status(1)
			},
		},
	}
}

fn builtin_pwd(out: &mut dyn Write, err: &mut dyn Write, _: &[String]) -> Outcome {
	match env::current_dir() {
		Ok(dir) => {
			let _ = writeln!(out, "{}", dir.display());
			Outcome::Status(0)
		},
		Err(e) => {
			let _ = writeln!(err, "pwd: {}", e);
			Outcome::Status(1)
		},
	}
}

fn builtin_cd(_: &mut dyn Write, err: &mut dyn Write, args: &[String]) -> Outcome {
	let target = match args.first() {
		Some(dir) => Path::new(dir),
		None => {
			let _ = writeln!(err, "cd: missing argument");
			return Outcome::Status(1);
		},
	};
	match env::set_current_dir(target) {
		Ok(()) => Outcome::Status(0),
		Err(e) => {
			let _ = writeln!(err, "cd: {}: {}", target.display(), e);
			Outcome::Status(1)
		},
	}
}

impl Builtin {
	pub fn lookup(name: &str) -> Option<Builtin> {
		TABLE.iter().find(|&&(_, n, _)| n == name).map(|&(b, _, _)| b)
	}

	/// Runs the command in the shell process. `args` excludes the command name.
	pub fn run(self, out: &mut dyn Write, err: &mut dyn Write, args: &[String]) -> Outcome {
		let f = match self {
			Builtin::Help => builtin_help,
			Builtin::Exit => builtin_exit,
			Builtin::Pwd => builtin_pwd,
			Builtin::Cd => builtin_cd,
		};
		f(out, err, args)
	}
}
