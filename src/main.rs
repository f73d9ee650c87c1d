use std::io;
use std::io::{BufRead, Write};
use std::process;

use log::error;

use minish::config::Config;
use minish::eval::{self, EvalResult};
use minish::global::Session;
use minish::{logging, tokenizer};

fn main() {
	let config = Config::from_env();
	logging::init(config.log_level);
	let mut session = match Session::init(config) {
		Ok(session) => session,
		Err(e) => {
			eprintln!("minish: failed to set up terminal: {}", e);
			process::exit(1);
		},
	};

	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	let mut line = String::new();
	let mut line_num: usize = 0;
	loop {
		if session.interactive {
			let _ = write!(stdout, "{}: ", line_num);
			let _ = stdout.flush();
		}
		line.clear();
		match stdin_locked.read_line(&mut line) {
			Ok(0) => break,
			Ok(_) => {},
			Err(ref e) if e.kind() == io::ErrorKind::InvalidData => {
				eprintln!("minish: {}", e);
				continue;
			},
			Err(e) => {
				error!("failed to read input: {}", e);
				break;
			},
		}
		let tokens = tokenizer::tokenize(&line);
		if let EvalResult::Exit(code) = eval::eval(&mut session, &tokens) {
			let _ = stdout.flush();
			process::exit(code);
		}
		line_num += 1;
	}
}
