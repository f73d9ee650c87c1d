use std::path::PathBuf;

use crate::error::{MalformedPipeline, Operator};
use crate::types::*;

type ScanResult<T> = Result<T, MalformedPipeline>;

struct Scanner<'a> {
	tokens: &'a [String],
	i: usize,
	saw_pipe: bool,
}

impl<'a> Scanner<'a> {
	fn next(&mut self) -> Option<&'a str> {
		let token = self.tokens.get(self.i)?;
		self.i += 1;
		Some(token.as_str())
	}

	fn read_target(&mut self, operator: Operator) -> ScanResult<PathBuf> {
		match self.next() {
			Some(target) if Operator::from_token(target).is_none() => Ok(PathBuf::from(target)),
			_ => Err(MalformedPipeline::MissingTarget { operator }),
		}
	}

	// Only the first redirection of a segment is honored; whatever follows it
	// up to the next pipe is dropped.
	fn skip_to_pipe(&mut self, segment: usize) {
		while let Some(token) = self.next() {
			if token == "|" {
				self.saw_pipe = true;
				return;
			}
			warn!("ignoring '{}' after redirection in segment {}", token, segment);
		}
	}

	fn scan_segment(&mut self, index: usize) -> ScanResult<Segment> {
		let mut arguments: Vec<String> = vec![];
		let mut input = None;
		let mut output = None;

		self.saw_pipe = false;
		while let Some(token) = self.next() {
			match Operator::from_token(token) {
				Some(Operator::Pipe) => {
					self.saw_pipe = true;
					break;
				},
				Some(operator) => {
					let target = self.read_target(operator)?;
					if operator == Operator::Input {
						input = Some(target);
					} else {
						output = Some(target);
					}
					self.skip_to_pipe(index);
					break;
				},
				None => arguments.push(token.to_owned()),
			}
		}

		if arguments.is_empty() {
			return Err(MalformedPipeline::EmptyCommand { segment: index });
		}
		let mut segment = Segment::new(arguments);
		segment.input = input;
		segment.output = output;
		Ok(segment)
	}

	fn scan_pipeline(&mut self) -> ScanResult<Pipeline> {
		let mut segments: Vec<Segment> = vec![];
		loop {
			let segment = self.scan_segment(segments.len())?;
			segments.push(segment);
			if !self.saw_pipe { break; }
		}

		let last = segments.len() - 1;
		for (i, segment) in segments.iter().enumerate() {
			if segment.input.is_some() && i != 0 {
				return Err(MalformedPipeline::MisplacedInput { segment: i });
			}
			if segment.output.is_some() && i != last {
				return Err(MalformedPipeline::MisplacedOutput { segment: i });
			}
		}
		trace!("scanned {} segment(s): {:?}", segments.len(), segments);
		Ok(Pipeline { segments })
	}
}

/// Splits `tokens` at `|` into segments and pulls out `<`/`>` targets.
pub fn scan(tokens: &[String]) -> ScanResult<Pipeline> {
	let mut scanner = Scanner { tokens, i: 0, saw_pipe: false };
	scanner.scan_pipeline()
}
