//! Splits an input line into words.
//!
//! Words are separated by whitespace. Unquoted, the operator characters `<`,
//! `>` and `|` always form a token of their own. Quoting or escaping one keeps
//! it inside a longer word, but tokens are plain strings, so a word that is
//! nothing but a quoted operator is still read as that operator. Single quotes
//! keep their contents literally; inside double quotes and outside quotes a
//! backslash takes the next character literally. No other expansion is done.

struct Tokenizer<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Tokenizer<'a> {
	fn peek(&self) -> Option<char> {
		self.line[self.i ..].chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.i += c.len_utf8();
		Some(c)
	}

	fn proceed_while<F>(&mut self, f: F) where F: Fn(char) -> bool {
		while let Some(c) = self.peek() {
			if !f(c) { break; }
			self.i += c.len_utf8();
		}
	}

	fn is_operator(c: char) -> bool {
		matches!(c, '<' | '>' | '|')
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(char::is_whitespace);
	}

	// An unterminated quote runs to the end of the line.
	fn read_quoted(&mut self, quote: char, word: &mut String) {
		while let Some(c) = self.bump() {
			match c {
				_ if c == quote => return,
				'\\' if quote == '"' => if let Some(e) = self.bump() { word.push(e) },
				_ => word.push(c),
			}
		}
	}

	fn read_token(&mut self) -> Option<String> {
		self.skip_whitespaces();
		let first = self.peek()?;
		if Tokenizer::is_operator(first) {
			self.bump();
			return Some(first.to_string());
		}

		let mut word = String::new();
		while let Some(c) = self.peek() {
			if c.is_whitespace() || Tokenizer::is_operator(c) { break; }
			self.bump();
			match c {
				'\'' | '"' => self.read_quoted(c, &mut word),
				'\\' => if let Some(e) = self.bump() { word.push(e) },
				_ => word.push(c),
			}
		}
		Some(word)
	}
}

pub fn tokenize(line: &str) -> Vec<String> {
	let mut tokenizer = Tokenizer { line, i: 0 };
	let mut tokens = vec![];
	while let Some(token) = tokenizer.read_token() {
		tokens.push(token);
	}
	tokens
}
