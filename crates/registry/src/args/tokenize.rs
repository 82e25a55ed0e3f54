/// Splits a settings file into flag tokens.
///
/// `#` starts a comment that runs to the end of the line. Tokens end at
/// whitespace or a newline; inside `'` or `"` quotes whitespace is kept and
/// the quotes themselves are dropped. A newline always ends a token.
pub fn settings_file_tokens(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut token = String::new();
	let mut in_white_space = true;
	let mut in_comment = false;
	let mut quote: Option<char> = None;

	for c in text.chars() {
		if in_white_space {
			if in_comment {
				in_comment = c != '\n';
			} else if c == '#' {
				in_comment = true;
			} else if !c.is_whitespace() {
				in_white_space = false;
				token.push(c);
			}
			continue;
		}
		match quote {
			_ if c == '\n' || (quote.is_none() && c.is_whitespace()) => {
				tokens.push(core::mem::take(&mut token));
				in_white_space = true;
				quote = None;
			}
			None if c == '\'' || c == '"' => quote = Some(c),
			Some(q) if c == q => quote = None,
			_ => token.push(c),
		}
	}
	if !token.is_empty() {
		tokens.push(token);
	}
	tokens
}

/// Splits an options variable into options, honoring quotes.
///
/// Returns `None` on an unmatched quote.
pub fn split_options(text: &str) -> Option<Vec<String>> {
	let mut options = Vec::new();
	let mut chars = text.chars().peekable();
	loop {
		while chars.next_if(|c| c.is_whitespace()).is_some() {}
		if chars.peek().is_none() {
			break;
		}
		let mut option = String::new();
		while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
			if c == '\'' || c == '"' {
				loop {
					match chars.next() {
						Some(q) if q == c => break,
						Some(inner) => option.push(inner),
						None => return None,
					}
				}
			} else {
				option.push(c);
			}
		}
		options.push(option);
	}
	Some(options)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn settings_tokens_skip_comments() {
		let text = "# tuning\n+UseCompiler   TieredStopAtLevel=1\n  # trailing\nCICompilerCount=2";
		assert_eq!(
			settings_file_tokens(text),
			vec!["+UseCompiler", "TieredStopAtLevel=1", "CICompilerCount=2"]
		);
	}

	#[test]
	fn settings_quotes_keep_spaces() {
		let text = "HeapDumpPath=\"/tmp/my dumps\"\nCompileCommand='quiet'";
		assert_eq!(
			settings_file_tokens(text),
			vec!["HeapDumpPath=/tmp/my dumps", "CompileCommand=quiet"]
		);
	}

	#[test]
	fn newline_ends_an_open_quote() {
		let text = "HeapDumpPath='/tmp/a\n+UseCompiler";
		assert_eq!(settings_file_tokens(text), vec!["HeapDumpPath=/tmp/a", "+UseCompiler"]);
	}

	#[test]
	fn comment_marker_inside_token_is_literal() {
		assert_eq!(settings_file_tokens("HeapDumpPath=a#b"), vec!["HeapDumpPath=a#b"]);
	}

	#[test]
	fn options_split_on_whitespace_and_quotes() {
		assert_eq!(
			split_options("  -XX:+UseCompiler\t-XX:HeapDumpPath='/tmp/x y' -Xint "),
			Some(vec![
				"-XX:+UseCompiler".to_string(),
				"-XX:HeapDumpPath=/tmp/x y".to_string(),
				"-Xint".to_string(),
			])
		);
		assert_eq!(split_options(""), Some(Vec::new()));
	}

	#[test]
	fn unmatched_quote_is_rejected() {
		assert_eq!(split_options("-XX:HeapDumpPath=\"/tmp"), None);
	}
}
