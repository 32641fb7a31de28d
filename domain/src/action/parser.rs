//! Action extraction from model output.
//!
//! Models answer in a ReAct-ish format (`Thought: … Action: tool(k=v, …)`).
//! This module finds the **last** `Action:` marker that starts a call and
//! parses that call into an [`Action`].
//!
//! The argument grammar is a closed literal language, parsed by hand with
//! recursive descent. Nothing is ever evaluated: identifiers other than the
//! literal keywords, nested calls, attribute access and operators are all
//! syntax errors.
//!
//! ```text
//! call     := IDENT '(' [kwarg (',' kwarg)* [',']] ')'
//! kwarg    := IDENT '=' literal
//! literal  := STRING | NUMBER | 'True' | 'False' | 'None'
//!           | 'true' | 'false' | 'null'
//!           | '[' [literal (',' literal)* [',']] ']'
//!           | '{' [STRING ':' literal (',' STRING ':' literal)* [',']] '}'
//! ```

use super::entities::Action;
use crate::util::truncate_str;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Marker that introduces a tool call in model output
pub const ACTION_MARKER: &str = "Action:";

/// Nested lists/mappings deeper than this are rejected
const MAX_NESTING: usize = 32;

/// Longest fragment quoted back in a [`ParseError`]
const MAX_FRAGMENT: usize = 48;

/// Malformed action syntax
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset} near `{fragment}`")]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// The offending fragment of the call text
    pub fragment: String,
    /// Byte offset of the error inside the call text
    pub offset: usize,
}

/// Extract the last action from model output.
///
/// Only markers followed by `Identifier(` start a call; any other
/// `Action:` text (`Action: None`, prose like "the next Action: is ...")
/// is ignored. Markers are scanned front to back and the last call wins.
/// Markers inside a call already parsed (e.g. in a string argument) are
/// part of that call, not new calls.
///
/// Returns `Ok(None)` when no marker starts a call. If the last call is
/// malformed the extraction fails; earlier calls are not consulted.
pub fn extract_action(text: &str) -> Result<Option<Action>, ParseError> {
    let mut found = None;
    let mut resume = 0;

    for (marker, _) in text.match_indices(ACTION_MARKER) {
        if marker < resume {
            continue;
        }
        let call_start = marker + ACTION_MARKER.len();
        let call = text[call_start..].trim_start();
        if !starts_call(call) {
            continue;
        }

        let mut parser = CallParser::new(call);
        let parsed = parser.parse_call();
        found = Some(parsed.map(|mut action| {
            action.source = call[..parser.pos].to_string();
            resume = text.len() - call.len() + parser.pos;
            action
        }));
    }

    found.transpose()
}

/// `IDENT` followed by optional spaces and `(` on the same line
fn starts_call(call: &str) -> bool {
    let mut parser = CallParser::new(call);
    if parser.parse_ident().is_none() {
        return false;
    }
    parser.src[parser.pos..]
        .trim_start_matches([' ', '\t'])
        .starts_with('(')
}

/// Parse a standalone call such as `describe_dataframe(dataframe_id="x")`.
///
/// Unlike [`extract_action`] nothing but whitespace may follow the call.
pub fn parse_action(src: &str) -> Result<Action, ParseError> {
    let call = src.trim();
    let mut parser = CallParser::new(call);
    let mut action = parser.parse_call()?;
    parser.skip_ws();
    if parser.pos < call.len() {
        return Err(parser.error("unexpected text after call"));
    }
    action.source = call.to_string();
    Ok(action)
}

struct CallParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> CallParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let tail = &self.src[offset..];
        // At end of input the useful context is what came before
        let fragment = if tail.trim().is_empty() {
            let start = offset.saturating_sub(MAX_FRAGMENT);
            let start = (start..=offset)
                .find(|&i| self.src.is_char_boundary(i))
                .unwrap_or(offset);
            self.src[start..offset].trim().to_string()
        } else {
            truncate_str(tail, MAX_FRAGMENT).to_string()
        };
        ParseError {
            message: message.into(),
            fragment,
            offset,
        }
    }

    fn parse_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                self.bump();
            }
            _ => return None,
        }
        while self
            .peek()
            .is_some_and(|c| c == '_' || c.is_ascii_alphanumeric())
        {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    fn parse_call(&mut self) -> Result<Action, ParseError> {
        let name = self
            .parse_ident()
            .ok_or_else(|| self.error("expected a tool name"))?;
        let mut action = Action::new(name);

        self.skip_ws();
        if !self.eat('(') {
            return Err(self.error(format!("expected '(' after tool name `{}`", name)));
        }

        loop {
            self.skip_ws();
            if self.eat(')') {
                return Ok(action);
            }
            if self.peek().is_none() {
                return Err(self.error("unbalanced parentheses: missing ')'"));
            }

            let key_start = self.pos;
            let Some(key) = self.parse_ident() else {
                return Err(self.error("positional arguments are not allowed"));
            };
            self.skip_ws();
            match self.peek() {
                Some('=') if self.peek_second() != Some('=') => {
                    self.bump();
                }
                Some('(') => {
                    return Err(self.error_at(key_start, "nested calls are not allowed"));
                }
                Some('.') => {
                    return Err(self.error_at(key_start, "attribute access is not allowed"));
                }
                Some('=') => {
                    return Err(self.error("expressions are not allowed, only literals"));
                }
                None => return Err(self.error("unbalanced parentheses: missing ')'")),
                _ => {
                    return Err(self.error_at(key_start, "positional arguments are not allowed"));
                }
            }

            if action.arguments.contains_key(key) {
                return Err(self.error_at(
                    key_start,
                    format!("duplicate keyword argument `{}`", key),
                ));
            }

            self.skip_ws();
            let value = self.parse_literal()?;
            action.arguments.insert(key.to_string(), value);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                None => return Err(self.error("unbalanced parentheses: missing ')'")),
                Some(c) => return Err(self.unexpected_after_literal(c)),
            }
        }
    }

    fn unexpected_after_literal(&self, c: char) -> ParseError {
        match c {
            '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '=' | '@' | '~' => {
                self.error("expressions are not allowed, only literals")
            }
            '(' => self.error("calls are not allowed"),
            '.' => self.error("attribute access is not allowed"),
            '[' => self.error("subscripts are not allowed"),
            _ => self.error("expected ',' or ')'"),
        }
    }

    fn parse_literal(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some('"') | Some('\'') => self.parse_string().map(Value::String),
            Some('[') => self.nested(Self::parse_list),
            Some('{') => self.nested(Self::parse_mapping),
            Some('(') => Err(self.error("parenthesized expressions are not allowed")),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.parse_number()
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.parse_keyword(),
            Some(_) => Err(self.error("expected a literal value")),
            None => Err(self.error("unbalanced parentheses: missing ')'")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, ParseError>,
    ) -> Result<Value, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("literal nesting is too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_keyword(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let ident = self.parse_ident().unwrap_or_default();
        match ident {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => {
                self.skip_ws();
                let message = match self.peek() {
                    Some('(') => format!("nested call `{}(` is not allowed", ident),
                    Some('"') | Some('\'') => {
                        format!("string prefix `{}` is not allowed", ident)
                    }
                    _ => format!("identifier `{}` is not a literal", ident),
                };
                Err(self.error_at(start, message))
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escape_start = self.pos - 1;
                    match self.bump() {
                        None => {
                            return Err(self.error_at(start, "unterminated string literal"));
                        }
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('0') => out.push('\0'),
                        Some('\\') => out.push('\\'),
                        Some('\'') => out.push('\''),
                        Some('"') => out.push('"'),
                        Some('x') => out.push(self.parse_hex_escape(2, escape_start)?),
                        Some('u') => out.push(self.parse_hex_escape(4, escape_start)?),
                        // Unknown escapes are kept verbatim (Windows paths)
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize, escape_start: usize) -> Result<char, ParseError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error_at(escape_start, "invalid escape sequence"))?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| self.error_at(escape_start, "invalid escape sequence"))?;
        let c = char::from_u32(code)
            .ok_or_else(|| self.error_at(escape_start, "invalid unicode escape"))?;
        self.pos = end;
        Ok(c)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut text = String::new();
        let mut is_float = false;

        if let Some(sign @ ('-' | '+')) = self.peek() {
            self.bump();
            if sign == '-' {
                text.push('-');
            }
        }

        let digits_before = self.take_digits(&mut text);
        if self.peek() == Some('.') {
            self.bump();
            text.push('.');
            is_float = true;
            let digits_after = self.take_digits(&mut text);
            if digits_before == 0 && digits_after == 0 {
                return Err(self.error_at(start, "expected a literal value"));
            }
        } else if digits_before == 0 {
            return Err(self.error_at(start, "expected a literal value"));
        }

        if let Some('e' | 'E') = self.peek() {
            self.bump();
            text.push('e');
            is_float = true;
            if let Some(sign @ ('-' | '+')) = self.peek() {
                self.bump();
                text.push(sign);
            }
            if self.take_digits(&mut text) == 0 {
                return Err(self.error_at(start, "malformed exponent in number"));
            }
        }

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.error_at(start, "malformed float literal"))?;
            Number::from_f64(value)
                .map(Value::Number)
                .ok_or_else(|| self.error_at(start, "float literal is not finite"))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.error_at(start, "integer literal is out of range"))?;
            Ok(Value::Number(value.into()))
        }
    }

    /// Consume digits (allowing `_` separators between them), returning the digit count
    fn take_digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    out.push(c);
                    count += 1;
                    self.bump();
                }
                Some('_') if count > 0 && self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump();
                }
                _ => return count,
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, ParseError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_literal()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                None => return Err(self.error("unbalanced brackets: missing ']'")),
                Some(c) => return Err(self.unexpected_in_container(c, "']'")),
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value, ParseError> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            if !matches!(self.peek(), Some('"') | Some('\'')) {
                if self.peek().is_none() {
                    return Err(self.error("unbalanced braces: missing '}'"));
                }
                return Err(self.error("mapping keys must be string literals"));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':' after mapping key"));
            }
            self.skip_ws();
            let value = self.parse_literal()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                None => return Err(self.error("unbalanced braces: missing '}'")),
                Some(c) => return Err(self.unexpected_in_container(c, "'}'")),
            }
        }
    }

    fn unexpected_in_container(&self, c: char, closer: &str) -> ParseError {
        match c {
            '+' | '-' | '*' | '/' | '%' => self.error("expressions are not allowed, only literals"),
            _ => self.error(format!("expected ',' or {}", closer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_err(text: &str) -> ParseError {
        extract_action(text).expect_err("should be rejected")
    }

    #[test]
    fn test_extract_keyword_arguments_preserve_types() {
        let action = extract_action(r#"Thought: go
Action: foo(a=1, b="x")"#)
            .unwrap()
            .unwrap();

        assert_eq!(action.name, "foo");
        assert_eq!(action.arguments.get("a"), Some(&json!(1)));
        assert!(action.arguments["a"].is_i64());
        assert_eq!(action.arguments.get("b"), Some(&json!("x")));
        assert_eq!(action.source, r#"foo(a=1, b="x")"#);
    }

    #[test]
    fn test_last_action_wins() {
        let text = "Action: load_dataframe(file_path='a.csv')\n\
                    Observation: ok\n\
                    Thought: now describe\n\
                    Action: describe_dataframe(dataframe_id='dataframe_1')";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.name, "describe_dataframe");
        assert_eq!(action.get_string("dataframe_id"), Some("dataframe_1"));
    }

    #[test]
    fn test_no_marker_is_not_an_error() {
        assert_eq!(
            extract_action("The series looks stationary; no further steps needed.").unwrap(),
            None
        );
        assert_eq!(extract_action("").unwrap(), None);
    }

    #[test]
    fn test_unbalanced_call_is_rejected() {
        let err = parse_err("Action: bad(");
        assert!(err.message.contains("unbalanced"));
        assert_eq!(err.fragment, "bad(");

        let err = parse_err("Action: bad(a=1, b='x'");
        assert!(err.message.contains("unbalanced"));
    }

    #[test]
    fn test_arithmetic_is_rejected() {
        let err = parse_err("Action: name(other_expr=1+1)");
        assert!(err.message.contains("expressions are not allowed"));
        assert!(err.fragment.starts_with("+1)"));
    }

    #[test]
    fn test_positional_arguments_are_rejected() {
        assert!(parse_err("Action: f(1)").message.contains("positional"));
        assert!(parse_err("Action: f('a.csv')").message.contains("positional"));
        assert!(parse_err("Action: f(x)").message.contains("positional"));
    }

    #[test]
    fn test_identifier_references_and_calls_are_rejected() {
        assert!(
            parse_err("Action: f(a=os)")
                .message
                .contains("identifier `os` is not a literal")
        );
        assert!(
            parse_err("Action: f(a=__import__('os'))")
                .message
                .contains("nested call")
        );
        assert!(parse_err("Action: f(a=1 .real)").message.contains("attribute"));
        assert!(parse_err("Action: f(a.b=1)").message.contains("attribute"));
        assert!(parse_err("Action: f(g(1))").message.contains("nested calls"));
        assert!(parse_err("Action: f(a=f'{x}')").message.contains("string prefix"));
        assert!(parse_err("Action: f(a=(1, 2))").message.contains("parenthesized"));
        assert!(parse_err("Action: f(a==1)").message.contains("expressions"));
    }

    #[test]
    fn test_marker_without_call_is_ignored() {
        assert_eq!(extract_action("Thought: done.\nAction: None").unwrap(), None);
        assert_eq!(extract_action("Action: none needed").unwrap(), None);
        assert_eq!(extract_action("Action: 9lives(a=1)").unwrap(), None);
        assert_eq!(extract_action("Action:").unwrap(), None);
        assert_eq!(
            extract_action("Action: None\n(nothing left to run)").unwrap(),
            None
        );
    }

    #[test]
    fn test_call_survives_trailing_marker_prose() {
        let text = "Action: describe_dataframe()\nI will decide the next Action: after reading.";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.name, "describe_dataframe");
        assert_eq!(action.source, "describe_dataframe()");
    }

    #[test]
    fn test_marker_inside_string_argument() {
        let text = "Action: plot_time_series(dataframe_id='d', time_column='index', \
                    value_column='value', title='Action: spikes')";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.name, "plot_time_series");
        assert_eq!(action.get_string("title"), Some("Action: spikes"));

        // a call-shaped marker inside a string is still part of the outer call
        let text = "Action: f(note='Action: g(x=1)')";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.name, "f");
        assert_eq!(action.get_string("note"), Some("Action: g(x=1)"));
    }

    #[test]
    fn test_malformed_last_call_is_an_error() {
        let text = "Action: load_dataframe(file_path='a.csv')\nAction: describe(dataframe_id=";
        assert!(extract_action(text).is_err());
        // a later valid call supersedes an earlier broken one
        let text = "Action: bad(\nThought: retry\nAction: good(a=1)";
        assert_eq!(extract_action(text).unwrap().unwrap().name, "good");
    }

    #[test]
    fn test_duplicate_keywords_are_rejected() {
        let err = parse_err("Action: f(a=1, a=2)");
        assert!(err.message.contains("duplicate keyword argument `a`"));
    }

    #[test]
    fn test_literal_kinds() {
        let action = parse_action(
            r#"f(s='it\'s', i=-42, x=1.5e3, y=.5, z=-2.0, t=True, u=false, n=None,
                l=[1, 'two', [3.0]], m={"k": {"inner": null}, 'j': [],}, big=1_000,)"#,
        )
        .unwrap();

        assert_eq!(action.arguments["s"], json!("it's"));
        assert_eq!(action.arguments["i"], json!(-42));
        assert!(action.arguments["x"].is_f64());
        assert_eq!(action.arguments["x"], json!(1500.0));
        assert_eq!(action.arguments["y"], json!(0.5));
        assert_eq!(action.arguments["z"], json!(-2.0));
        assert_eq!(action.arguments["t"], json!(true));
        assert_eq!(action.arguments["u"], json!(false));
        assert_eq!(action.arguments["n"], json!(null));
        assert_eq!(action.arguments["l"], json!([1, "two", [3.0]]));
        assert_eq!(action.arguments["m"], json!({"k": {"inner": null}, "j": []}));
        assert_eq!(action.arguments["big"], json!(1000));

        let keys: Vec<_> = action.arguments.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["s", "i", "x", "y", "z", "t", "u", "n", "l", "m", "big"]);
    }

    #[test]
    fn test_string_escapes() {
        let action =
            parse_action(r#"f(p="C:\data\x41\u00e9\n", q='say "hi"', r="括号)里")"#).unwrap();
        assert_eq!(action.arguments["p"], json!("C:\\dataAé\n"));
        assert_eq!(action.arguments["q"], json!("say \"hi\""));
        assert_eq!(action.arguments["r"], json!("括号)里"));
    }

    #[test]
    fn test_parenthesis_inside_string_does_not_end_call() {
        let text = "Action: plot_time_series(dataframe_id='d', time_column='t', \
                    value_column='v', title='Load (kW)') and then I will summarize.";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.get_string("title"), Some("Load (kW)"));
        assert!(action.source.ends_with("title='Load (kW)')"));
    }

    #[test]
    fn test_multiline_call() {
        let text = "Action: detect_anomalies_iqr(\n    dataframe_id='<last_df_id>',\n    value_column='value',\n)";
        let action = extract_action(text).unwrap().unwrap();
        assert_eq!(action.arguments.len(), 2);
    }

    #[test]
    fn test_empty_argument_list() {
        let action = extract_action("Action: describe_dataframe()").unwrap().unwrap();
        assert_eq!(action.name, "describe_dataframe");
        assert!(action.arguments.is_empty());
    }

    #[test]
    fn test_out_of_range_and_malformed_numbers() {
        assert!(
            parse_err("Action: f(a=99999999999999999999)")
                .message
                .contains("out of range")
        );
        assert!(parse_err("Action: f(a=1e)").message.contains("exponent"));
        assert!(parse_err("Action: f(a=-)").message.contains("expected a literal"));
        assert!(parse_err("Action: f(a=1e999)").message.contains("not finite"));
    }

    #[test]
    fn test_unterminated_containers() {
        assert!(parse_err("Action: f(a='x)").message.contains("unterminated string"));
        assert!(parse_err("Action: f(a=[1, 2)").message.contains("expected ','"));
        assert!(parse_err("Action: f(a={1: 2})").message.contains("string literals"));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("Action: f(a={}{})", "[".repeat(100), "]".repeat(100));
        assert!(parse_err(&deep).message.contains("too deep"));
    }

    #[test]
    fn test_parse_action_rejects_trailing_text() {
        let err = parse_action("f(a=1) extra").unwrap_err();
        assert!(err.message.contains("unexpected text"));
        assert_eq!(parse_action("  f(a=1)  ").unwrap().source, "f(a=1)");
    }

    #[test]
    fn test_parse_error_display() {
        let err = parse_err("Action: f(a=1+1)");
        assert_eq!(
            err.to_string(),
            "expressions are not allowed, only literals at offset 5 near `+1)`"
        );
    }
}
