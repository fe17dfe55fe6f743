//! Parsing of xAPI command strings.
//!
//! Two argument forms are accepted after the command path:
//! - whitespace-separated `Key:Value` tokens, split on the first colon;
//! - a single JSON object, forwarded member by member.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{XapiError, XapiResult};
use crate::model::CommandRequest;

/// Parse a command string such as `Audio.Volume.Set Level:50`.
///
/// # Errors
///
/// Returns [`XapiError::MalformedCommand`] when the path is empty, when a
/// segment is empty or holds anything besides ASCII letters and digits, when
/// an argument token lacks a key or a colon, when a key repeats, or when the
/// JSON argument form is not an object.
pub fn parse_command(input: &str) -> XapiResult<CommandRequest> {
    let trimmed = input.trim();
    let (path, rest) = trimmed
        .split_once(char::is_whitespace)
        .map_or((trimmed, ""), |(path, rest)| (path, rest.trim_start()));

    if path.is_empty() {
        return Err(XapiError::malformed(input, "command path is empty"));
    }
    if path.split('.').any(str::is_empty) {
        return Err(XapiError::malformed(
            input,
            format!("command path '{path}' contains an empty segment"),
        ));
    }
    if let Some(segment) = path
        .split('.')
        .find(|segment| !segment.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(XapiError::malformed(
            input,
            format!("command path segment '{segment}' must be ASCII letters and digits"),
        ));
    }

    let arguments = if rest.starts_with('{') {
        parse_json_arguments(input, rest)?
    } else {
        parse_token_arguments(input, rest)?
    };

    Ok(CommandRequest {
        path: path.to_string(),
        arguments,
    })
}

fn parse_token_arguments(input: &str, rest: &str) -> XapiResult<BTreeMap<String, Value>> {
    let mut arguments = BTreeMap::new();
    for token in rest.split_whitespace() {
        let (key, value) = token.split_once(':').ok_or_else(|| {
            XapiError::malformed(input, format!("argument '{token}' must be Key:Value"))
        })?;
        if key.is_empty() {
            return Err(XapiError::malformed(
                input,
                format!("argument '{token}' has an empty key"),
            ));
        }
        if arguments
            .insert(key.to_string(), Value::String(value.to_string()))
            .is_some()
        {
            return Err(XapiError::malformed(
                input,
                format!("argument '{key}' is repeated"),
            ));
        }
    }
    Ok(arguments)
}

fn parse_json_arguments(input: &str, rest: &str) -> XapiResult<BTreeMap<String, Value>> {
    let object = serde_json::from_str::<Map<String, Value>>(rest).map_err(|err| {
        XapiError::malformed(input, format!("arguments are not a JSON object: {err}"))
    })?;
    Ok(object.into_iter().collect())
}

impl FromStr for CommandRequest {
    type Err = XapiError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_command(input)
    }
}
