//! JSON I/O handling for the CLI
//!
//! - Input: one JSON value on stdin
//! - Output: one JSON object per line on stdout
//! - Errors: one JSON object on stderr, nothing on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read one JSON payload from stdin. The payload may span lines.
pub fn read_payload() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_payload(&input)
}

fn parse_payload(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(serde_json::from_str(input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stderr
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_json_line(&mut io::stderr().lock(), &error_body(code, message))
}

fn error_body(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write any serializable value as one line on stdout
pub fn write_line<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    write_json_line(&mut io::stdout().lock(), value)
}

fn write_json_line<W, T>(out: &mut W, value: &T) -> CliResult<()>
where
    W: Write,
    T: serde::Serialize + ?Sized,
{
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
