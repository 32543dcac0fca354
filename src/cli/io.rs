//! JSON I/O handling for the CLI
//!
//! - Input: one JSON document on stdin
//! - Output: one JSON envelope per line on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads one JSON request from stdin. The document may span lines.
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&input)?;
    Ok(value)
}

/// Success envelope
pub fn ok_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope
pub fn error_envelope(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&ok_envelope(data))
}

pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_json(&error_envelope(code, message))
}

fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = ok_envelope(serde_json::json!([1, 2]));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"][1], 2);

        let err = error_envelope("SEL_COMPILE_UNKNOWN_FIELD", "no field 'Front'");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "SEL_COMPILE_UNKNOWN_FIELD");
    }
}
