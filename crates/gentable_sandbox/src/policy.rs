//! Static rejection of obviously-unsafe snippets before a process is ever
//! spawned (§4.C `PythonGen`, §9 open question (a): the sandbox boundary is
//! left to the implementer, but wall-clock and memory caps are mandatory).
//!
//! This is a denylist, not a sandbox boundary by itself — the real
//! boundary is the out-of-process execution plus the resource limits in
//! [`crate::process`]. The denylist exists to reject the cheap, obvious
//! cases (importing `os`, opening sockets) before spending a process
//! spawn on them.

use gentable_error::{SandboxError, SandboxErrorKind};

/// Module and builtin names a snippet may not reference. Conservative by
/// construction: a snippet naming one of these as a substring of an
/// identifier (e.g. a variable called `socket_name`) is also rejected,
/// matching the column-reference analyzer's "any reference, even if
/// runtime-dead" stance in spec §4.A.
const DENIED_IDENTIFIERS: &[&str] = &[
    "os", "sys", "subprocess", "socket", "shutil", "pathlib", "importlib",
    "ctypes", "multiprocessing", "threading", "signal", "resource",
    "__import__", "eval", "exec", "compile", "open", "input",
    "globals", "locals", "vars", "breakpoint", "exit", "quit",
];

/// Reject a snippet referencing a denied identifier or too large to be a
/// plausible single-cell generator.
///
/// Grounded in the column-graph analyzer's own conservative scanning
/// (spec §4.A: "Python's conservative rule treats *any* reference to a
/// column name in the code as a dependency even if runtime-dead") — the
/// same word-boundary scan, applied to a denylist instead of the schema's
/// column names.
pub fn validate(code: &str) -> Result<(), SandboxError> {
    const MAX_SOURCE_BYTES: usize = 64 * 1024;
    if code.len() > MAX_SOURCE_BYTES {
        return Err(SandboxError::new(SandboxErrorKind::Denied(format!(
            "snippet exceeds the {MAX_SOURCE_BYTES}-byte source cap"
        ))));
    }

    for ident in DENIED_IDENTIFIERS {
        if references_identifier(code, ident) {
            return Err(SandboxError::new(SandboxErrorKind::Denied(format!(
                "snippet references disallowed identifier `{ident}`"
            ))));
        }
    }
    Ok(())
}

fn references_identifier(code: &str, ident: &str) -> bool {
    let bytes = code.as_bytes();
    let ident_bytes = ident.as_bytes();
    let mut start = 0;
    while let Some(offset) = find(&bytes[start..], ident_bytes) {
        let pos = start + offset;
        let before_ok = pos == 0 || !is_ident_byte(bytes[pos - 1]);
        let after = pos + ident_bytes.len();
        let after_ok = after >= bytes.len() || !is_ident_byte(bytes[after]);
        if before_ok && after_ok {
            return true;
        }
        start = pos + 1;
    }
    false
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_denied_import() {
        let err = validate("import os\nresult = 1").unwrap_err();
        assert!(matches!(err.kind, SandboxErrorKind::Denied(_)));
    }

    #[test]
    fn rejects_denied_identifier_as_whole_word_only() {
        // `os` appears inside `cost`, which is not a reference to the `os` module.
        validate("cost = row['price'] * 2\nresult = cost").unwrap();
    }

    #[test]
    fn accepts_plain_arithmetic_over_row() {
        validate("result = row['a'] + row['b']").unwrap();
    }

    #[test]
    fn rejects_oversized_source() {
        let huge = "x = 1\n".repeat(20_000);
        let err = validate(&huge).unwrap_err();
        assert!(matches!(err.kind, SandboxErrorKind::Denied(_)));
    }
}
