//! Exit codes for the `prenote` binary. Part of the public contract:
//! CI pipelines branch on these.

pub const SUCCESS: i32 = 0;
pub const CASE_FAILURES: i32 = 1; // at least one case did not reach an accepted output
pub const CONFIG_ERROR: i32 = 2; // bad invocation, unreadable input, schema problems
