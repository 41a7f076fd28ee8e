//! A scripted evaluator that outlives any sane wall-clock budget: it records
//! its own pid, then sleeps far longer than a test would ever configure
//! `wall_clock_limit` to be. Exercises the "evaluator exceeding its budget is
//! observed as `OutOfResources` and its child is actually killed" guarantee —
//! see `tests/end_to_end.rs`.
//!
//! The pidfile path is passed via `MACHETLI_SLEEP_PIDFILE` rather than a CLI
//! argument, since the shim's subprocess contract only passes the state blob
//! path as argv\[1\].

use std::time::Duration;

fn main() {
    let pidfile = std::env::var("MACHETLI_SLEEP_PIDFILE")
        .expect("usage: set MACHETLI_SLEEP_PIDFILE before invoking");
    std::fs::write(&pidfile, std::process::id().to_string()).expect("failed to write pidfile");

    std::thread::sleep(Duration::from_secs(30));

    std::process::exit(machetli_core::shim::EXIT_NOT_IMPROVING);
}
