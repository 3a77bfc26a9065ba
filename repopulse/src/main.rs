//! Collect activity facts and metrics for the repositories of a GitHub project.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use repopulse_lib::{Host, run};
use std::io::{Stderr, Stdout, Write, stderr, stdout};

/// Host over the process streams. The bundle goes to stdout, fatal reports to stderr.
#[derive(Debug)]
struct ProcessHost {
    stdout: Stdout,
    stderr: Stderr,
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for ProcessHost {
    fn output(&mut self) -> impl Write {
        self.stdout.lock()
    }

    fn error(&mut self) -> impl Write {
        self.stderr.lock()
    }

    /// Flushes both streams, since `process::exit` runs no destructors.
    fn exit(&mut self, code: i32) {
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    let mut host = ProcessHost {
        stdout: stdout(),
        stderr: stderr(),
    };

    run(&mut host, std::env::args()).await
}
