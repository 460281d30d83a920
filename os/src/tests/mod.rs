//! In-kernel test harness, run from rust_main before any process starts.
//! Build with `--features kernel_tests`; the machine exits through the test
//! finisher with the overall verdict.

use crate::{println, sbi};

mod debug;
mod heap;
mod sched;
mod sem;

pub type TestResult = Result<(), &'static str>;

#[derive(Copy, Clone)]
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

const SUITES: &[(&str, &[TestCase])] = &[
    ("heap", heap::TESTS),
    ("sched", sched::TESTS),
    ("sem", sem::TESTS),
    ("debug", debug::TESTS),
];

pub fn run() -> ! {
    println!("[test] kernel test harness starting");
    let mut failures = 0u32;
    let mut executed = 0u32;
    for (_, cases) in SUITES {
        for case in cases.iter() {
            executed += 1;
            match (case.func)() {
                Ok(()) => println!("[test] {}: ok", case.name),
                Err(msg) => {
                    failures += 1;
                    println!("[test] {}: FAIL ({})", case.name, msg);
                }
            }
        }
    }
    if failures == 0 {
        println!("[test] all {} passed", executed);
        sbi::shutdown(false)
    } else {
        println!("[test] {} failure(s)", failures);
        sbi::shutdown(true)
    }
}
