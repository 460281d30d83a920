use super::{TestCase, TestResult};
use crate::sync::{sem_create, sem_get};

pub const TESTS: &[TestCase] = &[
    TestCase::new("sem.counting", counting),
    TestCase::new("sem.initial_permits", initial_permits),
    TestCase::new("sem.ids_monotonic", ids_monotonic),
];

/// V three times, then P three times; none of the P calls may block, so
/// this runs safely before the scheduler is live.
fn counting() -> TestResult {
    let sem = sem_get(sem_create(0));
    sem.up();
    sem.up();
    sem.up();
    if sem.value() != 3 {
        return Err("three V from zero should leave value 3");
    }
    sem.down();
    sem.down();
    sem.down();
    if sem.value() != 0 {
        return Err("three P should drain the permits");
    }
    Ok(())
}

fn initial_permits() -> TestResult {
    let sem = sem_get(sem_create(1));
    sem.down();
    if sem.value() != 0 {
        return Err("P on a fresh permit should not go negative");
    }
    sem.up();
    if sem.value() != 1 {
        return Err("V should restore the permit");
    }
    Ok(())
}

fn ids_monotonic() -> TestResult {
    let first = sem_create(0);
    let second = sem_create(7);
    if second != first + 1 {
        return Err("ids should be assigned in creation order");
    }
    Ok(())
}
