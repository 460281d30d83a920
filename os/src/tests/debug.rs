use super::{TestCase, TestResult};
use crate::loader::{get_app_data, DebugInfo, FunctionSymbol, LineEntry};
use alloc::{string::String, vec};

pub const TESTS: &[TestCase] = &[
    TestCase::new("debug.symbol_ranges", symbol_ranges),
    TestCase::new("debug.line_exact_match", line_exact_match),
    TestCase::new("debug.elf_entry_symbol", elf_entry_symbol),
];

fn sample_info() -> DebugInfo {
    DebugInfo::with_tables(
        vec![
            FunctionSymbol {
                addr: 0x1000,
                size: 0x40,
                name: String::from("alpha"),
            },
            FunctionSymbol {
                addr: 0x1040,
                size: 0x20,
                name: String::from("main"),
            },
        ],
        vec![LineEntry {
            addr: 0x1008,
            line: 42,
            file: 0,
        }],
        vec![(String::from("src/"), String::from("demo.rs"))],
    )
}

fn symbol_ranges() -> TestResult {
    let info = sample_info();
    if info.resolve_function(0x1000) != Some("alpha") {
        return Err("start of range should resolve");
    }
    if info.resolve_function(0x103f) != Some("alpha") {
        return Err("last byte of range should resolve");
    }
    if info.resolve_function(0x1040) != Some("main") {
        return Err("adjacent symbol should take over at its start");
    }
    if info.resolve_function(0x1060).is_some() {
        return Err("address past every symbol should miss");
    }
    Ok(())
}

fn line_exact_match() -> TestResult {
    let info = sample_info();
    let hit = info.resolve_line(0x1008).ok_or("exact address should hit")?;
    if hit.line != 42 || hit.file != "demo.rs" {
        return Err("wrong row resolved");
    }
    // only exact matches count; the neighboring instruction misses
    if info.resolve_line(0x100c).is_some() {
        return Err("near miss should stay a miss");
    }
    Ok(())
}

fn elf_entry_symbol() -> TestResult {
    let elf_data = get_app_data(0);
    let entry = xmas_elf::ElfFile::new(elf_data)
        .map_err(|_| "embedded program is not an ELF")?
        .header
        .pt2
        .entry_point() as usize;
    let info = DebugInfo::from_elf(elf_data);
    match info.resolve_function(entry) {
        Some("_start") => Ok(()),
        Some(_) => Err("entry point resolved to an unexpected symbol"),
        None => Err("entry point should resolve to a symbol"),
    }
}
