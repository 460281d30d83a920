//! Access to the embedded user binaries and to the symbol/line tables the
//! kernel keeps for fault diagnostics and backtraces.

use alloc::{string::String, vec::Vec};
use lazy_static::lazy_static;
use xmas_elf::{
    sections::SectionData,
    symbol_table::{Entry, Type as SymbolType},
    ElfFile,
};

pub fn get_num_app() -> usize {
    extern "C" {
        fn _num_app();
    }
    unsafe { (_num_app as usize as *const usize).read_volatile() }
}

pub fn get_app_data(app_id: usize) -> &'static [u8] {
    extern "C" {
        fn _num_app();
    }
    let num_app_ptr = _num_app as usize as *const usize;
    let num_app = get_num_app();
    let app_start = unsafe { core::slice::from_raw_parts(num_app_ptr.add(1), num_app + 1) };
    assert!(app_id < num_app);
    unsafe {
        core::slice::from_raw_parts(
            app_start[app_id] as *const u8,
            app_start[app_id + 1] - app_start[app_id],
        )
    }
}

lazy_static! {
    static ref APP_NAMES: Vec<&'static str> = {
        extern "C" {
            fn _app_names();
        }
        let num_app = get_num_app();
        let mut start = _app_names as usize as *const u8;
        let mut names = Vec::new();
        unsafe {
            for _ in 0..num_app {
                let mut end = start;
                while end.read_volatile() != b'\0' {
                    end = end.add(1);
                }
                let slice = core::slice::from_raw_parts(start, end as usize - start as usize);
                names.push(core::str::from_utf8(slice).unwrap());
                start = end.add(1);
            }
        }
        names
    };
}

pub fn get_app_data_by_name(name: &str) -> Option<&'static [u8]> {
    (0..get_num_app())
        .find(|&i| APP_NAMES[i] == name)
        .map(get_app_data)
}

pub fn list_apps() {
    log::info!("embedded programs: {:?}", APP_NAMES.as_slice());
}

pub struct FunctionSymbol {
    pub addr: usize,
    pub size: usize,
    pub name: String,
}

/// One row of the address -> source line table. `file` indexes `files`.
pub struct LineEntry {
    pub addr: usize,
    pub line: usize,
    pub file: usize,
}

pub struct SourceLocation<'a> {
    pub dir: &'a str,
    pub file: &'a str,
    pub line: usize,
}

/// Per-binary lookup tables, populated once at load time and read-only
/// afterwards.
pub struct DebugInfo {
    symbols: Vec<FunctionSymbol>,
    lines: Vec<LineEntry>,
    files: Vec<(String, String)>,
}

impl DebugInfo {
    /// Extract the function symbols of an ELF image. The DWARF line program
    /// is not decoded here; an image that comes without a prepared line
    /// table simply misses every line lookup.
    pub fn from_elf(elf_data: &[u8]) -> Self {
        let elf = ElfFile::new(elf_data).unwrap();
        let mut symbols = Vec::new();
        for section in elf.section_iter() {
            if let Ok(SectionData::SymbolTable64(entries)) = section.get_data(&elf) {
                for entry in entries {
                    if matches!(entry.get_type(), Ok(SymbolType::Func)) && entry.size() > 0 {
                        if let Ok(name) = entry.get_name(&elf) {
                            symbols.push(FunctionSymbol {
                                addr: entry.value() as usize,
                                size: entry.size() as usize,
                                name: String::from(name),
                            });
                        }
                    }
                }
            }
        }
        symbols.sort_by_key(|symbol| symbol.addr);
        Self {
            symbols,
            lines: Vec::new(),
            files: Vec::new(),
        }
    }

    #[allow(unused)]
    pub fn with_tables(
        symbols: Vec<FunctionSymbol>,
        lines: Vec<LineEntry>,
        files: Vec<(String, String)>,
    ) -> Self {
        let mut symbols = symbols;
        symbols.sort_by_key(|symbol| symbol.addr);
        Self {
            symbols,
            lines,
            files,
        }
    }

    /// Name of the function whose range covers `addr`.
    pub fn resolve_function(&self, addr: usize) -> Option<&str> {
        self.symbols
            .iter()
            .find(|symbol| symbol.addr <= addr && addr < symbol.addr + symbol.size)
            .map(|symbol| symbol.name.as_str())
    }

    /// Source location recorded for exactly `addr`. A miss is an expected
    /// outcome, not an error.
    pub fn resolve_line(&self, addr: usize) -> Option<SourceLocation<'_>> {
        self.lines
            .iter()
            .find(|entry| entry.addr == addr)
            .map(|entry| {
                let (dir, file) = &self.files[entry.file];
                SourceLocation {
                    dir: dir.as_str(),
                    file: file.as_str(),
                    line: entry.line,
                }
            })
    }
}
