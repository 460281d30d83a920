use std::fs::{read_dir, File};
use std::io::{Result, Write};

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    println!("cargo:rerun-if-changed=../user/src/");
    println!("cargo:rustc-link-arg=-T{}/src/linker.ld", manifest_dir);
    insert_app_data(&manifest_dir).unwrap();
}

/// Generate link_app.S embedding every user binary, sorted by name so the
/// app indices are stable.
fn insert_app_data(manifest_dir: &str) -> Result<()> {
    let target_path = format!(
        "{}/../target/riscv64gc-unknown-none-elf/release/",
        manifest_dir
    );
    let mut f = File::create("src/link_app.S").unwrap();
    let mut apps: Vec<_> = read_dir("../user/src/bin")
        .unwrap()
        .map(|entry| {
            let mut name = entry.unwrap().file_name().into_string().unwrap();
            name.drain(name.find('.').unwrap()..name.len());
            name
        })
        .collect();
    apps.sort();

    writeln!(
        f,
        r#"
    .align 3
    .section .data
    .global _num_app
_num_app:
    .quad {}"#,
        apps.len()
    )?;

    for i in 0..apps.len() {
        writeln!(f, r#"    .quad app_{}_start"#, i)?;
    }
    writeln!(f, r#"    .quad app_{}_end"#, apps.len() - 1)?;

    writeln!(
        f,
        r#"
    .global _app_names
_app_names:"#
    )?;
    for app in apps.iter() {
        writeln!(f, r#"    .string "{}""#, app)?;
    }

    for (idx, app) in apps.iter().enumerate() {
        println!("app_{}: {}", idx, app);
        writeln!(
            f,
            r#"
    .section .data
    .global app_{0}_start
    .global app_{0}_end
    .align 3
app_{0}_start:
    .incbin "{2}{1}"
app_{0}_end:"#,
            idx, app, target_path
        )?;
    }
    Ok(())
}
