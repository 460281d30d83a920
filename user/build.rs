fn main() {
    println!("cargo:rerun-if-changed=src/linker.ld");
    println!(
        "cargo:rustc-link-arg=-T{}/src/linker.ld",
        std::env::var("CARGO_MANIFEST_DIR").unwrap()
    );
}
