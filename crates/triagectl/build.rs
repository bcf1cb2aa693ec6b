// Build script for triagectl - embeds version at compile time

fn main() {
    // Release pipelines may pin a version; otherwise use Cargo.toml
    let version = std::env::var("TRIAGECTL_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=TRIAGECTL_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=TRIAGECTL_VERSION");
}
