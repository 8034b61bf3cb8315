//! Build script for nest-storage.
//!
//! Rebuild when migrations change.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
