fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Exposes PKG_VERSION and friends to the health endpoint.
    if let Err(e) = built::write_built_file() {
        panic!("failed to write build metadata: {}", e);
    }
}
