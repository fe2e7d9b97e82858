fn main() {
    // Re-run if git HEAD changes (new commits, checkouts, etc.)
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=WAIFU2X_NCNN_VULKAN_DIR");

    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    let on_tag = std::process::Command::new("git")
        .args(["describe", "--exact-match", "--tags", "HEAD"])
        .output()
        .ok()
        .is_some_and(|o| o.status.success());

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={on_tag}");

    #[cfg(feature = "native")]
    build_native();
}

/// Compile the C shim over the `Waifu2x` class and link it with the prebuilt
/// engine and ncnn libraries.
///
/// - `WAIFU2X_NCNN_VULKAN_DIR`: prefix with `include/waifu2x.h` and
///   `lib/libwaifu2x-ncnn-vulkan`
/// - `NCNN_DIR`: ncnn install prefix (`include/ncnn`, `lib`)
///
/// Unset variables fall back to the system compiler and linker search paths.
#[cfg(feature = "native")]
fn build_native() {
    use std::path::PathBuf;

    println!("cargo:rerun-if-changed=csrc/waifu2x_capi.cpp");
    println!("cargo:rerun-if-env-changed=NCNN_DIR");

    let engine_root = std::env::var_os("WAIFU2X_NCNN_VULKAN_DIR").map(PathBuf::from);
    let ncnn_root = std::env::var_os("NCNN_DIR").map(PathBuf::from);

    let mut shim = cc::Build::new();
    shim.cpp(true)
        .file("csrc/waifu2x_capi.cpp")
        .flag_if_supported("-std=c++11");
    if let Some(root) = &engine_root {
        shim.include(root.join("include"));
    }
    if let Some(root) = &ncnn_root {
        shim.include(root.join("include").join("ncnn"));
    }
    shim.compile("waifu2x_capi");

    for root in engine_root.iter().chain(ncnn_root.iter()) {
        let lib_dir = root.join("lib");
        if !lib_dir.exists() {
            panic!("library directory not found at {}", lib_dir.display());
        }
        println!("cargo:rustc-link-search=native={}", lib_dir.display());
    }
    println!("cargo:rustc-link-lib=dylib=waifu2x-ncnn-vulkan");
    println!("cargo:rustc-link-lib=dylib=ncnn");
}
