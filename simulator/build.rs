//! Build script for energy-flow-simulator.
//!
//! On Windows, points the linker at a vendored SDL2 and copies `SDL2.dll`
//! next to the binary. Other platforms use the system SDL2.

use std::path::PathBuf;
use std::{env, fs};

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }

    let Some(manifest_dir) = env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        return;
    };
    let sdl2_dir = manifest_dir.join("vendor").join("sdl2");
    println!("cargo:rerun-if-changed={}", sdl2_dir.display());

    if !sdl2_dir.exists() {
        println!("cargo:warning=SDL2 not found at {}; place SDL2.lib and SDL2.dll there", sdl2_dir.display());
        return;
    }
    println!("cargo:rustc-link-search=native={}", sdl2_dir.display());

    // OUT_DIR is target/<profile>/build/<pkg>/out
    let profile_dir = env::var_os("OUT_DIR").map(PathBuf::from).and_then(|out| {
        out.ancestors()
            .find(|p| p.file_name().is_some_and(|n| n == "release" || n == "debug"))
            .map(PathBuf::from)
    });
    if let Some(profile_dir) = profile_dir {
        let dll = profile_dir.join("SDL2.dll");
        if !dll.exists()
            && let Err(e) = fs::copy(sdl2_dir.join("SDL2.dll"), &dll)
        {
            println!("cargo:warning=failed to copy SDL2.dll: {e}");
        }
    }
}
