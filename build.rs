//! Build-time hints for locating FFmpeg.
//!
//! Linking itself is handled by `ffmpeg-next`'s sys crate. On Windows that
//! discovery regularly fails without an explicit `FFMPEG_DIR`, so this script
//! only inspects the environment and prints a warning describing what to set.

use std::{env, path::Path};

const WATCHED_VARIABLES: [&str; 4] = [
    "FFMPEG_DIR",
    "VCPKG_ROOT",
    "VCPKGRS_DYNAMIC",
    "VCPKGRS_TRIPLET",
];
const DEFAULT_TRIPLET: &str = "x64-windows";

fn warn(message: &str) {
    println!("cargo:warning=vidshot: {message}");
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let building_for_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !building_for_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        warn(
            "FFMPEG_DIR is unset; install FFmpeg (e.g. `vcpkg install ffmpeg`) \
             and point FFMPEG_DIR at it",
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| DEFAULT_TRIPLET.to_string());
    let candidate = Path::new(&vcpkg_root).join("installed").join(&triplet);

    if !candidate.is_dir() {
        warn(&format!("no vcpkg FFmpeg found under {}", candidate.display()));
        return;
    }

    warn(&format!("found FFmpeg at {0}; set FFMPEG_DIR={0} to use it", candidate.display()));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() && !triplet.ends_with("-static") {
        warn("dynamic vcpkg triplet detected; VCPKGRS_DYNAMIC=1 is usually needed as well");
    }
}
