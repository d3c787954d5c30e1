//! Build driver: invoke the ONNX Runtime build toolchain for one target
//! architecture, fetching the dependency bundle first when needed, and
//! strip non-distributable files from the output afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::{archive, command, net};

/// Pinned dependency bundle consumed by x64 builds.
pub const DEPS_BUNDLE_URL: &str =
    "https://github.com/Blinue/onnxruntime/releases/download/deps/deps.zip";

/// The one import library that must survive output cleanup.
const KEEP_IMPORT_LIB: &str = "onnxruntime.lib";

/// Not built for ARM64; the toolchain emits it anyway.
const PROVIDERS_SHARED_DLL: &str = "onnxruntime_providers_shared.dll";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    X64,
    Arm64,
}

impl Platform {
    /// Parse the CLI argument. Anything outside {x64, ARM64} is a fatal
    /// configuration error, raised before the toolchain runs.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "x64" => Ok(Platform::X64),
            "ARM64" => Ok(Platform::Arm64),
            other => Err(Error::validation(
                "platform",
                format!("unsupported value '{}', expected x64 or ARM64", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::X64 => "x64",
            Platform::Arm64 => "ARM64",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BuildResult {
    pub platform: &'static str,
    pub deps_downloaded: bool,
    pub removed_files: Vec<String>,
}

pub fn run(platform: Platform) -> Result<BuildResult> {
    let cwd = std::env::current_dir()?;

    let mut deps_downloaded = false;
    if needs_deps_bundle(platform, Path::new("deps")) {
        log_status!("build", "Downloading dependency bundle");
        let client = net::client()?;
        net::download_to_file(&client, DEPS_BUNDLE_URL, Path::new("deps.zip"))?;
        archive::unzip_to(Path::new("deps.zip"), Path::new("deps"))?;
        fs::remove_file("deps.zip")?;
        deps_downloaded = true;
    }

    let args = toolchain_args(platform, &cwd);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    command::run_passthrough("python", &arg_refs, "build toolchain")?;

    let output_dir: PathBuf = ["build", "Release", "Release"].iter().collect();
    let removed_files = clean_output_dir(&output_dir, platform)?;
    log_status!("build", "Cleaned {} file(s) from output", removed_files.len());

    Ok(BuildResult {
        platform: platform.as_str(),
        deps_downloaded,
        removed_files,
    })
}

/// Only x64 links against the GPU SDK bundle, and a bundle already on
/// disk is reused without any network call.
pub fn needs_deps_bundle(platform: Platform, deps_dir: &Path) -> bool {
    platform == Platform::X64 && !deps_dir.exists()
}

/// The hard-coded per-architecture flag set for the external toolchain.
///
/// x64 adds the GPU providers (DML + minimal CUDA + TensorRT) with homes
/// under the local deps bundle; ARM64 builds with DML only.
pub fn toolchain_args(platform: Platform, cwd: &Path) -> Vec<String> {
    let path = |parts: &[&str]| -> String {
        let mut joined = cwd.to_path_buf();
        for part in parts {
            joined.push(part);
        }
        joined.to_string_lossy().into_owned()
    };

    let mut args: Vec<String> = vec!["tools/ci_build/build.py".into()];
    if platform == Platform::Arm64 {
        args.push("--arm64".into());
    }

    args.push("--build_dir".into());
    args.push(path(&["build"]));
    for flag in [
        "--config",
        "Release",
        "--build_shared_lib",
        "--parallel",
        "--compile_no_warning_as_error",
        "--skip_tests",
        "--enable_msvc_static_runtime",
        "--enable_lto",
        "--disable_rtti",
        "--use_dml",
    ] {
        args.push(flag.into());
    }

    if platform == Platform::X64 {
        args.push("--use_cuda".into());
        args.push("--enable_cuda_minimal_build".into());
        args.push("--cudnn_home".into());
        args.push(path(&["deps", "cudnn"]));
        args.push("--cuda_home".into());
        args.push(path(&["deps", "cuda"]));
        args.push("--use_tensorrt".into());
        args.push("--tensorrt_home".into());
        args.push(path(&["deps", "tensorrt"]));
    }

    args
}

/// Remove symbol/debug/import files not needed for distribution.
///
/// `onnxruntime.lib` is kept for downstream linking; ARM64 additionally
/// drops the shared-provider DLL, which does not apply to that target.
pub fn clean_output_dir(dir: &Path, platform: Platform) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for pattern in ["*.pdb", "*.lib", "*.exp"] {
        let full_pattern = dir.join(pattern).to_string_lossy().into_owned();
        let entries = glob::glob(&full_pattern)
            .map_err(|e| Error::Other(format!("invalid cleanup pattern '{}': {}", pattern, e)))?;

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name == KEEP_IMPORT_LIB {
                continue;
            }
            fs::remove_file(&entry)?;
            removed.push(name);
        }
    }

    if platform == Platform::Arm64 {
        fs::remove_file(dir.join(PROVIDERS_SHARED_DLL))?;
        removed.push(PROVIDERS_SHARED_DLL.to_string());
    }

    Ok(removed)
}
