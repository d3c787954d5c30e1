//! Publish driver: rearrange already-built outputs and the dependency
//! bundle into distributable packages, tag the commit, and publish a
//! release with the packages attached.
//!
//! The `publish/` directory arrives pre-populated by earlier CI stages
//! with one folder of build outputs per architecture; this pipeline only
//! moves files between layouts, zips, and talks to git and the release
//! API.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::env::ReleaseEnv;
use crate::error::Result;
use crate::git;
use crate::github::ReleaseClient;
use crate::utils::{archive, fsx, net};

/// Pinned dependency bundle matching the build that produced the outputs.
pub const DEPS_BUNDLE_URL: &str =
    "https://github.com/Blinue/onnxruntime/releases/download/deps-250413/deps.zip";

/// Final package directories, zipped and uploaded in this order.
pub const PACKAGE_NAMES: [&str; 3] = ["onnxruntime-x64", "onnxruntime-ARM64", "ext-tensorrt-x64"];

/// Provider DLLs moved out of the runtime package into the TensorRT
/// extension package.
const EXTENSION_PROVIDERS: [&str; 3] = ["cuda", "shared", "tensorrt"];

#[derive(Debug, Serialize)]
pub struct PublishResult {
    pub tag: String,
    pub packages: Vec<String>,
    pub release_id: u64,
}

pub fn run() -> Result<PublishResult> {
    let release_env = ReleaseEnv::from_env()?;

    let client = net::client()?;
    net::download_to_file(&client, DEPS_BUNDLE_URL, Path::new("deps.zip"))?;
    archive::unzip_to(Path::new("deps.zip"), Path::new("deps"))?;
    log_status!("publish", "Downloaded dependency bundle");

    let publish_dir = Path::new("publish");
    assemble_packages(publish_dir, Path::new("deps"))?;

    let mut packages = Vec::new();
    for name in PACKAGE_NAMES {
        let zip_name = format!("{}.zip", name);
        archive::zip_dir(&publish_dir.join(name), &publish_dir.join(&zip_name))?;
        packages.push(zip_name);
    }
    log_status!("publish", "Packaged release archives");

    git::configure_identity(&release_env.actor)?;
    git::set_authenticated_remote(&release_env.token, &release_env.repo)?;
    git::create_annotated_tag(&release_env.tag)?;
    git::push_tag(&release_env.tag)?;
    log_status!("publish", "Created tag {}", release_env.tag);

    let client = ReleaseClient::new(&release_env.repo, &release_env.token)?;
    let release = client.create_release(&release_env.tag)?;
    for zip_name in &packages {
        client.upload_asset(&release, zip_name, &publish_dir.join(zip_name))?;
    }
    log_status!("publish", "Published {}", release_env.tag);

    Ok(PublishResult {
        tag: release_env.tag,
        packages,
        release_id: release.id,
    })
}

/// Move build outputs and bundle files into the final package layouts.
///
/// The x64 runtime package gains the CUDA headers and `cudart.lib`; the
/// TensorRT extension package collects the provider DLLs, the CUDA
/// runtime DLL, and every TensorRT binary.
pub fn assemble_packages(publish_dir: &Path, deps_dir: &Path) -> Result<()> {
    let runtime_pkg = publish_dir.join("onnxruntime-x64");

    let cuda_dest = runtime_pkg.join("cuda");
    fsx::move_dir(&deps_dir.join("cuda/include"), &cuda_dest.join("include"))?;
    fsx::move_file(
        &deps_dir.join("cuda/lib/x64/cudart.lib"),
        &cuda_dest.join("lib/cudart.lib"),
    )?;

    let ext_pkg = publish_dir.join("ext-tensorrt-x64");
    fs::create_dir_all(&ext_pkg)?;

    for provider in EXTENSION_PROVIDERS {
        let dll = format!("onnxruntime_providers_{}.dll", provider);
        fsx::move_file(&runtime_pkg.join(&dll), &ext_pkg.join(&dll))?;
    }

    fsx::move_file(
        &deps_dir.join("cuda/bin/cudart64_12.dll"),
        &ext_pkg.join("cudart64_12.dll"),
    )?;

    for entry in fs::read_dir(deps_dir.join("tensorrt/bin"))? {
        let entry = entry?;
        fsx::move_file(&entry.path(), &ext_pkg.join(entry.file_name()))?;
    }

    Ok(())
}
