//! Dependency bundler: download and silently install the three GPU SDKs,
//! stage the subsets the build needs under `deps/`, archive the tree, and
//! replace the bundle asset on the fixed `deps` release.
//!
//! The three SDK tasks run on their own threads. They are independent
//! except that the CUDA and cuDNN installer executables cannot run at the
//! same time, so the silent-install step is serialized behind one mutex
//! while downloads and file copies proceed unsynchronized. A failing task
//! never interrupts its siblings; failures are aggregated after all three
//! have joined.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::thread;

use serde::Serialize;
use zip::ZipArchive;

use crate::env;
use crate::error::{Error, Result};
use crate::github::ReleaseClient;
use crate::sdk::SdkVersions;
use crate::utils::{archive, command, fsx, net};

pub const DEPS_RELEASE_TAG: &str = "deps";
pub const DEPS_ASSET_NAME: &str = "deps.zip";

const CUDA_INSTALL_ROOT: &str = r"C:\Program Files\NVIDIA GPU Computing Toolkit\CUDA";
const CUDNN_INSTALL_ROOT: &str = r"C:\Program Files\NVIDIA\CUDNN";

/// Installer components for the CUDA network installer, each suffixed
/// with `_<major.minor>` on the command line.
const CUDA_COMPONENTS: [&str; 5] = [
    "cudart",
    "nvcc",
    "cublas",
    "cublas_dev",
    "visual_studio_integration",
];

/// Large files the build never links against, skipped during the CUDA
/// tree copy.
const CUDA_COPY_IGNORE: [&str; 2] = ["cublas*.dll", "nvptxcompiler_static.lib"];

#[derive(Debug, Serialize)]
pub struct BundleResult {
    pub versions: SdkVersions,
    pub asset: &'static str,
    pub release_id: u64,
}

pub fn cuda_installer_url(versions: &SdkVersions) -> String {
    format!(
        "https://developer.download.nvidia.com/compute/cuda/{}/network_installers/cuda_{}_windows_network.exe",
        versions.cuda, versions.cuda
    )
}

pub fn cudnn_installer_url(versions: &SdkVersions) -> String {
    format!(
        "https://developer.download.nvidia.com/compute/cudnn/{}/local_installers/cudnn_{}_windows.exe",
        versions.cudnn, versions.cudnn
    )
}

pub fn tensorrt_zip_url(versions: &SdkVersions) -> String {
    format!(
        "https://developer.nvidia.com/downloads/compute/machine-learning/tensorrt/{}/zip/TensorRT-{}.Windows.win10.cuda-{}.zip",
        versions.trt_major_minor_patch(),
        versions.tensorrt,
        versions.cuda_major_minor()
    )
}

pub fn run() -> Result<BundleResult> {
    let versions = SdkVersions::from_env()?;
    let token = env::required("ACCESS_TOKEN")?;
    let repo = env::required("GITHUB_REPOSITORY")?;

    let staging = Path::new("deps");
    fs::create_dir(staging)?;

    deploy_all(&versions, staging)?;

    archive::zip_dir(staging, Path::new(DEPS_ASSET_NAME))?;
    log_status!("deps", "Packaged {}", DEPS_ASSET_NAME);

    let release_id = replace_bundle_asset(&versions, &repo, &token)?;
    log_status!("deps", "Updated release asset and notes");

    Ok(BundleResult {
        versions,
        asset: DEPS_ASSET_NAME,
        release_id,
    })
}

/// Run the three SDK tasks concurrently and aggregate their outcomes
/// after all have finished.
fn deploy_all(versions: &SdkVersions, staging: &Path) -> Result<()> {
    // CUDA and cuDNN installers cannot run concurrently
    let install_lock = Mutex::new(());

    let failures = thread::scope(|scope| {
        let cuda = scope.spawn(|| deploy_cuda(versions, staging, &install_lock));
        let cudnn = scope.spawn(|| deploy_cudnn(versions, staging, &install_lock));
        let tensorrt = scope.spawn(|| deploy_tensorrt(versions, staging));

        collect_failures([
            ("CUDA", cuda.join()),
            ("cuDNN", cudnn.join()),
            ("TensorRT", tensorrt.join()),
        ])
    });

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Deps(failures.join("; ")))
    }
}

fn collect_failures<const N: usize>(
    outcomes: [(&str, thread::Result<Result<()>>); N],
) -> Vec<String> {
    outcomes
        .into_iter()
        .filter_map(|(name, outcome)| match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{}: {}", name, e)),
            Err(_) => Some(format!("{}: task panicked", name)),
        })
        .collect()
}

fn deploy_cuda(versions: &SdkVersions, staging: &Path, install_lock: &Mutex<()>) -> Result<()> {
    let client = net::client()?;
    net::download_to_file(
        &client,
        &cuda_installer_url(versions),
        Path::new("cuda_installer.exe"),
    )?;

    {
        let _guard = install_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let suffix = versions.cuda_major_minor();
        let components: Vec<String> = CUDA_COMPONENTS
            .iter()
            .map(|c| format!("{}_{}", c, suffix))
            .collect();
        let mut args = vec!["-s"];
        args.extend(components.iter().map(String::as_str));
        command::run_passthrough("cuda_installer.exe", &args, "CUDA silent install")?;
    }

    stage_cuda(Path::new(CUDA_INSTALL_ROOT), versions, staging)?;
    log_status!("deps", "Deployed CUDA");
    Ok(())
}

fn deploy_cudnn(versions: &SdkVersions, staging: &Path, install_lock: &Mutex<()>) -> Result<()> {
    let client = net::client()?;
    net::download_to_file(
        &client,
        &cudnn_installer_url(versions),
        Path::new("cudnn_installer.exe"),
    )?;

    {
        let _guard = install_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        command::run_passthrough("cudnn_installer.exe", &["-s"], "cuDNN silent install")?;
    }

    stage_cudnn(Path::new(CUDNN_INSTALL_ROOT), versions, staging)?;
    log_status!("deps", "Deployed cuDNN");
    Ok(())
}

fn deploy_tensorrt(versions: &SdkVersions, staging: &Path) -> Result<()> {
    let client = net::client()?;
    net::download_to_file(
        &client,
        &tensorrt_zip_url(versions),
        Path::new("tensorrt.zip"),
    )?;

    extract_tensorrt_subset(Path::new("tensorrt.zip"), versions, &staging.join("tensorrt"))?;
    log_status!("deps", "Deployed TensorRT");
    Ok(())
}

/// Copy the installed CUDA tree into `deps/cuda`, skipping the large
/// files the build never uses.
pub fn stage_cuda(install_root: &Path, versions: &SdkVersions, staging: &Path) -> Result<()> {
    let source = install_root.join(format!("v{}", versions.cuda_major_minor()));
    fsx::copy_tree(&source, &staging.join("cuda"), &CUDA_COPY_IGNORE)
}

/// Copy the cuDNN headers and import library into `deps/cudnn`.
///
/// The installer nests both under the CUDA major.minor the build links
/// against.
pub fn stage_cudnn(install_root: &Path, versions: &SdkVersions, staging: &Path) -> Result<()> {
    let installed = install_root.join(format!("v{}", versions.cudnn_major_minor()));
    let cuda_mm = versions.cuda_major_minor();

    fsx::copy_tree(
        &installed.join("include").join(&cuda_mm),
        &staging.join("cudnn").join("include"),
        &[],
    )?;

    let lib_dir = staging.join("cudnn").join("lib");
    fs::create_dir_all(&lib_dir)?;
    fs::copy(
        installed.join("lib").join(&cuda_mm).join("x64").join("cudnn.lib"),
        lib_dir.join("cudnn.lib"),
    )?;
    Ok(())
}

pub fn tensorrt_lib_allow_list(major: &str) -> Vec<String> {
    ["nvinfer", "nvinfer_plugin", "nvonnxparser"]
        .iter()
        .map(|stem| format!("{}_{}.lib", stem, major))
        .collect()
}

pub fn tensorrt_bin_allow_list(major: &str) -> Vec<String> {
    [
        "nvinfer",
        "nvinfer_builder_resource",
        "nvinfer_plugin",
        "nvonnxparser",
    ]
    .iter()
    .map(|stem| format!("{}_{}.dll", stem, major))
    .collect()
}

/// Extract only the entries the build needs from the TensorRT release
/// zip: the include tree (structure preserved) and the allow-listed
/// libraries and DLLs (flattened into `lib/` and `bin/`).
pub fn extract_tensorrt_subset(
    zip_path: &Path,
    versions: &SdkVersions,
    dest: &Path,
) -> Result<()> {
    for sub in ["include", "lib", "bin"] {
        fs::create_dir_all(dest.join(sub))?;
    }

    let prefix = format!("TensorRT-{}/", versions.tensorrt);
    let include_prefix = format!("{}include/", prefix);
    let libs = tensorrt_lib_allow_list(versions.trt_major());
    let bins = tensorrt_bin_allow_list(versions.trt_major());

    let file = File::open(zip_path)?;
    let mut zip = ZipArchive::new(file)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let name = entry.name().to_string();

        if let Some(relative) = name.strip_prefix(&include_prefix) {
            if name.ends_with('/') {
                continue;
            }
            let target = dest.join("include").join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            io::copy(&mut entry, &mut File::create(&target)?)?;
        } else if name.ends_with(".lib") {
            if let Some(file_name) = libs.iter().find(|f| name == format!("{}lib/{}", prefix, f)) {
                io::copy(&mut entry, &mut File::create(dest.join("lib").join(file_name))?)?;
            }
        } else if name.ends_with(".dll") {
            if let Some(file_name) = bins.iter().find(|f| name == format!("{}lib/{}", prefix, f)) {
                io::copy(&mut entry, &mut File::create(dest.join("bin").join(file_name))?)?;
            }
        }
    }

    Ok(())
}

/// The markdown summary table written into the `deps` release body.
pub fn version_table(versions: &SdkVersions) -> String {
    format!(
        "| SDK | Version |\n|--------|--------|\n| CUDA | {} |\n| cuDNN | {} |\n| TensorRT | {} |",
        versions.cuda, versions.cudnn, versions.tensorrt
    )
}

/// Replace the bundle asset on the fixed `deps` release and refresh the
/// release notes. Four sequential API calls; any non-success response is
/// fatal.
fn replace_bundle_asset(versions: &SdkVersions, repo: &str, token: &str) -> Result<u64> {
    let client = ReleaseClient::new(repo, token)?;

    let release = client.release_by_tag(DEPS_RELEASE_TAG)?;
    let asset = release.asset_named(DEPS_ASSET_NAME).ok_or_else(|| {
        Error::Other(format!(
            "asset {} not found on release '{}'",
            DEPS_ASSET_NAME, DEPS_RELEASE_TAG
        ))
    })?;

    client.delete_asset(asset.id)?;
    client.upload_asset(&release, DEPS_ASSET_NAME, Path::new(DEPS_ASSET_NAME))?;
    client.update_release_body(release.id, &version_table(versions))?;

    Ok(release.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn versions() -> SdkVersions {
        SdkVersions::new("12.4.1", "9.1.0", "10.0.1.6").unwrap()
    }

    #[test]
    fn installer_urls_are_templated_by_version() {
        let v = versions();
        assert_eq!(
            cuda_installer_url(&v),
            "https://developer.download.nvidia.com/compute/cuda/12.4.1/network_installers/cuda_12.4.1_windows_network.exe"
        );
        assert_eq!(
            cudnn_installer_url(&v),
            "https://developer.download.nvidia.com/compute/cudnn/9.1.0/local_installers/cudnn_9.1.0_windows.exe"
        );
        assert_eq!(
            tensorrt_zip_url(&v),
            "https://developer.nvidia.com/downloads/compute/machine-learning/tensorrt/10.0.1/zip/TensorRT-10.0.1.6.Windows.win10.cuda-12.4.zip"
        );
    }

    #[test]
    fn version_table_lists_all_three_sdks() {
        let table = version_table(&versions());
        assert!(table.contains("| CUDA | 12.4.1 |"));
        assert!(table.contains("| cuDNN | 9.1.0 |"));
        assert!(table.contains("| TensorRT | 10.0.1.6 |"));
    }

    #[test]
    fn allow_lists_use_the_major_version_suffix() {
        assert_eq!(
            tensorrt_lib_allow_list("10"),
            vec!["nvinfer_10.lib", "nvinfer_plugin_10.lib", "nvonnxparser_10.lib"]
        );
        assert!(tensorrt_bin_allow_list("10").contains(&"nvinfer_builder_resource_10.dll".to_string()));
    }

    #[test]
    fn collect_failures_reports_only_failed_tasks() {
        let failures = collect_failures([
            ("CUDA", Ok(Ok(()))),
            ("cuDNN", Ok(Err(Error::Other("installer exited 1".into())))),
            ("TensorRT", Ok(Ok(()))),
        ]);
        assert_eq!(failures, vec!["cuDNN: installer exited 1"]);
    }

    #[test]
    fn one_failing_task_does_not_interrupt_siblings() {
        let completed = AtomicUsize::new(0);

        let failures = thread::scope(|scope| {
            let ok_a = scope.spawn(|| {
                thread::sleep(std::time::Duration::from_millis(20));
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            let failing = scope.spawn(|| Err(Error::Other("download failed".into())));
            let ok_b = scope.spawn(|| {
                thread::sleep(std::time::Duration::from_millis(20));
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

            collect_failures([
                ("CUDA", ok_a.join()),
                ("cuDNN", failing.join()),
                ("TensorRT", ok_b.join()),
            ])
        });

        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("cuDNN:"));
    }

    fn write_tensorrt_fixture(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();
        let prefix = "TensorRT-10.0.1.6";

        for name in [
            format!("{}/include/NvInfer.h", prefix),
            format!("{}/include/impl/NvInferImpl.h", prefix),
            format!("{}/lib/nvinfer_10.lib", prefix),
            format!("{}/lib/nvinfer_plugin_10.lib", prefix),
            format!("{}/lib/nvinfer_dispatch_10.lib", prefix),
            format!("{}/lib/nvinfer_10.dll", prefix),
            format!("{}/lib/nvonnxparser_10.dll", prefix),
            format!("{}/lib/nvinfer_lean_10.dll", prefix),
            format!("{}/doc/readme.txt", prefix),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(b"data").unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn tensorrt_extraction_honors_prefix_and_allow_lists() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("tensorrt.zip");
        write_tensorrt_fixture(&zip_path);

        let dest = dir.path().join("tensorrt");
        extract_tensorrt_subset(&zip_path, &versions(), &dest).unwrap();

        // include tree preserves relative structure
        assert!(dest.join("include/NvInfer.h").exists());
        assert!(dest.join("include/impl/NvInferImpl.h").exists());

        // allow-listed libs and dlls are flattened into lib/ and bin/
        assert!(dest.join("lib/nvinfer_10.lib").exists());
        assert!(dest.join("lib/nvinfer_plugin_10.lib").exists());
        assert!(dest.join("bin/nvinfer_10.dll").exists());
        assert!(dest.join("bin/nvonnxparser_10.dll").exists());

        // everything else stays behind
        assert!(!dest.join("lib/nvinfer_dispatch_10.lib").exists());
        assert!(!dest.join("bin/nvinfer_lean_10.dll").exists());
        assert!(!dest.join("doc").exists());
    }

    #[test]
    fn staged_cudnn_tree_matches_bundle_layout() {
        let dir = TempDir::new().unwrap();
        let v = versions();

        // Simulate the installer's nested layout.
        let install_root = dir.path().join("CUDNN");
        let installed = install_root.join("v9.1");
        fs::create_dir_all(installed.join("include/12.4")).unwrap();
        fs::create_dir_all(installed.join("lib/12.4/x64")).unwrap();
        fs::write(installed.join("include/12.4/cudnn.h"), b"h").unwrap();
        fs::write(installed.join("lib/12.4/x64/cudnn.lib"), b"lib").unwrap();

        let staging = dir.path().join("deps");
        fs::create_dir(&staging).unwrap();
        stage_cudnn(&install_root, &v, &staging).unwrap();

        assert!(staging.join("cudnn/include/cudnn.h").exists());
        assert!(staging.join("cudnn/lib/cudnn.lib").exists());
    }

    #[test]
    fn staged_tree_has_the_full_bundle_layout() {
        let dir = TempDir::new().unwrap();
        let v = versions();
        let staging = dir.path().join("deps");
        fs::create_dir(&staging).unwrap();

        let cuda_root = dir.path().join("CUDA");
        fs::create_dir_all(cuda_root.join("v12.4/include")).unwrap();
        fs::write(cuda_root.join("v12.4/include/cuda.h"), b"h").unwrap();
        stage_cuda(&cuda_root, &v, &staging).unwrap();

        let cudnn_root = dir.path().join("CUDNN");
        fs::create_dir_all(cudnn_root.join("v9.1/include/12.4")).unwrap();
        fs::create_dir_all(cudnn_root.join("v9.1/lib/12.4/x64")).unwrap();
        fs::write(cudnn_root.join("v9.1/include/12.4/cudnn.h"), b"h").unwrap();
        fs::write(cudnn_root.join("v9.1/lib/12.4/x64/cudnn.lib"), b"l").unwrap();
        stage_cudnn(&cudnn_root, &v, &staging).unwrap();

        let zip_path = dir.path().join("tensorrt.zip");
        write_tensorrt_fixture(&zip_path);
        extract_tensorrt_subset(&zip_path, &v, &staging.join("tensorrt")).unwrap();

        assert!(staging.join("cuda/include/cuda.h").exists());
        assert!(staging.join("cudnn/include/cudnn.h").exists());
        assert!(staging.join("cudnn/lib/cudnn.lib").exists());
        for sub in ["include", "lib", "bin"] {
            assert!(staging.join("tensorrt").join(sub).is_dir());
        }
    }

    #[test]
    fn staged_cuda_tree_skips_ignored_files() {
        let dir = TempDir::new().unwrap();
        let v = versions();

        let install_root = dir.path().join("CUDA");
        let installed = install_root.join("v12.4");
        fs::create_dir_all(installed.join("bin")).unwrap();
        fs::create_dir_all(installed.join("lib/x64")).unwrap();
        fs::write(installed.join("bin/cudart64_12.dll"), b"keep").unwrap();
        fs::write(installed.join("bin/cublas64_12.dll"), b"skip").unwrap();
        fs::write(installed.join("lib/x64/cudart.lib"), b"keep").unwrap();
        fs::write(installed.join("lib/x64/nvptxcompiler_static.lib"), b"skip").unwrap();

        let staging = dir.path().join("deps");
        fs::create_dir(&staging).unwrap();
        stage_cuda(&install_root, &v, &staging).unwrap();

        assert!(staging.join("cuda/bin/cudart64_12.dll").exists());
        assert!(staging.join("cuda/lib/x64/cudart.lib").exists());
        assert!(!staging.join("cuda/bin/cublas64_12.dll").exists());
        assert!(!staging.join("cuda/lib/x64/nvptxcompiler_static.lib").exists());
    }
}
