//! GPU SDK version strings and the substrings derived from them.
//!
//! Versions are validated only for dotted-segment count: CUDA and cuDNN
//! use three segments, TensorRT uses four. The segments are never
//! interpreted beyond slicing out major/minor prefixes for download URLs
//! and installed-path lookups.

use serde::Serialize;

use crate::env;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct SdkVersions {
    pub cuda: String,
    pub cudnn: String,
    pub tensorrt: String,
}

impl SdkVersions {
    pub fn new(
        cuda: impl Into<String>,
        cudnn: impl Into<String>,
        tensorrt: impl Into<String>,
    ) -> Result<Self> {
        let versions = Self {
            cuda: cuda.into(),
            cudnn: cudnn.into(),
            tensorrt: tensorrt.into(),
        };

        if segment_count(&versions.cuda) != 3 {
            return Err(Error::validation("CUDA_VER", "version must be x.y.z"));
        }
        if segment_count(&versions.cudnn) != 3 {
            return Err(Error::validation("CUDNN_VER", "version must be x.y.z"));
        }
        if segment_count(&versions.tensorrt) != 4 {
            return Err(Error::validation("TRT_VER", "version must be x.y.z.w"));
        }

        Ok(versions)
    }

    /// Read and validate `CUDA_VER`, `CUDNN_VER`, and `TRT_VER`.
    pub fn from_env() -> Result<Self> {
        Self::new(
            env::required("CUDA_VER")?,
            env::required("CUDNN_VER")?,
            env::required("TRT_VER")?,
        )
    }

    /// "12.4.1" -> "12.4"
    pub fn cuda_major_minor(&self) -> String {
        leading_segments(&self.cuda, 2)
    }

    /// "9.1.0" -> "9.1"
    pub fn cudnn_major_minor(&self) -> String {
        leading_segments(&self.cudnn, 2)
    }

    /// "10.0.1.6" -> "10.0.1"
    pub fn trt_major_minor_patch(&self) -> String {
        leading_segments(&self.tensorrt, 3)
    }

    /// "10.0.1.6" -> "10"
    pub fn trt_major(&self) -> &str {
        self.tensorrt.split('.').next().unwrap_or(&self.tensorrt)
    }
}

fn segment_count(version: &str) -> usize {
    version.split('.').count()
}

fn leading_segments(version: &str, count: usize) -> String {
    version
        .split('.')
        .take(count)
        .collect::<Vec<_>>()
        .join(".")
}
