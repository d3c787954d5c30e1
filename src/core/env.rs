//! Typed access to the CI environment contract.
//!
//! Every pipeline is configured exclusively through environment variables
//! set by the workflow; there are no config files. Missing required
//! variables are configuration errors, fatal before any work starts.

use crate::error::{Error, Result};

/// True when running under GitHub Actions.
///
/// Used only to force status output on: in Actions, stderr is a pipe
/// rather than a TTY, but progress lines still belong in the job log.
pub fn running_in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Read a required environment variable or fail with a configuration error.
pub fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}

/// Environment consumed by the publish pipeline's git and release steps.
pub struct ReleaseEnv {
    pub tag: String,
    pub token: String,
    pub repo: String,
    pub actor: String,
}

impl ReleaseEnv {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tag: required("TAG")?,
            token: required("ACCESS_TOKEN")?,
            repo: required("GITHUB_REPOSITORY")?,
            actor: required("GITHUB_ACTOR")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fails_for_unset_variable() {
        let result = required("ORTCI_TEST_UNSET_VARIABLE_XYZ");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code(), "CONFIG_ERROR");
    }

    #[test]
    fn required_reads_set_variable() {
        std::env::set_var("ORTCI_TEST_SET_VARIABLE", "value");
        assert_eq!(required("ORTCI_TEST_SET_VARIABLE").unwrap(), "value");
        std::env::remove_var("ORTCI_TEST_SET_VARIABLE");
    }
}
