pub mod build;
pub mod deps;
pub mod env;
pub mod error;
pub mod git;
pub mod github;
pub mod publish;
pub mod sdk;

pub use self::error::{Error, Result};
