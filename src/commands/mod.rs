pub mod build;
pub mod deps;
pub mod publish;

pub type CmdResult<T> = ortci::Result<T>;
