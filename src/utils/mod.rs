pub mod archive;
pub mod command;
pub mod fsx;
pub mod net;
