pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

mod render;

use chronotask_core::{Paths, TaskStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn paths() -> std::io::Result<Paths> {
    Paths::discover()
}

pub(crate) fn open_store(paths: &Paths) -> chronotask_core::error::Result<TaskStore> {
    TaskStore::open(&paths.data_file())
}
