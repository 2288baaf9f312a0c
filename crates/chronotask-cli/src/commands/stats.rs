use chronotask_core::minutes_by_date;

use super::{open_store, paths, render, CmdResult};

pub fn run(year: i32, month: u32) -> CmdResult {
    let paths = paths()?;
    let store = open_store(&paths)?;
    match minutes_by_date(store.tasks(), year, month)? {
        Some(work) => print!("{}", render::bar_chart(&work)),
        None => println!("Requested year {year} and month {month} isn't in the data."),
    }
    Ok(())
}
