//! Plain-text tables and charts.

use std::fmt::Write;

use chronotask_core::{MonthlyWork, TaskRecord};

const TEXT_WIDTH: usize = 39;
const BAR_CELLS_PER_HOUR: f64 = 4.0;

/// Greedy word wrap. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn hours(minutes: f64) -> f64 {
    (minutes / 60.0 * 10.0).round() / 10.0
}

/// Task listing: id, status box, wrapped text, created, due date and hours
/// worked.
pub fn task_table(rows: &[(u32, &TaskRecord)]) -> String {
    let header = ["ID", "[*]", "Text", "Created", "Due Date", "Work, h"];
    let cells: Vec<[Vec<String>; 6]> = rows
        .iter()
        .map(|(id, task)| {
            [
                vec![id.to_string()],
                vec![task.status.checkbox().to_string()],
                wrap(&task.text, TEXT_WIDTH),
                vec![task.date_added.format("%Y-%m-%d %H:%M").to_string()],
                vec![task.date.to_string()],
                vec![format!("{:.1}", hours(task.total_work))],
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            for line in cell {
                *width = (*width).max(line.chars().count());
            }
        }
    }

    let border = widths
        .iter()
        .fold(String::from("+"), |mut acc, w| {
            acc.push_str(&"-".repeat(w + 2));
            acc.push('+');
            acc
        });

    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    push_line(&mut out, &widths, |i| header[i]);
    let _ = writeln!(out, "{border}");
    for row in &cells {
        let height = row.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            push_line(&mut out, &widths, |i| {
                row[i].get(line).map(String::as_str).unwrap_or("")
            });
        }
    }
    let _ = writeln!(out, "{border}");
    out
}

fn push_line<'a>(out: &mut String, widths: &[usize; 6], cell: impl Fn(usize) -> &'a str) {
    out.push('|');
    for (i, width) in widths.iter().enumerate() {
        let _ = write!(out, " {:<width$} |", cell(i), width = width);
    }
    out.push('\n');
}

/// Horizontal bar chart of hours per day.
pub fn bar_chart(work: &MonthlyWork) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Work Hours by Date: {} {}", work.month_name(), work.year);
    for day in &work.days {
        let hours = day.hours();
        let cells = (hours * BAR_CELLS_PER_HOUR).round().max(0.0) as usize;
        let _ = writeln!(out, "{} |{} {hours:.1}", day.label(), "#".repeat(cells));
    }
    let _ = writeln!(out, "Total: {:.1} h", hours(work.total_minutes()));
    out
}
