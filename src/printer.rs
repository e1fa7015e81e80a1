use std::fmt::Display;
use std::io::{self, Write};

use lazy_format::lazy_format;

use crate::schema::AccountSnapshot;
use crate::usage_tracker::{UsageAnnotation, UsageChange};

const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Clone, PartialEq, Debug)]
pub struct Report {
    pub snapshot: AccountSnapshot,
    pub usage: Option<UsageAnnotation>,
}

pub fn format_report(report: &Report) -> String {
    let mut output = String::new();
    for (key, value) in report.snapshot.fields() {
        let annotation = match (key, &report.usage) {
            ("internet", Some(usage)) => format!(" {}", format_annotation(usage)),
            _ => String::new(),
        };
        output += &format_line(key, lazy_format!("{value}{annotation}"));
    }
    output
}

pub fn print_report(report: &Report) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(format_report(report).as_bytes())?;
    stdout.flush()
}

fn format_line(key: &str, value: impl Display) -> String {
    let key = key.replace('_', " ");
    format!("{CYAN}* {key}:{RESET} {GREEN}{value}{RESET}\n")
}

fn format_annotation(usage: &UsageAnnotation) -> String {
    let color = match usage.change {
        UsageChange::Consumed(_) => RED,
        UsageChange::Unchanged => DIM,
    };
    format!(
        "{color}{}{RESET} {DIM}{}{RESET}",
        usage.change, usage.since
    )
}
