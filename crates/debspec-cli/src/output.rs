use anyhow::Result;
use serde::Serialize;

/// Print a report, as JSON or using its text rendering
pub fn emit<T, F>(json: bool, report: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", text(report));
    }
    Ok(())
}
