use std::fs;
use std::path::Path;

use snafu::prelude::*;

use crate::pipeline::{ScanningInputsSnafu, TicketResult};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Recursively finds general-election precinct CSV files under `dir`,
/// optionally keeping only those whose file name starts with the given year
/// (county files are conventionally named
/// `YYYYMMDD__state__general__county__precinct.csv`).
pub fn find_precinct_files(dir: &str, year: Option<&str>) -> TicketResult<Vec<String>> {
    let mut found: Vec<String> = Vec::new();
    walk(Path::new(dir), &mut found)?;
    found.retain(|f| {
        let name = simplify_file_name(f);
        name.contains("__general__")
            && name.ends_with("precinct.csv")
            && year.map(|y| name.starts_with(y)).unwrap_or(true)
    });
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<String>) -> TicketResult<()> {
    let entries = fs::read_dir(dir).context(ScanningInputsSnafu {
        path: dir.display().to_string(),
    })?;
    for entry in entries {
        let entry = entry.context(ScanningInputsSnafu {
            path: dir.display().to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else {
            found.push(path.display().to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::simplify_file_name;

    #[test]
    fn file_names_are_simplified() {
        assert_eq!(
            simplify_file_name("2008/counties/20081104__wv__general__barbour__precinct.csv"),
            "20081104__wv__general__barbour__precinct.csv"
        );
        assert_eq!(simplify_file_name("plain.csv"), "plain.csv");
    }
}
