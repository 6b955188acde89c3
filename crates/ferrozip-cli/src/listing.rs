//! `unzip -l` style table

use ferrozip_core::ArchiveEntry;
use std::fmt::Write;

const HEADER: &str = "  Length      Date    Time    Name\n---------  ---------- -----   ----\n";
const RULE: &str = "---------                     -------\n";

/// Render entries as an Info-ZIP listing, totals footer included
pub fn render_listing(entries: &[ArchiveEntry]) -> String {
    let mut out = String::from(HEADER);
    let mut total: u64 = 0;

    for entry in entries {
        let stamp = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "0000-00-00 00:00".to_string());
        let _ = writeln!(out, "{:>9}  {}   {}", entry.size, stamp, entry.name);
        total += entry.size;
    }

    out.push_str(RULE);
    let _ = writeln!(out, "{:>9}                     {} files", total, entries.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ferrozip_core::EntryMethod;

    fn entry(name: &str, size: u64, is_dir: bool) -> ArchiveEntry {
        ArchiveEntry {
            name: name.to_string(),
            size,
            compressed_size: size,
            modified: NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(14, 5, 30)),
            method: EntryMethod::Stored,
            mode: None,
            is_dir,
        }
    }

    #[test]
    fn test_table_layout() {
        let entries = vec![entry("docs/", 0, true), entry("docs/readme.txt", 1234, false)];
        let table = render_listing(&entries);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "  Length      Date    Time    Name");
        assert_eq!(lines[2], "        0  2024-03-09 14:05   docs/");
        assert_eq!(lines[3], "     1234  2024-03-09 14:05   docs/readme.txt");
        assert_eq!(lines[4], "---------                     -------");
        assert_eq!(lines[5], "     1234                     2 files");
    }

    #[test]
    fn test_empty_archive() {
        let table = render_listing(&[]);
        assert!(table.ends_with("        0                     0 files\n"));
    }

    #[test]
    fn test_missing_timestamp() {
        let mut e = entry("x", 1, false);
        e.modified = None;
        assert!(render_listing(&[e]).contains("0000-00-00 00:00   x"));
    }
}
