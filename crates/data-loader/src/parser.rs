//! Parser for rating and item files.
//!
//! Two layouts are understood, detected from the first non-empty line:
//! - HetRec MovieLens (tab separated, header row):
//!   `userID movieID rating date_day date_month date_year date_hour date_minute date_second`
//!   and `id title imdbID ...` for items
//! - MovieLens 1M (`::` separated, no header):
//!   `userId::movieId::rating::timestamp` and `movieId::title::genres`

use crate::error::{DataLoadError, Result};
use crate::types::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a file with ISO-8859-1 encoding (Latin-1)
///
/// MovieLens files are Latin-1, not UTF-8. Every byte maps directly to a
/// Unicode code point, so the conversion never fails.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Tab separated with a header row
    Tabular,
    /// `::` separated, no header
    DoubleColon,
}

impl Layout {
    fn detect(lines: &[String]) -> Layout {
        let first = lines.iter().find(|l| !l.trim().is_empty());
        match first {
            Some(line) if line.contains("::") => Layout::DoubleColon,
            _ => Layout::Tabular,
        }
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Layout::Tabular => line.split('\t').map(str::trim).collect(),
            Layout::DoubleColon => line.split("::").collect(),
        }
    }
}

/// Parse one field, tagging failures with file and line
fn parse_field<T>(value: &str, name: &str, file: &str, line: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// True for a header row such as `userID\tmovieID\t...`
fn is_header(fields: &[&str]) -> bool {
    fields
        .first()
        .map(|f| f.parse::<u64>().is_err())
        .unwrap_or(false)
}

/// Parse a ratings file in either supported layout
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingRecord>> {
    let lines = read_lines_latin1(path)?;
    let layout = Layout::detect(&lines);
    let file = file_name(path);
    let expected = match layout {
        Layout::Tabular => 9,
        Layout::DoubleColon => 4,
    };

    let mut ratings = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let fields = layout.split(line_trimmed);
        if layout == Layout::Tabular && is_header(&fields) {
            continue;
        }
        if fields.len() < expected {
            return Err(DataLoadError::FieldCountMismatch {
                file: file.clone(),
                line: line_no,
                expected,
                found: fields.len(),
            });
        }

        let user_id = parse_field(fields[0], "userId", &file, line_no)?;
        let item_id = parse_field(fields[1], "movieId", &file, line_no)?;
        let rating = parse_field(fields[2], "rating", &file, line_no)?;
        let timestamp = match layout {
            Layout::Tabular => parse_date_parts(&fields[3..9], &file, line_no)?,
            Layout::DoubleColon => {
                let secs: i64 = parse_field(fields[3], "timestamp", &file, line_no)?;
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| DataLoadError::ParseError {
                        file: file.clone(),
                        line: line_no,
                        reason: format!("Timestamp out of range: {}", secs),
                    })?
            }
        };

        ratings.push(RatingRecord {
            user_id,
            item_id,
            rating,
            timestamp,
        });
    }
    Ok(ratings)
}

/// Build a timestamp from `day month year hour minute second` columns
fn parse_date_parts(parts: &[&str], file: &str, line: usize) -> Result<NaiveDateTime> {
    let day: u32 = parse_field(parts[0], "date_day", file, line)?;
    let month: u32 = parse_field(parts[1], "date_month", file, line)?;
    let year: i32 = parse_field(parts[2], "date_year", file, line)?;
    let hour: u32 = parse_field(parts[3], "date_hour", file, line)?;
    let minute: u32 = parse_field(parts[4], "date_minute", file, line)?;
    let second: u32 = parse_field(parts[5], "date_second", file, line)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!(
                "Invalid date {}.{}.{} {}:{}:{}",
                day, month, year, hour, minute, second
            ),
        })
}

/// Parse an item (movie) file in either supported layout
///
/// Only the id and the title are kept; they are used for display.
pub fn parse_items(path: &Path) -> Result<Vec<Item>> {
    let lines = read_lines_latin1(path)?;
    let layout = Layout::detect(&lines);
    let file = file_name(path);

    let mut items = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let fields = layout.split(line_trimmed);
        if layout == Layout::Tabular && is_header(&fields) {
            continue;
        }
        if fields.len() < 2 {
            return Err(DataLoadError::FieldCountMismatch {
                file: file.clone(),
                line: line_no,
                expected: 2,
                found: fields.len(),
            });
        }

        let title = fields[1].to_string();
        items.push(Item {
            id: parse_field(fields[0], "movieId", &file, line_no)?,
            year: extract_year_from_title(&title),
            title,
        });
    }
    Ok(items)
}

/// Parse a `dd.mm.yyyy` date, the format used on the command line
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d.%m.%Y").map_err(|_| {
        DataLoadError::InvalidValue {
            field: "date".to_string(),
            value: value.to_string(),
        }
    })
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "data-loader-{}-{}",
            std::process::id(),
            name
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Movie Title"), None);
    }

    #[test]
    fn test_parse_tabular_ratings() {
        let path = write_temp(
            "ratings.dat",
            "userID\tmovieID\trating\tdate_day\tdate_month\tdate_year\tdate_hour\tdate_minute\tdate_second\n\
             75\t3\t1\t29\t10\t2006\t23\t17\t16\n\
             75\t32\t4.5\t29\t10\t2006\t23\t23\t44\n",
        );

        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1].user_id, 75);
        assert_eq!(ratings[1].item_id, 32);
        assert_eq!(ratings[1].rating, 4.5);
        assert_eq!(
            ratings[0].timestamp.date(),
            NaiveDate::from_ymd_opt(2006, 10, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_double_colon_ratings() {
        let path = write_temp("ml1m.dat", "1::1193::5::978300760\n1::661::3::978302109\n");

        let ratings = parse_ratings(&path).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].item_id, 1193);
        assert_eq!(ratings[0].rating, 5.0);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let path = write_temp("short.dat", "1::1193::5\n");
        let err = parse_ratings(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::FieldCountMismatch { found: 3, .. }));
        assert!(err.to_string().ends_with("short.dat:1: expected 4 fields, found 3"));
    }

    #[test]
    fn test_parse_items() {
        let path = write_temp(
            "movies.dat",
            "id\ttitle\timdbID\n1\tToy story\t0114709\n2\tJumanji (1995)\t0113497\n",
        );

        let items = parse_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Toy story");
        assert_eq!(items[1].year, Some(1995));
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("2.1.2008").unwrap(),
            NaiveDate::from_ymd_opt(2008, 1, 2).unwrap()
        );
        assert!(parse_day("2008-01-02").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = parse_ratings(Path::new("/definitely/not/here.dat")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
