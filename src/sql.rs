use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::value::ResultMap;

pub const DEFAULT_OUTPUT: &str = "strongarm.sql";
pub const MAX_FRACTION_DIGITS: usize = 100;

/// Plain decimal notation, `.` as separator, never an exponent.
pub fn format_value(value: f64) -> String {
    // Display for f64 never switches to scientific notation
    let plain = value.to_string();

    match plain.split_once('.') {
        Some((_, fraction)) if fraction.len() > MAX_FRACTION_DIGITS => {
            let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value);
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

            match trimmed {
                "-0" => "0".to_string(),
                _ => trimmed.to_string(),
            }
        },
        _ => plain,
    }
}

pub fn insert_statement(equation: &str, value: f64) -> String {
    format!(
        "insert into strongarm (equation, result) values ('{}',{});",
        equation.replace('\'', "''"),
        format_value(value),
    )
}

/// Writes one insert per entry, ordered by value.
pub fn write_inserts<W: Write>(results: &ResultMap, mut out: W) -> io::Result<()> {
    for (value, equation) in results.sorted() {
        writeln!(out, "{}", insert_statement(equation, value))?;
    }

    out.flush()
}

/// Replaces `path` with the full dump, or leaves it untouched on failure.
pub fn save(results: &ResultMap, path: &Path) -> io::Result<()> {
    let tmp = temp_path(path);
    debug!("Writing to {}", tmp.display());

    let res = write_file(results, &tmp).and_then(|_| fs::rename(&tmp, path));
    if res.is_err() {
        // The temporary may not even exist; there is nothing left to report.
        let _ = fs::remove_file(&tmp);
        return res;
    }

    info!("Wrote {} statement(s) to {}", results.len(), path.display());

    Ok(())
}

fn write_file(results: &ResultMap, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_inserts(results, &mut out)?;

    out.into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_OUTPUT.into());
    name.push(".tmp");

    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use crate::value::ValueKey;

    use super::*;

    fn results(entries: &[(f64, &str)]) -> ResultMap {
        let mut map = ResultMap::new();
        for (v, eq) in entries {
            map.offer(ValueKey::of(*v).unwrap(), eq.to_string());
        }

        map
    }

    #[test]
    fn plain_notation() {
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(-12.25), "-12.25");
        assert_eq!(format_value(1e-7), "0.0000001");
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(1e-120), "0");
        assert_eq!(format_value(-1e-120), "0");
    }

    #[test]
    fn statement_format() {
        assert_eq!(
            insert_statement("sqrt(2)", 1.4142135623731),
            "insert into strongarm (equation, result) values ('sqrt(2)',1.4142135623731);",
        );
    }

    #[test]
    fn inserts_sorted_by_value() {
        let map = results(&[(0.5, "1/2"), (-0.25, "1/-4"), (2.5, "5/2")]);
        let mut buf = Vec::new();
        write_inserts(&map, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();

        assert!(text.ends_with(";\n"));
        assert_eq!(lines, [
            "insert into strongarm (equation, result) values ('1/-4',-0.25);",
            "insert into strongarm (equation, result) values ('1/2',0.5);",
            "insert into strongarm (equation, result) values ('5/2',2.5);",
        ]);
    }

    #[test]
    fn save_replaces_the_whole_file() {
        let dir = std::env::temp_dir().join(format!("strongarm-sql-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.sql");
        fs::write(&path, "stale line\nanother stale line\nthird\n").unwrap();

        save(&results(&[(0.5, "1/2")]), &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "insert into strongarm (equation, result) values ('1/2',0.5);\n",
        );
        assert!(!temp_path(&path).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_save_leaves_nothing_behind() {
        let dir = std::env::temp_dir().join(format!("strongarm-missing-{}", std::process::id()));
        let path = dir.join("nested").join("out.sql");

        assert!(save(&results(&[(0.5, "1/2")]), &path).is_err());
        assert!(!path.exists());
        assert!(!temp_path(&path).exists());
    }
}
