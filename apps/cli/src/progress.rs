//! Progress lines on stderr.

use std::io::Write;

use sealpost_transfer::ProgressUpdate;

/// Formats one progress line, without the leading carriage return.
pub fn render(update: &ProgressUpdate) -> String {
    let percent = if update.total_bytes == 0 {
        100.0
    } else {
        update.transferred_bytes as f64 * 100.0 / update.total_bytes as f64
    };
    let mut line = format!(
        "{}: {:5.1}% {}/{} {}/s",
        update.file,
        percent.min(100.0),
        human_bytes(update.transferred_bytes as f64),
        human_bytes(update.total_bytes as f64),
        human_bytes(update.bytes_per_second),
    );
    if let Some(eta) = update.eta {
        line.push_str(&format!(" eta {}s", eta.as_secs()));
    }
    line
}

/// Overwrites the current stderr line; ends it when the transfer finishes.
pub fn print(update: &ProgressUpdate) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "\r{}", render(update));
    if update.finished {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

fn human_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0}{}", UNITS[unit])
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update(transferred: u64, total: u64) -> ProgressUpdate {
        ProgressUpdate {
            file: "sample.txt.enc".into(),
            total_bytes: total,
            transferred_bytes: transferred,
            bytes_per_second: 2048.0,
            eta: Some(Duration::from_secs(3)),
            finished: false,
        }
    }

    #[test]
    fn renders_percentage_and_sizes() {
        let line = render(&update(512 * 1024, 1024 * 1024));
        assert_eq!(line, "sample.txt.enc:  50.0% 512.0KiB/1.0MiB 2.0KiB/s eta 3s");
    }

    #[test]
    fn empty_total_is_complete() {
        let line = render(&update(0, 0));
        assert!(line.contains("100.0%"));
    }

    #[test]
    fn small_sizes_have_no_decimals() {
        assert_eq!(human_bytes(152.0), "152B");
        assert_eq!(human_bytes(65688.0), "64.1KiB");
    }
}
