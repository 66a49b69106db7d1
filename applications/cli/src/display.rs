//! Terminal formatting for song lists and the player status line

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use vibefy_playback::{PlaybackPhase, PlaybackState};
use vibefy_server_client::CatalogEntry;

/// Rows per page in `vibefy list`
pub const PAGE_SIZE: usize = 5;

const PLACEHOLDER: &str = "—";

/// `m:ss`; non-finite or negative input renders as `0:00`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// `Mon D, YYYY`; strings that are not dates are shown as sent
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Number of pages needed for `len` rows; at least one
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Rows of the 1-based `page`, clamped to the last page
pub fn page<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let page = page.clamp(1, page_count(items.len(), page_size));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    &items[start.min(items.len())..end]
}

pub fn entry_date(entry: &CatalogEntry) -> String {
    entry
        .uploaded()
        .map(format_date)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn entry_size(entry: &CatalogEntry) -> String {
    if let Some(label) = entry.size_label() {
        return label.to_string();
    }
    entry
        .size_bytes()
        .map(format_size)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn entry_duration(entry: &CatalogEntry) -> String {
    if let Some(label) = entry.duration.as_deref().filter(|d| !d.is_empty()) {
        return label.to_string();
    }
    entry
        .duration()
        .map(|d| format_time(d.as_secs_f64()))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// One line of `vibefy list`; `index` is the 0-based position in the full list
pub fn entry_row(index: usize, entry: &CatalogEntry) -> String {
    format!(
        "{:>3}. {:<32} {:<16} {:>12} {:>9} {:>6}",
        index + 1,
        entry.display_title(),
        entry.display_owner(),
        entry_date(entry),
        entry_size(entry),
        entry_duration(entry),
    )
}

/// Player status line
pub fn status_line(state: &PlaybackState) -> String {
    let phase = match state.phase {
        PlaybackPhase::Idle => "stopped",
        PlaybackPhase::Loading => "loading",
        PlaybackPhase::Playing => "playing",
        PlaybackPhase::Paused => "paused",
    };

    let track = state
        .current_track
        .as_ref()
        .map(|t| format!("{} - {}", t.title, t.artist))
        .unwrap_or_else(|| "nothing selected".to_string());

    let mut flags = Vec::new();
    if state.shuffle {
        flags.push("shuffle");
    }
    if state.repeat {
        flags.push("repeat");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    format!(
        "[{phase}] {track} {}/{} vol {:.0}%{flags}",
        format_time(state.current_time),
        format_time(state.duration),
        state.volume * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibefy_playback::Track;

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(-5.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn date_formatting() {
        assert_eq!(format_date("2024-03-07T12:00:00Z"), "Mar 7, 2024");
        assert_eq!(format_date("2024-11-20 08:15:00"), "Nov 20, 2024");
        assert_eq!(format_date("2023-01-02"), "Jan 2, 2023");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn paging() {
        let items: Vec<u32> = (1..=12).collect();
        assert_eq!(page_count(items.len(), PAGE_SIZE), 3);
        assert_eq!(page(&items, 1, PAGE_SIZE), &[1, 2, 3, 4, 5]);
        assert_eq!(page(&items, 3, PAGE_SIZE), &[11, 12]);
        assert_eq!(page(&items, 9, PAGE_SIZE), &[11, 12]);
        assert_eq!(page(&items, 0, PAGE_SIZE), &[1, 2, 3, 4, 5]);

        let empty: Vec<u32> = Vec::new();
        assert_eq!(page_count(0, PAGE_SIZE), 1);
        assert!(page(&empty, 1, PAGE_SIZE).is_empty());
    }

    #[test]
    fn entry_columns_fall_back() {
        let entry = CatalogEntry::default();
        assert_eq!(entry_date(&entry), "—");
        assert_eq!(entry_size(&entry), "—");
        assert_eq!(entry_duration(&entry), "—");

        let entry = CatalogEntry {
            size_in_bytes: Some(2048),
            duration_seconds: Some(125.0),
            ..CatalogEntry::default()
        };
        assert_eq!(entry_size(&entry), "2.0 KB");
        assert_eq!(entry_duration(&entry), "2:05");

        let entry = CatalogEntry {
            duration: Some("3:33".into()),
            duration_seconds: Some(1.0),
            ..CatalogEntry::default()
        };
        assert_eq!(entry_duration(&entry), "3:33");
    }

    #[test]
    fn status_line_shows_track_and_flags() {
        let state = PlaybackState {
            phase: PlaybackPhase::Playing,
            current_track: Some(Track::new(1u64, "Song", "Band")),
            is_playing: true,
            current_time: 65.0,
            duration: 200.0,
            volume: 0.5,
            shuffle: true,
            ..PlaybackState::default()
        };
        assert_eq!(
            status_line(&state),
            "[playing] Song - Band 1:05/3:20 vol 50% [shuffle]"
        );

        assert_eq!(
            status_line(&PlaybackState::default()),
            "[stopped] nothing selected 0:00/0:00 vol 100%"
        );
    }
}
