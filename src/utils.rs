pub fn fmt_date(date: chrono::NaiveDateTime) -> String {
  date.format("%d.%m.%Y").to_string()
}

/// `01:01:01`-style rendering of a second count.
pub fn fmt_hms(seconds: i64) -> String {
  let seconds = seconds.max(0);
  let (hours, rem) = (seconds / 3600, seconds % 3600);
  let (minutes, secs) = (rem / 60, rem % 60);
  format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Readable rendering of a second count, e.g. `1 hour and 30 minutes`.
pub fn human_hours_minutes(seconds: i64) -> String {
  let seconds = seconds.max(0);
  let hours = seconds / 3600;
  let minutes = (seconds % 3600) / 60;

  let hours_txt = format!("{hours} hour{}", if hours == 1 { "" } else { "s" });
  let minutes_txt =
    format!("{minutes} minute{}", if minutes == 1 { "" } else { "s" });

  if hours > 0 && minutes > 0 {
    format!("{hours_txt} and {minutes_txt}")
  } else if hours > 0 {
    hours_txt
  } else {
    minutes_txt
  }
}
