pub mod logging;
pub mod profile;

/// Formats the current local time as `YYYY-MM-DD HH:MM:SS`.
/// Returns `None` if the system clock or the local timezone cannot be queried.
pub fn format_now() -> Option<String> {
    let now = time_format::now().ok()?;
    time_format::strftime_local("%Y-%m-%d %H:%M:%S", now).ok()
}
