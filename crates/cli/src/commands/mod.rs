pub(crate) mod list;
pub(crate) mod run;

/// `YYYY-MM-DD HH:MM [TAG] mountainwatch`
pub(crate) fn banner(tag: &str) -> String {
    format!("{} [{tag}] mountainwatch", chrono::Local::now().format("%Y-%m-%d %H:%M"))
}
