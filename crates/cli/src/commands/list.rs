use anyhow::Result;
use mountainwatch_core::{
    Condition, DEFAULT_LINK_BASE, StoreSettings, format_date, processed_flag,
};
use mountainwatch_storage::Storage;

const LIST_HEADER: &str = "id, status, date_from, frontendtype, title, processed, user_id";

pub(crate) fn run_list() -> Result<()> {
    let store = StoreSettings::from_env();
    let link_base = std::env::var("MOUNTAINWATCH_LINK_BASE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LINK_BASE.to_owned());

    let storage = Storage::new(&store.db_path)?;
    let conditions = storage.all_conditions()?;
    println!("{LIST_HEADER}");
    for (index, condition) in conditions.iter().enumerate() {
        println!("{}", list_line(index + 1, condition, &link_base));
    }
    tracing::debug!(count = conditions.len(), path = %store.db_path.display(), "Listed conditions");
    Ok(())
}

fn list_line(row: usize, condition: &Condition, link_base: &str) -> String {
    format!(
        "[{row:3}]: {} Title: {} URL:{link_base}{} Processed: [{}] User:{link_base}{}",
        format_date(condition.date_from),
        condition.title,
        condition.id,
        processed_flag(condition.processed),
        condition.user_id,
    )
}
