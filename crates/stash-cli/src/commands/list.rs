use std::path::Path;

use stash_core::Platform;

use crate::commands::common::{format_item_lines, item_to_list_item, open_store, ItemListItem};
use crate::error::CliError;

pub async fn run_list(
    platform: Platform,
    limit: usize,
    page: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path, platform).await?;
    let mut pages = store
        .paged_top_level_items(limit)
        .starting_at_page(page.saturating_sub(1));
    let items = pages.next_page().await.transpose()?.unwrap_or_default();

    if as_json {
        let json_items = items
            .iter()
            .map(item_to_list_item)
            .collect::<Vec<ItemListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if items.is_empty() {
        println!("No {platform} items on page {page}.");
    } else {
        for line in format_item_lines(&items) {
            println!("{line}");
        }
    }

    Ok(())
}
