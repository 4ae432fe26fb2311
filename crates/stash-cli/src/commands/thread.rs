use std::path::Path;

use stash_core::Platform;

use crate::commands::common::{format_thread_lines, item_to_list_item, open_store, ItemListItem};
use crate::error::CliError;

pub async fn run_thread(
    platform: Platform,
    conversation_id: &str,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let conversation_id = conversation_id.trim();
    if conversation_id.is_empty() {
        return Err(stash_core::Error::InvalidInput("Conversation id cannot be empty".into()).into());
    }

    let store = open_store(db_path, platform).await?;
    let items = store.list_thread(conversation_id).await?;

    if as_json {
        let json_items = items
            .iter()
            .map(item_to_list_item)
            .collect::<Vec<ItemListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if items.is_empty() {
        println!("No stored items for {platform} conversation {conversation_id}.");
    } else {
        for line in format_thread_lines(&items) {
            println!("{line}");
        }
    }

    Ok(())
}
