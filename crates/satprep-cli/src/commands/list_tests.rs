//! The `satprep list-tests` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use satprep_store::config::load_config_from;
use satprep_store::create_store;

pub async fn execute(store_name: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (name, store_config) = config.store(store_name.as_deref())?;
    let store = create_store(&name, &store_config)?;

    let tests = store
        .list_tests()
        .await
        .with_context(|| format!("failed to list tests in store '{name}'"))?;

    if tests.is_empty() {
        println!("No tests in store '{name}'. Run `satprep init` to create an example.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Questions", "Max points"]);
    for t in &tests {
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(t.question_count),
            Cell::new(t.max_points),
        ]);
    }
    println!("{table}");

    Ok(())
}
