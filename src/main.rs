mod diary_entry;
mod storage;
mod ui;

use color_eyre::Result;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use storage::Storage;
use tracing_subscriber::EnvFilter;
use ui::{Action, UI};

const LOG_FILE_NAME: &str = "atrides_diary.log";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let data_dir = storage::data_dir()?;
    init_logging(&data_dir)?;

    let storage = Storage::open()?;
    let mut entries = storage.load_all().await;
    tracing::info!(count = entries.len(), "diary loaded");

    let mut ui = UI::new()?;

    loop {
        ui.display(&entries)?;

        if let Some(action) = ui.handle_input(&entries)? {
            match action {
                Action::Write => {
                    if let Some(entry) = ui.get_new_entry()? {
                        entries.insert(0, entry);
                        storage.save_all(&entries).await;
                    }
                }
                Action::View => {
                    ui.view_entries(&entries)?;
                }
                Action::Delete => {
                    if let Some(entry) = ui.select_entry_to_delete(&entries)? {
                        entries.retain(|e| e.id != entry.id);
                        storage.save_all(&entries).await;
                    }
                }
                Action::Quit => break,
            }
        }
    }

    Ok(())
}

// The UI owns the terminal, so diagnostics go to a file next to the data.
fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_file = File::create(data_dir.join(LOG_FILE_NAME))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
