use checkrelay::application::workflow::CheckWorkflow;
use checkrelay::config::Config;
use checkrelay::domain::ports::{DirectoryStoreBox, MessengerBox, RecordSheetBox};
use checkrelay::infrastructure::csv_sheet::CsvRecordSheet;
use checkrelay::infrastructure::in_memory::InMemoryRecordSheet;
use checkrelay::infrastructure::json_directory::JsonDirectoryStore;
use checkrelay::interfaces::telegram::{Poller, TelegramClient};
use checkrelay::logging::init_logging;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level);

    if config.operators.is_empty() {
        warn!("No operators configured; nobody can start a check");
    }

    let directory: DirectoryStoreBox = Arc::new(JsonDirectoryStore::new(&config.directory));
    let sheet: RecordSheetBox = match &config.sheet {
        Some(path) => {
            info!(path = %path.display(), "Recording checks to CSV sheet");
            Arc::new(CsvRecordSheet::new(path))
        }
        None => {
            warn!("No sheet configured; check records are kept in memory only");
            Arc::new(InMemoryRecordSheet::new())
        }
    };

    let client = Arc::new(
        TelegramClient::new(&config.api_url, &config.token, config.poll_timeout())
            .into_diagnostic()?,
    );
    let messenger: MessengerBox = client.clone();
    let workflow = Arc::new(CheckWorkflow::new(
        directory,
        sheet,
        messenger,
        config.operators.clone(),
    ));

    Poller::new(client, workflow, config.poll_timeout())
        .run()
        .await
        .into_diagnostic()
}
