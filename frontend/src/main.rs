mod app;

slint::include_modules!();

extern crate pretty_env_logger;
#[macro_use] extern crate log;

use std::env;
use std::sync::{Arc, Mutex};

use app::store::{SharedStore, Store};
use app::viewer;
use wxrecordings::{default_selection, resolve_permalink};

fn main() -> Result<(), slint::PlatformError> {
    pretty_env_logger::init();

    info!("Starting satellite recordings viewer...");

    let base_url = env::var("WXVIEWER_BASE_URL").unwrap_or_default();
    if base_url.is_empty() {
        warn!("WXVIEWER_BASE_URL is not set, the pass list cannot be fetched");
    }
    let permalink = env::args().nth(1);

    let store: SharedStore = Arc::new(Mutex::new(Store::new(&base_url)));

    let main_window = MainWindow::new()?;

    // Set up callback handlers for navigation, toggles and permalinks
    viewer::setup_viewer_callbacks(&main_window, &store);

    // Start the async runtime for the initial manifest fetch
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        if let Err(e) = viewer::load_catalog(&store).await {
            error!("Failed to load the pass list: {}", e);
            main_window.set_status_message(format!("Failed to load passes: {}", e).into());
        }
    });

    // Initial selection: a permalink argument when given, the most recent
    // pass otherwise
    let initial = {
        let guard = store.lock().unwrap();
        let catalog = &guard.state().catalog;
        match &permalink {
            Some(link) => resolve_permalink(catalog, link),
            None => default_selection(catalog),
        }
    };

    match initial {
        Some(selection) => viewer::apply_selection(&main_window, &store, selection),
        None => info!("Catalog is empty, leaving the loading screen up"),
    }

    main_window.invoke_focus_keys();

    info!("Satellite recordings viewer started successfully");

    // Run the main window - this blocks until the window is closed
    main_window.run()
}
