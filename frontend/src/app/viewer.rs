use slint::ComponentHandle;

use wxrecordings::{
    can_toggle_map, can_toggle_precip, encode_permalink, image_url, navigate_enhancement,
    navigate_pass, prefetch_plan, resolve_permalink, toggle_map, toggle_precip, Pass,
    RecordingsClient, Selection,
};

use crate::app::store::{Action, SharedStore, ViewerState};
use crate::app::utils::decode_webp_to_slint_image;
use crate::MainWindow;

pub fn setup_viewer_callbacks(main_window: &MainWindow, store: &SharedStore) {
    // Pass navigation (prev/next buttons and left/right arrow keys)
    let main_window_weak = main_window.as_weak();
    let store_handle = store.clone();
    main_window.on_navigate_pass(move |direction| {
        let window_weak = main_window_weak.clone();
        let store = store_handle.clone();
        slint::invoke_from_event_loop(move || {
            handle_navigation(
                &window_weak,
                &store,
                "pass navigation",
                |catalog, selection| navigate_pass(catalog, selection, direction),
            );
        })
        .unwrap();
    });

    // Enhancement navigation (prev/next buttons and up/down arrow keys)
    let main_window_weak = main_window.as_weak();
    let store_handle = store.clone();
    main_window.on_navigate_enhancement(move |direction| {
        let window_weak = main_window_weak.clone();
        let store = store_handle.clone();
        slint::invoke_from_event_loop(move || {
            handle_navigation(
                &window_weak,
                &store,
                "enhancement navigation",
                |catalog, selection| navigate_enhancement(catalog, selection, direction),
            );
        })
        .unwrap();
    });

    // Precipitation overlay toggle
    let main_window_weak = main_window.as_weak();
    let store_handle = store.clone();
    main_window.on_toggle_precip(move || {
        let window_weak = main_window_weak.clone();
        let store = store_handle.clone();
        slint::invoke_from_event_loop(move || {
            handle_navigation(&window_weak, &store, "precip toggle", toggle_precip);
        })
        .unwrap();
    });

    // Map overlay toggle
    let main_window_weak = main_window.as_weak();
    let store_handle = store.clone();
    main_window.on_toggle_map(move || {
        let window_weak = main_window_weak.clone();
        let store = store_handle.clone();
        slint::invoke_from_event_loop(move || {
            handle_navigation(&window_weak, &store, "map toggle", toggle_map);
        })
        .unwrap();
    });

    // Pasted permalink
    let main_window_weak = main_window.as_weak();
    let store_handle = store.clone();
    main_window.on_open_permalink(move |link| {
        let window_weak = main_window_weak.clone();
        let store = store_handle.clone();
        slint::invoke_from_event_loop(move || {
            handle_open_permalink(&window_weak, &store, link.as_str());
        })
        .unwrap();
    });
}

/// Shared handler for every user action that moves the selection. Steps the
/// selection with the given function and applies the result when it actually
/// moved.
fn handle_navigation<F>(
    window_weak: &slint::Weak<MainWindow>,
    store: &SharedStore,
    action: &str,
    step: F,
) where
    F: FnOnce(&[Pass], Selection) -> Selection,
{
    let window = match window_weak.upgrade() {
        Some(window) => window,
        None => return,
    };

    let next = {
        let guard = match store.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Store is busy, dropping {}", action);
                return;
            }
        };
        let state = guard.state();
        let current = match state.selection {
            Some(selection) => selection,
            None => {
                debug!("No selection yet, ignoring {}", action);
                return;
            }
        };
        let next = step(&state.catalog, current);
        if next == current {
            debug!("{} is a no-op at the current selection", action);
            return;
        }
        next
    };

    apply_selection(&window, store, next);
}

fn handle_open_permalink(window_weak: &slint::Weak<MainWindow>, store: &SharedStore, link: &str) {
    let link = link.trim();
    if link.is_empty() {
        return;
    }

    let window = match window_weak.upgrade() {
        Some(window) => window,
        None => return,
    };

    let resolved = {
        let guard = match store.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Store is busy, dropping permalink open");
                return;
            }
        };
        resolve_permalink(&guard.state().catalog, link)
    };

    match resolved {
        Some(selection) => {
            info!("Opening permalink {}", link);
            apply_selection(&window, store, selection);
            window.invoke_focus_keys();
        }
        None => debug!("Catalog is empty, ignoring permalink {}", link),
    }
}

/// Commit a selection: update the store, refresh the window chrome and start
/// the image loads the change implies.
pub fn apply_selection(window: &MainWindow, store: &SharedStore, selection: Selection) {
    let (display_url, prefetch_urls, cached) = {
        let mut guard = store.lock().unwrap();
        let old = guard.state().selection;
        let plan = prefetch_plan(&guard.state().catalog, old, selection);
        guard.dispatch(Action::SetSelection(selection));
        update_window(window, guard.state());

        let state = guard.state();
        let pass = match selection.selected_pass(&state.catalog) {
            Some(pass) => pass,
            None => return,
        };
        let enhancement = match selection.selected_enhancement(&state.catalog) {
            Some(enhancement) => enhancement,
            None => return,
        };

        let display_url = image_url(guard.base_url(), pass, enhancement);
        let prefetch_urls: Vec<String> = plan
            .iter()
            .filter_map(|(index, target)| {
                state
                    .catalog
                    .get(*index)
                    .map(|pass| image_url(guard.base_url(), pass, target))
            })
            .filter(|url| *url != display_url && guard.cached_image(url).is_none())
            .collect();
        let cached = guard.cached_image(&display_url).cloned();

        (display_url, prefetch_urls, cached)
    };

    match cached {
        Some(image_data) => {
            debug!("Showing {} from the cache", display_url);
            show_image(window, &image_data);
        }
        None => fetch_display_image(window.as_weak(), store.clone(), selection, display_url),
    }

    if !prefetch_urls.is_empty() {
        spawn_prefetch(store.clone(), prefetch_urls);
    }
}

/// Refresh every window property derived from the current state
pub fn update_window(window: &MainWindow, state: &ViewerState) {
    let selection = match state.selection {
        Some(selection) => selection,
        None => return,
    };
    let pass = match selection.selected_pass(&state.catalog) {
        Some(pass) => pass,
        None => return,
    };
    let enhancement = match selection.selected_enhancement(&state.catalog) {
        Some(enhancement) => enhancement,
        None => return,
    };

    let mut label = enhancement.label();
    if enhancement.precip {
        label.push_str(" + precip");
    }
    if enhancement.map {
        label.push_str(" + map");
    }

    window.set_window_title(pass.title().into());
    window.set_pass_title(pass.title().into());
    window.set_pass_counter(format!("{} / {}", selection.pass + 1, state.catalog.len()).into());
    window.set_enhancement_label(label.into());
    window.set_permalink(encode_permalink(&state.catalog, selection).into());

    window.set_precip_checked(enhancement.precip);
    window.set_map_checked(enhancement.map);
    window.set_precip_enabled(can_toggle_precip(&state.catalog, selection));
    window.set_map_enabled(can_toggle_map(&state.catalog, selection));

    window.set_pass_prev_enabled(navigate_pass(&state.catalog, selection, -1) != selection);
    window.set_pass_next_enabled(navigate_pass(&state.catalog, selection, 1) != selection);
    window
        .set_enhancement_prev_enabled(navigate_enhancement(&state.catalog, selection, -1) != selection);
    window
        .set_enhancement_next_enabled(navigate_enhancement(&state.catalog, selection, 1) != selection);

    window.set_loading(false);
}

fn show_image(window: &MainWindow, image_data: &[u8]) {
    match decode_webp_to_slint_image(image_data) {
        Ok(slint_image) => {
            window.set_viewer_image(slint_image);
            window.set_status_message("".into());
        }
        Err(e) => {
            error!("Failed to decode enhancement image: {}", e);
            window.set_status_message("Image decode failed".into());
        }
    }
}

/// Fetch the selected image off the UI thread and show it once it arrives.
/// A result that comes back after the selection moved on only fills the
/// cache, never the screen.
fn fetch_display_image(
    window_weak: slint::Weak<MainWindow>,
    store: SharedStore,
    selection: Selection,
    url: String,
) {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let client = {
                let guard = store.lock().unwrap();
                RecordingsClient::new(guard.base_url())
            };

            match client.fetch_image(&url).await {
                Ok(image_data) => {
                    let mut guard = store.lock().unwrap();
                    guard.insert_image(url.clone(), image_data.clone());
                    let current = guard.state().selection;
                    drop(guard);

                    if current != Some(selection) {
                        debug!("Selection moved on while fetching {}, caching only", url);
                        return;
                    }

                    slint::invoke_from_event_loop(move || {
                        if let Some(window) = window_weak.upgrade() {
                            show_image(&window, &image_data);
                        }
                    })
                    .ok();
                }
                Err(e) => {
                    error!("Failed to fetch {}: {}", url, e);
                    let message = format!("Image load failed: {}", e);
                    slint::invoke_from_event_loop(move || {
                        if let Some(window) = window_weak.upgrade() {
                            window.set_status_message(message.into());
                        }
                    })
                    .ok();
                }
            }
        });
    });
}

/// Warm the image cache in the background; failures are logged and dropped
fn spawn_prefetch(store: SharedStore, urls: Vec<String>) {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let client = {
                let guard = store.lock().unwrap();
                RecordingsClient::new(guard.base_url())
            };

            debug!("Prefetching {} images", urls.len());
            let images = client.prefetch_images(&urls).await;

            let mut guard = store.lock().unwrap();
            for (url, image_data) in images {
                guard.insert_image(url, image_data);
            }
        });
    });
}

/// Fetch the pass manifest and store the catalog; a second call is a no-op
pub async fn load_catalog(store: &SharedStore) -> Result<(), Box<dyn std::error::Error>> {
    let client = {
        let guard = store.lock().unwrap();
        if !guard.state().catalog.is_empty() {
            debug!("Catalog already loaded, skipping");
            return Ok(());
        }
        RecordingsClient::new(guard.base_url())
    };

    let catalog = client.fetch_pass_list().await?;
    info!("Loaded {} satellite passes", catalog.len());

    let mut guard = store.lock().unwrap();
    guard.dispatch(Action::SetCatalog(catalog));
    Ok(())
}
