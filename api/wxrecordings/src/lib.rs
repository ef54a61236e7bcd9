pub mod client;
pub mod pass;
pub mod selection;

pub use client::RecordingsClient;
pub use pass::{image_path, image_url, parse_pass_list, Enhancement, Pass};
pub use selection::{
    can_toggle_map, can_toggle_precip, change_pass, decode_permalink, default_selection,
    encode_permalink, navigate_enhancement, navigate_pass, prefetch_plan, resolve_permalink,
    resolve_target, select_kind, toggle_map, toggle_precip, PermalinkTarget, Selection,
};
