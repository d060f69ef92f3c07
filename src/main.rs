// Replays a scripted navigation session against the in-memory host and prints
// the breadcrumb trail as JSON after every change.
//
// Usage: breadcrumb-history [SCRIPT.json] [SETTINGS.json]

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use breadcrumb_history_lib::{
    init_logging, HistoryEntry, HistoryTracker, InMemoryNavigator, Navigator, Settings,
};

#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Clear,
    Visit { uri: String, caption: String },
    Back,
    Forward,
    Jump { uri: String, title: String },
}

const DEFAULT_SCRIPT: &str = r#"[
    { "action": "clear" },
    { "action": "visit", "uri": "/configs", "caption": "Configs" },
    { "action": "visit", "uri": "/items", "caption": "Items" },
    { "action": "back" }
]"#;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let script_path = args.next().map(PathBuf::from);
    let settings = args
        .next()
        .map(|p| Settings::load(&PathBuf::from(p)))
        .unwrap_or_default();
    init_logging(&settings);

    let script = match &script_path {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_SCRIPT.to_string(),
    };
    let steps: Vec<Step> = serde_json::from_str(&script)?;

    let base_uri = settings.base_uri.clone().unwrap_or_else(|| "/".to_string());
    let navigator = Rc::new(InMemoryNavigator::new(base_uri));
    let tracker = HistoryTracker::with_settings(navigator.clone(), &settings);

    // Every navigation re-renders the page, which reports itself like any other render.
    let weak = tracker.downgrade();
    navigator.set_render_hook(move |_| {
        if let Some(tracker) = weak.upgrade() {
            let caption = tracker.current().map(|c| c.title().to_string()).unwrap_or_default();
            tracker.add_current_page_to_history(&caption);
        }
    });
    tracker.subscribe(|crumbs| match crumbs.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("[Demo] could not serialize breadcrumbs: {}", e),
    });

    for step in steps {
        log::debug!("[Demo] {:?}", step);
        match &step {
            Step::Clear => tracker.clear(),
            Step::Visit { uri, caption } => {
                navigator.set_location(uri);
                tracker.add_current_page_to_history(caption);
            }
            Step::Back if tracker.can_go_backward() => tracker.go_backward()?,
            Step::Forward if tracker.can_go_forward() => tracker.go_forward()?,
            Step::Back | Step::Forward => log::warn!("[Demo] {:?} ignored, nothing there", step),
            Step::Jump { uri, title } => tracker.jump_to(&HistoryEntry::new(uri, title))?,
        }
    }

    log::info!("[Demo] finished at {}", navigator.current_uri());
    Ok(())
}
