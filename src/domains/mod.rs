//! Built-in typed settings domains.
//!
//! Each submodule holds one domain: its document options struct and the
//! schema mapping those options onto preference keys. Domains run in the
//! order they are registered here.

pub mod desktop;
pub mod dock;
pub mod finder;
pub mod keyboard;
pub mod menubar;
pub mod mission_control;
pub mod mouse;
pub mod safari;
pub mod screenshots;
pub mod trackpad;

pub use desktop::DesktopOptions;
pub use dock::DockOptions;
pub use finder::FinderOptions;
pub use keyboard::KeyboardOptions;
pub use menubar::MenubarOptions;
pub use mission_control::MissionControlOptions;
pub use mouse::MouseOptions;
pub use safari::SafariOptions;
pub use screenshots::ScreenshotOptions;
pub use trackpad::TrackpadOptions;

use crate::Result;
use crate::registry::Registry;

/// Registry holding every built-in domain.
pub fn builtin_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    for schema in [
        dock::schema(),
        finder::schema(),
        desktop::schema(),
        safari::schema(),
        screenshots::schema(),
        menubar::schema(),
        mouse::schema(),
        trackpad::schema(),
        keyboard::schema(),
        mission_control::schema(),
    ] {
        registry.register(schema)?;
    }
    Ok(registry)
}
