//! Terminal presentation of the core view models.
//!
//! Everything here produces ratatui [`Line`](ratatui::text::Line)s; the CLI
//! prints them, and a full-screen host can place them in widgets.
//!
//! - [`markdown`]: the pulldown-cmark walker and its pluggable handlers.
//! - [`answer`], [`sidebar`], [`user_menu`]: one renderer per component.
//! - [`theme`] and [`highlight`]: styles and syntect code highlighting.

pub mod answer;
pub mod highlight;
pub mod markdown;
pub mod sidebar;
pub mod theme;
pub mod user_menu;
