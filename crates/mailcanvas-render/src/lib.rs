//! Terminal rendering for threads and drafts: column-accurate text helpers,
//! fixed-width panels built on them, and the list and detail views.

mod panel_mod;
mod text_mod;
mod transcript_mod;
mod views_mod;

pub use panel_mod::{DEFAULT_PANEL_WIDTH, MAX_PANEL_WIDTH, MIN_PANEL_WIDTH, Panel};
pub use text_mod::{char_width, display_width, truncate, wrap};
pub use transcript_mod::{Role, Turn, format_thread_transcript, initial_turns, revision_turns};
pub use views_mod::{
    DRAFT_HINT, DetailMode, Progress, RenderConfig, render_draft_panel, render_thread_detail,
    render_thread_list,
};
