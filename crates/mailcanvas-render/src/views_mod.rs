use log::debug;

use mailcanvas_core::{
    Message, Participant, Thread, ThreadRecord, format_date, format_participants,
};

use crate::panel_mod::{DEFAULT_PANEL_WIDTH, Panel};
use crate::text_mod::{truncate, wrap};

pub const DRAFT_HINT: &str = "\"approve\" to save draft | give feedback to revise";
const EMPTY_LIST: &str = "No emails to respond to";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub panel_width: usize,
    /// When the latest sender matches this address the thread is shown as
    /// awaiting a reply from the other side.
    pub own_address: Option<String>,
    pub preview_chars: usize,
    pub subject_max: usize,
    pub id_prefix: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            panel_width: DEFAULT_PANEL_WIDTH,
            own_address: None,
            preview_chars: 300,
            subject_max: 60,
            id_prefix: 20,
        }
    }
}

impl RenderConfig {
    pub fn panel(&self) -> Panel {
        Panel::new(self.panel_width)
    }

    fn is_own(&self, sender: Option<&Participant>) -> bool {
        let (Some(own), Some(sender)) = (self.own_address.as_deref(), sender) else {
            return false;
        };
        let own = own.trim().to_lowercase();
        !own.is_empty() && sender.email.to_lowercase().contains(&own)
    }
}

/// Where the thread sits in a batch review and how the batch is going.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub index: Option<usize>,
    pub total: Option<usize>,
    pub drafted: usize,
    pub skipped: usize,
}

impl Progress {
    fn position(&self) -> String {
        match (self.index, self.total) {
            (Some(index), Some(total)) if index > 0 && total > 0 => format!(" {index}/{total}:"),
            _ => String::new(),
        }
    }

    fn counts(&self) -> String {
        let mut parts = Vec::new();
        if self.drafted > 0 {
            parts.push(format!("{} drafted", self.drafted));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("  [{}]", parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMode {
    /// Every message, oldest first.
    Full,
    /// Latest message preview plus the draft panel.
    Abbreviated,
}

impl DetailMode {
    pub fn for_draft(draft: Option<&str>) -> Self {
        match draft {
            Some(text) if !text.trim().is_empty() => Self::Abbreviated,
            _ => Self::Full,
        }
    }
}

fn id_prefix(id: &str, len: usize) -> String {
    if id.chars().count() > len {
        format!("{}...", id.chars().take(len).collect::<String>())
    } else {
        id.to_string()
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}

fn sender_label(message: &Message) -> &str {
    message.sender().map(Participant::label).unwrap_or("Unknown")
}

pub fn render_thread_list(threads: &[ThreadRecord], config: &RenderConfig) -> Vec<String> {
    let panel = config.panel();
    let mut lines = vec![panel.top()];
    if threads.is_empty() {
        lines.push(panel.line(EMPTY_LIST));
        lines.push(panel.bottom());
        return lines;
    }

    lines.push(panel.line(&format!(
        "📧 EMAILS TO RESPOND ({} threads)",
        threads.len()
    )));
    lines.push(panel.separator());
    for (idx, thread) in threads.iter().enumerate() {
        let subject = thread
            .subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("No subject");
        let latest = thread.latest_draft_or_message.as_ref();
        let sender = latest.and_then(|msg| msg.from.first());
        let from = sender.map(Participant::label).unwrap_or("Unknown");
        let date = latest
            .map(|msg| format_date(msg.date.unwrap_or(0)))
            .unwrap_or_default();
        let icon = if config.is_own(sender) { "⏳" } else { "📩" };

        lines.push(panel.empty_line());
        lines.push(panel.line(&format!(
            "{icon} [{}] {}",
            idx + 1,
            truncate(subject, config.subject_max)
        )));
        lines.push(panel.line(&format!("   From: {from} | {date}")));
        lines.push(panel.line(&format!(
            "   {} messages | ID: {}",
            thread.message_count(),
            id_prefix(&thread.id, config.id_prefix)
        )));
    }
    lines.push(panel.empty_line());
    lines.push(panel.separator());
    lines.push(panel.line("Pipe a thread bundle to `mailcanvas thread` to open it"));
    lines.push(panel.bottom());
    debug!("rendered list of {} threads", threads.len());
    lines
}

/// Lines for one thread. With a non-blank `draft` the thread collapses to a
/// preview of the latest message followed by the draft panel.
pub fn render_thread_detail(
    thread: &Thread,
    draft: Option<&str>,
    progress: &Progress,
    config: &RenderConfig,
) -> Vec<String> {
    let mode = DetailMode::for_draft(draft);
    debug!(
        "rendering thread {} ({} messages) in {:?} mode",
        thread.id,
        thread.len(),
        mode
    );
    match (mode, draft) {
        (DetailMode::Abbreviated, Some(draft)) => {
            let mut lines = render_abbreviated(thread, progress, config);
            lines.push(String::new());
            lines.extend(render_draft_panel(draft, config));
            lines
        }
        _ => render_full(thread, progress, config),
    }
}

fn render_full(thread: &Thread, progress: &Progress, config: &RenderConfig) -> Vec<String> {
    let panel = config.panel();
    let body_width = panel.inner_width().saturating_sub(2);
    let total = thread.len();
    let mut lines = vec![panel.top()];
    lines.push(panel.line(&format!(
        "📧 THREAD:{} {}{}",
        progress.position(),
        truncate(&thread.subject, config.subject_max),
        progress.counts()
    )));
    lines.push(panel.line(&format!(
        "{total} messages | Latest: {}",
        format_date(thread.latest().date)
    )));

    for (idx, message) in thread.messages().iter().enumerate() {
        let tag = if idx + 1 == total {
            "LATEST".to_string()
        } else {
            format!("[{}/{}]", idx + 1, total)
        };
        lines.push(panel.separator());
        lines.push(panel.line(&format!("{tag} From: {}", format_participants(&message.from))));
        lines.push(panel.line(&format!("To: {}", format_participants(&message.to))));
        if !message.cc.is_empty() {
            lines.push(panel.line(&format!("CC: {}", format_participants(&message.cc))));
        }
        lines.push(panel.line(&format!("Date: {}", format_date(message.date))));
        lines.push(panel.empty_line());
        let body = wrap(&message.body_text, body_width);
        lines.extend(panel.lines(&body));
        lines.push(panel.empty_line());
    }
    lines.push(panel.bottom());
    lines
}

fn render_abbreviated(thread: &Thread, progress: &Progress, config: &RenderConfig) -> Vec<String> {
    let panel = config.panel();
    let latest = thread.latest();
    let mut lines = vec![panel.top()];
    lines.push(panel.line(&format!(
        "📧 ORIGINAL:{} {}{}",
        progress.position(),
        truncate(&thread.subject, config.subject_max),
        progress.counts()
    )));
    lines.push(panel.line(&format!(
        "From: {} | {}",
        sender_label(latest),
        format_date(latest.date)
    )));
    lines.push(panel.separator());
    lines.push(panel.empty_line());
    let body = wrap(
        &preview(&latest.body_text, config.preview_chars),
        panel.inner_width().saturating_sub(2),
    );
    lines.extend(panel.lines(&body));
    lines.push(panel.empty_line());
    lines.push(panel.bottom());
    lines
}

pub fn render_draft_panel(draft: &str, config: &RenderConfig) -> Vec<String> {
    let panel = config.panel();
    let mut lines = vec![panel.top()];
    lines.push(panel.line("✏️  YOUR DRAFT"));
    lines.push(panel.separator());
    lines.push(panel.empty_line());
    let body = wrap(draft, panel.inner_width().saturating_sub(2));
    lines.extend(panel.lines(&body));
    lines.push(panel.empty_line());
    lines.push(panel.separator());
    lines.push(panel.line(DRAFT_HINT));
    lines.push(panel.bottom());
    lines
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use mailcanvas_core::{Message, Participant, Thread, ThreadRecord};
    use serde_json::json;

    use super::{
        DRAFT_HINT, DetailMode, Progress, RenderConfig, render_thread_detail, render_thread_list,
    };
    use crate::text_mod::display_width;

    fn message(from: &str, date: i64, body: &str) -> Message {
        Message {
            from: vec![Participant::new(from, "")],
            to: vec![Participant::new("me@example.com", "Me")],
            date,
            subject: "Project".to_string(),
            body_text: body.to_string(),
            ..Message::default()
        }
    }

    fn three_message_thread() -> anyhow::Result<Thread> {
        let thread = Thread::new(
            "thread_abc",
            "Project kickoff",
            vec![
                message("ann@example.com", 100, "First message"),
                message("bob@example.com", 200, "Second message"),
                message("ann@example.com", 300, "Third message with 😀 emoji"),
            ],
        )?;
        Ok(thread)
    }

    fn records(value: serde_json::Value) -> anyhow::Result<Vec<ThreadRecord>> {
        Ok(serde_json::from_value(value)?)
    }

    fn assert_boxed(lines: &[String], width: usize) {
        for line in lines.iter().filter(|line| !line.is_empty()) {
            assert_eq!(display_width(line), width, "{line:?}");
        }
    }

    #[test]
    fn empty_list_has_three_lines() {
        let lines = render_thread_list(&[], &RenderConfig::default());
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("No emails to respond to"));
        assert_boxed(&lines, 100);
    }

    #[test]
    fn list_marks_threads_awaiting_reply() -> anyhow::Result<()> {
        let threads = records(json!([
            {
                "id": "thread_0123456789abcdefghijklmnop",
                "subject": "Quarterly numbers",
                "message_ids": ["a", "b", "c"],
                "latest_draft_or_message": {
                    "from": [{"email": "Me@Example.com", "name": "Me"}],
                    "date": 1704067200
                }
            },
            {
                "id": "short",
                "subject": null,
                "message_ids": ["a"],
                "latest_draft_or_message": {"from": [{"email": "ann@example.com"}]}
            }
        ]))?;
        let config = RenderConfig {
            own_address: Some("me@example.com".to_string()),
            ..RenderConfig::default()
        };
        let lines = render_thread_list(&threads, &config);
        assert_boxed(&lines, 100);
        let text = lines.join("\n");
        assert!(text.contains("(2 threads)"));
        assert!(text.contains("⏳ [1] Quarterly numbers"));
        assert!(text.contains("📩 [2] No subject"));
        assert!(text.contains("From: ann@example.com | Unknown"));
        assert!(text.contains("3 messages | ID: thread_0123456789abc..."));
        assert!(text.contains("ID: short "));
        Ok(())
    }

    #[test]
    fn list_truncates_long_subjects() -> anyhow::Result<()> {
        let threads = records(json!([{"id": "t", "subject": "s".repeat(200)}]))?;
        let lines = render_thread_list(&threads, &RenderConfig::default());
        let row = lines.iter().find(|line| line.contains("[1]")).context("no subject row")?;
        assert!(row.contains(&format!("{}...", "s".repeat(57))));
        assert!(!row.contains(&"s".repeat(58)));
        Ok(())
    }

    #[test]
    fn full_view_lists_every_message() -> anyhow::Result<()> {
        let thread = three_message_thread()?;
        let lines = render_thread_detail(&thread, None, &Progress::default(), &RenderConfig::default());
        assert_boxed(&lines, 100);
        let text = lines.join("\n");
        assert!(text.contains("📧 THREAD: Project kickoff"));
        assert!(text.contains("[1/3] From: ann@example.com"));
        assert!(text.contains("[2/3] From: bob@example.com"));
        assert!(text.contains("LATEST From: ann@example.com"));
        assert!(text.contains("To: Me <me@example.com>"));
        assert!(text.find("First message") < text.find("Third message"));
        assert!(!text.contains(DRAFT_HINT));
        Ok(())
    }

    #[test]
    fn draft_collapses_thread_to_preview() -> anyhow::Result<()> {
        let thread = three_message_thread()?;
        let progress = Progress {
            index: Some(2),
            total: Some(9),
            drafted: 3,
            skipped: 1,
        };
        let draft = "Hi Ann,\n\nThanks, that works.\n\n\nBest,\nMe";
        let lines = render_thread_detail(&thread, Some(draft), &progress, &RenderConfig::default());
        assert_boxed(&lines, 100);
        let text = lines.join("\n");
        assert!(text.contains("📧 ORIGINAL: 2/9: Project kickoff  [3 drafted, 1 skipped]"));
        assert!(text.contains("From: ann@example.com"));
        assert!(text.contains("Third message"));
        assert!(!text.contains("First message"));
        assert!(text.contains("✏️  YOUR DRAFT"));
        assert!(text.contains(DRAFT_HINT));
        assert_eq!(lines.iter().filter(|line| line.is_empty()).count(), 1);
        Ok(())
    }

    #[test]
    fn draft_body_keeps_blank_lines() -> anyhow::Result<()> {
        let thread = three_message_thread()?;
        let lines = render_thread_detail(
            &thread,
            Some("Line one\n\n\nLine two"),
            &Progress::default(),
            &RenderConfig::default(),
        );
        let start = lines.iter().position(|line| line.contains("Line one")).context("no draft row")?;
        assert!(lines[start + 1].trim_matches(|c| c == '│' || c == ' ').is_empty());
        assert!(lines[start + 2].trim_matches(|c| c == '│' || c == ' ').is_empty());
        assert!(lines[start + 3].contains("Line two"));
        Ok(())
    }

    #[test]
    fn preview_is_cut_to_configured_chars() -> anyhow::Result<()> {
        let long_body = "word ".repeat(200);
        let thread = Thread::new("t", "Long", vec![message("a@x.com", 1, &long_body)])?;
        let config = RenderConfig {
            preview_chars: 20,
            ..RenderConfig::default()
        };
        let lines = render_thread_detail(&thread, Some("ok"), &Progress::default(), &config);
        let text = lines.join("\n");
        assert!(text.contains("word word word word..."));
        assert!(!text.contains("word word word word word"));
        Ok(())
    }

    #[test]
    fn blank_draft_renders_full_view() {
        assert_eq!(DetailMode::for_draft(Some("  \n")), DetailMode::Full);
        assert_eq!(DetailMode::for_draft(None), DetailMode::Full);
        assert_eq!(DetailMode::for_draft(Some("x")), DetailMode::Abbreviated);
    }

    #[test]
    fn progress_header_is_optional() -> anyhow::Result<()> {
        let thread = three_message_thread()?;
        let lines = render_thread_detail(
            &thread,
            None,
            &Progress {
                index: Some(1),
                total: Some(4),
                ..Progress::default()
            },
            &RenderConfig::default(),
        );
        assert!(lines[1].contains("THREAD: 1/4: Project kickoff"));
        assert!(!lines[1].contains('['));
        Ok(())
    }

    #[test]
    fn narrow_panels_stay_aligned() -> anyhow::Result<()> {
        let thread = three_message_thread()?;
        let config = RenderConfig {
            panel_width: 40,
            ..RenderConfig::default()
        };
        let draft = "long draft text ".repeat(20);
        let lines = render_thread_detail(&thread, Some(draft.as_str()), &Progress::default(), &config);
        assert_boxed(&lines, 40);
        Ok(())
    }
}
