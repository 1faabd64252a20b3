use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use mailcanvas_content::thread_from_bundle;
use mailcanvas_core::{
    MessageRecord, Thread, ThreadBundle, ThreadRecord, load_previous_draft,
    parse_draft_response, plan_label_update, save_draft,
};
use mailcanvas_render::{
    MAX_PANEL_WIDTH, MIN_PANEL_WIDTH, Progress, RenderConfig, format_thread_transcript,
    initial_turns, render_thread_detail, render_thread_list, revision_turns,
};

use super::{Cli, CliCommand, DraftCommand, ThreadCmd};

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn read_json<T: DeserializeOwned>(path: Option<&Path>, what: &str) -> Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid {what} JSON"))
}

fn read_thread(path: Option<&Path>) -> Result<Thread> {
    let bundle: ThreadBundle = read_json(path, "thread bundle")?;
    let thread = thread_from_bundle(&bundle)
        .with_context(|| format!("cannot show thread {:?}", bundle.thread.id))?;
    Ok(thread)
}

fn checked_panel_width(requested: usize) -> usize {
    let width = requested.clamp(MIN_PANEL_WIDTH, MAX_PANEL_WIDTH);
    if width != requested {
        warn!(
            "panel width {} is outside {}..={}; using {}",
            requested, MIN_PANEL_WIDTH, MAX_PANEL_WIDTH, width
        );
    }
    width
}

fn print_lines(lines: &[String]) -> Result<()> {
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_thread(cmd: ThreadCmd, config: &RenderConfig) -> Result<()> {
    let thread = read_thread(cmd.input.as_deref())?;
    let draft = match (cmd.draft, cmd.draft_file) {
        (Some(text), _) => Some(text),
        (None, Some(path)) => Some(load_previous_draft(&path)?.body),
        (None, None) => None,
    };
    let progress = Progress {
        index: cmd.index,
        total: cmd.total,
        drafted: cmd.drafted,
        skipped: cmd.skipped,
    };
    print_lines(&render_thread_detail(
        &thread,
        draft.as_deref(),
        &progress,
        config,
    ))
}

fn run_draft(command: DraftCommand) -> Result<()> {
    match command {
        DraftCommand::Save { input, output } => {
            let response = read_input(Some(input.as_path()))?;
            let draft = parse_draft_response(&response);
            save_draft(&output, &draft)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("saved draft to {}", output.display());
            println!("Saved draft to {}", output.display());
            Ok(())
        }
        DraftCommand::Show { file } => {
            let draft = load_previous_draft(&file)?;
            print!("{}", draft.to_json_pretty()?);
            Ok(())
        }
        DraftCommand::Payload { file, reply_to } => {
            let draft = load_previous_draft(&file)?;
            print_json(&draft.reply_payload(&reply_to))
        }
        DraftCommand::Turns {
            input,
            dictation,
            previous_draft,
            feedback,
        } => {
            let transcript = format_thread_transcript(&read_thread(input.as_deref())?);
            let turns = match (previous_draft, feedback) {
                (Some(path), Some(feedback)) => {
                    let previous = load_previous_draft(&path)?.to_json_pretty()?;
                    revision_turns(&transcript, &dictation, &previous, &feedback)
                }
                _ => initial_turns(&transcript, &dictation),
            };
            debug!("built {} turns", turns.len());
            print_json(&turns)
        }
    }
}

pub(crate) fn run_cli(cli: Cli, mut config: RenderConfig) -> Result<()> {
    if let Some(width) = cli.width {
        config.panel_width = width;
    }
    config.panel_width = checked_panel_width(config.panel_width);
    debug!("render config: {:?}", config);

    match cli.command {
        CliCommand::Threads(cmd) => {
            let threads: Vec<ThreadRecord> = read_json(cmd.input.as_deref(), "thread list")?;
            print_lines(&render_thread_list(&threads, &config))
        }
        CliCommand::Thread(cmd) => run_thread(cmd, &config),
        CliCommand::Draft(cmd) => run_draft(cmd.command),
        CliCommand::Transcript(cmd) => {
            let thread = read_thread(cmd.input.as_deref())?;
            print!("{}", format_thread_transcript(&thread));
            Ok(())
        }
        CliCommand::Labels(cmd) => {
            let record: MessageRecord = read_json(cmd.input.as_deref(), "message")?;
            let plan = plan_label_update(&record.labels, &record.folders, &cmd.add, &cmd.remove);
            print_json(&plan)
        }
    }
}

#[cfg(test)]
mod tests {
    use mailcanvas_core::{ThreadRecord, load_previous_draft};
    use mailcanvas_render::{MAX_PANEL_WIDTH, MIN_PANEL_WIDTH};
    use serde_json::{Value, json};

    use super::{DraftCommand, checked_panel_width, read_input, read_json, read_thread, run_draft};

    #[test]
    fn reads_thread_bundle_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bundle.json");
        std::fs::write(
            &path,
            r#"{"thread": {"id": "t1", "subject": "Hello"},
                "messages": [{"from": "a@x.com", "date": 10, "body": "<p>Hi</p>"}]}"#,
        )?;
        let thread = read_thread(Some(path.as_path()))?;
        assert_eq!(thread.subject, "Hello");
        assert_eq!(thread.latest().body_text, "Hi");
        Ok(())
    }

    #[test]
    fn empty_bundle_is_reported() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, r#"{"thread": {"id": "t1"}, "messages": []}"#)?;
        let err = read_thread(Some(path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("thread has no messages"));
        Ok(())
    }

    #[test]
    fn missing_and_invalid_inputs_carry_context() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.json");
        let err = read_input(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json")?;
        let err = read_json::<Vec<ThreadRecord>>(Some(bad.as_path()), "thread list").unwrap_err();
        assert_eq!(err.to_string(), "invalid thread list JSON");
        Ok(())
    }

    #[test]
    fn panel_width_outside_range_is_clamped() {
        assert_eq!(checked_panel_width(30), MIN_PANEL_WIDTH);
        assert_eq!(checked_panel_width(0), MIN_PANEL_WIDTH);
        assert_eq!(checked_panel_width(500), MAX_PANEL_WIDTH);
        assert_eq!(checked_panel_width(MIN_PANEL_WIDTH), MIN_PANEL_WIDTH);
        assert_eq!(checked_panel_width(100), 100);
    }

    #[test]
    fn saving_draft_over_its_input_rewrites_in_place() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("draft.json");
        std::fs::write(
            &path,
            "```json\n{\"to\": \"ann@example.com\", \"subject\": \"Re: Hi\", \"body\": \"Sure\", \"tone\": \"warm\"}\n```\n",
        )?;

        run_draft(DraftCommand::Save {
            input: path.clone(),
            output: path.clone(),
        })?;

        let written = std::fs::read_to_string(&path)?;
        assert!(written.ends_with('\n'));
        let value: Value = serde_json::from_str(&written)?;
        assert_eq!(value["to"], json!([{"email": "ann@example.com", "name": ""}]));
        assert_eq!(value["subject"], "Re: Hi");
        assert_eq!(value["body"], "Sure");
        assert_eq!(value["tone"], "warm");
        assert_eq!(load_previous_draft(&path)?.body, "Sure");

        let names: Vec<String> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["draft.json".to_string()]);
        Ok(())
    }
}
