use serde::Serialize;

use mailcanvas_core::{Message, Thread, format_participants, format_prompt_date};

const DRAFT_INSTRUCTIONS: &str = "You are drafting a reply to the most recent message in the email thread below.

Guidelines:
- Match the tone and formality of the conversation
- Be concise but complete
- Answer every question or request in the most recent message
- The user dictated what they want to say; capture their key points in your own words without adding commitments they did not make

Respond with a single JSON object and nothing else:
{\"to\": [{\"email\": \"...\", \"name\": \"...\"}], \"cc\": [], \"subject\": \"...\", \"body\": \"...\"}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a draft-generation conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }
}

fn format_message(message: &Message) -> String {
    let mut out = format!("From: {}\n", format_participants(&message.from));
    out.push_str(&format!("To: {}\n", format_participants(&message.to)));
    if !message.cc.is_empty() {
        out.push_str(&format!("Cc: {}\n", format_participants(&message.cc)));
    }
    out.push_str(&format!("Date: {}\n", format_prompt_date(message.date)));
    let subject = if message.subject.trim().is_empty() {
        "(no subject)"
    } else {
        message.subject.as_str()
    };
    out.push_str(&format!("Subject: {subject}\n\n"));
    out.push_str(message.body_text.trim_end());
    out
}

/// Plain-text rendering of the whole thread, oldest message first.
pub fn format_thread_transcript(thread: &Thread) -> String {
    let total = thread.len();
    let mut out = format!("=== Email Thread: {} ===\n", thread.subject);
    for (idx, message) in thread.messages().iter().enumerate() {
        out.push_str(&format!("\n--- Message {} of {} ---\n", idx + 1, total));
        out.push_str(&format_message(message));
        out.push('\n');
    }
    out
}

fn first_turn(transcript: &str, dictation: &str) -> Turn {
    Turn::user(format!(
        "{DRAFT_INSTRUCTIONS}\n\n## Email Thread to Respond To\n\n{}\n\n## User's Dictation\n\n{}\n",
        transcript.trim_end(),
        dictation.trim()
    ))
}

pub fn initial_turns(transcript: &str, dictation: &str) -> Vec<Turn> {
    vec![first_turn(transcript, dictation)]
}

/// Conversation for revising `previous_draft`: the original request, the
/// previous answer, then the feedback.
pub fn revision_turns(
    transcript: &str,
    dictation: &str,
    previous_draft: &str,
    feedback: &str,
) -> Vec<Turn> {
    vec![
        first_turn(transcript, dictation),
        Turn {
            role: Role::Assistant,
            content: previous_draft.trim().to_string(),
        },
        Turn::user(format!(
            "Revise the draft using this feedback:\n\n{}\n\nRespond with the complete revised draft as the same JSON object.",
            feedback.trim()
        )),
    ]
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use mailcanvas_core::{Message, Participant, Thread};
    use serde_json::json;

    use super::{Role, format_thread_transcript, initial_turns, revision_turns};

    fn thread() -> anyhow::Result<Thread> {
        let thread = Thread::new(
            "t1",
            "Multi",
            vec![
                Message {
                    from: vec![Participant::new("ann@example.com", "Ann")],
                    to: vec![Participant::new("me@example.com", "")],
                    cc: vec![Participant::new("cc@example.com", "")],
                    date: 1_704_153_600,
                    subject: "Re: Multi".to_string(),
                    body_text: "Second".to_string(),
                },
                Message {
                    from: vec![Participant::new("me@example.com", "")],
                    to: vec![Participant::new("ann@example.com", "Ann")],
                    date: 1_704_067_200,
                    subject: String::new(),
                    body_text: "First\n".to_string(),
                    ..Message::default()
                },
            ],
        )?;
        Ok(thread)
    }

    #[test]
    fn transcript_lists_messages_in_order() -> anyhow::Result<()> {
        let text = format_thread_transcript(&thread()?);
        assert!(text.starts_with("=== Email Thread: Multi ===\n"));
        let first = text.find("--- Message 1 of 2 ---").context("first block")?;
        let second = text.find("--- Message 2 of 2 ---").context("second block")?;
        assert!(first < second);
        assert!(text[first..second].contains("Subject: (no subject)\n\nFirst\n"));
        assert!(text[first..second].contains("To: Ann <ann@example.com>"));
        assert!(!text[first..second].contains("Cc:"));
        assert!(text[second..].contains("Cc: cc@example.com"));
        assert!(text[second..].contains("From: Ann <ann@example.com>"));
        Ok(())
    }

    #[test]
    fn initial_request_carries_thread_and_dictation() -> anyhow::Result<()> {
        let transcript = format_thread_transcript(&thread()?);
        let turns = initial_turns(&transcript, "tell her yes, friday works");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        let content = turns[0].content.to_lowercase();
        assert!(content.contains("capture their key points"));
        assert!(content.contains("=== email thread: multi ==="));
        assert!(content.contains("tell her yes, friday works"));
        Ok(())
    }

    #[test]
    fn revision_appends_previous_draft_and_feedback() -> anyhow::Result<()> {
        let turns = revision_turns("thread", "dictation", "{\"body\": \"v1\"}\n", "make it shorter");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "{\"body\": \"v1\"}");
        assert!(turns[2].content.contains("make it shorter"));
        assert_eq!(
            serde_json::to_value(&turns[1])?,
            json!({"role": "assistant", "content": "{\"body\": \"v1\"}"})
        );
        Ok(())
    }
}
