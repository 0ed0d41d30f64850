use std::collections::{BTreeMap, VecDeque};

use chrono::Local;

use crate::artifact::Artifact;
use crate::commands::CommandName;
use crate::dispatcher::ChannelEvent;

const MAX_LOGS: usize = 200;
const MAX_MESSAGES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    /// Images stay in memory; the console only shows what was attached.
    Attachment { filename: String, summary: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: Author,
    pub invocation: Option<u64>,
    pub at: String,
    pub body: MessageBody,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub messages: VecDeque<ChatMessage>,
    pub input: String,
    pub logs: VecDeque<String>,
    /// In-flight invocations by id.
    pub pending: BTreeMap<u64, String>,
    /// Lines scrolled up from the newest message.
    pub scroll: usize,
    pub help_overlay: bool,
    pub replies: usize,
    pub attachments: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(64),
            input: String::new(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            pending: BTreeMap::new(),
            scroll: 0,
            help_overlay: false,
            replies: 0,
            attachments: 0,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn push_message(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.scroll = 0;
    }

    /// Takes the input line and posts it as the user's message. Blank input
    /// is left alone.
    pub fn take_input(&mut self) -> Option<String> {
        let line = self.input.trim().to_string();
        self.input.clear();
        if line.is_empty() {
            return None;
        }
        self.push_message(ChatMessage {
            author: Author::User,
            invocation: None,
            at: timestamp(),
            body: MessageBody::Text(line.clone()),
        });
        Some(line)
    }

    /// Remembers that the user's latest message started invocation `id`.
    pub fn mark_submitted(&mut self, id: u64, line: &str) {
        if let Some(last) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.author == Author::User)
        {
            last.invocation = Some(id);
        }
        self.pending.insert(id, line.to_string());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Flattened transcript, oldest first, one entry per screen line.
    pub fn transcript_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for message in &self.messages {
            let who = match message.author {
                Author::User => "you",
                Author::Bot => "bot",
            };
            match &message.body {
                MessageBody::Text(text) => {
                    let mut body = text.lines();
                    let first = body.next().unwrap_or_default();
                    lines.push(format!("{} {who:>3}: {first}", message.at));
                    for rest in body {
                        lines.push(format!("{:width$}{rest}", "", width = message.at.len() + 6));
                    }
                }
                MessageBody::Attachment { summary, .. } => {
                    lines.push(format!("{} {who:>3}: [image] {summary}", message.at));
                }
            }
        }
        lines
    }

    /// The slice of `lines` visible in a pane `height` rows tall, honouring
    /// the scroll offset.
    pub fn visible_window(&self, total: usize, height: usize) -> (usize, usize) {
        let max_scroll = total.saturating_sub(height);
        let scroll = self.scroll.min(max_scroll);
        let end = total - scroll;
        (end.saturating_sub(height), end)
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

pub fn apply_event(state: &mut AppState, event: ChannelEvent) {
    match event {
        ChannelEvent::Reply {
            invocation,
            artifact,
        } => {
            state.replies += 1;
            let summary = artifact.summary();
            let body = match artifact {
                Artifact::Text(text) => MessageBody::Text(text),
                Artifact::Image { filename, .. } => {
                    state.attachments += 1;
                    MessageBody::Attachment { filename, summary }
                }
            };
            state.push_message(ChatMessage {
                author: Author::Bot,
                invocation: Some(invocation),
                at: timestamp(),
                body,
            });
        }
        ChannelEvent::Finished {
            invocation,
            command,
            elapsed,
            ok,
        } => {
            state.pending.remove(&invocation);
            if command != CommandName::Help {
                let outcome = if ok { "done" } else { "failed" };
                state.push_log(format!(
                    "[{outcome}] #{invocation} {command} in {} ms",
                    elapsed.as_millis()
                ));
            }
        }
    }
}
