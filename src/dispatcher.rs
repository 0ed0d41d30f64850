use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::artifact::Artifact;
use crate::commands::{self, CommandContext, CommandName, Invocation, ReplySink};

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Reply {
        invocation: u64,
        artifact: Artifact,
    },
    Finished {
        invocation: u64,
        command: CommandName,
        elapsed: Duration,
        ok: bool,
    },
}

/// Runs each chat command as its own task on a worker pool. Replies of one
/// invocation arrive in handler order; different invocations may interleave.
pub struct Dispatcher {
    ctx: Arc<CommandContext>,
    pool: Option<rayon::ThreadPool>,
    tx: Sender<ChannelEvent>,
    next_id: u64,
}

impl Dispatcher {
    pub fn new(ctx: CommandContext, workers: usize, tx: Sender<ChannelEvent>) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|idx| format!("dispatch-{idx}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(error = %err, "worker pool unavailable; using plain threads");
                None
            }
        };
        Self {
            ctx: Arc::new(ctx),
            pool,
            tx,
            next_id: 1,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.ctx.prefix
    }

    /// Queues `line` if it is addressed to the bot and returns its invocation
    /// id. Other chatter is ignored.
    pub fn submit(&mut self, line: &str) -> Option<u64> {
        let invocation = Invocation::parse(line, &self.ctx.prefix)?;
        let id = self.next_id;
        self.next_id += 1;

        let ctx = Arc::clone(&self.ctx);
        let tx = self.tx.clone();
        let task = move || execute(&ctx, id, &invocation, tx);
        match &self.pool {
            Some(pool) => pool.spawn(task),
            None => {
                std::thread::spawn(task);
            }
        }
        Some(id)
    }
}

struct ChannelSink {
    invocation: u64,
    tx: Sender<ChannelEvent>,
}

impl ReplySink for ChannelSink {
    fn send(&mut self, artifact: Artifact) {
        tracing::debug!(invocation = self.invocation, reply = %artifact.summary(), "reply");
        let event = ChannelEvent::Reply {
            invocation: self.invocation,
            artifact,
        };
        if self.tx.send(event).is_err() {
            tracing::debug!(invocation = self.invocation, "channel closed; reply dropped");
        }
    }
}

fn execute(ctx: &CommandContext, id: u64, invocation: &Invocation, tx: Sender<ChannelEvent>) {
    let started = Instant::now();
    let mut sink = ChannelSink {
        invocation: id,
        tx: tx.clone(),
    };
    let result = commands::run(ctx, invocation, &mut sink);
    let elapsed = started.elapsed();

    match &result {
        Ok(()) => tracing::info!(
            invocation = id,
            command = %invocation.command,
            elapsed_ms = elapsed.as_millis() as u64,
            "command finished"
        ),
        Err(commands::CommandError::Render(err)) => tracing::error!(
            invocation = id,
            command = %invocation.command,
            error = %format_args!("{err:#}"),
            "rendering failed"
        ),
        Err(err) => tracing::warn!(
            invocation = id,
            command = %invocation.command,
            error = %err,
            "command failed"
        ),
    }

    let _ = tx.send(ChannelEvent::Finished {
        invocation: id,
        command: invocation.command,
        elapsed,
        ok: result.is_ok(),
    });
}
