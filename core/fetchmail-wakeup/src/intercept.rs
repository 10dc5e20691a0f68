//! Interception adapter between an IMAP server's command table and the engine.
//!
//! Two host shapes are supported:
//!
//! - **Daisy-chain**: [`WakeInterceptor::install`] swaps the handlers of the
//!   tracked commands in a [`CommandTable`] for wrappers that wake fetchmail
//!   and then call the original handler. [`WakeInterceptor::uninstall`] puts
//!   the originals back.
//! - **Hook**: the host calls [`WakeInterceptor::on_command_start`] before
//!   every command and runs the real handler itself.
//!
//! Either way the real command always runs, whatever the wake outcome.

use crate::config::{self, TrackedCommands};
use crate::engine::{WakeDecision, WakeEngine};
use crate::settings::SettingsLookup;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One client command as seen by the host.
pub struct CommandContext<'a> {
    pub name: &'a str,
    pub settings: &'a dyn SettingsLookup,
}

/// A host command handler. Returns true when the command has finished.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, ctx: &CommandContext<'_>) -> bool;
}

/// The host's table of command handlers, keyed by upper-cased name.
#[derive(Default, Clone)]
pub struct CommandTable {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `name`, returning the handler it replaced.
    pub fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.insert(name.to_ascii_uppercase(), handler)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.remove(&name.to_ascii_uppercase())
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&name.to_ascii_uppercase()).cloned()
    }

    /// Runs the handler for `ctx.name`; `None` if the command is unknown.
    pub fn dispatch(&self, ctx: &CommandContext<'_>) -> Option<bool> {
        self.find(ctx.name).map(|handler| handler.handle(ctx))
    }
}

/// Result of the hook entry point.
#[derive(Debug)]
pub struct HookOutcome {
    /// `None` when the command isn't tracked.
    pub decision: Option<WakeDecision>,
    chained: bool,
}

impl HookOutcome {
    /// True if the adapter already ran the original handler, false if the
    /// host must run it.
    pub fn continues_in_adapter(&self) -> bool {
        self.chained
    }
}

/// Wraps an original handler: wake first, then run the original.
struct ChainedHandler {
    engine: Arc<WakeEngine>,
    original: Arc<dyn CommandHandler>,
}

impl CommandHandler for ChainedHandler {
    fn handle(&self, ctx: &CommandContext<'_>) -> bool {
        let (outcome, finished) = chain(&self.engine, ctx, self.original.as_ref());
        debug!(
            command = ctx.name,
            decision = ?outcome.decision,
            chained = outcome.continues_in_adapter(),
            "intercepted command"
        );
        finished
    }
}

/// Wakes for `ctx`, then runs `original`. Returns the outcome together with
/// the original handler's result.
fn chain(
    engine: &WakeEngine,
    ctx: &CommandContext<'_>,
    original: &dyn CommandHandler,
) -> (HookOutcome, bool) {
    let decision = engine.on_command_start(ctx.name, ctx.settings);
    let finished = original.handle(ctx);
    let outcome = HookOutcome {
        decision: Some(decision),
        chained: true,
    };
    (outcome, finished)
}

pub struct WakeInterceptor {
    engine: Arc<WakeEngine>,
    tracked: TrackedCommands,
    saved: Vec<(String, Arc<dyn CommandHandler>)>,
}

impl WakeInterceptor {
    /// Uses the default tracked commands for daisy-chain installs.
    pub fn new(engine: Arc<WakeEngine>) -> Self {
        Self::with_commands(engine, TrackedCommands::default())
    }

    /// Uses an explicit tracked command set, fixed for the lifetime of an install.
    pub fn with_commands(engine: Arc<WakeEngine>, tracked: TrackedCommands) -> Self {
        Self {
            engine,
            tracked,
            saved: Vec::new(),
        }
    }

    pub fn is_installed(&self) -> bool {
        !self.saved.is_empty()
    }

    /// Wraps each tracked command present in `table`.
    ///
    /// Commands the host doesn't know are skipped. Installing twice is a no-op.
    pub fn install(&mut self, table: &mut CommandTable) {
        if self.is_installed() {
            warn!("fetchmail wake-up interceptor already installed");
            return;
        }

        for name in self.tracked.iter() {
            let Some(original) = table.find(name) else {
                debug!(command = name, "command not registered; not intercepting");
                continue;
            };
            let wrapper = ChainedHandler {
                engine: Arc::clone(&self.engine),
                original: Arc::clone(&original),
            };
            table.register(name, Arc::new(wrapper));
            self.saved.push((name.to_string(), original));
        }
    }

    /// Restores the handlers replaced by [`install`](Self::install).
    pub fn uninstall(&mut self, table: &mut CommandTable) {
        for (name, original) in self.saved.drain(..) {
            table.register(&name, original);
        }
    }

    /// Daisy-chain entry point for hosts that keep their own handler table.
    ///
    /// Wakes for `ctx` and then runs `original`, returning the outcome (with
    /// [`HookOutcome::continues_in_adapter`] true) and the handler's result.
    pub fn chain_command(
        &self,
        ctx: &CommandContext<'_>,
        original: &dyn CommandHandler,
    ) -> (HookOutcome, bool) {
        chain(&self.engine, ctx, original)
    }

    /// Hook entry point, called before every client command.
    ///
    /// The tracked set is resolved from this session's settings on each call.
    /// The host always continues to the real handler afterwards.
    pub fn on_command_start(&self, ctx: &CommandContext<'_>) -> HookOutcome {
        let tracked = config::tracked_commands(ctx.settings);
        let decision = tracked
            .matching(ctx.name)
            .map(|_| self.engine.on_command_start(ctx.name, ctx.settings));

        HookOutcome {
            decision,
            chained: false,
        }
    }
}
