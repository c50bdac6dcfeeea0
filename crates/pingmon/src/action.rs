use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

/// An external action configured for probe transitions: either an inline
/// shell command line or a path to a script. The distinction is resolved by
/// the caller at configuration time; both become one detached process here.
#[derive(Debug, Clone)]
pub enum ActionSpec {
    Command(String),
    Script(PathBuf),
}

impl ActionSpec {
    fn command(&self) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = Command::new("sh");
            if matches!(self, ActionSpec::Command(_)) {
                c.arg("-c");
            }
            c
        };

        match self {
            ActionSpec::Command(line) => cmd.arg(line),
            ActionSpec::Script(path) => cmd.arg(path),
        };

        cmd
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpec::Command(line) => write!(f, "{line}"),
            ActionSpec::Script(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fires configured external actions without ever blocking or failing the
/// monitoring loop. Children run detached with stdio nulled; a reaper task
/// logs non-zero exits, and a spawn failure is logged and swallowed.
#[derive(Debug, Default)]
pub struct ActionDispatcher {
    success_action: Option<ActionSpec>,
    failure_action: Option<ActionSpec>,
}

impl ActionDispatcher {
    pub fn new(success_action: Option<ActionSpec>, failure_action: Option<ActionSpec>) -> Self {
        Self { success_action, failure_action }
    }

    /// Fire the configured success action, if any.
    pub fn fire_success(&self) {
        if let Some(spec) = &self.success_action {
            Self::dispatch("success", spec);
        }
    }

    /// Fire the configured failure action, if any.
    pub fn fire_failure(&self) {
        if let Some(spec) = &self.failure_action {
            Self::dispatch("failure", spec);
        }
    }

    fn dispatch(trigger: &'static str, spec: &ActionSpec) {
        let mut cmd = spec.command();
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        match cmd.spawn() {
            Ok(mut child) => {
                debug!("dispatched {trigger} action: {spec}");
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            warn!("{trigger} action exited with {status}");
                        }
                        Err(e) => warn!("failed to reap {trigger} action: {e}"),
                        Ok(_) => {}
                    }
                });
            }
            Err(e) => warn!("failed to start {trigger} action: {e}"),
        }
    }
}
