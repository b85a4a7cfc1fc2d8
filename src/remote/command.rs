// ABOUTME: Immutable value object describing one remote shell operation.
// ABOUTME: Carries visibility and error-tolerance flags for the sequence runner.

/// One shell operation to run on the target host.
///
/// `hidden` keeps the command's output out of the user-visible log (it still
/// executes and still short-circuits the sequence on failure). `ignore_errors`
/// means a non-zero exit must not abort the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub command: String,
    pub hidden: bool,
    pub ignore_errors: bool,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            hidden: false,
            ignore_errors: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }
}

impl std::fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)
    }
}
