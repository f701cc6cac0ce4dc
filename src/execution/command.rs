//! Shell invocation for command lines.

use std::process::Stdio;

use tokio::process::Command;

/// Shell interpreter that receives command lines verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    /// Interpreter executable.
    pub program: String,
    /// Arguments placed before the command line (e.g. `-c`).
    pub args: Vec<String>,
}

impl Shell {
    /// Create a shell from a program and its leading arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a shell from an argv-style list such as `["bash", "-c"]`.
    ///
    /// Returns `None` if the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// `sh -c` on Unix-like systems, `cmd /C` on Windows.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", ["/C"])
        } else {
            Self::new("sh", ["-c"])
        }
    }

    /// Build a child process command for `command_line`.
    ///
    /// Stdin is closed, both output streams are piped, and the child is
    /// killed if the handle is dropped. On Unix the child leads a new
    /// process group so termination reaches every descendant.
    pub fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        #[cfg(windows)]
        cmd.raw_arg(command_line);
        #[cfg(not(windows))]
        cmd.arg(command_line);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::platform_default()
    }
}
