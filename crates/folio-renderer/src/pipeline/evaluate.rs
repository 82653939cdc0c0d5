//! Live evaluation of code blocks.
//!
//! Only blocks whose fence carries the `live` flag are evaluated. Output is
//! attached as plain text in a [`Node::LiveCode`]; the serializer escapes it.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::node::{Node, NodeError};

use super::highlight::Language;
use super::{StageContext, rewrite};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the source of a live code block and returns its textual output.
///
/// Implementations must treat `source` as untrusted.
pub trait Evaluator: Send + Sync {
    /// Evaluate `source` written in `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the language is not supported, the program fails
    /// or resource limits are exceeded.
    fn evaluate(&self, language: &str, source: &str) -> Result<String, EvalError>;
}

/// Evaluation failure.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("no interpreter configured for `{0}`")]
    UnsupportedLanguage(String),
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("output exceeded {0} bytes")]
    OutputLimit(usize),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Evaluates code by piping it to a configured interpreter.
///
/// The child runs in a fresh temporary directory with an empty environment
/// (only `PATH` is kept), is killed when the timeout expires, and its stdout
/// is capped at `max_output_bytes`.
#[derive(Clone, Debug)]
pub struct CommandEvaluator {
    commands: BTreeMap<String, Vec<String>>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl CommandEvaluator {
    /// Create an evaluator from a language → argv table.
    #[must_use]
    pub fn new(
        commands: BTreeMap<String, Vec<String>>,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            commands,
            timeout,
            max_output_bytes,
        }
    }

    /// Find the command for a fence language.
    ///
    /// Falls back to any configured key naming the same highlight language,
    /// so `javascript` uses a command configured for `js`.
    fn command(&self, language: &str) -> Option<&[String]> {
        if let Some(argv) = self.commands.get(language) {
            return Some(argv);
        }
        let wanted = Language::parse(language)?;
        self.commands
            .iter()
            .find(|(key, _)| Language::parse(key) == Some(wanted))
            .map(|(_, argv)| argv.as_slice())
    }

    fn spawn(program: &str, args: &[String], dir: &std::path::Path) -> Result<Child, EvalError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(dir)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        command.spawn().map_err(|source| EvalError::Spawn {
            program: program.to_owned(),
            source,
        })
    }
}

impl Evaluator for CommandEvaluator {
    fn evaluate(&self, language: &str, source: &str) -> Result<String, EvalError> {
        let Some((program, args)) = self.command(language).and_then(<[String]>::split_first)
        else {
            return Err(EvalError::UnsupportedLanguage(language.to_owned()));
        };

        let dir = tempfile::tempdir()?;
        let mut child = Self::spawn(program, args, dir.path())?;

        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_owned();
            thread::spawn(move || {
                // The child may exit without reading its input.
                let _ = stdin.write_all(input.as_bytes());
            })
        });
        let stdout = child
            .stdout
            .take()
            .map(|pipe: ChildStdout| spawn_reader(pipe, self.max_output_bytes));
        let stderr = child
            .stderr
            .take()
            .map(|pipe: ChildStderr| spawn_reader(pipe, self.max_output_bytes));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                // Readers may be held open by grandchildren; leave them detached.
                return Err(EvalError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(truncate(&stderr, self.max_output_bytes));
            return Err(EvalError::Failed {
                status: status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }
        if stdout.len() > self.max_output_bytes {
            return Err(EvalError::OutputLimit(self.max_output_bytes));
        }

        tracing::debug!(language, bytes = stdout.len(), "Evaluated live block");
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Read up to `limit + 1` bytes, then drain the rest so the child never
/// blocks on a full pipe.
fn spawn_reader<R>(mut pipe: R, limit: usize) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        (&mut pipe)
            .take(limit as u64 + 1)
            .read_to_end(&mut buf)?;
        io::copy(&mut pipe, &mut io::sink())?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>, EvalError> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    let bytes = reader
        .join()
        .map_err(|_| io::Error::other("output reader panicked"))??;
    Ok(bytes)
}

fn truncate(bytes: &[u8], limit: usize) -> &[u8] {
    &bytes[..bytes.len().min(limit)]
}

pub(super) fn apply(nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
    let Some(evaluator) = ctx.evaluator() else {
        tracing::debug!("No evaluator configured, live blocks render statically");
        return nodes;
    };
    rewrite(nodes, &mut |node| {
        let Some((language, source)) = live_source(&node) else {
            return Some(node);
        };
        Some(match evaluator.evaluate(language, source) {
            Ok(output) => Node::LiveCode {
                code: Box::new(node),
                output,
            },
            Err(error) => {
                let error = NodeError::EvaluationError {
                    message: error.to_string(),
                };
                ctx.degrade(node, error)
            }
        })
    })
}

/// Language and source of a code node marked `live`.
fn live_source(node: &Node) -> Option<(&str, &str)> {
    match node {
        Node::CodeBlock {
            language: Some(language),
            source,
            live: true,
        }
        | Node::HighlightedCode {
            language,
            source,
            live: true,
            ..
        } => Some((language, source)),
        Node::Degraded {
            fallback,
            error: NodeError::HighlightUnsupported { .. },
        } => live_source(fallback),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::anchor::AnchorMap;
    use crate::component::ComponentSet;
    use crate::pipeline::DiagnosticKind;

    struct Echo;

    impl Evaluator for Echo {
        fn evaluate(&self, language: &str, source: &str) -> Result<String, EvalError> {
            if source.contains("boom") {
                return Err(EvalError::Failed {
                    status: "exit status: 1".to_owned(),
                    stderr: "boom".to_owned(),
                });
            }
            Ok(format!("{language}:{source}"))
        }
    }

    fn code(language: &str, source: &str, live: bool) -> Node {
        Node::CodeBlock {
            language: Some(language.to_owned()),
            source: source.to_owned(),
            live,
        }
    }

    fn run(nodes: Vec<Node>, evaluator: Option<&dyn Evaluator>) -> (Vec<Node>, Vec<DiagnosticKind>) {
        let anchors = AnchorMap::new();
        let components = ComponentSet::new();
        let mut ctx = StageContext::new(&anchors, &components);
        if let Some(evaluator) = evaluator {
            ctx = ctx.with_evaluator(evaluator);
        }
        let nodes = apply(nodes, &mut ctx);
        let kinds = ctx.diagnostics().iter().map(|d| d.kind).collect();
        (nodes, kinds)
    }

    fn sh(timeout_ms: u64, max_output_bytes: usize) -> CommandEvaluator {
        let commands = BTreeMap::from([("sh".to_owned(), vec!["sh".to_owned()])]);
        CommandEvaluator::new(commands, Duration::from_millis(timeout_ms), max_output_bytes)
    }

    #[test]
    fn test_live_block_gets_output() {
        let (nodes, kinds) = run(vec![code("js", "1 + 1", true)], Some(&Echo));

        assert_eq!(
            nodes,
            vec![Node::LiveCode {
                code: Box::new(code("js", "1 + 1", true)),
                output: "js:1 + 1".to_owned(),
            }]
        );
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_static_block_not_evaluated() {
        let original = vec![code("js", "1 + 1", false)];
        let (nodes, _) = run(original.clone(), Some(&Echo));

        assert_eq!(nodes, original);
    }

    #[test]
    fn test_failed_evaluation_degrades_to_static_block() {
        let (nodes, kinds) = run(vec![code("js", "boom", true)], Some(&Echo));

        let Node::Degraded { fallback, error } = &nodes[0] else {
            panic!("expected degraded node, got {:?}", nodes[0]);
        };
        assert_eq!(**fallback, code("js", "boom", true));
        assert!(matches!(error, NodeError::EvaluationError { message } if message.contains("boom")));
        assert_eq!(kinds, vec![DiagnosticKind::EvaluationError]);
    }

    #[test]
    fn test_no_evaluator_leaves_live_block() {
        let original = vec![code("js", "1 + 1", true)];
        let (nodes, kinds) = run(original.clone(), None);

        assert_eq!(nodes, original);
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_unhighlighted_live_block_still_evaluated() {
        let degraded = Node::Degraded {
            fallback: Box::new(code("cobol", "DISPLAY 1.", true)),
            error: NodeError::HighlightUnsupported {
                language: "cobol".to_owned(),
            },
        };
        let (nodes, _) = run(vec![degraded.clone()], Some(&Echo));

        assert_eq!(
            nodes,
            vec![Node::LiveCode {
                code: Box::new(degraded),
                output: "cobol:DISPLAY 1.".to_owned(),
            }]
        );
    }

    #[test]
    fn test_command_lookup_by_alias() {
        let commands = BTreeMap::from([("js".to_owned(), vec!["node".to_owned(), "-".to_owned()])]);
        let evaluator = CommandEvaluator::new(commands, Duration::from_secs(1), 1024);

        assert!(evaluator.command("javascript").is_some());
        assert!(evaluator.command("python").is_none());
    }

    #[test]
    fn test_unsupported_language() {
        let result = sh(1000, 1024).evaluate("python", "print(1)");

        assert!(matches!(result, Err(EvalError::UnsupportedLanguage(lang)) if lang == "python"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_success() {
        let output = sh(5000, 1024).evaluate("sh", "echo hello").unwrap();

        assert_eq!(output, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_environment_is_cleared() {
        let output = sh(5000, 1024)
            .evaluate("sh", "echo \"${HOME:-unset}\"")
            .unwrap();

        assert_eq!(output, "unset\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_reports_stderr() {
        let result = sh(5000, 1024).evaluate("sh", "echo oops >&2; exit 3");

        assert!(matches!(result, Err(EvalError::Failed { stderr, .. }) if stderr == "oops"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout() {
        let start = Instant::now();
        let result = sh(200, 1024).evaluate("sh", "sleep 5");

        assert!(matches!(result, Err(EvalError::Timeout(_))));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_limit() {
        let source = "i=0; while [ $i -lt 50 ]; do echo xxxx; i=$((i+1)); done";
        let result = sh(5000, 16).evaluate("sh", source);

        assert!(matches!(result, Err(EvalError::OutputLimit(16))));
    }
}
