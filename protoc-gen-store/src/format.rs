//! Post-processing of generated artifacts by an external formatter.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::FormatError;
use crate::generator::Artifact;

/// Rewrites the content of matching artifacts
pub trait PostProcessor {
    fn matches(&self, artifact: &Artifact) -> bool;

    fn process(&self, input: &str) -> Result<String, FormatError>;
}

/// Runs `dart format` over `.dart` artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartFormat {
    command: Vec<String>,
}

impl DartFormat {
    pub fn new() -> Self {
        Self::with_command(
            ["dart", "format", "-o", "show"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    /// Uses a custom command line that filters stdin to stdout
    pub fn with_command(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for DartFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessor for DartFormat {
    fn matches(&self, artifact: &Artifact) -> bool {
        artifact.name.ends_with(".dart")
    }

    fn process(&self, input: &str) -> Result<String, FormatError> {
        let (program, args) = self.command.split_first().ok_or(FormatError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: program.clone(),
                source,
            })?;

        // feed stdin from a separate thread so a large output cannot block us
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.to_owned();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output()?;
        let written = writer.map(|handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("formatter stdin writer panicked")))
        });

        if !output.status.success() {
            return Err(FormatError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(result) = written {
            result?;
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Applies every matching processor in order. A failing processor leaves the
/// artifact as it was and is reported as a warning.
pub fn post_process(artifacts: Vec<Artifact>, processors: &[&dyn PostProcessor]) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .map(|mut artifact| {
            for processor in processors {
                if !processor.matches(&artifact) {
                    continue;
                }
                match processor.process(&artifact.content) {
                    Ok(content) => artifact.content = content,
                    Err(err) => tracing::warn!(
                        artifact = %artifact.name,
                        error = %err,
                        "formatter failed, keeping unformatted output"
                    ),
                }
            }
            artifact
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl PostProcessor for Upper {
        fn matches(&self, artifact: &Artifact) -> bool {
            artifact.name.ends_with(".dart")
        }

        fn process(&self, input: &str) -> Result<String, FormatError> {
            Ok(input.to_uppercase())
        }
    }

    struct Broken;

    impl PostProcessor for Broken {
        fn matches(&self, _: &Artifact) -> bool {
            true
        }

        fn process(&self, _: &str) -> Result<String, FormatError> {
            Err(FormatError::EmptyCommand)
        }
    }

    fn artifact(name: &str, content: &str) -> Artifact {
        Artifact {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_matching_artifacts_are_processed() {
        let out = post_process(
            vec![artifact("a.pbstore.dart", "class a {}"), artifact("notes.txt", "keep")],
            &[&Upper],
        );

        assert_eq!(
            out,
            vec![artifact("a.pbstore.dart", "CLASS A {}"), artifact("notes.txt", "keep")]
        );
    }

    #[test]
    fn test_failure_falls_back_to_unformatted() {
        let out = post_process(vec![artifact("a.pbstore.dart", "class a {}")], &[&Broken, &Upper]);

        assert_eq!(out, vec![artifact("a.pbstore.dart", "CLASS A {}")]);
    }

    #[test]
    fn test_dart_format_matches_suffix() {
        let fmt = DartFormat::new();

        assert!(fmt.matches(&artifact("x/y.pbstore.dart", "")));
        assert!(!fmt.matches(&artifact("x/y.pbstore.dart.bak", "")));
    }

    #[test]
    fn test_empty_command() {
        let err = DartFormat::with_command(Vec::new()).process("x").unwrap_err();
        assert!(matches!(err, FormatError::EmptyCommand));
    }

    #[test]
    fn test_missing_formatter_binary() {
        let fmt = DartFormat::with_command(vec!["protoc-gen-store-no-such-formatter".to_string()]);

        let err = fmt.process("class A {}").unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_filter_command_round_trip() {
        let fmt = DartFormat::with_command(vec!["cat".to_string()]);

        assert_eq!(fmt.process("class A {}\n").unwrap(), "class A {}\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let fmt = DartFormat::with_command(vec!["false".to_string()]);

        let err = fmt.process("class A {}\n").unwrap_err();
        assert!(matches!(err, FormatError::Failed { .. }));
    }
}
