//! Generator configuration, parsed from a protoc-style parameter string.

use crate::error::OptionsError;

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Extension substituted onto each input path to name its artifact.
    pub artifact_suffix: String,
    /// Extension of the message classes generated by the Dart protobuf plugin.
    pub message_suffix: String,
    /// Extension of the sibling RPC client stub.
    pub stub_suffix: String,
    pub format: bool,
    /// Formatter command line; reads source on stdin, writes it to stdout.
    pub formatter: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            artifact_suffix: ".pbstore.dart".to_string(),
            message_suffix: ".pb.dart".to_string(),
            stub_suffix: ".pbgrpc.dart".to_string(),
            format: true,
            formatter: ["dart", "format", "-o", "show"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GeneratorOptions {
    /// Parses `key=value` pairs separated by commas, e.g.
    /// `format=false,artifact_suffix=.store.dart`
    pub fn parse(param: Option<&str>) -> Result<Self, OptionsError> {
        let mut opts = Self::default();
        let Some(param) = param else {
            return Ok(opts);
        };

        for part in param.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(OptionsError::MissingValue(part.to_string()));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "artifact_suffix" => opts.artifact_suffix = suffix(key, value)?,
                "message_suffix" => opts.message_suffix = suffix(key, value)?,
                "stub_suffix" => opts.stub_suffix = suffix(key, value)?,
                "format" => {
                    opts.format = value.parse().map_err(|_| OptionsError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        expected: "`true` or `false`",
                    })?;
                }
                "formatter" => {
                    let command: Vec<String> = value.split_whitespace().map(String::from).collect();
                    if command.is_empty() {
                        return Err(OptionsError::MissingValue(key.to_string()));
                    }
                    opts.formatter = command;
                }
                _ => return Err(OptionsError::UnknownKey(key.to_string())),
            }
        }

        Ok(opts)
    }
}

fn suffix(key: &str, value: &str) -> Result<String, OptionsError> {
    if value.starts_with('.') && value.len() > 1 {
        Ok(value.to_string())
    } else {
        Err(OptionsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "a file extension starting with `.`",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GeneratorOptions::parse(None).unwrap();

        assert_eq!(opts, GeneratorOptions::default());
        assert_eq!(opts.artifact_suffix, ".pbstore.dart");
        assert_eq!(opts.formatter, vec!["dart", "format", "-o", "show"]);
        assert!(opts.format);
    }

    #[test]
    fn test_parse_all_keys() {
        let opts = GeneratorOptions::parse(Some(
            "artifact_suffix=.store.dart, message_suffix=.m.dart,stub_suffix=.rpc.dart,format=false,formatter=dartfmt --fix,",
        ))
        .unwrap();

        assert_eq!(
            opts,
            GeneratorOptions {
                artifact_suffix: ".store.dart".to_string(),
                message_suffix: ".m.dart".to_string(),
                stub_suffix: ".rpc.dart".to_string(),
                format: false,
                formatter: vec!["dartfmt".to_string(), "--fix".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_parameter() {
        assert_eq!(GeneratorOptions::parse(Some("")).unwrap(), GeneratorOptions::default());
    }

    #[test]
    fn test_unknown_key() {
        let err = GeneratorOptions::parse(Some("paths=source_relative")).unwrap_err();
        assert_eq!(err, OptionsError::UnknownKey("paths".to_string()));
    }

    #[test]
    fn test_missing_value() {
        let err = GeneratorOptions::parse(Some("format")).unwrap_err();
        assert_eq!(err, OptionsError::MissingValue("format".to_string()));

        let err = GeneratorOptions::parse(Some("formatter=  ")).unwrap_err();
        assert_eq!(err, OptionsError::MissingValue("formatter".to_string()));
    }

    #[test]
    fn test_invalid_values() {
        let err = GeneratorOptions::parse(Some("format=yes")).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidValue { ref key, .. } if key == "format"));

        let err = GeneratorOptions::parse(Some("artifact_suffix=dart")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "generator option `artifact_suffix` expects a file extension starting with `.`, got `dart`"
        );
    }
}
