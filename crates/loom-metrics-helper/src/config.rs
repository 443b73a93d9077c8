// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration: defaults, then a TOML file, then environment.
//!
//! Environment convention: `LOOM_METRICS_HELPER_<FIELD>`.

use std::path::{Path, PathBuf};

use loom_metrics_helper_core::{ActionMatching, DEFAULT_METADATA_NAMESPACE, MAX_LABEL_LEN};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "LOOM_METRICS_HELPER";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsHelperConfig {
	/// Prefix for every metadata key the recipes write
	pub metadata_namespace: String,
	/// Cap on synthesized labels
	pub max_label_len: usize,
	pub action_matching: ActionMatching,
}

impl Default for MetricsHelperConfig {
	fn default() -> Self {
		Self {
			metadata_namespace: DEFAULT_METADATA_NAMESPACE.to_string(),
			max_label_len: MAX_LABEL_LEN,
			action_matching: ActionMatching::Substring,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsHelperConfigLayer {
	pub metadata_namespace: Option<String>,
	pub max_label_len: Option<usize>,
	pub action_matching: Option<ActionMatching>,
}

impl MetricsHelperConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.metadata_namespace.is_some() {
			self.metadata_namespace = other.metadata_namespace;
		}
		if other.max_label_len.is_some() {
			self.max_label_len = other.max_label_len;
		}
		if other.action_matching.is_some() {
			self.action_matching = other.action_matching;
		}
	}

	pub fn finalize(self) -> Result<MetricsHelperConfig, ConfigError> {
		let defaults = MetricsHelperConfig::default();

		let max_label_len = self.max_label_len.unwrap_or(defaults.max_label_len);
		if max_label_len == 0 {
			return Err(ConfigError::invalid_value(
				"max_label_len",
				"must be greater than zero",
			));
		}

		let metadata_namespace = self
			.metadata_namespace
			.unwrap_or(defaults.metadata_namespace);
		if metadata_namespace.is_empty() {
			return Err(ConfigError::invalid_value(
				"metadata_namespace",
				"must not be empty",
			));
		}

		Ok(MetricsHelperConfig {
			metadata_namespace,
			max_label_len,
			action_matching: self.action_matching.unwrap_or(defaults.action_matching),
		})
	}
}

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<MetricsHelperConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<MetricsHelperConfigLayer, ConfigError> {
		let defaults = MetricsHelperConfig::default();
		Ok(MetricsHelperConfigLayer {
			metadata_namespace: Some(defaults.metadata_namespace),
			max_label_len: Some(defaults.max_label_len),
			action_matching: Some(defaults.action_matching),
		})
	}
}

/// A TOML file. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<MetricsHelperConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(MetricsHelperConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: MetricsHelperConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables under a prefix, `LOOM_METRICS_HELPER` by default.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	fn var(&self, field: &str) -> Option<String> {
		std::env::var(format!("{}_{field}", self.prefix))
			.ok()
			.filter(|s| !s.is_empty())
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::with_prefix(ENV_PREFIX)
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<MetricsHelperConfigLayer, ConfigError> {
		let max_label_len = match self.var("MAX_LABEL_LEN") {
			Some(v) => Some(v.parse::<usize>().map_err(|_| {
				ConfigError::invalid_value(
					format!("{}_MAX_LABEL_LEN", self.prefix),
					format!("expected a positive integer, got {v}"),
				)
			})?),
			None => None,
		};

		let action_matching = match self.var("ACTION_MATCHING") {
			Some(v) => Some(v.parse::<ActionMatching>().map_err(|message| {
				ConfigError::invalid_value(format!("{}_ACTION_MATCHING", self.prefix), message)
			})?),
			None => None,
		};

		Ok(MetricsHelperConfigLayer {
			metadata_namespace: self.var("NAMESPACE"),
			max_label_len,
			action_matching,
		})
	}
}

/// Merges sources in precedence order and finalizes the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<MetricsHelperConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = MetricsHelperConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	merged.finalize()
}

/// Loads defaults, then `path` if given, then `LOOM_METRICS_HELPER_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<MetricsHelperConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource)];
	if let Some(path) = path {
		sources.push(Box::new(TomlSource::new(path)));
	}
	sources.push(Box::new(EnvSource::default()));

	load_from_sources(sources)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_default_values() {
		let config = MetricsHelperConfig::default();
		assert_eq!(config.metadata_namespace, "metrics_helper");
		assert_eq!(config.max_label_len, 100);
		assert_eq!(config.action_matching, ActionMatching::Substring);
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = MetricsHelperConfigLayer::default().finalize().unwrap();
		assert_eq!(config, MetricsHelperConfig::default());
	}

	#[test]
	fn test_merge_overwrites_only_set_fields() {
		let mut base = MetricsHelperConfigLayer {
			metadata_namespace: Some("base".to_string()),
			max_label_len: Some(80),
			action_matching: None,
		};
		base.merge(MetricsHelperConfigLayer {
			max_label_len: Some(40),
			action_matching: Some(ActionMatching::Exact),
			..Default::default()
		});

		let config = base.finalize().unwrap();
		assert_eq!(config.metadata_namespace, "base");
		assert_eq!(config.max_label_len, 40);
		assert_eq!(config.action_matching, ActionMatching::Exact);
	}

	#[test]
	fn test_zero_label_len_rejected() {
		let layer = MetricsHelperConfigLayer {
			max_label_len: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { ref key, .. }) if key == "max_label_len"
		));
	}

	#[test]
	fn test_toml_source_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"metadata_namespace = \"ussd\"\naction_matching = \"exact\""
		)
		.unwrap();

		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		];
		let config = load_from_sources(sources).unwrap();

		assert_eq!(config.metadata_namespace, "ussd");
		assert_eq!(config.max_label_len, 100);
		assert_eq!(config.action_matching, ActionMatching::Exact);
	}

	#[test]
	fn test_missing_toml_file_is_skipped() {
		let layer = TomlSource::new("/nonexistent/metrics-helper.toml")
			.load()
			.unwrap();
		assert_eq!(layer, MetricsHelperConfigLayer::default());
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "max_label_len = \"lots\"").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_source_reads_prefixed_vars() {
		let prefix = "LOOM_METRICS_HELPER_TEST_ENV_SOURCE";
		std::env::set_var(format!("{prefix}_NAMESPACE"), "from_env");
		std::env::set_var(format!("{prefix}_MAX_LABEL_LEN"), "64");
		std::env::set_var(format!("{prefix}_ACTION_MATCHING"), "Exact");

		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(DefaultsSource),
			Box::new(EnvSource::with_prefix(prefix)),
		];
		let config = load_from_sources(sources).unwrap();

		assert_eq!(config.metadata_namespace, "from_env");
		assert_eq!(config.max_label_len, 64);
		assert_eq!(config.action_matching, ActionMatching::Exact);
	}

	#[test]
	fn test_env_source_rejects_bad_number() {
		let prefix = "LOOM_METRICS_HELPER_TEST_BAD_NUMBER";
		std::env::set_var(format!("{prefix}_MAX_LABEL_LEN"), "ten");

		let err = EnvSource::with_prefix(prefix).load().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}
}
