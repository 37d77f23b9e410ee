use anyhow::{Context, Result};
use scheduler::ProjectDeclaration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Rollout File
// ============================================================================

/// Contents of a rollout file (`projects.yaml` by default)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolloutConfig {
    #[serde(default)]
    pub projects: Vec<ProjectDeclaration>,

    #[serde(default)]
    pub provisioner: ProvisionerConfig,

    /// Default organization, overridden by `--org`
    #[serde(default)]
    pub org: Option<String>,
}

/// How units are applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Infrastructure-as-code CLI to invoke
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra arguments appended to every `up`/`destroy` invocation
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
        }
    }
}

fn default_command() -> String {
    "pulumi".to_string()
}

/// Supported rollout file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick a format from the file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

impl RolloutConfig {
    /// Load a rollout file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let format = ConfigFormat::from_path(path);
        log::debug!("Loading {} as {}", path.display(), format.extension());

        Self::parse(&content, format)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse rollout file contents
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML format")?,
            ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON format")?,
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML format")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check fields the scheduler cannot check for itself
    pub fn validate(&self) -> Result<()> {
        for (i, project) in self.projects.iter().enumerate() {
            if project.name.trim().is_empty() {
                anyhow::bail!("Project #{} has an empty name", i + 1);
            }
            if let Some(stack) = project.stacks.iter().find(|s| s.trim().is_empty()) {
                anyhow::bail!("Project '{}' lists an empty stack name '{}'", project.name, stack);
            }
        }
        if self.provisioner.command.trim().is_empty() {
            anyhow::bail!("provisioner.command must not be empty");
        }
        Ok(())
    }
}

/// Directory the rollout file lives in, used as the default projects root
pub fn config_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
projects:
  - name: vpcs
    stacks: [dev, prod]
  - name: eks
    stacks: [dev]
    dependsOn: [vpcs]
  - name: monitoring
    stacks:
      - dev
    dependsOn:
      - eks
org: acme
"#;
        let config = RolloutConfig::parse(yaml, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.projects.len(), 3);
        assert_eq!(config.projects[1].depends_on, vec!["vpcs"]);
        assert_eq!(config.org.as_deref(), Some("acme"));
        assert_eq!(config.provisioner.command, "pulumi");
        assert!(config.provisioner.args.is_empty());
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "projects": [{"name": "vpc", "stacks": ["dev"]}],
            "provisioner": {"command": "tofu-wrapper", "args": ["--non-interactive"]}
        }"#;
        let config = RolloutConfig::parse(json, ConfigFormat::Json).unwrap();

        assert_eq!(config.projects[0].name, "vpc");
        assert_eq!(config.provisioner.command, "tofu-wrapper");
        assert_eq!(config.provisioner.args, vec!["--non-interactive"]);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
org = "acme"

[[projects]]
name = "vpc"
stacks = ["dev"]

[[projects]]
name = "eks"
stacks = ["dev"]
dependsOn = ["vpc"]
"#;
        let config = RolloutConfig::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.projects.len(), 2);
        assert_eq!(config.projects[1].depends_on, vec!["vpc"]);
    }

    #[test]
    fn test_empty_project_name_rejected() {
        let yaml = "projects:\n  - name: ''\n    stacks: [dev]\n";
        assert!(RolloutConfig::parse(yaml, ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_empty_stack_name_rejected() {
        let yaml = "projects:\n  - name: vpc\n    stacks: ['']\n";
        assert!(RolloutConfig::parse(yaml, ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("projects")), ConfigFormat::Yaml);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.yaml");
        fs::write(&path, "projects:\n  - name: vpc\n    stacks: [dev]\n").unwrap();

        let config = RolloutConfig::load(&path).unwrap();
        assert_eq!(config.projects.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RolloutConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("Could not read config file"));
    }

    #[test]
    fn test_config_root() {
        assert_eq!(config_root(Path::new("projects.yaml")), PathBuf::from("."));
        assert_eq!(
            config_root(Path::new("/infra/projects.yaml")),
            PathBuf::from("/infra")
        );
    }
}
