use super::paths::normalize;
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReporterConfig {
    /// Report file, absolute or relative to the working directory
    pub out_file: PathBuf,

    /// Directory holding screenshots, absolute or relative to the working directory
    pub screenshot_path: PathBuf,

    /// Report format to write
    pub format: ReportFormat,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            out_file: PathBuf::from("dist/html-report.html"),
            screenshot_path: PathBuf::from("screenshots"),
            format: ReportFormat::Html,
        }
    }
}

/// Absolute locations derived from a [`ReporterConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub out_file: PathBuf,
    pub screenshot_dir: PathBuf,
    /// Directory the report is written to; screenshot links are relative to it
    pub base_path: PathBuf,
}

impl ReporterConfig {
    /// Load configuration from a YAML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn resolve(&self, cwd: &Path) -> ResolvedPaths {
        let out_file = normalize(&cwd.join(&self.out_file));
        let screenshot_dir = normalize(&cwd.join(&self.screenshot_path));
        let base_path = out_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        ResolvedPaths {
            out_file,
            screenshot_dir,
            base_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_under_cwd() {
        let paths = ReporterConfig::default().resolve(Path::new("/work"));
        assert_eq!(paths.out_file, PathBuf::from("/work/dist/html-report.html"));
        assert_eq!(paths.base_path, PathBuf::from("/work/dist"));
        assert_eq!(paths.screenshot_dir, PathBuf::from("/work/screenshots"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = ReporterConfig {
            out_file: PathBuf::from("/reports/./out/index.html"),
            screenshot_path: PathBuf::from("/shots"),
            format: ReportFormat::Html,
        };
        let paths = config.resolve(Path::new("/work"));
        assert_eq!(paths.out_file, PathBuf::from("/reports/out/index.html"));
        assert_eq!(paths.base_path, PathBuf::from("/reports/out"));
        assert_eq!(paths.screenshot_dir, PathBuf::from("/shots"));
    }

    #[test]
    fn test_load_yaml_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.yaml");
        std::fs::write(&path, "outFile: out/report.xml\nformat: junit\n").unwrap();

        let config = ReporterConfig::load(&path).unwrap();
        assert_eq!(config.out_file, PathBuf::from("out/report.xml"));
        assert_eq!(config.format, ReportFormat::Junit);
        assert_eq!(config.screenshot_path, PathBuf::from("screenshots"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ReporterConfig::load(Path::new("/definitely/missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
