//! Validation request: what to check and how to build it.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// Curriculum module. Ordered: later modules unlock constructs forbidden earlier.
pub enum ModuleTag {
    Basics,
    Pointers,
    Memory,
    Structures,
    Files,
    Capstone,
}

impl ModuleTag {
    pub const ALL: [ModuleTag; 6] = [
        ModuleTag::Basics,
        ModuleTag::Pointers,
        ModuleTag::Memory,
        ModuleTag::Structures,
        ModuleTag::Files,
        ModuleTag::Capstone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleTag::Basics => "basics",
            ModuleTag::Pointers => "pointers",
            ModuleTag::Memory => "memory",
            ModuleTag::Structures => "structures",
            ModuleTag::Files => "files",
            ModuleTag::Capstone => "capstone",
        }
    }
}

impl fmt::Display for ModuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleTag::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::Config(format!(
                    "unknown module '{}' (expected one of: basics, pointers, memory, structures, files, capstone)",
                    s
                ))
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Generic,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Generic => "generic",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" | "mac" => Ok(Platform::MacOs),
            "generic" | "unix" => Ok(Platform::Generic),
            "unknown" => Ok(Platform::Unknown),
            other => Err(ValidationError::Config(format!(
                "unknown platform '{}' (expected linux|macos|generic|unknown)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
/// Compiler invocation settings shared by every validator that builds code.
pub struct ToolConfig {
    pub compiler: String,
    pub flags: Vec<String>,
    pub std: String,
    pub timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            compiler: "cc".to_string(),
            flags: vec!["-Wall".to_string(), "-Wextra".to_string()],
            std: "c11".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
/// One validation request. Populated before dispatch; validators only ever
/// see it through a shared reference.
pub struct Context {
    pub submission: String,
    pub module: ModuleTag,
    pub platform: Platform,
    pub sources: Vec<PathBuf>,
    pub headers: Vec<PathBuf>,
    pub tools: ToolConfig,
    pub metadata: HashMap<String, String>,
}

impl Context {
    pub fn new(submission: impl Into<String>, module: ModuleTag, platform: Platform) -> Self {
        Context {
            submission: submission.into(),
            module,
            platform,
            sources: Vec::new(),
            headers: Vec::new(),
            tools: ToolConfig::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_files(mut self, sources: Vec<PathBuf>, headers: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self.headers = headers;
        self
    }

    pub fn with_tools(mut self, tools: ToolConfig) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Primary sources followed by auxiliary files.
    pub fn all_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.sources.iter().chain(self.headers.iter())
    }

    /// Path shown in issues: relative to the submission when possible.
    pub fn display_path(&self, path: &std::path::Path) -> String {
        let root = PathBuf::from(&self.submission);
        let base = if root.is_file() {
            root.parent().map(PathBuf::from).unwrap_or_default()
        } else {
            root
        };
        match pathdiff::diff_paths(path, &base) {
            Some(rel) if !rel.as_os_str().is_empty() && !rel.starts_with("..") => {
                rel.to_string_lossy().to_string()
            }
            _ => path.to_string_lossy().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_and_platform() {
        assert_eq!("Memory".parse::<ModuleTag>().unwrap(), ModuleTag::Memory);
        assert!("networking".parse::<ModuleTag>().is_err());
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::MacOs);
        assert!(ModuleTag::Basics < ModuleTag::Files);
    }

    #[test]
    fn test_display_path_relative_to_submission() {
        let ctx = Context::new("/work/sub", ModuleTag::Basics, Platform::Linux);
        assert_eq!(
            ctx.display_path(std::path::Path::new("/work/sub/src/main.c")),
            "src/main.c"
        );
        assert_eq!(
            ctx.display_path(std::path::Path::new("/elsewhere/x.c")),
            "/elsewhere/x.c"
        );
    }
}
