//! Configuration discovery and effective settings resolution.
//!
//! conforma reads `conforma.toml|yaml|yml` from the submission directory (or
//! closest ancestor, stopping at a `.git` directory) and merges it with CLI
//! flags to produce an `Effective` config.
//! Defaults:
//! - `module`: `basics`
//! - `platform`: detected from the host
//! - `output`: `human`
//! - `compiler.name|flags|std`: `cc`, `["-Wall", "-Wextra"]`, `c11`
//! - `engine.parallel|memory`: true
//! - `engine.timeout_secs`: 30
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::ValidationError;
use crate::models::context::{ModuleTag, Platform, ToolConfig};
use crate::models::Severity;
use crate::rules::FeatureRule;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_NAMES: [&str; 3] = ["conforma.toml", "conforma.yaml", "conforma.yml"];
/// Upper bound for `engine.timeout_secs` / `--timeout` (one day).
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Default, Deserialize, Clone)]
/// Compiler section under `[compiler]`.
pub struct CompilerCfg {
    pub name: Option<String>,
    pub flags: Option<Vec<String>>,
    pub std: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Engine section under `[engine]`.
pub struct EngineCfg {
    pub parallel: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub memory: Option<bool>,
    /// Force a memory tool by name instead of the best-ranked one.
    pub memory_tool: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
/// Extra forbidden-feature rule under `[[rules]]`.
pub struct RuleCfg {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `conforma.toml|yaml`.
pub struct ConformaConfig {
    pub module: Option<String>,
    pub platform: Option<String>,
    pub output: Option<String>,
    pub compiler: Option<CompilerCfg>,
    pub engine: Option<EngineCfg>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub rules: Vec<RuleCfg>,
}

/// Values given on the command line; `None` means not given.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub path: Option<String>,
    pub module: Option<String>,
    pub platform: Option<String>,
    pub output: Option<String>,
    pub compiler: Option<String>,
    pub std: Option<String>,
    pub flags: Vec<String>,
    pub timeout_secs: Option<u64>,
    pub sequential: bool,
    pub no_memory: bool,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub submission: PathBuf,
    pub module: ModuleTag,
    /// `None` means detect from the host.
    pub platform: Option<Platform>,
    pub output: String,
    pub tools: ToolConfig,
    pub parallel: bool,
    pub memory: bool,
    pub memory_tool: Option<String>,
    pub metadata: HashMap<String, String>,
    pub extra_rules: Vec<FeatureRule>,
}

/// Walk upward from `start` to detect the configuration root.
///
/// Stops when a `conforma.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Path of the config file in `root`, TOML first.
pub fn config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_NAMES.iter().map(|n| root.join(n)).find(|p| p.exists())
}

/// Load `ConformaConfig` from `root` if a config file is present. A present
/// but unreadable or malformed file is an error.
pub fn load_config(root: &Path) -> Result<Option<ConformaConfig>, ValidationError> {
    let Some(path) = config_path(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path).map_err(|source| ValidationError::FileRead {
        path: path.clone(),
        source,
    })?;
    let is_toml = path.extension().is_some_and(|e| e == "toml");
    let cfg = if is_toml {
        toml::from_str(&s).map_err(|e| ValidationError::Config(format!("{}: {}", path.display(), e)))?
    } else {
        serde_yaml::from_str(&s)
            .map_err(|e| ValidationError::Config(format!("{}: {}", path.display(), e)))?
    };
    debug!(path = %path.display(), "loaded configuration");
    Ok(Some(cfg))
}

fn rule_from_cfg(r: RuleCfg) -> Result<FeatureRule, ValidationError> {
    let severity = match r.severity.as_deref() {
        None => Severity::Major,
        Some(s) => Severity::parse(s).ok_or_else(|| {
            ValidationError::Config(format!(
                "rule '{}': unknown severity '{}' (expected critical|major|minor)",
                r.name, s
            ))
        })?,
    };
    if r.pattern.is_empty() {
        return Err(ValidationError::Config(format!("rule '{}': empty pattern", r.name)));
    }
    Ok(FeatureRule {
        description: r
            .description
            .unwrap_or_else(|| format!("{} is not allowed in this course", r.name)),
        name: r.name,
        pattern: r.pattern,
        severity,
    })
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective, ValidationError> {
    let submission = PathBuf::from(cli.path.as_deref().unwrap_or("."));
    let start = if submission.is_file() {
        submission.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        submission.clone()
    };
    let start = fs::canonicalize(&start).unwrap_or(start);
    let root = detect_repo_root(&start);
    let config_file = config_path(&root);
    let cfg = load_config(&root)?.unwrap_or_default();
    let compiler = cfg.compiler.unwrap_or_default();
    let engine = cfg.engine.unwrap_or_default();
    let defaults = ToolConfig::default();

    let module = match cli.module.as_deref().or(cfg.module.as_deref()) {
        Some(m) => m.parse()?,
        None => ModuleTag::Basics,
    };
    let platform = match cli.platform.as_deref().or(cfg.platform.as_deref()) {
        None | Some("auto") => None,
        Some(p) => Some(p.parse()?),
    };
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(ValidationError::Config(format!(
            "unknown output '{}' (expected human|json)",
            output
        )));
    }

    let tools = ToolConfig {
        compiler: cli
            .compiler
            .clone()
            .or(compiler.name)
            .unwrap_or(defaults.compiler),
        flags: if cli.flags.is_empty() {
            compiler.flags.unwrap_or(defaults.flags)
        } else {
            cli.flags.clone()
        },
        std: cli.std.clone().or(compiler.std).unwrap_or(defaults.std),
        timeout: cli
            .timeout_secs
            .or(engine.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    };
    if tools.timeout.is_zero() {
        return Err(ValidationError::Config("timeout must be at least one second".into()));
    }
    if tools.timeout.as_secs() > MAX_TIMEOUT_SECS {
        return Err(ValidationError::Config(format!(
            "timeout of {}s exceeds the maximum of {}s",
            tools.timeout.as_secs(),
            MAX_TIMEOUT_SECS
        )));
    }

    let extra_rules = cfg
        .rules
        .into_iter()
        .map(rule_from_cfg)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Effective {
        root,
        config_file,
        submission,
        module,
        platform,
        output,
        tools,
        parallel: !cli.sequential && engine.parallel.unwrap_or(true),
        memory: !cli.no_memory && engine.memory.unwrap_or(true),
        memory_tool: engine.memory_tool,
        metadata: cfg.metadata,
        extra_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            path: root.to_str().map(str::to_string),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("conforma.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
module = "memory"
output = "json"
[compiler]
name = "clang"
flags = ["-Wall", "-Werror"]
[engine]
parallel = false
timeout_secs = 5
[metadata]
"run.args" = "input.txt 3"
[[rules]]
name = "printf"
pattern = '\bprintf\s*\('
severity = "minor"
    "#
        )
        .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        assert_eq!(eff.module, ModuleTag::Memory);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.tools.compiler, "clang");
        assert_eq!(eff.tools.flags, vec!["-Wall", "-Werror"]);
        assert_eq!(eff.tools.std, "c11");
        assert_eq!(eff.tools.timeout, Duration::from_secs(5));
        assert!(!eff.parallel);
        assert!(eff.memory);
        assert_eq!(eff.metadata.get("run.args").map(String::as_str), Some("input.txt 3"));
        assert_eq!(eff.extra_rules.len(), 1);
        assert_eq!(eff.extra_rules[0].severity, Severity::Minor);
        assert!(eff.config_file.is_some());
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("conforma.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
platform: linux
engine:
  memory: false
            "#
        )
        .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        assert_eq!(eff.module, ModuleTag::Basics);
        assert_eq!(eff.platform, Some(Platform::Linux));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.tools.compiler, "cc");
        assert!(eff.parallel);
        assert!(!eff.memory);
    }

    #[test]
    fn test_cli_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("conforma.toml"),
            "module = \"memory\"\nplatform = \"macos\"\n[compiler]\nstd = \"c99\"\n",
        )
        .unwrap();
        let eff = resolve_effective(&Overrides {
            module: Some("files".into()),
            platform: Some("auto".into()),
            std: Some("c17".into()),
            flags: vec!["-O2".into()],
            sequential: true,
            no_memory: true,
            ..at(root)
        })
        .unwrap();
        assert_eq!(eff.module, ModuleTag::Files);
        assert_eq!(eff.platform, None);
        assert_eq!(eff.tools.std, "c17");
        assert_eq!(eff.tools.flags, vec!["-O2"]);
        assert!(!eff.parallel);
        assert!(!eff.memory);
    }

    #[test]
    fn test_config_found_in_ancestor_and_errors_surface() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let sub = root.join("students/alice");
        fs::create_dir_all(&sub).unwrap();
        fs::write(root.join("conforma.toml"), "module = \"pointers\"\n").unwrap();
        let eff = resolve_effective(&at(&sub)).unwrap();
        assert_eq!(eff.module, ModuleTag::Pointers);
        assert_eq!(eff.root, fs::canonicalize(root).unwrap());

        fs::write(root.join("conforma.toml"), "module = \"networking\"\n").unwrap();
        assert!(matches!(resolve_effective(&at(&sub)), Err(ValidationError::Config(_))));
        fs::write(root.join("conforma.toml"), "module = [\n").unwrap();
        assert!(matches!(resolve_effective(&at(&sub)), Err(ValidationError::Config(_))));
        fs::write(
            root.join("conforma.toml"),
            "[[rules]]\nname = \"x\"\npattern = \"x\"\nseverity = \"fatal\"\n",
        )
        .unwrap();
        assert!(resolve_effective(&at(&sub)).is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("conforma.toml"), "[engine]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(resolve_effective(&at(root)), Err(ValidationError::Config(_))));
        let huge = Overrides {
            timeout_secs: Some(u64::MAX),
            ..at(root)
        };
        assert!(matches!(resolve_effective(&huge), Err(ValidationError::Config(_))));
        let max = Overrides {
            timeout_secs: Some(MAX_TIMEOUT_SECS),
            ..at(root)
        };
        assert_eq!(
            resolve_effective(&max).unwrap().tools.timeout,
            Duration::from_secs(MAX_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_git_dir_stops_the_walk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("conforma.toml"), "module = \"files\"\n").unwrap();
        let repo = root.join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        assert_eq!(detect_repo_root(&repo), repo);
        let eff = resolve_effective(&at(&repo)).unwrap();
        assert_eq!(eff.module, ModuleTag::Basics);
        assert!(eff.config_file.is_none());
    }
}
