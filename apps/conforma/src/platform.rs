//! Host platform detection and command availability.

use crate::models::context::Platform;
use std::env;
use std::path::Path;

/// Probe consumed by the engine setup and the tool factory.
pub trait PlatformProbe: Send + Sync {
    fn detect_platform(&self) -> Platform;
    fn is_command_available(&self, name: &str) -> bool;
    fn cpu_core_count(&self) -> usize;
}

/// Probe backed by the running host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl PlatformProbe for SystemProbe {
    fn detect_platform(&self) -> Platform {
        platform_from_os(env::consts::OS, cfg!(unix))
    }

    fn is_command_available(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        // Explicit paths are checked directly, bare names against PATH
        if name.contains('/') {
            return is_executable(Path::new(name));
        }
        match env::var_os("PATH") {
            Some(paths) => env::split_paths(&paths).any(|dir| is_executable(&dir.join(name))),
            None => false,
        }
    }

    fn cpu_core_count(&self) -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

pub fn platform_from_os(os: &str, unix: bool) -> Platform {
    match os {
        "linux" => Platform::Linux,
        "macos" => Platform::MacOs,
        _ if unix => Platform::Generic,
        _ => Platform::Unknown,
    }
}

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    p.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(p: &Path) -> bool {
    p.is_file() || p.with_extension("exe").is_file()
}
