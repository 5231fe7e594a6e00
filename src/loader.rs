//! Locating and loading the native rlawt module.
//!
//! The native module ships next to the application as a per-platform
//! resource named `<os>-<arch>/<libname>`, like `macos-aarch64/librlawt.dylib`
//! or `windows-amd64/rlawt.dll`. The resource is staged through a temporary
//! copy before it is loaded, so the application directory can live on a
//! filesystem the dynamic linker refuses to map from.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use libloading::Library;
use log::debug;
use once_cell::sync::OnceCell;

use crate::error::{Error, ErrorKind, Result};
use crate::ffi::Rlawt;

/// Environment variable naming an exact path to the native module.
///
/// When set, bundled-resource resolution is bypassed entirely and the named
/// file is loaded in place, without staging.
pub const PATH_OVERRIDE_ENV: &str = "RLAWT_PATH";

static NATIVES: OnceCell<Rlawt> = OnceCell::new();

/// Loads the native module for the running platform if it is not loaded yet.
///
/// [`Context::new`](crate::Context::new) calls this implicitly; calling it
/// up front only moves the load error to a convenient place. Concurrent
/// callers block until the first attempt finishes. A failed attempt is not
/// sticky, the next call resolves and tries again.
pub fn load_natives() -> Result<()> {
    natives().map(|_| ())
}

/// Process-wide entry-point table of the loaded module.
pub(crate) fn natives() -> Result<&'static Rlawt> {
    load_into(&NATIVES, runtime_source)
}

fn load_into(cell: &OnceCell<Rlawt>, source: impl FnOnce() -> LoadSource) -> Result<&Rlawt> {
    cell.get_or_try_init(|| load_from_source(source()))
}

/// Where a load attempt sources the native module from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadSource {
    /// An explicitly configured module path, loaded as-is.
    Override(PathBuf),
    /// A bundled per-platform resource, staged through a temporary copy.
    Bundled { path: PathBuf, file_name: &'static str },
}

pub(crate) fn plan(
    override_path: Option<PathBuf>,
    root: &Path,
    os_name: &str,
    arch: &str,
) -> LoadSource {
    if let Some(path) = override_path {
        return LoadSource::Override(path);
    }

    let (os, file_name) = library_location(os_name);
    LoadSource::Bundled { path: root.join(format!("{os}-{arch}")).join(file_name), file_name }
}

/// Resolved `<os>` directory and `<libname>` for an operating system name.
///
/// Matching is case-insensitive and substring-based, so both runtime names
/// like `macos` and reported names like `Mac OS X` resolve. Unrecognized
/// systems map to `unknown`/`unknown` and fail later with a clear path in
/// the error instead of a guessed one.
fn library_location(os_name: &str) -> (&'static str, &'static str) {
    let os = os_name.to_lowercase();
    if os.contains("mac") || os.contains("darwin") {
        ("macos", "librlawt.dylib")
    } else if os.contains("win") {
        ("windows", "rlawt.dll")
    } else if os.contains("nux") {
        ("linux", "librlawt.so")
    } else {
        ("unknown", "unknown")
    }
}

fn runtime_source() -> LoadSource {
    let override_path = env::var_os(PATH_OVERRIDE_ENV).map(PathBuf::from);
    plan(override_path, &resource_root(), env::consts::OS, env::consts::ARCH)
}

/// Directory the per-platform resources are resolved against. The bundle
/// layout puts them next to the executable.
fn resource_root() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub(crate) fn load_from_source(source: LoadSource) -> Result<Rlawt> {
    let lib = match source {
        LoadSource::Override(path) => {
            debug!("loading rlawt natives from override path {}", path.display());
            open(&path)?
        },
        LoadSource::Bundled { path, file_name } => {
            if !path.is_file() {
                return Err(Error::new(
                    None,
                    Some(format!("rlawt does not exist at {}", path.display())),
                    ErrorKind::NotFound,
                ));
            }

            let staged = stage(&path, file_name)?;
            debug!("staged rlawt natives from {} at {}", path.display(), staged.display());
            open(&staged)?
        },
    };

    Rlawt::load_from(lib)
}

fn open(path: &Path) -> Result<Library> {
    unsafe { Library::new(path) }
        .map_err(|err| Error::new(None, Some(err.to_string()), ErrorKind::InitializationFailed))
}

fn stage(path: &Path, file_name: &str) -> Result<PathBuf> {
    let staged = env::temp_dir().join(format!("rlawt-{}-{}", process::id(), file_name));
    fs::copy(path, &staged)
        .map_err(|err| Error::new(None, Some(err.to_string()), ErrorKind::InitializationFailed))?;
    cleanup::register(staged.clone());
    Ok(staged)
}

// Staged copies are removed when the process exits. Windows keeps loaded
// modules locked on disk, so the copy stays behind there.
#[cfg(unix)]
mod cleanup {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, Once};

    static STAGED: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
    static ATEXIT: Once = Once::new();

    extern "C" fn remove_staged() {
        if let Ok(staged) = STAGED.lock() {
            for path in staged.iter() {
                let _ = fs::remove_file(path);
            }
        }
    }

    pub(super) fn register(path: PathBuf) {
        if let Ok(mut staged) = STAGED.lock() {
            staged.push(path);
        }
        ATEXIT.call_once(|| unsafe {
            libc::atexit(remove_staged);
        });
    }
}

#[cfg(not(unix))]
mod cleanup {
    use std::path::PathBuf;

    pub(super) fn register(_path: PathBuf) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    fn bundled(root: &Path, os_name: &str, arch: &str) -> (PathBuf, &'static str) {
        match plan(None, root, os_name, arch) {
            LoadSource::Bundled { path, file_name } => (path, file_name),
            LoadSource::Override(path) => panic!("unexpected override {}", path.display()),
        }
    }

    #[test]
    fn bundled_path_macos() {
        let (path, file_name) = bundled(Path::new(""), "Mac OS X", "aarch64");
        assert_eq!(path, Path::new("macos-aarch64/librlawt.dylib"));
        assert_eq!(file_name, "librlawt.dylib");
    }

    #[test]
    fn bundled_path_windows() {
        let (path, file_name) = bundled(Path::new(""), "Windows 10", "amd64");
        assert_eq!(path, Path::new("windows-amd64/rlawt.dll"));
        assert_eq!(file_name, "rlawt.dll");
    }

    #[test]
    fn bundled_path_linux() {
        let (path, _) = bundled(Path::new(""), "Linux", "x86_64");
        assert_eq!(path, Path::new("linux-x86_64/librlawt.so"));
    }

    #[test]
    fn bundled_path_darwin_alias() {
        let (path, _) = bundled(Path::new(""), "Darwin", "x86_64");
        assert_eq!(path, Path::new("macos-x86_64/librlawt.dylib"));
    }

    #[test]
    fn bundled_path_unrecognized_os() {
        let (path, _) = bundled(Path::new(""), "plan9", "sparc");
        assert_eq!(path, Path::new("unknown-sparc/unknown"));
    }

    #[test]
    fn bundled_path_joins_resource_root() {
        let (path, _) = bundled(Path::new("/opt/app"), "Linux", "x86_64");
        assert_eq!(path, Path::new("/opt/app/linux-x86_64/librlawt.so"));
    }

    #[test]
    fn override_takes_precedence_over_resolution() {
        let source = plan(
            Some(PathBuf::from("/tmp/librlawt-custom.so")),
            Path::new("/opt/app"),
            "Linux",
            "x86_64",
        );
        assert_eq!(source, LoadSource::Override(PathBuf::from("/tmp/librlawt-custom.so")));
    }

    #[test]
    fn runtime_plan_honors_override_env() {
        env::remove_var(PATH_OVERRIDE_ENV);
        assert!(matches!(runtime_source(), LoadSource::Bundled { .. }));

        env::set_var(PATH_OVERRIDE_ENV, "/tmp/librlawt-override.so");
        let source = runtime_source();
        env::remove_var(PATH_OVERRIDE_ENV);

        assert_eq!(source, LoadSource::Override(PathBuf::from("/tmp/librlawt-override.so")));
    }

    #[test]
    fn missing_bundled_library_reports_not_found() {
        let source = plan(None, Path::new("/nonexistent"), "Linux", "x86_64");
        let err = load_from_source(source).unwrap_err();

        assert_eq!(err.error_kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("rlawt does not exist at"));
    }

    #[test]
    fn missing_override_is_loaded_directly() {
        // No "does not exist" resolution error: the override path goes
        // straight to the dynamic linker.
        let err = load_from_source(LoadSource::Override(PathBuf::from("/nonexistent/librlawt.so")))
            .unwrap_err();

        assert_eq!(err.error_kind(), ErrorKind::InitializationFailed);
    }

    #[test]
    fn staging_copies_module_bytes() {
        let source = env::temp_dir().join(format!("rlawt-test-{}-module-source.so", process::id()));
        fs::write(&source, b"module bytes").unwrap();

        let staged = stage(&source, "module-staged.so").unwrap();
        assert_ne!(staged, source);
        assert_eq!(fs::read(&staged).unwrap(), b"module bytes");

        let _ = fs::remove_file(source);
        let _ = fs::remove_file(staged);
    }

    #[test]
    fn unloadable_module_reports_initialization_failure() {
        let source = env::temp_dir().join(format!("rlawt-test-{}-not-a-library.so", process::id()));
        fs::write(&source, b"not a shared object").unwrap();

        let err = load_from_source(LoadSource::Bundled {
            path: source.clone(),
            file_name: "not-a-library.so",
        })
        .unwrap_err();

        assert_eq!(err.error_kind(), ErrorKind::InitializationFailed);

        let staged = env::temp_dir().join(format!("rlawt-{}-not-a-library.so", process::id()));
        let _ = fs::remove_file(source);
        let _ = fs::remove_file(staged);
    }

    #[test]
    fn guard_does_not_rerun_after_success() {
        let cell: OnceCell<u32> = OnceCell::new();
        let attempts = Cell::new(0);

        for _ in 0..3 {
            let loaded = cell.get_or_try_init(|| -> Result<u32> {
                attempts.set(attempts.get() + 1);
                Ok(7)
            });
            assert_eq!(loaded.copied().ok(), Some(7));
        }

        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn failed_attempt_is_not_sticky() {
        let cell = OnceCell::new();
        let attempts = Cell::new(0);

        for _ in 0..3 {
            let loaded = load_into(&cell, || {
                attempts.set(attempts.get() + 1);
                LoadSource::Override(PathBuf::from("/nonexistent/librlawt.so"))
            });
            assert!(loaded.is_err());
        }

        assert_eq!(attempts.get(), 3);
        assert!(cell.get().is_none());
    }
}
