use std::env;
use std::process::Command;

fn main() {
    // OpenBLAS and LAPACK are not found automatically on Windows
    let target_os: String = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "windows" {
        println!("cargo:rustc-link-lib=dylib=openblas");
        println!("cargo:rustc-link-lib=dylib=lapack");
    }

    // With the `python` feature, tests link against libpython (there is no `extension-module` feature)
    if env::var("CARGO_FEATURE_PYTHON").is_err() {
        return;
    }
    let profile: String = env::var("PROFILE").unwrap_or_default();
    if profile != "test" && profile != "debug" {
        return;
    }

    let python_cmd: String = match (env::var("PYO3_PYTHON"), env::var("VIRTUAL_ENV")) {
        (Ok(pyo3_python), _) => pyo3_python,
        (Err(_), Ok(venv)) => format!("{}/bin/python", venv),
        _ => "python3".to_string(),
    };

    let query = |code: &str| -> Option<String> {
        let output = Command::new(&python_cmd).args(["-c", code]).output().ok()?;
        if !output.status.success() {
            return None;
        }
        return String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string());
    };

    if let (Some(libdir), Some(version)) = (
        query("import sysconfig; print(sysconfig.get_config_var('LIBDIR'))"),
        query("import sys; print(f'{sys.version_info.major}.{sys.version_info.minor}')"),
    ) {
        println!("cargo:rustc-link-search=native={}", libdir);
        println!("cargo:rustc-link-lib=dylib=python{}", version);
    }
}
