use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::FuzzError;

/// Where the compiled descriptor set of `proto` is stored inside `dest`.
pub fn descriptor_path<P: AsRef<Path>, Q: AsRef<Path>>(proto: P, dest: Q) -> PathBuf {
    let stem = proto.as_ref().file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
    dest.as_ref().join(format!("{}.desc", stem))
}

/// Compile every `.proto` file in `files` into a descriptor set inside `dest` by running `protoc`.
/// Returns the paths of the written descriptor sets.
pub fn compile_protos<P: AsRef<Path>>(files: &[P], dest: &Path) -> Result<Vec<PathBuf>, FuzzError> {
    std::fs::create_dir_all(dest).map_err(|source| FuzzError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut outputs = Vec::with_capacity(files.len());

    for file in files {
        let file = file.as_ref();
        let include = file.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let output = descriptor_path(file, dest);

        log::info!("Running protoc on {}", file.display());

        let result = Command::new("protoc")
            .arg(format!("-I={}", include.display()))
            .arg("--include_imports")
            .arg(format!("--descriptor_set_out={}", output.display()))
            .arg(file)
            .output()
            .map_err(|e| FuzzError::Compile {
                path: file.to_path_buf(),
                msg: format!("could not launch protoc: {}", e),
            })?;

        if !result.status.success() {
            return Err(FuzzError::Compile {
                path: file.to_path_buf(),
                msg: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        outputs.push(output);
    }

    Ok(outputs)
}
