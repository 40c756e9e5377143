use crate::CliError;
use hatchery_core::{Error, infra::InfraError, workflow::deploy::DeploymentCheckpoint};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Default checkpoint location for `profile`.
#[must_use]
pub fn default_path(profile: &str) -> PathBuf {
    PathBuf::from(".hatchery").join(format!("{profile}.checkpoint.json"))
}

/// Load a checkpoint; a missing file is an empty checkpoint.
pub fn load(path: &Path) -> Result<DeploymentCheckpoint, CliError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(DeploymentCheckpoint::default());
        }
        Err(err) => return Err(checkpoint_error(path, err)),
    };

    serde_json::from_str(&text).map_err(|err| checkpoint_error(path, err))
}

/// Write a checkpoint; used as the orchestrator's sink after every step.
pub fn save(path: &Path, checkpoint: &DeploymentCheckpoint) -> Result<(), Error> {
    let io_error = |source| InfraError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let json = serde_json::to_string_pretty(checkpoint)
        .map_err(|err| io_error(io::Error::other(err)))?;
    fs::write(path, json).map_err(io_error)?;

    Ok(())
}

fn checkpoint_error(path: &Path, err: impl ToString) -> CliError {
    CliError::Checkpoint {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use hatchery_core::ids::LogicRef;

    #[test]
    fn missing_file_loads_empty_and_saves_round_trip() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("nested/local.checkpoint.json");

        let empty = load(&path).expect("missing is empty");
        assert!(empty.is_empty());

        let checkpoint = DeploymentCheckpoint {
            blueprint: Some(LogicRef::from_text("2vxsx-fae").expect("principal")),
            registry: None,
        };
        save(&path, &checkpoint).expect("save");

        assert_eq!(load(&path).expect("load"), checkpoint);
    }

    #[test]
    fn unreadable_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "[1, 2").expect("write");

        let err = load(&path).expect_err("broken json");
        assert!(matches!(err, CliError::Checkpoint { .. }));
    }
}
