//! CLI argument parsing.

use std::path::PathBuf;

use argh::FromArgs;

use crate::errors::*;

#[derive(Clone, Debug, FromArgs)]
#[argh(description = "Drivechain SCDB node")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "TOML config file")]
    pub config: Option<PathBuf>,

    #[argh(option, short = 'd', description = "data directory, overrides client.datadir")]
    pub datadir: Option<PathBuf>,

    #[argh(option, description = "rpc listen address, overrides client.rpc_host")]
    pub rpc_host: Option<String>,

    #[argh(option, description = "rpc listen port, overrides client.rpc_port")]
    pub rpc_port: Option<u16>,

    /// `key=value` pairs applied on top of the file, e.g. `-o scdb.network=signet`.
    #[argh(option, short = 'o', description = "config overrides as key=value")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Overrides in application order: `-o` pairs first, then the dedicated flags.
    pub(crate) fn get_all_overrides(&self) -> Result<Vec<String>, InitError> {
        let datadir = match &self.datadir {
            Some(path) => Some(
                path.to_str()
                    .ok_or_else(|| InitError::InvalidDatadirPath(path.clone()))?,
            ),
            None => None,
        };

        let flags = [
            datadir.map(|dd| format!("client.datadir={dd}")),
            self.rpc_host.as_ref().map(|host| format!("client.rpc_host={host}")),
            self.rpc_port.map(|port| format!("client.rpc_port={port}")),
        ];

        Ok(self
            .overrides
            .iter()
            .cloned()
            .chain(flags.into_iter().flatten())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_overrides_follow_user_overrides() {
        let args = Args::from_args(
            &["drivechain-node"],
            &[
                "-o",
                "scdb.network=signet",
                "--datadir",
                "/data",
                "--rpc-port",
                "9000",
            ],
        )
        .unwrap();

        assert_eq!(
            args.get_all_overrides().unwrap(),
            vec![
                "scdb.network=signet".to_string(),
                "client.datadir=/data".to_string(),
                "client.rpc_port=9000".to_string(),
            ]
        );
    }
}
