use std::path::PathBuf;
use std::process::Command;

use log::debug;

use crate::error::{Error, ErrorKind, Result};

pub const OVS_OFCTL: &str = "/usr/bin/ovs-ofctl";

/// Collects raw flow lines with `ovs-ofctl dump-flows`.
pub struct DumpCommand {
    program: PathBuf,
    protocol: String,
}

impl DumpCommand {
    pub fn new(protocol: &str) -> Self {
        Self::with_program(OVS_OFCTL, protocol)
    }

    pub fn with_program<P: Into<PathBuf>>(program: P, protocol: &str) -> Self {
        Self {
            program: program.into(),
            protocol: protocol.into(),
        }
    }

    pub fn args(&self, bridge: &str) -> Vec<String> {
        vec![
            "dump-flows".into(),
            "-O".into(),
            self.protocol.clone(),
            bridge.into(),
        ]
    }

    pub fn dump(&self, bridge: &str) -> Result<Vec<String>> {
        let args = self.args(bridge);
        debug!("running {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                Error::from((format!("couldn't run {}", self.program.display()), e))
                    .set_kind(ErrorKind::Io)
            })?;

        if !output.status.success() {
            return Err(Error::with_kind(
                ErrorKind::Io,
                &format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(String::from)
            .collect())
    }
}
