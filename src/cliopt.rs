use structopt::StructOpt;

use crate::config::{Config, Settings, DEFAULT_CONFIG, DEFAULT_PROTOCOL};

#[derive(Debug, StructOpt)]
#[structopt(name = "flozer", about = "openflow parser")]
pub struct CliOpt {
    /// Do not output unicode characters
    #[structopt(long = "disable-unicode")]
    pub disable_unicode: bool,

    /// Output JSON
    #[structopt(long = "json")]
    pub json: bool,

    /// Display the effective settings and config file, then exit
    #[structopt(long = "show-config")]
    pub show_config: bool,

    /// Config file
    #[structopt(long = "conf", default_value = DEFAULT_CONFIG)]
    pub conf: String,

    /// OpenFlow protocol used to collect flows, see ovs-ofctl(8). Defaults to OpenFlow13
    #[structopt(long = "protocol", short = "O")]
    pub protocol: Option<String>,

    /// Sort flows by ascending priority
    #[structopt(long = "sort")]
    pub sort: bool,

    /// Skip lines that can't be parsed instead of aborting
    #[structopt(long = "skip-malformed")]
    pub skip_malformed: bool,

    /// Bridges to dump flows from; flows are read from stdin if none given
    pub bridges: Vec<String>,
}

impl CliOpt {
    /// Command line flags win over config values.
    pub fn settings(&self, conf: &Config) -> Settings {
        Settings {
            disable_unicode: self.disable_unicode || conf.disable_unicode.unwrap_or(false),
            json: self.json || conf.json.unwrap_or(false),
            protocol: self
                .protocol
                .clone()
                .or_else(|| conf.protocol.clone())
                .unwrap_or_else(|| DEFAULT_PROTOCOL.into()),
            sort: self.sort,
            skip_malformed: self.skip_malformed,
        }
    }
}
