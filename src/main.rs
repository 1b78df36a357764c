use std::io::{self, BufReader};

use env_logger::Env;
use log::debug;
use structopt::StructOpt;

use flozer::cliopt::CliOpt;
use flozer::config::{expand_home, Config};
use flozer::input::{DumpCommand, LineReader};
use flozer::output::LineWriter;
use flozer::runner::Runner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let opt = CliOpt::from_args();
    let conf_path = expand_home(&opt.conf);
    let conf = Config::load(&conf_path)?;
    let settings = opt.settings(&conf);

    if opt.show_config {
        println!("bridges: {:?}", opt.bridges);
        println!("OpenFlow protocol used: {}", settings.protocol);
        println!("json output: {}", settings.json);
        println!("disable unicode: {}", settings.disable_unicode);
        println!("conf file: {}", conf_path.display());
        println!("conf file contents:");
        println!("{:#?}", conf);
        return Ok(());
    }

    let maps = conf.mappings();
    let mut runner = Runner::from_settings(&maps, &settings, Box::new(LineWriter::new(io::stdout())));

    let count = if opt.bridges.is_empty() {
        runner.run(LineReader::new(BufReader::new(io::stdin())))?
    } else {
        let dump = DumpCommand::new(&settings.protocol);
        let mut lines = Vec::new();
        for bridge in &opt.bridges {
            lines.extend(dump.dump(bridge)?);
        }
        runner.run(lines.into_iter().map(Ok))?
    };
    debug!("wrote {} flows", count);

    Ok(())
}
