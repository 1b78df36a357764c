use log::{debug, error, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::flow::{FlowRecord, Glyphs};
use crate::input::is_flow_line;
use crate::mapping::Mappings;
use crate::output::{Formatter, HumanReadableFormatter, JSONFormatter, Writer};

// lines -> FlowRecord(s) [-> sort by priority] -> Formatter -> Writer
//
// Lines come either from stdin or from `ovs-ofctl dump-flows`. The mapping
// tables are borrowed for the whole batch and shared by every flow.

pub struct Runner<'m> {
    maps: &'m Mappings,
    glyphs: Glyphs,
    sort: bool,
    skip_malformed: bool,
    formatter: Box<dyn Formatter>,
    writer: Box<dyn Writer>,
}

impl<'m> Runner<'m> {
    pub fn new(
        maps: &'m Mappings,
        formatter: Box<dyn Formatter>,
        writer: Box<dyn Writer>,
    ) -> Self {
        Self {
            maps,
            glyphs: Glyphs::default(),
            sort: false,
            skip_malformed: false,
            formatter,
            writer,
        }
    }

    pub fn from_settings(maps: &'m Mappings, settings: &Settings, writer: Box<dyn Writer>) -> Self {
        let formatter: Box<dyn Formatter> = if settings.json {
            Box::new(JSONFormatter::new())
        } else {
            Box::new(HumanReadableFormatter::new())
        };

        let mut runner = Self::new(maps, formatter, writer);
        runner.glyphs = Glyphs::new(settings.disable_unicode);
        runner.sort = settings.sort;
        runner.skip_malformed = settings.skip_malformed;
        runner
    }

    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip_malformed(mut self, skip_malformed: bool) -> Self {
        self.skip_malformed = skip_malformed;
        self
    }

    /// Parses every flow line. A malformed line either aborts the whole
    /// batch or is skipped, depending on `skip_malformed`.
    pub fn parse<I>(&self, lines: I) -> Result<Vec<FlowRecord<'m>>>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut flows = Vec::new();
        for line in lines {
            let line = line?;
            if !is_flow_line(&line) {
                continue;
            }

            match FlowRecord::new(&line, self.maps, self.glyphs) {
                Ok(flow) => flows.push(flow),
                Err(e) if self.skip_malformed => {
                    warn!("skipping flow: {}", e);
                }
                Err(e) => {
                    error!("error processing flow: {}", e);
                    return Err(e);
                }
            }
        }

        if self.sort {
            // Stable, so equal priorities keep the dump order.
            flows.sort_by_key(|flow| flow.priority());
        }

        debug!("parsed {} flows", flows.len());
        Ok(flows)
    }

    /// Parses, formats and writes the lines. Returns the number of flows.
    pub fn run<I>(&mut self, lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let flows = self.parse(lines)?;
        let buf = self.formatter.format(&flows)?;
        if !buf.is_empty() {
            self.writer
                .write(&buf)
                .map_err(|e| ("writer failed", e))?;
        }
        Ok(flows.len())
    }
}
