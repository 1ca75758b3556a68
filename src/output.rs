use std::io::{self, Write};

use serde::Serialize;

use crate::app::{DownloadResult, ProgressEvent, ProgressSink, RunReport, SearchResult};
use crate::cmr::ToolInfo;
use crate::convert::ConversionReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

/// Progress lines on stderr, `[phase] detail`.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let (phase, payload) = split_phase(&event.message);
        let mut stderr = io::stderr().lock();
        let _ = match event.elapsed {
            Some(elapsed) => writeln!(
                stderr,
                "[{phase}] {payload} ({:.1}s)",
                elapsed.as_secs_f64()
            ),
            None => writeln!(stderr, "[{phase}] {payload}"),
        };
    }
}

fn split_phase(message: &str) -> (&str, &str) {
    message
        .strip_prefix("phase=")
        .and_then(|rest| rest.split_once("; "))
        .unwrap_or(("info", message))
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_search(result: &SearchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_download(result: &DownloadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_conversion(result: &ConversionReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_tool(result: &ToolInfo) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_phase_prefix() {
        assert_eq!(
            split_phase("phase=Convert; wrote a.nc"),
            ("Convert", "wrote a.nc")
        );
        assert_eq!(split_phase("plain"), ("info", "plain"));
    }
}
