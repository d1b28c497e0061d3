use anyhow::{Context, Result};
use relay_lens_core::Event;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, info};

/// Line reader for JSONL event dumps
pub struct InputReader {
    reader: Lines<BufReader<File>>,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input: P) -> Result<Self> {
        let path = input.as_ref();
        if !path.exists() {
            anyhow::bail!("Input file does not exist: {}", path.display());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        let reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer

        Ok(Self {
            reader: reader.lines(),
        })
    }
}

impl Iterator for InputReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.reader.next()?;
        Some(line.context("Failed to read line from file"))
    }
}

/// Events parsed from a dump, plus how many lines were unusable
#[derive(Debug, Default)]
pub struct LoadedEvents {
    pub events: Vec<Event>,
    pub skipped_lines: usize,
}

/// Parse every line of a JSONL dump into an [`Event`]
///
/// Blank lines are ignored. Lines that are not events (bad JSON, kind out of
/// range) are counted and skipped. Read errors abort.
pub fn load_events<P: AsRef<Path>>(input: P) -> Result<LoadedEvents> {
    let mut loaded = LoadedEvents::default();

    for (line_num, line) in InputReader::new(&input)?.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match Event::try_from(line.as_str()) {
            Ok(event) => loaded.events.push(event),
            Err(e) => {
                debug!("Skipping line {}: {}", line_num + 1, e);
                loaded.skipped_lines += 1;
            }
        }
    }

    info!(
        "Loaded {} events from {} ({} lines skipped)",
        loaded.events.len(),
        input.as_ref().display(),
        loaded.skipped_lines
    );
    Ok(loaded)
}
