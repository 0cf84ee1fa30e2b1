//! G-code export
//!
//! Streams toolpaths as LinuxCNC flavoured G-code. Filters carried by a toolpath (tool
//! selection, spindle, feed, safety height) are applied before its moves; rapids that
//! change the xy position always travel at the safety height.

use std::io::Write;

use camflow_core::{Move, MoveKind, Point, ToolpathFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CamToolResult;

/// Exporter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Height for rapid moves between cuts, in mm
    pub safety_height: f64,
    /// Decimal places of coordinates
    pub decimal_places: usize,
    /// Prefix lines with `N` numbers
    pub line_numbers: bool,
    /// Write a comment header
    pub header_comment: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            safety_height: 25.0,
            decimal_places: 3,
            line_numbers: false,
            header_comment: true,
        }
    }
}

/// Modal machine state the exporter tracks to avoid repeating words
#[derive(Debug, Clone, Default)]
struct MachineState {
    position: Option<Point>,
    tool: Option<u32>,
    spindle_speed: Option<f64>,
    spindle_on: bool,
    feed: Option<f64>,
    plunge_feed: Option<f64>,
    written_feed: Option<f64>,
    at_safety_height: bool,
}

/// G-code writer for one output stream
pub struct GCodeExporter<W: Write> {
    writer: W,
    options: ExportOptions,
    state: MachineState,
    safety_height: f64,
    line_number: u32,
    started: bool,
    toolpaths: usize,
}

impl<W: Write> GCodeExporter<W> {
    /// Create an exporter writing to `writer`
    pub fn new(writer: W, options: ExportOptions) -> Self {
        let safety_height = options.safety_height;
        Self {
            writer,
            options,
            state: MachineState::default(),
            safety_height,
            line_number: 0,
            started: false,
            toolpaths: 0,
        }
    }

    fn number(&self, value: f64) -> String {
        let text = format!("{:.*}", self.options.decimal_places, value);
        // "-0.000" reads badly
        if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            text.trim_start_matches('-').to_string()
        } else {
            text
        }
    }

    fn line(&mut self, text: &str) -> CamToolResult<()> {
        if self.options.line_numbers {
            self.line_number += 10;
            writeln!(self.writer, "N{} {}", self.line_number, text)?;
        } else {
            writeln!(self.writer, "{}", text)?;
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) -> CamToolResult<()> {
        writeln!(self.writer, "({})", text)?;
        Ok(())
    }

    fn start(&mut self) -> CamToolResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        if self.options.header_comment {
            self.comment(&format!(
                "Generated by camflow {}",
                env!("CARGO_PKG_VERSION")
            ))?;
        }
        self.line("G21")?;
        self.line("G90")?;
        self.line("G17")?;
        self.line("G40")?;
        self.line("G49")?;
        self.line("G64")
    }

    fn apply_filter(&mut self, filter: &ToolpathFilter) -> CamToolResult<()> {
        match *filter {
            ToolpathFilter::SafetyHeight(height) => self.safety_height = height,
            ToolpathFilter::SelectTool(id) => {
                if self.state.tool != Some(id) {
                    self.retract()?;
                    if self.state.spindle_on {
                        self.line("M5")?;
                        self.state.spindle_on = false;
                    }
                    self.line(&format!("T{} M6", id))?;
                    self.state.tool = Some(id);
                }
            }
            ToolpathFilter::SpindleSpeed(speed) => {
                if self.state.spindle_speed != Some(speed) {
                    self.line(&format!("S{}", self.number(speed)))?;
                    self.state.spindle_speed = Some(speed);
                }
            }
            ToolpathFilter::SpindleEnabled(true) => {
                if !self.state.spindle_on {
                    self.line("M3")?;
                    self.state.spindle_on = true;
                }
            }
            ToolpathFilter::SpindleEnabled(false) => {
                if self.state.spindle_on {
                    self.line("M5")?;
                    self.state.spindle_on = false;
                }
            }
            ToolpathFilter::SpinUpDelay(seconds) => {
                if seconds > 0.0 {
                    self.line(&format!("G4 P{}", self.number(seconds)))?;
                }
            }
            ToolpathFilter::Feedrate(feed) => self.state.feed = Some(feed),
            ToolpathFilter::PlungeFeedrate(feed) => self.state.plunge_feed = Some(feed),
        }
        Ok(())
    }

    fn retract(&mut self) -> CamToolResult<()> {
        match self.state.position {
            Some(position) if position.z >= self.safety_height => Ok(()),
            Some(position) => self.rapid_to(Point::new(position.x, position.y, self.safety_height)),
            None if self.state.at_safety_height => Ok(()),
            None => {
                self.line(&format!("G0 Z{}", self.number(self.safety_height)))?;
                self.state.at_safety_height = true;
                Ok(())
            }
        }
    }

    fn axes(&self, target: &Point) -> String {
        let mut words = Vec::new();
        for (axis, letter) in ["X", "Y", "Z"].iter().enumerate() {
            let changed = self
                .state
                .position
                .map_or(true, |current| self.number(current[axis]) != self.number(target[axis]));
            if changed {
                words.push(format!("{}{}", letter, self.number(target[axis])));
            }
        }
        words.join(" ")
    }

    fn rapid_to(&mut self, target: Point) -> CamToolResult<()> {
        let axes = self.axes(&target);
        if !axes.is_empty() {
            self.line(&format!("G0 {}", axes))?;
        }
        self.state.position = Some(target);
        Ok(())
    }

    fn rapid(&mut self, target: Point) -> CamToolResult<()> {
        let moves_xy = self
            .state
            .position
            .map_or(true, |p| p.x != target.x || p.y != target.y);
        if moves_xy {
            self.retract()?;
            let travel_z = self
                .state
                .position
                .map_or(self.safety_height, |p| p.z.max(self.safety_height));
            self.rapid_to(Point::new(target.x, target.y, travel_z))?;
        }
        self.rapid_to(target)
    }

    fn cut(&mut self, target: Point) -> CamToolResult<()> {
        let axes = self.axes(&target);
        if axes.is_empty() {
            return Ok(());
        }
        let plunge = self
            .state
            .position
            .is_some_and(|p| p.x == target.x && p.y == target.y && target.z < p.z);
        let feed = if plunge {
            self.state.plunge_feed.or(self.state.feed)
        } else {
            self.state.feed
        };
        let mut text = format!("G1 {}", axes);
        if let Some(feed) = feed {
            if self.state.written_feed != Some(feed) {
                text.push_str(&format!(" F{}", self.number(feed)));
                self.state.written_feed = Some(feed);
            }
        }
        self.line(&text)?;
        self.state.position = Some(target);
        Ok(())
    }

    /// Write one toolpath: its filters, then its moves
    pub fn add_moves(&mut self, moves: &[Move], filters: &[ToolpathFilter]) -> CamToolResult<()> {
        self.start()?;
        self.toolpaths += 1;
        // safety height first so a tool change already retracts to it
        for filter in filters
            .iter()
            .filter(|f| matches!(f, ToolpathFilter::SafetyHeight(_)))
        {
            self.apply_filter(filter)?;
        }
        for filter in filters
            .iter()
            .filter(|f| !matches!(f, ToolpathFilter::SafetyHeight(_)))
        {
            self.apply_filter(filter)?;
        }
        for m in moves {
            match m.kind {
                MoveKind::Rapid => self.rapid(m.position)?,
                MoveKind::Cut => self.cut(m.position)?,
            }
        }
        debug!("Exported toolpath with {} moves", moves.len());
        Ok(())
    }

    /// Retract, stop the spindle, end the program and hand the writer back
    pub fn finish(mut self) -> CamToolResult<W> {
        self.start()?;
        self.retract()?;
        if self.state.spindle_on {
            self.line("M5")?;
        }
        self.line("M2")?;
        self.writer.flush()?;
        debug!("Finished G-code export of {} toolpaths", self.toolpaths);
        Ok(self.writer)
    }
}
