//! # Camflow CAM Tools
//!
//! Built-in strategies and output for the Camflow kernel.
//!
//! ## Included
//!
//! - **Slice**: layer-by-layer removal over parallel grid lines, dropped onto the models
//! - **Milling**: the task type turning a task into a toolpath
//! - **G-code**: LinuxCNC flavoured export of toolpaths

pub mod error;
pub mod export;
pub mod gcode;
pub mod milling;
pub mod slice;

// Re-export commonly used items
pub use error::{CamToolError, CamToolResult, ParameterError};
pub use export::{GCodeExportPlugin, GCodeExporterFactory, GCODE_EXPORTER};
pub use gcode::{ExportOptions, GCodeExporter};
pub use milling::{MillingPlugin, TaskTypeMilling, MILLING_TASK};
pub use slice::{
    DropCutter, GridDirection, MillingStyle, ProcessStrategySlice, SliceDefaults, SlicePlugin,
    SliceSettings, SLICE_STRATEGY,
};

use camflow_core::Plugin;

/// The strategy and exporter plugins, in loadable order (after the collection plugins)
pub fn builtin_plugins(slice: SliceDefaults, export: ExportOptions) -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(SlicePlugin::new(slice)),
        Box::new(MillingPlugin),
        Box::new(GCodeExportPlugin::new(export)),
    ]
}
