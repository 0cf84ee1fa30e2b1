//! Exporter plugin
//!
//! Publishes a [`GCodeExporterFactory`] into the namespace and adds the configured safety
//! height to every toolpath's filters through the `toolpath_filters` chain.

use std::any::Any;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use camflow_core::{
    ChainFn, Core, Plugin, PluginError, ToolpathFilter, ToolpathFilterRequest,
    TOOLPATH_FILTERS_CHAIN,
};

use crate::gcode::{ExportOptions, GCodeExporter};

/// Namespace key of the G-code exporter factory
pub const GCODE_EXPORTER: &str = "gcode_exporter";

/// Weight of the safety height link in the filter chain
const SAFETY_HEIGHT_WEIGHT: i32 = 50;

/// Creates G-code exporters with shared options
#[derive(Debug, Clone, Default)]
pub struct GCodeExporterFactory {
    options: ExportOptions,
}

impl GCodeExporterFactory {
    /// Create a factory
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// The options every exporter starts with
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Create an exporter writing to `writer`
    pub fn create<W: Write>(&self, writer: W) -> GCodeExporter<W> {
        GCodeExporter::new(writer, self.options.clone())
    }
}

/// Plugin providing G-code export
pub struct GCodeExportPlugin {
    options: ExportOptions,
    link: RefCell<Option<ChainFn>>,
}

impl GCodeExportPlugin {
    /// Create the plugin
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            link: RefCell::new(None),
        }
    }
}

impl Plugin for GCodeExportPlugin {
    fn name(&self) -> &str {
        "GCodeExport"
    }

    fn setup(&self, core: &Rc<Core>) -> Result<(), PluginError> {
        core.namespace()
            .publish(
                GCODE_EXPORTER,
                Rc::new(GCodeExporterFactory::new(self.options.clone())),
            )
            .map_err(|e| PluginError::SetupFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let safety_height = self.options.safety_height;
        let link: ChainFn = Rc::new(move |args: &mut dyn Any| {
            if let Some(request) = args.downcast_mut::<ToolpathFilterRequest>() {
                let declared = request
                    .filters
                    .iter()
                    .any(|f| matches!(f, ToolpathFilter::SafetyHeight(_)));
                if !declared {
                    request.filters.push(ToolpathFilter::SafetyHeight(safety_height));
                }
            }
        });
        core.chains()
            .register_chain(TOOLPATH_FILTERS_CHAIN, link.clone(), SAFETY_HEIGHT_WEIGHT);
        *self.link.borrow_mut() = Some(link);
        Ok(())
    }

    fn teardown(&self, core: &Core) {
        if let Some(link) = self.link.borrow_mut().take() {
            core.chains().unregister_chain(TOOLPATH_FILTERS_CHAIN, &link);
        }
        core.namespace().withdraw(GCODE_EXPORTER);
    }
}
