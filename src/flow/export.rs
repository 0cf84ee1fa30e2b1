use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use camflow_camtools::{GCodeExporterFactory, GCODE_EXPORTER};
use camflow_core::Toolpath;

use super::interpreter::name_list;
use super::{FlowError, FlowInterpreter, FlowReport};

const TOOLPATH_SOURCE: &str = "toolpath";
const FILE_TARGET: &str = "file";

fn required<'v>(
    value: &'v Value,
    field: &str,
    entry: &str,
    key: &'static str,
) -> Result<&'v Value, FlowError> {
    value.get(field).ok_or_else(|| FlowError::MissingKey {
        entry: entry.to_string(),
        key,
    })
}

fn expect_str(
    value: &Value,
    expected: &str,
    entry: &str,
    key: &'static str,
) -> Result<(), FlowError> {
    if value.as_str() == Some(expected) {
        Ok(())
    } else {
        Err(FlowError::Unsupported {
            entry: entry.to_string(),
            key,
            value: value.to_string(),
        })
    }
}

impl FlowInterpreter<'_> {
    pub(super) fn run_exports(&self, section: &Value, base_dir: &Path, report: &mut FlowReport) {
        let Some(entries) = section.as_array() else {
            error!(
                "{}",
                FlowError::Section {
                    section: "exports".to_string(),
                    expected: "a sequence of export entries",
                }
            );
            report.skipped += 1;
            return;
        };
        for (index, spec) in entries.iter().enumerate() {
            let entry = format!("export #{}", index + 1);
            match self.export(&entry, spec, base_dir) {
                Ok(path) => report.exports.push(path),
                Err(e) => {
                    error!("Export failed: {}", e);
                    report.skipped += 1;
                }
            }
        }
    }

    /// Run one `exports` entry, returning the written file
    ///
    /// Toolpath names that do not resolve are logged and left out of the output.
    pub fn export(&self, entry: &str, spec: &Value, base_dir: &Path) -> Result<PathBuf, FlowError> {
        let source = required(spec, "source", entry, "source")?;
        let source_type = required(source, "type", entry, "source.type")?;
        let target = required(spec, "target", entry, "target")?;
        let target_type = required(target, "type", entry, "target.type")?;
        expect_str(source_type, TOOLPATH_SOURCE, entry, "source.type")?;
        let names = required(source, "toolpaths", entry, "source.toolpaths")?;
        let names = name_list(names).ok_or_else(|| FlowError::Unsupported {
            entry: entry.to_string(),
            key: "source.toolpaths",
            value: names.to_string(),
        })?;
        expect_str(target_type, FILE_TARGET, entry, "target.type")?;
        let location = required(target, "location", entry, "target.location")?;
        let location = location.as_str().ok_or_else(|| FlowError::Unsupported {
            entry: entry.to_string(),
            key: "target.location",
            value: location.to_string(),
        })?;

        let collection = self.core.collection::<Toolpath>()?;
        let toolpaths: Vec<_> = names
            .into_iter()
            .filter_map(|name| match collection.get_by_name(name) {
                Ok(toolpath) => Some(toolpath),
                Err(e) => {
                    error!("Unknown toolpath selected for {}: {}", entry, e);
                    None
                }
            })
            .collect();

        let factory = self
            .core
            .namespace()
            .get::<GCodeExporterFactory>(GCODE_EXPORTER)
            .ok_or_else(|| FlowError::Unavailable(GCODE_EXPORTER.to_string()))?;
        let path = base_dir.join(location);
        let file = File::create(&path).map_err(|source| FlowError::Target {
            path: path.clone(),
            source,
        })?;

        let mut exporter = factory.create(BufWriter::new(file));
        for toolpath in &toolpaths {
            exporter.add_moves(toolpath.moves(), toolpath.filters())?;
        }
        exporter.finish()?;
        info!("Exported {} toolpaths to {}", toolpaths.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use serde_json::json;

    fn export(spec: Value) -> Result<PathBuf, FlowError> {
        let environment = Environment::default();
        let dir = tempfile::tempdir().unwrap();
        FlowInterpreter::for_environment(&environment).export("export #1", &spec, dir.path())
    }

    #[test]
    fn test_missing_keys_abort_the_entry() {
        let target = json!({"type": "file", "location": "out.ngc"});
        let source = json!({"type": "toolpath", "toolpaths": []});
        let cases = [
            (json!({"target": target}), "source"),
            (json!({"source": {"toolpaths": []}, "target": target}), "source.type"),
            (json!({"source": source}), "target"),
            (json!({"source": source, "target": {"location": "x"}}), "target.type"),
            (json!({"source": source, "target": {"type": "file"}}), "target.location"),
            (
                json!({"source": {"type": "toolpath"}, "target": target}),
                "source.toolpaths",
            ),
        ];
        for (spec, missing) in cases {
            match export(spec) {
                Err(FlowError::MissingKey { key, .. }) => assert_eq!(key, missing),
                other => panic!("expected missing {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_unsupported_types() {
        let err = export(json!({
            "source": {"type": "model", "toolpaths": []},
            "target": {"type": "file", "location": "out.ngc"}
        }))
        .unwrap_err();
        assert!(matches!(err, FlowError::Unsupported { key: "source.type", .. }));

        let err = export(json!({
            "source": {"type": "toolpath", "toolpaths": []},
            "target": {"type": "socket", "location": "out.ngc"}
        }))
        .unwrap_err();
        assert!(matches!(err, FlowError::Unsupported { key: "target.type", .. }));
    }

    #[test]
    fn test_export_without_exporter() {
        let mut config = camflow_settings::Config::default();
        config.plugins.disabled.push("GCodeExport".to_string());
        let environment = Environment::new(&config);
        let dir = tempfile::tempdir().unwrap();
        let err = FlowInterpreter::for_environment(&environment)
            .export(
                "export #1",
                &json!({
                    "source": {"type": "toolpath", "toolpaths": []},
                    "target": {"type": "file", "location": "out.ngc"}
                }),
                dir.path(),
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::Unavailable(_)));
        assert!(!dir.path().join("out.ngc").exists());
    }
}
