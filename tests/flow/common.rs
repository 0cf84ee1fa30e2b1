use camflow::{Document, Environment, FlowInterpreter, FlowReport, Format};
use serde_json::{json, Value};
use std::path::Path;

/// One tool, one slice process, absolute bounds, a flat floor model and a task using them
pub fn job() -> Value {
    json!({
        "tools": {
            "T1": {"shape": "flat_bottom", "tool_id": 1, "radius": 1.0, "feed": 300},
            "T2": {"shape": "ball_nose", "tool_id": 2, "diameter": 4.0}
        },
        "processes": {
            "rough": {"strategy": "slice", "step_down": 1.0, "overlap": 0.2}
        },
        "bounds": {
            "stock": {"specification": "absolute", "lower": [0, 0, -2], "upper": [6, 4, 0]}
        },
        "tasks": {
            "job": {
                "tool": "T1",
                "process": "rough",
                "bounds": "stock",
                "collision_models": ["floor"]
            },
            "finish": {
                "tool": "T2",
                "process": "rough",
                "bounds": "stock",
                "collision_models": ["floor"]
            }
        },
        "models": {
            "floor": {
                "source": {
                    "type": "object",
                    "triangles": [[[-5, -5, -1.5], [20, -5, -1.5], [-5, 20, -1.5]]]
                }
            }
        }
    })
}

/// Merge `extra` sections into `base`
pub fn with(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

pub fn run(environment: &Environment, spec: &Value, base_dir: &Path) -> FlowReport {
    let document =
        Document::parse(&spec.to_string(), Some(Format::Json), base_dir.to_path_buf()).unwrap();
    FlowInterpreter::for_environment(environment).run(&document)
}
