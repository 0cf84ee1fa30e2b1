use camflow_camtools::{ExportOptions, GCodeExporterFactory};
use camflow_core::{Move, Point, Tool, ToolShape, ToolpathFilter};
use std::fs;
use std::io::BufWriter;

#[test]
fn test_two_toolpaths_share_one_program() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.ngc");
    let factory = GCodeExporterFactory::new(ExportOptions::default());

    let first = Tool::new("small", 1, ToolShape::FlatBottom, 1.0);
    let second = Tool::new("large", 2, ToolShape::FlatBottom, 3.0);
    let moves = [
        Move::rapid(Point::new(0.0, 0.0, 2.0)),
        Move::cut(Point::new(0.0, 0.0, -1.0)),
        Move::cut(Point::new(5.0, 0.0, -1.0)),
    ];

    let mut exporter = factory.create(BufWriter::new(fs::File::create(&path).unwrap()));
    exporter.add_moves(&moves, &first.toolpath_filters()).unwrap();
    exporter.add_moves(&moves, &second.toolpath_filters()).unwrap();
    exporter.finish().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let change = lines.iter().position(|l| *l == "T2 M6").unwrap();
    assert!(lines[..change].contains(&"T1 M6"));
    // the spindle stops and the tool retracts before the change
    assert_eq!(lines[change - 1], "M5");
    assert_eq!(lines[change - 2], "G0 Z25.000");
    assert_eq!(lines.iter().filter(|l| **l == "G21").count(), 1);
    assert_eq!(lines.last(), Some(&"M2"));
    assert!(lines.iter().any(|l| l.starts_with("G4 P3")));
}

#[test]
fn test_filters_without_spindle_delay() {
    let mut tool = Tool::new("quick", 3, ToolShape::BallNose, 1.0);
    tool.spindle.spin_up_enabled = false;
    let filters = tool.toolpath_filters();
    assert!(!filters
        .iter()
        .any(|f| matches!(f, ToolpathFilter::SpinUpDelay(_))));

    let factory = GCodeExporterFactory::default();
    let mut exporter = factory.create(Vec::new());
    exporter.add_moves(&[], &filters).unwrap();
    let text = String::from_utf8(exporter.finish().unwrap()).unwrap();
    assert!(!text.contains("G4"));
    assert!(text.contains("M3"));
}
