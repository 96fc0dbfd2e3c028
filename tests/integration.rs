// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for bpschema parsing, output and the CLI.

use bpschema::model::{Blueprint, Field};
use bpschema::parser::{self, ParseError};
use bpschema::writer::{OutputFormat, SchemaWriter, WriteError};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const CC_PAGE: &str = r#"<html>
<body>
<h2>cc_binary</h2>
<div class="simple" id="cc_binary.name">
  <span class="fixed">&nbsp;</span><b>name</b> <i>string</i>
</div>
<div class="simple" id="cc_binary.arch.arm.srcs">
  <span class="fixed">&nbsp;</span><b>arch.arm.srcs</b> <i>list of strings</i>
</div>
</body>
</html>
"#;

const JAVA_PAGE: &str = r#"<html>
<body>
<h2>java_library</h2>
<div class="simple" id="java_library.static_libs">
  <b>static_libs</b> <i>list of strings</i>, List of java libraries to
  link with.
</div>
<div class="accordion" id="java_library.optimize">
  <span class="fixed">&#x2295;</span><b>optimize</b> <i>TestOptions</i>
</div>
<div class="collapsible">
  <div class="simple" id="java_library.optimize.enabled">
    <b>enabled</b> <i>bool</i>, Whether to run R8 on the "module".
  </div>
</div>
<h2>java_test</h2>
<div class="simple" id="java_test.test_suites">
  <b>test_suites</b> <i>list of strings</i>
</div>
</body>
</html>
"#;

fn render(format: OutputFormat, blueprints: &[Blueprint]) -> Result<String, WriteError> {
    let mut out = Vec::new();
    {
        let mut writer = format.writer(&mut out);
        writer.start()?;
        for blueprint in blueprints {
            blueprint.print(writer.as_mut())?;
        }
        writer.end()?;
    }
    Ok(String::from_utf8(out).unwrap())
}

/// Counts children and the deepest nesting level below a field list.
fn shape(fields: &[Field]) -> (usize, usize) {
    fields.iter().fold((0, 0), |(count, depth), field| {
        let (child_count, child_depth) = shape(field.fields());
        (count + 1 + child_count, depth.max(1 + child_depth))
    })
}

#[test]
fn cc_binary_end_to_end_xml() {
    let blueprints = parser::parse_document(CC_PAGE).unwrap();
    let xml = render(OutputFormat::Xml, &blueprints).unwrap();

    assert_eq!(
        xml,
        "\
<blueprints>
    <blueprint name=\"cc_binary\">
        <field name=\"name\" type=\"string\"/>
        <object-field name=\"arch\">
            <object-field name=\"arm\">
                <field name=\"srcs\" type=\"string[]\"/>
            </object-field>
        </object-field>
    </blueprint>
</blueprints>
"
    );
}

#[test]
fn one_blueprint_per_heading_in_order() {
    let blueprints = parser::parse_document(JAVA_PAGE).unwrap();
    let names: Vec<&str> = blueprints.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["java_library", "java_test"]);

    let xml = render(OutputFormat::Xml, &blueprints).unwrap();
    assert_eq!(xml.matches("<blueprint ").count(), 2);
    assert!(xml.find("java_library").unwrap() < xml.find("java_test").unwrap());
}

#[test]
fn writers_share_topology() {
    let blueprints = parser::parse_document(JAVA_PAGE).unwrap();
    let library = &blueprints[0];
    assert_eq!(shape(&library.fields), (3, 2));

    let xml = render(OutputFormat::Xml, &blueprints).unwrap();
    let text = render(OutputFormat::Text, &blueprints).unwrap();

    let xml_fields = xml.matches("<field ").count() + xml.matches("<object-field ").count();
    let text_fields = text.lines().filter(|line| line.contains(" (")).count();
    assert_eq!(xml_fields, 4);
    assert_eq!(text_fields, 4);
    assert_eq!(
        xml.matches("<object-field ").count(),
        text.lines().filter(|l| l.ends_with(") {")).count()
    );
}

#[test]
fn java_page_types_and_descriptions() {
    let blueprints = parser::parse_document(JAVA_PAGE).unwrap();
    let xml = render(OutputFormat::Xml, &blueprints).unwrap();

    assert!(xml.contains(
        r#"<field name="static_libs" type="blueprint[]" descr="List of java libraries to\n  link with."/>"#
    ));
    assert!(xml.contains(r#"<object-field name="optimize" type="string[]">"#));
    assert!(xml.contains(
        r#"<field name="enabled" type="bool" descr="Whether to run R8 on the &quot;module&quot;."/>"#
    ));
    assert!(xml.contains(r#"<field name="test_suites" type="string[]"/>"#));
}

#[test]
fn unsupported_type_only_breaks_xml() {
    let html = r#"<h2>m</h2><div class="simple" id="m.x"><b>x</b><i>frobnicate</i></div>"#;
    let blueprints = parser::parse_document(html).unwrap();

    let err = render(OutputFormat::Xml, &blueprints).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("frobnicate"), "{message}");
    assert!(message.contains("`x`"), "{message}");

    let text = render(OutputFormat::Text, &blueprints).unwrap();
    assert_eq!(text, "m {\n    x (frobnicate; )\n}\n");
}

#[test]
fn broken_markup_is_rejected() {
    let html = "<h2>m</h2>\n<div class=\"collapsible\">\n</span>\n";
    let err = parser::parse_document(html).unwrap_err();
    assert!(matches!(err, ParseError::Markup { line: 3, .. }), "{err:?}");
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bpschema"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bpschema")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn cli_converts_directory() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("cc.html"), CC_PAGE).unwrap();
    fs::write(docs.join("java.html"), JAVA_PAGE).unwrap();
    fs::write(docs.join("notes.txt"), "<h2>ignored</h2>").unwrap();
    let out = dir.path().join("schema.xml");

    let output = run(&["--in", path_str(&docs), "--out", path_str(&out), "-q"]);
    assert!(output.status.success(), "{output:?}");

    let xml = fs::read_to_string(&out).unwrap();
    assert!(xml.starts_with("<blueprints>\n"));
    assert!(xml.ends_with("</blueprints>\n"));
    let names: Vec<&str> = xml
        .lines()
        .filter_map(|line| line.trim().strip_prefix("<blueprint name=\""))
        .collect();
    assert_eq!(
        names,
        ["cc_binary\">", "java_library\">", "java_test\">"]
    );
}

#[test]
fn cli_writes_text_format() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cc.html"), CC_PAGE).unwrap();
    let out = dir.path().join("schema.txt");

    let output = run(&[
        "-i",
        path_str(dir.path()),
        "-o",
        path_str(&out),
        "--format",
        "text",
    ]);
    assert!(output.status.success(), "{output:?}");

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("cc_binary {\n    name (string; )\n"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Reading"));
}

#[test]
fn cli_rejects_bad_paths() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = path_str(dir.path());
    let missing = dir.path().join("missing");
    let nested = missing.join("schema.xml");

    let no_input = run(&["--out", "schema.xml"]);
    assert!(!no_input.status.success());
    assert!(String::from_utf8_lossy(&no_input.stderr).contains("MissingInput"));

    let no_output = run(&["--in", dir_str]);
    assert!(!no_output.status.success());
    assert!(String::from_utf8_lossy(&no_output.stderr).contains("MissingOutput"));

    let bad_input = run(&["--in", path_str(&missing), "--out", "schema.xml"]);
    assert!(!bad_input.status.success());
    assert!(String::from_utf8_lossy(&bad_input.stderr).contains("InputNotFound"));

    let out_is_dir = run(&["--in", dir_str, "--out", dir_str]);
    assert!(!out_is_dir.status.success());
    assert!(String::from_utf8_lossy(&out_is_dir.stderr).contains("OutputIsDirectory"));

    let no_parent = run(&["--in", dir_str, "--out", path_str(&nested)]);
    assert!(!no_parent.status.success());
    assert!(String::from_utf8_lossy(&no_parent.stderr).contains("OutputDirNotFound"));
}

#[test]
fn cli_fails_on_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(
        docs.join("odd.html"),
        r#"<h2>m</h2><div class="simple" id="m.x"><b>x</b><i>frobnicate</i></div>"#,
    )
    .unwrap();
    let out = dir.path().join("schema.xml");

    let output = run(&["--in", path_str(&docs), "--out", path_str(&out)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("frobnicate"), "{stderr}");
}
