//! File inclusion and module import.

mod common;

use std::{fs, io::Write};

use common::interpreter;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn include_runs_in_the_current_scope() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "header.tpl", "included {% shared = 42; %}");
    let (mut interp, output) = interpreter();
    let script = format!("{{% ok = include(\"{path}\"); %}}{{{{ ok }}}}|{{{{ shared }}}}");
    interp.execute_template(&script).unwrap();
    assert_eq!(output.to_string_lossy(), "included true|42");
}

#[test]
fn include_of_missing_file_raises_import_error() {
    let (mut interp, _output) = interpreter();
    let error = interp
        .execute_template("{% include(\"/no/such/file.tpl\"); %}")
        .unwrap_err();
    assert_eq!(error.class_name, "ImportError");
    assert_eq!(error.message, "Unable to include file");
}

#[test]
fn include_of_bad_source_raises_syntax_error() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.tpl", "{% if %}");
    let (mut interp, _output) = interpreter();
    let error = interp
        .execute_template(&format!("{{% include(\"{path}\"); %}}"))
        .unwrap_err();
    assert_eq!(error.class_name, "SyntaxError");
    assert!(!error.message.is_empty());
}

#[test]
fn import_returns_module_locals_as_map() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "module.tpl", "{% answer = 42; double = function(x) => x * 2; %}");
    let (mut interp, _output) = interpreter();
    let repr = interp
        .eval_expression(&format!("m = import(\"{path}\"); m[\"answer\"]"))
        .unwrap();
    assert_eq!(repr, Some("42".to_owned()));
    // Imported functions remain callable.
    let repr = interp.eval_expression("m[\"double\"](21)").unwrap();
    assert_eq!(repr, Some("42".to_owned()));
    // Module locals do not leak into the importing scope.
    let error = interp.eval_expression("answer").unwrap_err();
    assert_eq!(error.class_name, "NameError");
}

#[test]
fn import_is_memoized_by_canonical_path() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "counted.tpl", "{% tally = 1; %}");
    let (mut interp, _output) = interpreter();
    // Identity equality: the same module map is returned for both imports.
    let source = format!("a = import(\"{path}\"); b = import(\"{path}\"); a == b");
    assert_eq!(interp.eval_expression(&source).unwrap(), Some("true".to_owned()));
}
