//! Whole-form conversion tests
//!
//! Covers:
//! - Loading form descriptions and option files from disk
//! - Identifier sanitization and answer codes flowing into output
//! - Parallel conversion order
//! - Rendering for the import sheet

use formscript::cli::convert::{convert_parallel, render};
use formscript::cli::load_options;
use formscript::cli::output::OutputFormat;
use formscript::{ExpressionKind, FieldRegistry, FormDescription, QuotePolicy, TranspileOptions};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::sync::Arc;
use tempfile::TempDir;

const FORM: &str = r#"{
    "fields": [
        {"path": "/data/consent", "choices": ["yes", "no"]},
        {"path": "/data/age"},
        {"path": "/data/adult_consent"},
        {"path": "/data/household/member_name"},
        {"path": "/data/household/member_age"},
        {"path": "/data/favourite_fruit", "choices": ["banana_split", "banana_bread", "apple"]}
    ],
    "expressions": [
        {"field": "/data/age", "kind": "relevance", "expression": "selected(${consent}, 'yes')"},
        {"field": "/data/age", "kind": "constraint", "expression": ". >= 0 and . <= 120"},
        {"field": "/data/adult_consent", "kind": "relevance", "expression": "${age} >= 18"},
        {"field": "/data/household/member_age", "kind": "relevance", "expression": "../member_name != ''"},
        {"field": "/data/favourite_fruit", "kind": "relevance", "expression": "not(selected(${consent}, 'no'))"},
        {"field": "/data/adult_consent", "kind": "calculation", "expression": "if(selected(${favourite_fruit}, 'banana_bread'), 1, 0)"}
    ]
}"#;

struct Workspace {
    _dir: TempDir,
    form: std::path::PathBuf,
    options: std::path::PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let form = dir.path().join("form.json");
    let options = dir.path().join("options.json");
    std::fs::write(&form, FORM).unwrap();
    std::fs::write(&options, r#"{"quote-policy": "double"}"#).unwrap();
    Workspace {
        _dir: dir,
        form,
        options,
    }
}

#[rstest]
fn test_registry_identifiers(workspace: Workspace) {
    let form = FormDescription::from_json_file(&workspace.form).unwrap();
    let registry = form.registry().unwrap();

    let identifiers: Vec<&str> = registry.iter().map(|e| e.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        vec!["consent", "age", "adultconsent", "membername", "memberage", "favouritefruit"]
    );

    let fruit = registry.get("/data/favourite_fruit").unwrap();
    assert_eq!(fruit.answer_code("banana_split"), Some("banan"));
    assert_eq!(fruit.answer_code("banana_bread"), Some("bana1"));
    assert_eq!(fruit.answer_code("apple"), Some("apple"));
}

#[rstest]
#[tokio::test]
async fn test_convert_form(workspace: Workspace) {
    let form = FormDescription::from_json_file(&workspace.form).unwrap();
    let registry = form.registry().unwrap();
    let converted = convert_parallel(
        Arc::new(registry),
        Arc::new(TranspileOptions::default()),
        form.expressions.clone(),
        3,
    )
    .await
    .unwrap();

    assert_eq!(converted.len(), form.expressions.len());
    assert!(converted.iter().all(|c| c.diagnostics.is_empty()));
    assert_eq!(converted[4].kind, ExpressionKind::Relevance);

    assert_snapshot!(render(&converted, OutputFormat::Text).unwrap(), @r#"
    (consent == "yes")
    age >= 0  and  age <= 120
    age >= 18
    membername != ''
    not((consent == "no"))
    if((favouritefruit == "bana1"), 1, 0)
    "#);
}

#[rstest]
#[tokio::test]
async fn test_options_file_and_overrides(workspace: Workspace) {
    let options = load_options(Some(workspace.options.as_path()), None, None).unwrap();
    assert_eq!(options.quote_policy, QuotePolicy::Double);

    let options = load_options(Some(workspace.options.as_path()), Some(QuotePolicy::Preserve), Some("/data/age".into()))
        .unwrap();
    assert_eq!(options.quote_policy, QuotePolicy::Preserve);
    assert_eq!(options.current_field.as_deref(), Some("/data/age"));

    let form = FormDescription::from_json_file(&workspace.form).unwrap();
    let registry = Arc::new(form.registry().unwrap());
    let double = load_options(Some(workspace.options.as_path()), None, None).unwrap();
    let converted = convert_parallel(registry, Arc::new(double), form.expressions, 2)
        .await
        .unwrap();
    assert_eq!(converted[3].output, r#"membername != """#);
}

#[rstest]
fn test_missing_files_are_errors(workspace: Workspace) {
    let missing = workspace.form.with_file_name("nope.json");
    assert!(FormDescription::from_json_file(&missing).is_err());
    assert!(load_options(Some(missing.as_path()), None, None).is_err());
}

#[test]
fn test_tsv_render_escapes_cells() {
    let registry = FieldRegistry::from_paths(["/data/note"]).unwrap();
    let form = FormDescription::from_json(
        r#"{"expressions": [{"field": "/data/note", "kind": "constraint", "expression": "${note} != 'a\tb'"}]}"#,
    )
    .unwrap();
    let converted = form.convert(&registry, &TranspileOptions::default());
    assert_eq!(
        render(&converted, OutputFormat::Tsv).unwrap(),
        "field\tkind\texpression\n/data/note\tconstraint\tnote != 'a b'"
    );
}
