//! Path compilation through the facade, under both strategies and with
//! configuration and content model loaded from disk.

mod common;

use fts_compiler::model::{APPLICATION_MODEL_URI, CONTENT_MODEL_URI};
use fts_compiler::path::{DESCENDANT_SLOP, PATH_END_MARKER};
use fts_compiler::{
    BackendQuery, CompileError, CompilerConfig, ContentModel, PathStrategy, QueryCompiler,
    SpanQuery,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn t(value: &str) -> SpanQuery {
    SpanQuery::term("PATH", value)
}

#[test]
fn test_descendant_wildcard_under_company_home() {
    let query = common::compiler()
        .compile_path("/app:company_home//*", None)
        .unwrap();
    let expected = SpanQuery::near(
        vec![
            SpanQuery::first(
                SpanQuery::near(vec![t(APPLICATION_MODEL_URI), t("company_home")], 0, true),
                2,
            ),
            SpanQuery::near(vec![t("*"), t("*"), t(PATH_END_MARKER)], 0, true),
        ],
        DESCENDANT_SLOP,
        false,
    );
    assert_eq!(query, BackendQuery::Span(expected));
}

#[test]
fn test_model_prefixes_resolve_in_paths() {
    let query = common::compiler().compile_path("/ex:reports", None).unwrap();
    assert_eq!(
        query,
        BackendQuery::Span(SpanQuery::first(
            SpanQuery::near(
                vec![t("http://example.com/model/1.0"), t("reports"), t(PATH_END_MARKER)],
                0,
                true
            ),
            3
        ))
    );

    let err = common::compiler().compile_path("/zz:reports", None).unwrap_err();
    assert!(matches!(err, CompileError::UnknownPrefix(ref p) if p == "zz"));
}

#[test]
fn test_relative_path_uses_regex() {
    let query = common::compiler().compile_path("cm:a/*", None).unwrap();
    assert_eq!(
        query,
        BackendQuery::Regexp {
            field: "PATH.raw".to_string(),
            pattern: "(.*/)?cm:a/[^/]+".to_string(),
        }
    );
}

#[test]
fn test_positional_path_to_dsl() {
    let compiler = common::compiler();
    let query = compiler.compile_path("/cm:a//*", None).unwrap();
    let dsl = compiler.to_dsl(&query).unwrap().to_json();

    assert_eq!(dsl["span_near"]["slop"], json!(DESCENDANT_SLOP));
    assert_eq!(dsl["span_near"]["in_order"], json!(false));

    let anchored = &dsl["span_near"]["clauses"][0]["span_first"];
    assert_eq!(anchored["end"], json!(2));
    assert_eq!(
        anchored["match"]["span_near"]["clauses"][0],
        json!({ "span_term": { "PATH": { "value": CONTENT_MODEL_URI } } })
    );

    let tail = &dsl["span_near"]["clauses"][1]["span_near"]["clauses"];
    assert_eq!(
        tail[0],
        json!({ "span_multi": { "match": { "wildcard": { "PATH": { "value": "*" } } } } })
    );
    assert_eq!(tail[2], json!({ "span_term": { "PATH": { "value": "/" } } }));
}

#[test]
fn test_predicates_and_axes_are_unsupported() {
    let compiler = common::compiler();
    for path in ["/cm:a[1]", "/cm:a/@cm:name", "/cm:a/child::cm:b", "/cm:a/.."] {
        assert!(
            matches!(compiler.compile_path(path, None), Err(CompileError::Unsupported(_))),
            "{}",
            path
        );
    }
}

#[test]
fn test_config_and_model_from_files() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.json");
    let model_path = tmp.path().join("model.json");
    fs::write(
        &config_path,
        r#"{ "path_strategy": "regex", "path_regex_field": "PATH.raw" }"#,
    )
    .unwrap();
    fs::write(&model_path, common::MODEL_JSON).unwrap();

    let config = CompilerConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.path_strategy, PathStrategy::Regex);
    // keys left out keep their defaults
    assert_eq!(config.default_field, "TEXT");

    let model = ContentModel::from_json_file(&model_path).unwrap();
    let compiler = QueryCompiler::from_model(model, config);
    let query = compiler.compile_path("/app:company_home//*", None).unwrap();
    assert_eq!(
        query,
        BackendQuery::Regexp {
            field: "PATH.raw".to_string(),
            pattern: "/app:company_home/(.*/)?[^/]+".to_string(),
        }
    );
    assert_eq!(
        compiler.to_dsl(&query).unwrap().to_json(),
        json!({ "regexp": { "PATH.raw": { "value": "/app:company_home/(.*/)?[^/]+" } } })
    );
}

#[test]
fn test_missing_config_file_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = CompilerConfig::from_json_file(tmp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CompileError::Io(_)));
}
