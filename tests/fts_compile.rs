//! End-to-end tests for FTS expressions: parsing, templates, auto-phrase and
//! field resolution against the fixture content model.

mod common;

use fts_compiler::field::FieldKind;
use fts_compiler::fts::Connective;
use fts_compiler::{
    CompileError, Constraint, ConstraintKind, FtsOptions, MatchMode, Occur, QueryMode, RerankPhase,
    TemplateRegistry,
};

fn compile(query: &str) -> Constraint {
    common::compiler()
        .compile_fts(query, &FtsOptions::default())
        .unwrap()
}

fn field_names(constraint: &Constraint) -> Vec<String> {
    constraint
        .leaves()
        .into_iter()
        .filter_map(|leaf| leaf.field().map(|f| f.index_field()))
        .collect()
}

#[test]
fn test_compilation_is_deterministic() {
    let compiler = common::compiler();
    let options = FtsOptions::default().with_rerank_phase(RerankPhase::SinglePassWithAutoPhrase);
    let query = "big brown dog OR cm:title:(\"annual report\"~2 -draft) ex:pages:[1 TO 10>";

    let first = compiler.compile_fts(query, &options).unwrap();
    let second = compiler.compile_fts(query, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_single_clause_collapses_at_every_level() {
    let constraint = compile("((report))");
    assert!(matches!(constraint.kind, ConstraintKind::Term { .. }));
    assert!(constraint.children().is_empty());
}

#[test]
fn test_mixed_connectives() {
    let constraint = compile("+cm:name:alpha |beta OR !gamma");
    let ConstraintKind::Disjunction { children } = &constraint.kind else {
        panic!("expected disjunction, got {:?}", constraint.kind);
    };
    assert_eq!(children.len(), 2);

    let conjunction = &children[0];
    assert_eq!(conjunction.children()[0].occur, Occur::Mandatory);
    assert_eq!(conjunction.children()[1].occur, Occur::Optional);
    assert_eq!(children[1].occur, Occur::Exclude);
}

#[test]
fn test_disjunction_mode() {
    let options = FtsOptions::default().with_mode(QueryMode::DefaultDisjunction);
    let constraint = common::compiler()
        .compile_fts("alpha beta", &options)
        .unwrap();
    assert!(matches!(constraint.kind, ConstraintKind::Disjunction { .. }));
}

#[test]
fn test_field_group_connective() {
    let options = FtsOptions::default().with_default_connective(Connective::Or);
    let constraint = common::compiler()
        .compile_fts("cm:title:(alpha beta)", &options)
        .unwrap();
    assert!(matches!(constraint.kind, ConstraintKind::Disjunction { .. }));
    assert_eq!(field_names(&constraint), vec!["cm:title", "cm:title"]);
}

#[test]
fn test_cmis_mode_rejects_extended_syntax() {
    let compiler = common::compiler();
    let options = FtsOptions::default().with_mode(QueryMode::Cmis);

    assert!(compiler.compile_fts("alpha -beta OR \"gamma delta\"", &options).is_ok());
    let err = compiler.compile_fts("cm:name:alpha", &options).unwrap_err();
    assert!(matches!(err, CompileError::Syntax { position: 0, .. }));
}

#[test]
fn test_auto_phrase_branches() {
    let compiler = common::compiler();

    let single = compiler
        .compile_fts(
            "big brown dog",
            &FtsOptions::default().with_rerank_phase(RerankPhase::SinglePassWithAutoPhrase),
        )
        .unwrap();
    let branches = single.children();
    assert_eq!(branches.len(), 2);
    assert!(matches!(branches[0].kind, ConstraintKind::Conjunction { .. }));
    assert!(matches!(
        &branches[1].kind,
        ConstraintKind::Phrase { text, .. } if text == "big brown dog"
    ));

    let rerank = compiler
        .compile_fts(
            "big brown dog",
            &FtsOptions::default().with_rerank_phase(RerankPhase::Rerank),
        )
        .unwrap();
    assert!(matches!(
        &rerank.kind,
        ConstraintKind::Phrase { text, .. } if text == "big brown dog"
    ));

    let plain = compiler
        .compile_fts(
            "big brown dog",
            &FtsOptions::default().with_rerank_phase(RerankPhase::QueryPhase),
        )
        .unwrap();
    assert!(matches!(plain.kind, ConstraintKind::Conjunction { .. }));
}

#[test]
fn test_template_redirects_to_derived_field() {
    let templates = TemplateRegistry::from_map([("content", "%cm:content.size")]).unwrap();
    let options = FtsOptions::default().with_templates(templates);

    let constraint = common::compiler()
        .compile_fts("content:1000", &options)
        .unwrap();
    assert_eq!(field_names(&constraint), vec!["cm:content.size"]);
    let field = constraint.field().unwrap();
    assert!(!field.is_tokenized());
}

#[test]
fn test_default_field_template_with_boost() {
    let templates =
        TemplateRegistry::from_map([("TEXT", "%(cm:name cm:title cm:content)")]).unwrap();
    let options = FtsOptions::default().with_templates(templates);

    let constraint = common::compiler()
        .compile_fts("report^4", &options)
        .unwrap();
    assert_eq!(constraint.boost, Some(4.0));
    assert_eq!(
        field_names(&constraint),
        vec!["cm:name", "cm:title", "cm:content"]
    );
}

#[test]
fn test_duplicate_template_is_rejected() {
    let err = TemplateRegistry::from_map([("content", "%cm:content"), ("Content", "%cm:name")])
        .unwrap_err();
    assert!(matches!(err, CompileError::DuplicateTemplate(_)));
}

#[test]
fn test_field_forms_resolve_to_the_same_property() {
    let uri_form = compile("{http://www.alfresco.org/model/content/1.0}title:x");
    let prefix_form = compile("cm:title:x");
    let at_form = compile("@cm:title:x");
    assert_eq!(uri_form, prefix_form);
    assert_eq!(at_form, prefix_form);
    assert_eq!(prefix_form.field().unwrap().kind, FieldKind::Property);
}

#[test]
fn test_exact_term_requires_support() {
    let compiler = common::compiler();

    let exact = compiler
        .compile_fts("=cm:name:Report", &FtsOptions::default())
        .unwrap();
    assert_eq!(exact.field().unwrap().mode, MatchMode::ExactTerm);
    assert_eq!(field_names(&exact), vec!["cm:name.exact"]);

    let err = compiler
        .compile_fts("=cm:title:Report", &FtsOptions::default())
        .unwrap_err();
    assert!(matches!(err, CompileError::ExactTermNotEnabled { .. }));
}

#[test]
fn test_bare_star_matches_every_node() {
    let constraint = compile("*");
    assert_eq!(field_names(&constraint), vec!["ISNODE"]);
}

#[test]
fn test_wildcard_forms() {
    assert!(matches!(
        compile("repo*").kind,
        ConstraintKind::PrefixTerm { ref prefix, .. } if prefix == "repo"
    ));
    assert!(matches!(
        compile("r?po*t").kind,
        ConstraintKind::WildTerm { ref pattern, .. } if pattern == "r?po*t"
    ));

    let err = common::compiler()
        .compile_fts("repo*~0.8", &FtsOptions::default())
        .unwrap_err();
    assert!(matches!(err, CompileError::Unsupported(_)));
}

#[test]
fn test_syntax_errors_carry_positions() {
    let err = common::compiler()
        .compile_fts("alpha AND (beta", &FtsOptions::default())
        .unwrap_err();
    match err {
        CompileError::Syntax {
            position, found, ..
        } => {
            assert_eq!(position, 15);
            assert_eq!(found, "end of input");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_constraint_json() {
    let constraint = compile("ex:pages:10..20");
    let json = serde_json::to_value(&constraint).unwrap();
    assert_eq!(json["type"], "range");
    assert_eq!(json["lower"], "10");
    assert_eq!(json["upper"], "20");
    assert_eq!(json["field"]["name"], "ex:pages");
    assert_eq!(json["field"]["tokenization"], "untokenized");
}
