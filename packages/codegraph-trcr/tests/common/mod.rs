//! Shared fixtures for codegraph-trcr integration tests

#![allow(dead_code)]

use codegraph_trcr::{
    ArgConstraint, AtomKind, AtomSpec, CallSite, Entity, MatchRule, PropertyRead, RuleSet,
    Severity, TaintRuleCompiler, ValidatedConfig,
};

/// The sqlite3 scenario: one Tier-1 and one Tier-2 rule on `execute`
pub fn sqlite_atoms() -> Vec<AtomSpec> {
    vec![
        AtomSpec::new("sink.sql.sqlite3", AtomKind::Sink)
            .with_rule(MatchRule::call(Some("sqlite3.Cursor"), "execute"))
            .with_tags(["sql_injection"])
            .with_cwe("CWE-89")
            .with_severity(Severity::Critical),
        AtomSpec::new("sink.sql.cursor", AtomKind::Sink)
            .with_rule(MatchRule::call(Some("*.Cursor"), "execute"))
            .with_tags(["sql_injection"])
            .with_severity(Severity::High),
    ]
}

/// A small mixed catalog covering every tier and entity kind
pub fn catalog() -> Vec<AtomSpec> {
    let mut atoms = sqlite_atoms();
    atoms.extend([
        AtomSpec::new("source.flask.request", AtomKind::Source)
            .with_rule(MatchRule::read(Some("flask.Request"), "args"))
            .with_rule(MatchRule::read(Some("flask.Request"), "form"))
            .with_tags(["user_input"]),
        AtomSpec::new("sink.command.subprocess", AtomKind::Sink)
            .with_rule(MatchRule::call(None, "subprocess.*").with_arg(ArgConstraint::not_const(0)))
            .with_tags(["command_injection"])
            .with_severity(Severity::Critical),
        AtomSpec::new("sink.nosql.mongo", AtomKind::Sink)
            .with_rule(MatchRule::call(Some("*mongo*"), "find"))
            .with_tags(["nosql_injection"]),
        AtomSpec::new("sanitizer.shlex", AtomKind::Sanitizer)
            .with_rule(MatchRule::call(Some("shlex"), "quote")),
        AtomSpec::new("sink.os.general", AtomKind::Sink)
            .with_rule(MatchRule::call(None, "os.*sys*")),
    ]);
    atoms
}

pub fn compile(config: &ValidatedConfig, atoms: &[AtomSpec]) -> RuleSet {
    TaintRuleCompiler::new(config.clone())
        .compile_all(atoms)
        .into_strict()
        .expect("fixture atoms compile")
}

pub fn sqlite_entity(id: &str) -> Entity {
    CallSite::new(id, "execute")
        .with_base_type("sqlite3.Cursor")
        .with_qualified_call("sqlite3.Cursor.execute")
        .into()
}

/// Entities matching several catalog rules, in discovery order
pub fn mixed_entities() -> Vec<Entity> {
    vec![
        sqlite_entity("app.py:10:4"),
        PropertyRead::new("app.py:3:8", "args").with_base_type("flask.Request").into(),
        CallSite::new("app.py:20:4", "Popen")
            .with_base_type("subprocess")
            .with_qualified_call("subprocess.Popen")
            .with_arg("cmd", Some(false))
            .into(),
        CallSite::new("app.py:21:4", "run")
            .with_base_type("subprocess")
            .with_qualified_call("subprocess.run")
            .with_arg("['ls']", Some(true))
            .into(),
        CallSite::new("db.py:7:2", "find")
            .with_base_type("pymongo.collection.Collection")
            .into(),
        CallSite::new("db.py:9:2", "execute")
            .with_base_type("psycopg2.extensions.Cursor")
            .into(),
        CallSite::new("util.py:1:1", "quote").with_base_type("shlex").into(),
        PropertyRead::new("util.py:2:1", "headers").with_base_type("flask.Request").into(),
    ]
}

/// `n` call entities sharing one call name
pub fn execute_flood(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| {
            CallSite::new(format!("gen.py:{}:1", i), "execute")
                .with_base_type(format!("driver{}.Cursor", i % 7))
                .into()
        })
        .collect()
}
