use std::any::TypeId;

use ferric_ioc::metadata::{injectable, singleton, MemberKind};
use ferric_ioc::{
    ContainerPool, CtorArgs, DecorArg, DiResult, Injectable, Member, Metadata, Provider, Token,
};

struct Sample;

impl Injectable for Sample {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Sample)
    }
}

#[test]
fn test_positional_class_shape() {
    let md = injectable()
        .parse_args(&[
            DecorArg::Token(Token::string("tokenA")),
            DecorArg::string("v1"),
            DecorArg::Bool(true),
            DecorArg::Millis(250),
        ])
        .unwrap();

    assert_eq!(md.provide, Some(Token::string("tokenA")));
    assert_eq!(md.alias.as_deref(), Some("v1"));
    assert_eq!(md.singleton, Some(true));
    assert_eq!(md.expires, Some(std::time::Duration::from_millis(250)));
}

#[test]
fn test_positional_skip_to_matching_predicate() {
    // A lone millisecond argument skips past the provide/alias/singleton
    // positions and lands on the TTL.
    let md = injectable().parse_args(&[DecorArg::Millis(100)]).unwrap();
    assert!(md.provide.is_none());
    assert!(md.alias.is_none());
    assert!(md.singleton.is_none());
    assert_eq!(md.expires, Some(std::time::Duration::from_millis(100)));
}

#[test]
fn test_freeze_on_unmatched_position() {
    // Position 0 matches the singleton predicate; position 1 (a string)
    // fits none of the remaining predicates, so parsing freezes there.
    let md = injectable()
        .parse_args(&[DecorArg::Bool(true), DecorArg::string("late")])
        .unwrap();
    assert_eq!(md.singleton, Some(true));
    assert!(md.alias.is_none());
}

#[test]
fn test_metadata_object_short_circuits() {
    let explicit = Metadata {
        alias: Some("b".into()),
        ..Metadata::default()
    };
    let md = injectable()
        .parse_args(&[
            DecorArg::Token(Token::string("tokenA")),
            DecorArg::Metadata(explicit),
            // Ignored: the metadata object ended positional parsing.
            DecorArg::Bool(true),
        ])
        .unwrap();

    assert_eq!(md.provide, Some(Token::string("tokenA")));
    assert_eq!(md.alias.as_deref(), Some("b"));
    assert!(md.singleton.is_none());
}

#[test]
fn test_unparseable_application_yields_no_metadata() {
    let md = injectable().parse_args(&[DecorArg::Provider(Provider::value(5u8))]);
    assert!(md.is_none());
}

#[test]
fn test_bare_application_runs_extender() {
    let md = singleton().parse_args(&[]).unwrap();
    assert_eq!(md.singleton, Some(true));
}

#[test]
fn test_repeated_application_merges() {
    let pool = ContainerPool::new();
    let table = pool.metadata();

    injectable().apply::<Sample>(table, &[DecorArg::Token(Token::string("tokenA"))]);
    injectable().apply::<Sample>(
        table,
        &[DecorArg::Metadata(Metadata {
            alias: Some("b".into()),
            ..Metadata::default()
        })],
    );

    let md = table
        .metadata(TypeId::of::<Sample>(), Member::Class, "Injectable")
        .unwrap();
    assert_eq!(md.provide, Some(Token::string("tokenA")));
    assert_eq!(md.alias.as_deref(), Some("b"));
}

#[test]
fn test_later_application_overrides_fields() {
    let pool = ContainerPool::new();
    let table = pool.metadata();

    injectable().apply::<Sample>(table, &[DecorArg::Token(Token::string("first"))]);
    injectable().apply::<Sample>(table, &[DecorArg::Token(Token::string("second"))]);

    let md = table
        .metadata(TypeId::of::<Sample>(), Member::Class, "Injectable")
        .unwrap();
    assert_eq!(md.provide, Some(Token::string("second")));
}

#[test]
fn test_null_metadata_still_counts_as_decorated() {
    let pool = ContainerPool::new();
    let table = pool.metadata();

    injectable().apply::<Sample>(table, &[DecorArg::Provider(Provider::value(5u8))]);

    assert!(table.is_decorated(TypeId::of::<Sample>()));
    assert!(table
        .metadata(TypeId::of::<Sample>(), Member::Class, "Injectable")
        .is_none());
    assert_eq!(
        table.decorators_of(TypeId::of::<Sample>(), MemberKind::Class),
        vec!["Injectable"]
    );
}

#[test]
fn test_member_records_are_independent() {
    let pool = ContainerPool::new();
    let table = pool.metadata();

    ferric_ioc::metadata::auto_wired().apply_member::<Sample>(
        table,
        Member::Property("engine"),
        &[DecorArg::Token(Token::string("engine-token"))],
    );

    assert!(table
        .metadata(TypeId::of::<Sample>(), Member::Class, "AutoWired")
        .is_none());
    let md = table
        .merged_metadata(TypeId::of::<Sample>(), Member::Property("engine"))
        .unwrap();
    assert_eq!(md.provide, Some(Token::string("engine-token")));
    assert_eq!(
        table.members_with(TypeId::of::<Sample>(), MemberKind::Property, "AutoWired"),
        vec![Member::Property("engine")]
    );
}
