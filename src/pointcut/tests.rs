use super::*;
use proptest::prelude::*;

fn pointcut(kind: PointcutType, include: &[&str], exclude: &[&str]) -> Pointcut {
    let cache = PatternCache::new();
    let options = Options::default();
    let mut pointcut = Pointcut::new(kind);
    for p in include {
        pointcut.add_include(PointcutPatternRule::parse(p), &cache, &options).unwrap();
    }
    for p in exclude {
        pointcut.add_exclude(PointcutPatternRule::parse(p), &cache, &options).unwrap();
    }
    pointcut
}

fn wildcard(include: &[&str], exclude: &[&str]) -> Pointcut {
    pointcut(PointcutType::Wildcard, include, exclude)
}

#[test]
fn single_star_include_stays_in_segment() {
    let p = wildcard(&["/service/*"], &[]);
    assert!(p.matches("/service/user"));
    assert!(!p.matches("/service/user/detail"));
}

#[test]
fn exclude_carves_out_of_include() {
    let p = wildcard(&["/service/**"], &["/service/admin/**"]);
    assert!(!p.matches("/service/admin/users"));
    assert!(p.matches("/service/public/users"));
}

#[test]
fn empty_pointcut_matches_nothing() {
    let p = Pointcut::new(PointcutType::Wildcard);
    assert!(p.is_empty());
    assert!(!p.matches("/any"));
    assert!(!p.matches_operation("/any", "svc", "op"));
}

#[test]
fn absent_pointcut_applies_everywhere() {
    assert!(applies(None, "/any", "svc", "op"));
    let empty = Pointcut::new(PointcutType::Wildcard);
    assert!(!applies(Some(&empty), "/any", "svc", "op"));
}

#[test]
fn unsupplied_name_fails_a_present_component() {
    let p = wildcard(&["/service/*@userService"], &[]);
    assert!(!p.matches("/service/a"));
    assert!(p.matches_handler("/service/a", "userService"));
    assert!(p.matches_operation("/service/a", "userService", "anything"));
}

#[test]
fn absent_components_are_dont_care() {
    let p = wildcard(&["@*Service^get*"], &[]);
    assert!(p.matches_operation("/whatever", "userService", "getUser"));
    assert!(!p.matches_operation("/whatever", "userService", "setUser"));
    assert!(!p.matches_operation("/whatever", "userDao", "getUser"));
}

#[test]
fn handler_ids_match_on_dot_segments() {
    let p = wildcard(&["@com.example.*"], &[]);
    assert!(p.matches_handler("/r", "com.example.UserService"));
    assert!(!p.matches_handler("/r", "com.example.admin.UserService"));
}

#[test]
fn exclude_with_more_components_is_narrower() {
    let p = wildcard(&["/api/**"], &["/api/**@auditService"]);
    assert!(p.matches("/api/a"));
    assert!(p.matches_handler("/api/a", "userService"));
    assert!(!p.matches_handler("/api/a", "auditService"));
}

#[test]
fn regexp_dialect_shares_precedence() {
    let p = pointcut(PointcutType::Regexp, &["/service/.*"], &["/service/admin/.*"]);
    assert!(p.matches("/service/user/detail"));
    assert!(!p.matches("/service/admin/users"));
    assert!(!p.matches("/other/service/x"));
}

#[test]
fn regexp_components_are_full_matches() {
    let p = pointcut(PointcutType::Regexp, &["@user.*^get[A-Z]\\w*"], &[]);
    assert!(p.matches_operation("/r", "userService", "getUser"));
    assert!(!p.matches_operation("/r", "userService", "forgetUser"));
    assert!(!p.matches_operation("/r", "myuserService", "getUser"));
}

#[test]
fn invalid_regexp_is_a_build_error() {
    let cache = PatternCache::new();
    let mut p = Pointcut::new(PointcutType::Regexp);
    let err = p.add_include(PointcutPatternRule::parse("/a/(("), &cache, &Options::default()).unwrap_err();
    assert!(matches!(err, RuleError::InvalidRegex { .. }));
}

#[test]
fn compile_from_declaration() {
    let declaration: PointcutDeclaration = serde_json::from_str(
        r#"{
            "type": "wildcard",
            "include": ["/service/**", {"handler": "*Service", "operation": "get*"}],
            "exclude": ["/service/admin/**"]
        }"#,
    )
    .unwrap();
    let p = Pointcut::compile(&declaration, &PatternCache::new(), &Options::default()).unwrap();

    assert_eq!(p.include_list().len(), 2);
    assert_eq!(p.exclude_list().len(), 1);
    assert_eq!(p.include_list()[1].rule().combine(), "@*Service^get*");
    assert!(p.matches_operation("/other", "userService", "getName"));
    assert!(!p.matches("/service/admin/x"));
}

#[test]
fn unknown_pointcut_type_is_rejected() {
    let declaration = PointcutDeclaration { pointcut_type: Some("glob".into()), ..Default::default() };
    let err = Pointcut::compile(&declaration, &PatternCache::new(), &Options::default()).unwrap_err();
    assert!(matches!(err, RuleError::UnknownPointcutType(ref t) if t == "glob"));
}

#[test]
fn default_pointcut_type_comes_from_options() {
    let options = Options { default_pointcut_type: PointcutType::Regexp, ..Options::default() };
    let declaration = PointcutDeclaration { include: vec![PatternDeclaration::Combined("/a/.+".into())], ..Default::default() };
    let p = Pointcut::compile(&declaration, &PatternCache::new(), &options).unwrap();
    assert_eq!(p.pointcut_type(), PointcutType::Regexp);
    assert!(p.matches("/a/bc"));
}

#[test]
fn exists_handler_requires_a_listed_operation() {
    let p = wildcard(&["/r/**@userService^get*"], &[]);
    let ops = vec!["save".to_string(), "getUser".to_string()];
    assert!(p.exists_handler("userService", None, &ops));
    assert!(!p.exists_handler("userService", None, &["save".to_string()]));
    assert!(!p.exists_handler("userService", None, &[]));
    assert!(!p.exists_handler("orderService", None, &ops));

    let any_operation = wildcard(&["@userService"], &[]);
    assert!(any_operation.exists_handler("userService", None, &[]));
}

#[test]
fn exists_handler_honours_class_patterns() {
    let p = wildcard(&["@class:com.example.*Dao"], &[]);
    assert!(p.exists_handler("userDao", Some("com.example.UserDao"), &[]));
    assert!(!p.exists_handler("userDao", Some("com.other.UserDao"), &[]));
    assert!(p.exists_handler("userDao", None, &[]));
}

#[test]
fn class_patterns_never_match_a_joinpoint() {
    let include = wildcard(&["@class:com.example.*Dao"], &[]);
    assert!(!include.matches_operation("/health", "clock", "tick"));
    assert!(!include.matches_operation("/users", "userDao", "find"));
    assert!(include.exists_handler("userDao", Some("com.example.UserDao"), &[]));

    let exclude = wildcard(&["/**"], &["@class:com.example.*Dao"]);
    assert!(exclude.matches_operation("/a", "svc", "op"));
    assert!(exclude.matches_names(Some("/a"), None, None));
}

#[test]
fn references_handlers_looks_at_both_lists() {
    assert!(!wildcard(&["/a/**"], &["/a/b"]).references_handlers());
    assert!(wildcard(&["/a/**"], &["/a/**@svc"]).references_handlers());
    assert!(wildcard(&["@^run"], &[]).references_handlers());
}

proptest! {
    #[test]
    fn exclusion_always_wins(pattern in "/[ab]{1,3}/(\\*|\\*\\*|[ab]{1,2})", input in "/[ab]{1,3}/[ab]{0,3}(/[ab]{1,2})?") {
        let both = wildcard(&[pattern.as_str()], &[pattern.as_str()]);
        prop_assert!(!both.matches(&input));
        prop_assert!(!both.matches_operation(&input, "h", "o"));
    }

    #[test]
    fn include_alone_matches_what_the_wildcard_matches(pattern in "/[ab]{1,2}/(\\*|\\*\\*)", input in "/[ab]{1,2}/[ab/]{0,4}") {
        let p = wildcard(&[pattern.as_str()], &[]);
        let compiled = crate::wildcard::WildcardPattern::compile(&pattern, Some('/'));
        prop_assert_eq!(p.matches(&input), compiled.matches(&input));
    }
}
