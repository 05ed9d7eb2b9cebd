use super::*;
use crate::services::papyrus::model::ScriptFlag;

const ACTOR_SOURCE: &str = r#"Scriptname Actor extends ObjectReference Hidden

; Base actor script
Import Utility

Int Property Health = 100 Auto
Bool Property IsEssential AutoReadOnly Hidden

Float Property Speed Hidden
    Float Function Get()
        return 1.0
    EndFunction
EndProperty

Function AddSpell(Spell akSpell, bool abVerbose = true) native
Int Function GetLevel() native

Function Kill(Actor akKiller = None)
    Debug.Trace("Function Fake(Int a) inside a string")
    KillSilent(akKiller)
EndFunction

Event OnDeath(Actor akKiller)
EndEvent
"#;

#[test]
fn test_parse_identity_parent_and_flags() {
    let model = parse(ACTOR_SOURCE).unwrap();
    assert_eq!(model.identity.as_str(), "Actor");
    assert_eq!(model.parent.as_ref().map(|p| p.as_str()), Some("ObjectReference"));
    assert_eq!(model.flags, vec![ScriptFlag::Hidden]);
}

#[test]
fn test_parse_properties_including_full_property() {
    let model = parse(ACTOR_SOURCE).unwrap();
    let names: Vec<&str> = model.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Health", "IsEssential", "Speed"]);

    assert_eq!(model.properties[0].default_value.as_deref(), Some("100"));
    assert!(!model.properties[0].readonly);

    assert!(model.properties[1].readonly);
    assert_eq!(model.properties[1].flags, vec!["Hidden".to_string()]);

    // Only a Get accessor.
    assert!(model.properties[2].readonly);
    assert_eq!(model.properties[2].flags, vec!["Hidden".to_string()]);
}

#[test]
fn test_parse_functions_and_events() {
    let model = parse(ACTOR_SOURCE).unwrap();
    let names: Vec<&str> = model.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["AddSpell", "GetLevel", "Kill"]);

    let add_spell = &model.functions[0];
    assert!(add_spell.is_native);
    assert!(!add_spell.is_global);
    assert_eq!(add_spell.params.len(), 2);
    assert_eq!(add_spell.params[1].default_literal.as_deref(), Some("true"));

    assert_eq!(model.functions[1].return_type.as_deref(), Some("Int"));
    assert_eq!(model.events.len(), 1);
    assert_eq!(model.events[0].name, "OnDeath");
    assert_eq!(model.events[0].kind, SignatureKind::Event);
}

#[test]
fn test_multiline_signature_matches_single_line() {
    let single = "Scriptname A\nFunction Foo(Int a, Float b = 1.0, String c = \"\") global\n";
    let wrapped = "Scriptname A\nFunction Foo(Int a,\n    Float b = 1.0,\n    String c = \"\"\n) global\n";

    let a = parse(single).unwrap();
    let b = parse(wrapped).unwrap();
    assert_eq!(a.functions, b.functions);
    assert_eq!(a.functions[0].params.len(), 3);
    assert!(a.functions[0].is_global);
}

#[test]
fn test_line_continuation_joins_signature() {
    let model = parse("Scriptname A\nFunction Foo(Int a, \\\n Int b)\n").unwrap();
    assert_eq!(model.functions[0].params.len(), 2);
}

#[test]
fn test_string_literal_is_not_a_declaration() {
    let text = "Scriptname A\nString Property Msg = \"Function Foo(\" Auto\n";
    let parsed = parse_script(text).unwrap();
    assert!(parsed.model.functions.is_empty());
    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.model.properties[0].default_value.as_deref(), Some("\"\""));
}

#[test]
fn test_comments_are_ignored() {
    let text = "Scriptname A ; Scriptname B\n;/ Function Hidden1()\n/;\n{ Event Hidden2() }\nEvent Real()\nEndEvent\n";
    let parsed = parse_script(text).unwrap();
    assert_eq!(parsed.model.identity.as_str(), "A");
    assert!(parsed.model.functions.is_empty());
    assert_eq!(parsed.model.events.len(), 1);
    assert_eq!(parsed.model.events[0].name, "Real");
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_missing_identity_is_hard_failure() {
    assert_eq!(
        parse("Function Foo()\nEndFunction\n"),
        Err(ParseError::MissingIdentity)
    );
    assert_eq!(parse("; only a comment\n"), Err(ParseError::MissingIdentity));
}

#[test]
fn test_empty_source() {
    assert_eq!(parse("  \n\t\n"), Err(ParseError::EmptySource));
}

#[test]
fn test_malformed_declaration_is_dropped_with_warning() {
    let text = "Scriptname A\nFunction Broken(Int a,\nFunction Good(Int b)\nEndFunction\nFunction AlsoBad(Int)\n";
    let parsed = parse_script(text).unwrap();

    let names: Vec<&str> = parsed.model.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Good"]);
    assert_eq!(parsed.warnings.len(), 2);
    assert_eq!(parsed.warnings[0].line, 2);
    assert!(parsed.warnings[0].message.contains("unterminated"));
    assert_eq!(parsed.warnings[1].line, 5);
    assert!(parsed.warnings[1].message.contains("missing parameter name"));
}

#[test]
fn test_unterminated_signature_at_eof_warns() {
    let parsed = parse_script("Scriptname A\nFunction Foo(Int a,\n  Int b\n").unwrap();
    assert!(parsed.model.functions.is_empty());
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].line, 2);
}

#[test]
fn test_second_scriptname_warns_and_keeps_first() {
    let parsed = parse_script("Scriptname A\nScriptname B extends C\n").unwrap();
    assert_eq!(parsed.model.identity.as_str(), "A");
    assert!(parsed.model.parent.is_none());
    assert_eq!(parsed.warnings.len(), 1);
}

#[test]
fn test_state_functions_are_skipped() {
    let text = r#"Scriptname Door
Function Open()
EndFunction
Auto State Closed
    Function Open()
        GoToState("Opened")
    EndFunction
    Event OnActivate(ObjectReference akActionRef)
    EndEvent
EndState
Event OnLoad()
EndEvent
"#;
    let model = parse(text).unwrap();
    assert_eq!(model.functions.len(), 1);
    let events: Vec<&str> = model.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(events, vec!["OnLoad"]);
}

#[test]
fn test_keywords_are_case_insensitive() {
    let model = parse("SCRIPTNAME Foo EXTENDS Bar conditional\nINT FUNCTION Baz() NATIVE GLOBAL\n").unwrap();
    assert_eq!(model.identity.as_str(), "Foo");
    assert_eq!(model.parent.as_ref().map(|p| p.as_str()), Some("Bar"));
    assert_eq!(model.flags, vec![ScriptFlag::Conditional]);
    assert!(model.functions[0].is_native);
    assert!(model.functions[0].is_global);
    assert_eq!(model.functions[0].modifiers, vec!["NATIVE", "GLOBAL"]);
}

#[test]
fn test_unknown_modifiers_are_preserved() {
    let model = parse("Scriptname A\nFunction Log(String s) global DebugOnly\n").unwrap();
    assert_eq!(model.functions[0].modifiers, vec!["global", "DebugOnly"]);
}

#[test]
fn test_split_params_on_top_level_commas_only() {
    let params = split_params("Int a, Float[] b = None, Point c = Make(1, 2)").unwrap();
    assert_eq!(params.len(), 3);
    assert_eq!(params[1].type_name, "Float[]");
    assert_eq!(params[2].default_literal.as_deref(), Some("Make(1, 2)"));
}

#[test]
fn test_parse_signature_errors() {
    assert!(parse_signature("Function Foo").unwrap_err().contains("missing parameter list"));
    assert!(parse_signature("Function Foo(Int a").unwrap_err().contains("unbalanced"));
    assert!(parse_signature("Function Foo() = 3").is_err());
    assert!(parse_signature("Int Event Foo()").is_err());
}

#[test]
fn test_property_without_name_warns() {
    let parsed = parse_script("Scriptname A\nInt Property\nInt Property Ok Auto\n").unwrap();
    assert_eq!(parsed.model.properties.len(), 1);
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].line, 2);
}

#[test]
fn test_property_default_without_spaces() {
    let model = parse("Scriptname A\nFloat Property Rate=0.5 Auto\n").unwrap();
    assert_eq!(model.properties[0].default_value.as_deref(), Some("0.5"));
}
