use super::*;
use crate::services::papyrus::parser::{parse, parse_script};
use crate::types::ScriptName;

const QUEST_SOURCE: &str = r#"ScriptName DA04Quest extends Quest conditional hidden
{Quest script for DA04}

Import Debug

ObjectReference Property Target Auto
Int Property Stage = 10 Auto Conditional
Actor[] Property Helpers AutoReadOnly

Int Property Counter
    Int Function Get()
        return 0
    EndFunction
    Function Set(Int value)
    EndFunction
EndProperty

Function   Advance( Int  aiStage ,
                    Bool abForce = False,   ; force it
                    Float afDelay = 0.5 )  global
    SetStage(aiStage)
EndFunction

Actor Function FindHelper(String asName = "Lydia") native DebugOnly

Event OnInit()
    Advance(Stage)
EndEvent

Event OnStageSet(Int auiStageID, Int auiItemID)
EndEvent
"#;

const QUEST_HEADER: &str = "\
Scriptname DA04Quest extends Quest Conditional Hidden

ObjectReference Property Target Auto
Int Property Stage = 10 Auto Conditional
Actor[] Property Helpers AutoReadOnly
Int Property Counter Auto

Function Advance(Int aiStage, Bool abForce = False, Float afDelay = 0.5) global
Actor Function FindHelper(String asName = \"\") native DebugOnly

Event OnInit()
Event OnStageSet(Int auiStageID, Int auiItemID)
";

#[test]
fn test_synthesize_canonical_form() {
    let model = parse(QUEST_SOURCE).unwrap();
    assert_eq!(synthesize(&model), QUEST_HEADER);
}

#[test]
fn test_synthesize_is_idempotent_through_parse() {
    let first = synthesize(&parse(QUEST_SOURCE).unwrap());
    let reparsed = parse_script(&first).unwrap();
    assert!(reparsed.warnings.is_empty());

    let second = synthesize(&reparsed.model);
    assert_eq!(first, second);
}

#[test]
fn test_identity_only_header() {
    let model = DeclarationModel::new(ScriptName::new("Empty"));
    assert_eq!(synthesize(&model), "Scriptname Empty\n");

    let reparsed = parse(&synthesize(&model)).unwrap();
    assert_eq!(reparsed, model);
}

#[test]
fn test_sections_are_omitted_when_empty() {
    let model = parse("Scriptname A extends B\nEvent OnInit()\nEndEvent\n").unwrap();
    assert_eq!(synthesize(&model), "Scriptname A extends B\n\nEvent OnInit()\n");
}

#[test]
fn test_no_bodies_are_emitted() {
    let header = synthesize(&parse(QUEST_SOURCE).unwrap());
    for fragment in ["EndFunction", "EndEvent", "SetStage", "return", "Import"] {
        assert!(!header.contains(fragment), "header leaked '{fragment}'");
    }
}

#[test]
fn test_synthesize_is_deterministic() {
    let model = parse(QUEST_SOURCE).unwrap();
    let outputs: Vec<String> = (0..5).map(|_| synthesize(&model)).collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}
