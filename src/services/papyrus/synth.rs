//! Header synthesis: render a declaration model as signature-only source.
//!
//! Output is a pure function of the model. Parsing the output again yields an
//! equal model, so synthesizing twice is byte-identical.

use super::model::{DeclarationModel, FunctionSig, Param, PropertyDecl, SignatureKind};

pub fn synthesize(model: &DeclarationModel) -> String {
    let mut sections: Vec<Vec<String>> = vec![vec![identity_line(model)]];
    sections.push(model.properties.iter().map(property_line).collect());
    sections.push(model.functions.iter().map(signature_line).collect());
    sections.push(model.events.iter().map(signature_line).collect());

    let blocks: Vec<String> = sections
        .into_iter()
        .filter(|lines| !lines.is_empty())
        .map(|lines| lines.join("\n"))
        .collect();

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn identity_line(model: &DeclarationModel) -> String {
    let mut line = format!("Scriptname {}", model.identity);
    if let Some(parent) = &model.parent {
        line.push_str(&format!(" extends {parent}"));
    }
    for flag in &model.flags {
        line.push(' ');
        line.push_str(&flag.to_string());
    }
    line
}

fn property_line(prop: &PropertyDecl) -> String {
    let mut line = format!("{} Property {}", prop.type_name, prop.name);
    if let Some(default) = &prop.default_value {
        line.push_str(" = ");
        line.push_str(default);
    }
    line.push_str(if prop.readonly { " AutoReadOnly" } else { " Auto" });
    for flag in &prop.flags {
        line.push(' ');
        line.push_str(flag);
    }
    line
}

fn param_text(param: &Param) -> String {
    match &param.default_literal {
        Some(default) => format!("{} {} = {default}", param.type_name, param.name),
        None => format!("{} {}", param.type_name, param.name),
    }
}

fn signature_line(sig: &FunctionSig) -> String {
    let keyword = match sig.kind {
        SignatureKind::Function => "Function",
        SignatureKind::Event => "Event",
    };
    let params: Vec<String> = sig.params.iter().map(param_text).collect();

    let mut line = match &sig.return_type {
        Some(ret) => format!("{ret} {keyword} {}({})", sig.name, params.join(", ")),
        None => format!("{keyword} {}({})", sig.name, params.join(", ")),
    };
    for modifier in &sig.modifiers {
        line.push(' ');
        line.push_str(modifier);
    }
    line
}

#[cfg(test)]
#[path = "tests/synth_tests.rs"]
mod tests;
