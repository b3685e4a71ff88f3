//! The editable text form of a worksheet.
//!
//! Each source line is classified, in this order, as
//!
//! 1. `// ...` -- a comment, dropped
//! 2. `!cmd args` -- a command, returned separately from the items
//! 3. `[desc]{{spec}}` or `{{spec}}` -- a worksheet reference
//! 4. `[desc]{spec}` or `{spec}` -- a bundle reference
//! 5. `% tokens` -- a directive
//! 6. anything else -- markup, kept verbatim
//!
//! Worksheet references are tried before bundle references so that a
//! doubled-brace line is never taken for a bundle.

use tracing::debug;

use folio_core::bundle::BundleInfo;
use folio_core::client::{BundleClient, ClientError, is_uuid};
use folio_core::display::DIRECTIVE_CHAR;
use folio_core::item::WorksheetItem;
use folio_core::token::{string_to_tokens, tokens_to_string};
use folio_core::worksheet::{SubworksheetInfo, WorksheetInfo};

use crate::error::{InterpretError, Result};
use crate::genpath::interpret_field_genpath;

/// Placeholder in a command that stands for the most recent bundle.
const LAST_BUNDLE: &str = "^";

/// The result of parsing an edited worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedForm {
    pub items: Vec<WorksheetItem>,
    /// `!` lines, tokenized, with `^` replaced by a bundle UUID.
    pub commands: Vec<Vec<String>>,
}

/// Splits an optional leading `[description]` off a reference line and
/// returns what follows it, with leading whitespace removed.
///
/// The description is greedy: with several `]`, the last one that leaves a
/// match for `body` wins.
fn after_description<'a>(line: &'a str, body: impl Fn(&'a str) -> Option<&'a str>) -> Option<&'a str> {
    if !line.starts_with('[') {
        return body(line.trim_start());
    }
    line.match_indices(']')
        .rev()
        .find_map(|(pos, _)| body(line[pos + 1..].trim_start()))
}

/// `{{spec}}`, after the description.
fn worksheet_spec(line: &str) -> Option<&str> {
    after_description(line, |rest| {
        if rest.len() < 4 {
            return None;
        }
        rest.strip_prefix("{{")?.strip_suffix("}}")
    })
}

/// `{spec}`, after the description. The spec may not contain `{`.
fn bundle_spec(line: &str) -> Option<&str> {
    after_description(line, |rest| {
        let inner = rest.strip_prefix('{')?.strip_suffix('}')?;
        (!inner.contains('{')).then_some(inner)
    })
}

fn directive_body(line: &str) -> Option<&str> {
    line.strip_prefix(DIRECTIVE_CHAR).map(str::trim_start)
}

fn resolve_bundle<C: BundleClient + ?Sized>(
    client: &C,
    worksheet_uuid: &str,
    spec: &str,
) -> std::result::Result<String, ClientError> {
    if is_uuid(spec) {
        return Ok(spec.to_string());
    }
    client.resolve_bundle_uuid(worksheet_uuid, spec)
}

fn resolve_worksheet<C: BundleClient + ?Sized>(
    client: &C,
    worksheet_uuid: &str,
    spec: &str,
) -> std::result::Result<String, ClientError> {
    if is_uuid(spec) {
        return Ok(spec.to_string());
    }
    client.resolve_worksheet_uuid(worksheet_uuid, spec)
}

/// Parses the lines of an edited worksheet into items and commands.
///
/// A reference whose spec cannot be resolved becomes a markup item carrying
/// the error message; the rest of the form is still parsed. Any other
/// client failure, an unclosed quote, or a `^` with no preceding bundle
/// aborts the parse.
pub fn parse_worksheet_form<C, S>(lines: &[S], client: &C, worksheet_uuid: &str) -> Result<ParsedForm>
where
    C: BundleClient + ?Sized,
    S: AsRef<str>,
{
    let mut form = ParsedForm::default();
    let mut last_bundle: Option<String> = None;

    for line in lines {
        let line = line.as_ref();
        if line.starts_with("//") {
            continue;
        }

        if let Some(command) = line.strip_prefix('!') {
            let tokens = string_to_tokens(command.trim())?;
            let command = tokens
                .into_iter()
                .map(|arg| {
                    if arg != LAST_BUNDLE {
                        return Ok(arg);
                    }
                    last_bundle.clone().ok_or_else(|| {
                        InterpretError::usage(format!("no bundle before ^ in command: {line}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            form.commands.push(command);
            continue;
        }

        let item = if let Some(spec) = worksheet_spec(line) {
            match resolve_worksheet(client, worksheet_uuid, spec) {
                Ok(uuid) => WorksheetItem::Worksheet(SubworksheetInfo::from_uuid(uuid)),
                Err(err) if err.is_resolution() => {
                    debug!(line, error = %err, "unresolved worksheet reference");
                    WorksheetItem::Markup(format!("{err}: {line}"))
                }
                Err(err) => return Err(err.into()),
            }
        } else if let Some(spec) = bundle_spec(line) {
            match resolve_bundle(client, worksheet_uuid, spec) {
                Ok(uuid) => {
                    last_bundle = Some(uuid.clone());
                    WorksheetItem::Bundle(BundleInfo::from_uuid(uuid))
                }
                Err(err) if err.is_resolution() => {
                    debug!(line, error = %err, "unresolved bundle reference");
                    WorksheetItem::Markup(format!("{line}: {err}"))
                }
                Err(err) => return Err(err.into()),
            }
        } else if let Some(body) = directive_body(line) {
            WorksheetItem::Directive(string_to_tokens(body)?)
        } else {
            WorksheetItem::Markup(line.to_string())
        };
        form.items.push(item);
    }

    Ok(form)
}

/// Replaces UUID-only bundle and worksheet items with their full info.
pub fn hydrate_items<C: BundleClient + ?Sized>(
    client: &C,
    items: Vec<WorksheetItem>,
) -> Result<Vec<WorksheetItem>> {
    items
        .into_iter()
        .map(|item| -> Result<WorksheetItem> {
            Ok(match item {
                WorksheetItem::Bundle(info) => WorksheetItem::Bundle(client.get_bundle_info(&info.uuid)?),
                WorksheetItem::Worksheet(info) => {
                    let full = client.get_worksheet_info(&info.uuid)?;
                    WorksheetItem::Worksheet(SubworksheetInfo {
                        uuid: full.uuid,
                        name: full.name,
                    })
                }
                other => other,
            })
        })
        .collect()
}

/// Renders a worksheet as editable source lines.
///
/// Parsing the result with [`parse_worksheet_form`] gives back the same
/// items; the header is all comments.
pub fn worksheet_lines(worksheet: &WorksheetInfo) -> Vec<String> {
    let mut lines: Vec<String> = header(&worksheet.name);

    for item in &worksheet.items {
        let line = match item {
            WorksheetItem::Markup(text) => text.clone(),
            WorksheetItem::Directive(tokens) => {
                let value = tokens_to_string(tokens);
                let sep = if value.is_empty() || value.starts_with(DIRECTIVE_CHAR) {
                    ""
                } else {
                    " "
                };
                format!("{DIRECTIVE_CHAR}{sep}{value}")
            }
            WorksheetItem::Bundle(info) => {
                let mut description = format!("{} {}", info.bundle_type, info.name());
                if let Some(deps) = interpret_field_genpath(info, "dependencies")
                    .as_str()
                    .filter(|d| !d.is_empty())
                {
                    description.push_str(" -- ");
                    description.push_str(deps);
                }
                if let Some(command) = info.command.as_deref().filter(|c| !c.is_empty()) {
                    description.push_str(" : ");
                    description.push_str(command);
                }
                format!("[{description}]{{{}}}", info.uuid)
            }
            WorksheetItem::Worksheet(info) => {
                format!("[worksheet {}]{{{{{}}}}}", info.name, info.uuid)
            }
        };
        lines.push(line);
    }
    lines
}

fn header(name: &str) -> Vec<String> {
    [
        format!("// Editing worksheet {name}. Lines starting with // are dropped when saved."),
        "// Each line is one of:".to_string(),
        "// - Markdown text".to_string(),
        "// - a bundle reference: {<bundle_spec>}".to_string(),
        "// - a worksheet reference: {{<worksheet_spec>}}".to_string(),
        "// - a directive (% title|schema|addschema|add|display|search):".to_string(),
        "//   * title \"Worksheet title\"".to_string(),
        "//   * schema <schema name>".to_string(),
        "//   * addschema <schema name>".to_string(),
        "//   * add <genpath> | add <name> <genpath> [post-processing]".to_string(),
        "//   * display hidden".to_string(),
        "//   * display inline|contents|image|html <genpath>".to_string(),
        "//   * display record|table <schema name>".to_string(),
        "//   * search <keywords>".to_string(),
        "// For example:".to_string(),
        "// % schema s1".to_string(),
        "// % add name".to_string(),
        "// % add /stats:errorRate %.3f".to_string(),
        "// % display table s1".to_string(),
        "// {run1}".to_string(),
        "// {run2}".to_string(),
    ]
    .into()
}
