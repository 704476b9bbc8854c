//! Gesture scripts: a line-oriented text form of the editor's inbound
//! events, used to drive an [`Editor`] without a UI.
//!
//! ```text
//! # comment
//! tool rectangle
//! click 23 17
//! drag 30 30 200 40
//! delete 30 30 210 60
//! label 30 30 Start
//! undo
//! redo
//! ```

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::canvas::Point;
use crate::editor::Editor;
use crate::tools::ToolMode;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Tool(ToolMode),
    Click(Point),
    /// Grab the shape under `from` and drag its anchor to `to`
    Drag { from: Point, to: Point },
    /// Delete whatever lies under each point, as one step
    Delete(Vec<Point>),
    Label { at: Point, text: String },
    Undo,
    Redo,
}

fn parse_tool(word: &str) -> Result<ToolMode> {
    match word.to_ascii_lowercase().as_str() {
        "select" => Ok(ToolMode::Select),
        "rectangle" | "rect" => Ok(ToolMode::CreateRectangle),
        "ellipse" => Ok(ToolMode::CreateEllipse),
        "connect" => Ok(ToolMode::Connect),
        other => bail!("unknown tool '{}'", other),
    }
}

fn parse_coord(word: &str) -> Result<f64> {
    let value: f64 = word.parse().with_context(|| format!("invalid coordinate '{}'", word))?;
    if !value.is_finite() {
        bail!("coordinate '{}' is not finite", word);
    }
    Ok(value)
}

fn parse_points(words: &[&str]) -> Result<Vec<Point>> {
    if words.is_empty() || words.len() % 2 != 0 {
        bail!("expected x y pairs, got {} value(s)", words.len());
    }
    words
        .chunks(2)
        .map(|pair| Ok(Point::new(parse_coord(pair[0])?, parse_coord(pair[1])?)))
        .collect()
}

impl FromStr for ScriptCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (&verb, args) = words.split_first().ok_or_else(|| anyhow!("empty command"))?;

        let command = match (verb.to_ascii_lowercase().as_str(), args) {
            ("tool", [mode]) => ScriptCommand::Tool(parse_tool(mode)?),
            ("click", [_, _]) => ScriptCommand::Click(parse_points(args)?[0]),
            ("drag", [_, _, _, _]) => {
                let points = parse_points(args)?;
                ScriptCommand::Drag {
                    from: points[0],
                    to: points[1],
                }
            }
            ("delete", _) => ScriptCommand::Delete(parse_points(args)?),
            ("label", [x, y, ..]) if args.len() > 2 => ScriptCommand::Label {
                at: Point::new(parse_coord(x)?, parse_coord(y)?),
                text: args[2..].join(" "),
            },
            ("undo", []) => ScriptCommand::Undo,
            ("redo", []) => ScriptCommand::Redo,
            (other, _) => bail!("cannot parse '{}' command: {}", other, line.trim()),
        };
        Ok(command)
    }
}

/// Parse a whole script, skipping blank lines and `#` comments.
///
/// Returns each command with its 1-based line number.
pub fn parse_script(source: &str) -> Result<Vec<(usize, ScriptCommand)>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then_some((i + 1, line))
        })
        .map(|(number, line)| {
            line.parse::<ScriptCommand>()
                .map(|command| (number, command))
                .with_context(|| format!("line {}", number))
        })
        .collect()
}

impl ScriptCommand {
    /// Feed the command to an editor as inbound events
    pub fn apply(&self, editor: &mut Editor) {
        match self {
            ScriptCommand::Tool(mode) => editor.set_tool_mode(*mode),
            ScriptCommand::Click(p) => {
                editor.pointer_primary_activate(*p);
            }
            ScriptCommand::Drag { from, to } => match editor.diagram().shape_at(*from) {
                Some(id) => {
                    if editor.pointer_drag(id, *to) {
                        editor.pointer_release();
                    } else {
                        editor.set_status("Drag needs the select tool");
                    }
                }
                None => editor.set_status("Nothing to drag"),
            },
            ScriptCommand::Delete(points) => {
                let selected: Vec<_> = points
                    .iter()
                    .filter_map(|p| editor.diagram().entity_at(*p))
                    .collect();
                if editor.request_delete_selection(&selected) == 0 {
                    editor.set_status("Nothing to delete");
                }
            }
            ScriptCommand::Label { at, text } => match editor.diagram().shape_at(*at) {
                Some(id) => {
                    editor.request_set_label(id, text.clone());
                }
                None => editor.set_status("No shape to label"),
            },
            ScriptCommand::Undo => {
                editor.request_undo();
            }
            ScriptCommand::Redo => {
                editor.request_redo();
            }
        }
    }
}
