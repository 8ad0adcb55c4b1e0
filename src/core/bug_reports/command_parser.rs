// Recognises `!bug <text>` / `!bugs <text>` in a raw chat line.
//
// Pure string handling, no state.

const COMMAND_SIGIL: char = '!';
const COMMAND_STEM: &str = "bug";
const PLURAL_SUFFIX: [char; 2] = ['s', 'S'];
const LINE_BREAKS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Result of looking at one chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// Doesn't start with `!bug`; not a report command at all.
    NotCommand,
    /// Starts with `!bug` but isn't a usable `!bug <text>`; the author should get usage help.
    MissingDescription,
    /// Report command with its (trimmed) free-text description.
    Report(String),
}

/// Parse a raw chat line.
///
/// Any line starting with `!bug` (case-insensitive) counts as an attempt at the
/// command, so `!bugfix the door` gets usage help rather than silence. It is
/// only accepted when `bug` or `bugs` is followed by whitespace and a
/// description that fits on one line.
pub fn parse(raw: &str) -> ParsedCommand {
    let trimmed = raw.trim();
    let Some(after_sigil) = trimmed.strip_prefix(COMMAND_SIGIL) else {
        return ParsedCommand::NotCommand;
    };
    let Some(stem) = after_sigil.get(..COMMAND_STEM.len()) else {
        return ParsedCommand::NotCommand;
    };
    if !stem.eq_ignore_ascii_case(COMMAND_STEM) {
        return ParsedCommand::NotCommand;
    }

    let rest = &after_sigil[COMMAND_STEM.len()..];
    let plural_rest = rest.strip_prefix(PLURAL_SUFFIX);

    // `!bugs x` is tried as the plural form first; `!bug s` only ever matches the singular.
    match plural_rest
        .and_then(description_after_token)
        .or_else(|| description_after_token(rest))
    {
        Some(description) => ParsedCommand::Report(description.to_string()),
        None => ParsedCommand::MissingDescription,
    }
}

/// The description following a command token, if the token is separated from it
/// by whitespace and the description is a single non-empty line.
fn description_after_token(rest: &str) -> Option<&str> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let description = rest.trim();
    if description.is_empty() || description.contains(LINE_BREAKS) {
        return None;
    }
    Some(description)
}
