//! Line-oriented transcript parsing

use crate::report::models::{Speaker, TranscriptLine};

/// Parse a `Role: text` transcript into ordered lines.
///
/// Each line is split on its first colon. Stray double quotes are removed from
/// the text. Lines without a colon, without a role, or without text are skipped.
pub fn parse_transcript(raw: &str) -> Vec<TranscriptLine> {
    raw.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<TranscriptLine> {
    let (role, text) = line.split_once(':')?;

    let role = role.trim();
    let text = text.replace('"', "");
    let text = text.trim();

    if role.is_empty() || text.is_empty() {
        return None;
    }

    Some(TranscriptLine {
        speaker: Speaker::from_label(role),
        text: text.to_string(),
    })
}

/// Render lines back into `Role: text` form.
pub fn render_transcript(lines: &[TranscriptLine]) -> String {
    let mut output = String::new();
    for line in lines {
        output.push_str(line.speaker.label());
        output.push_str(": ");
        output.push_str(&line.text);
        output.push('\n');
    }
    output
}
