//! Deterministic reshaping of the summarizer's free text into a stable
//! bullet layout.

/// Literal bullet label that gets a blank line inserted before it.
const WEATHER_OUTLOOK_LABEL: &str = "Today's expected weather:";

/// Bullet marker emitted by the summarizer.
const BULLET: &str = "\u{2022} ";

/// Normalize raw summarizer text:
/// - strip bold markdown delimiters;
/// - split on the `"• "` marker, trimming and dropping empty segments;
/// - first surviving segment becomes an unbulleted header, the rest become
///   `"- "` items;
/// - the first item starting with the expected-weather label gains a blank
///   line before it.
///
/// Idempotent on text that contains no further `"• "` markers.
pub fn format_reply(raw: &str) -> String {
    let stripped = raw.replace("**", "");

    let mut segments = stripped
        .split(BULLET)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(header) = segments.next() else {
        return String::new();
    };

    let mut lines = vec![header.to_string()];
    let mut outlook_marked = false;
    for segment in segments {
        if !outlook_marked && segment.starts_with(WEATHER_OUTLOOK_LABEL) {
            lines.push(format!("\n- {segment}"));
            outlook_marked = true;
        } else {
            lines.push(format!("- {segment}"));
        }
    }

    lines.join("\n")
}

/// Strip bold markers only; used before storing the assistant turn.
pub fn strip_bold(raw: &str) -> String {
    raw.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_become_dash_items_under_a_header() {
        let raw = "Here is your weather! \u{2022} Temp: 21C \u{2022} Wind: light";
        let formatted = format_reply(raw);
        assert_eq!(formatted, "Here is your weather!\n- Temp: 21C\n- Wind: light");
    }

    #[test]
    fn bold_markers_are_stripped() {
        let raw = "**Seoul** weather \u{2022} **Sunny** all day";
        let formatted = format_reply(raw);
        assert_eq!(formatted, "Seoul weather\n- Sunny all day");
    }

    #[test]
    fn empty_segments_are_dropped() {
        let raw = "Header \u{2022}  \u{2022} One item";
        let formatted = format_reply(raw);
        assert_eq!(formatted, "Header\n- One item");
    }

    #[test]
    fn expected_weather_item_gets_a_blank_line() {
        let raw = "Hi! \u{2022} Humidity: 40% \u{2022} Today's expected weather: clear skies";
        let formatted = format_reply(raw);
        assert_eq!(
            formatted,
            "Hi!\n- Humidity: 40%\n\n- Today's expected weather: clear skies"
        );
    }

    #[test]
    fn only_the_first_outlook_item_is_spaced() {
        let raw = "Hi \u{2022} Today's expected weather: rain \u{2022} Today's expected weather: more rain";
        let formatted = format_reply(raw);
        let blank_count = formatted.matches("\n\n").count();
        assert_eq!(blank_count, 1);
    }

    #[test]
    fn idempotent_without_bullet_marker() {
        let inputs = [
            "Just a plain sentence.",
            "Line one\n- already dashed\n- twice",
            "",
        ];
        for input in inputs {
            let once = format_reply(input);
            let twice = format_reply(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn plain_text_passes_through_as_header_only() {
        assert_eq!(format_reply("Nice day ahead."), "Nice day ahead.");
    }
}
