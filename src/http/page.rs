//! Static page shell plus the server-rendered track cards it loads.

use crate::{
    domain::track::TrackRecord,
    playback::controller::{PlayIndicator, WidgetView},
};

/// Holds no catalog data, so a cached copy never goes stale.
pub const INDEX: &str = include_str!("../../html/index.html");
const TRACK_CARD: &str = include_str!("../../html/track_card.html");
pub const STYLES: &str = include_str!("../../html/styles.css");
pub const SCRIPT: &str = include_str!("../../html/script.js");

const SPEEDS: &[f32] = &[0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn speed_options(view: Option<&WidgetView>) -> String {
    let selected = view.map(|v| v.rate.get()).unwrap_or(1.0);
    SPEEDS
        .iter()
        .map(|speed| {
            let marker = if *speed == selected { " selected" } else { "" };
            format!(r#"<option value="{speed}"{marker}>{speed}x</option>"#)
        })
        .collect()
}

fn render_card(track: &TrackRecord, view: Option<&WidgetView>) -> String {
    let indicator = match view.map(|v| v.indicator) {
        Some(PlayIndicator::Pause) => "pause",
        _ => "play",
    };
    let document = if track.document_url.is_some() {
        format!(
            r#"<a class="download-doc" href="/tracks/{}/document">Document</a>"#,
            track.id
        )
    } else {
        String::new()
    };

    TRACK_CARD
        .replace("{{ID}}", &track.id.to_string())
        .replace("{{TITLE}}", &escape_html(&track.title))
        .replace("{{ARTIST}}", &escape_html(track.display_artist()))
        .replace("{{INDICATOR}}", indicator)
        .replace("{{SPEEDS}}", &speed_options(view))
        .replace("{{DOCUMENT}}", &document)
}

/// One card per listed track, in catalog order.
pub fn render_cards(
    tracks: &[&TrackRecord],
    view_of: impl Fn(&TrackRecord) -> Option<WidgetView>,
) -> String {
    tracks
        .iter()
        .map(|track| render_card(track, view_of(*track).as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
