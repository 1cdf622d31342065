//! Project artifacts written to disk
//!
//! - `slides.html`: a self-contained deck rendered from the presentation agent
//! - code files saved by the user under a sanitized name
//!
//! Everything for a project lives under `<base>/<project_id>/`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::agents::AgentEnvelope;
use crate::error::Result;
use crate::project::ProjectId;

/// File name of the rendered deck
pub const SLIDES_FILE: &str = "slides.html";

/// Used when a code artifact has no usable name
pub const DEFAULT_CODE_FILE: &str = "code.txt";

/// Keys that may hold the slide list, in lookup order
const SLIDE_LIST_KEYS: [&str; 3] = ["slides_outline", "slides", "slide_deck"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDeck {
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    /// Build a deck from the presentation agent's envelope
    ///
    /// Structured output wins; otherwise the raw text is split on `## `
    /// headings. A failed envelope gives an empty deck.
    pub fn from_presentation(envelope: &AgentEnvelope) -> Self {
        if let Some(slides) = envelope.parsed().and_then(slides_from_parsed) {
            return Self { slides };
        }
        match envelope.raw() {
            Some(raw) => Self {
                slides: slides_from_markdown(raw),
            },
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Render a standalone HTML page navigable with the arrow keys
    pub fn render_html(&self) -> String {
        let mut sections = String::new();
        for slide in &self.slides {
            let _ = write!(
                sections,
                "<section class=\"slide\"><h2>{}</h2><ul>",
                escape_html(&slide.title)
            );
            for bullet in &slide.bullets {
                let _ = write!(sections, "<li>{}</li>", escape_html(bullet));
            }
            sections.push_str("</ul></section>");
        }

        format!("{HTML_HEAD}<div class='deck'>{sections}</div>\n{HTML_TAIL}")
    }
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<meta name='viewport' content='width=device-width, initial-scale=1'>
<title>Presentation</title>
<style>
*{box-sizing:border-box}
html,body{margin:0;height:100%;font-family:Inter,-apple-system,Segoe UI,Roboto,sans-serif;background:#0b1020;color:#fff}
.deck{height:100%;display:flex;overflow-x:auto;scroll-snap-type:x mandatory}
.slide{min-width:100%;height:100%;scroll-snap-align:start;padding:60px;display:flex;flex-direction:column;justify-content:center;gap:24px}
h2{font-size:56px;margin:0 0 12px 0;line-height:1.1}
ul{list-style:disc inside;font-size:24px;line-height:1.6}
.help{position:fixed;bottom:16px;right:20px;opacity:.7;font-size:14px}
</style>
<script>
document.addEventListener('keydown', e => {
  const deck = document.querySelector('.deck');
  if (!deck) return;
  if (['ArrowRight', 'PageDown', ' '].includes(e.key))
    deck.scrollBy({ left: window.innerWidth, behavior: 'smooth' });
  if (['ArrowLeft', 'PageUp'].includes(e.key))
    deck.scrollBy({ left: -window.innerWidth, behavior: 'smooth' });
  if (e.key === 'f' && document.documentElement.requestFullscreen)
    document.documentElement.requestFullscreen();
});
</script>
</head>
<body>
"#;

const HTML_TAIL: &str = "<div class='help'>Use \u{2190}/\u{2192} or Space. F for fullscreen.</div>
</body>
</html>
";

fn slides_from_parsed(parsed: &Value) -> Option<Vec<Slide>> {
    let map = parsed.as_object()?;
    let items = SLIDE_LIST_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))?;

    let slides: Vec<Slide> = items.iter().filter_map(slide_from_value).collect();
    (!slides.is_empty()).then_some(slides)
}

fn slide_from_value(item: &Value) -> Option<Slide> {
    match item {
        Value::String(title) => Some(Slide {
            title: title.clone(),
            bullets: Vec::new(),
        }),
        Value::Object(map) => {
            let title = map.get("title").map(value_text).unwrap_or_default();
            let bullets = map
                .get("bullets")
                .or_else(|| map.get("points"))
                .map(|b| match b {
                    Value::Array(list) => list.iter().map(value_text).collect(),
                    other => vec![value_text(other)],
                })
                .unwrap_or_default();
            Some(Slide { title, bullets })
        }
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn slides_from_markdown(raw: &str) -> Vec<Slide> {
    raw.split("\n## ")
        .filter(|section| !section.trim().is_empty())
        .enumerate()
        .map(|(idx, section)| {
            let mut lines = section.lines();
            let title = lines
                .next()
                .unwrap_or_default()
                .trim()
                .trim_start_matches(['#', '-', '*'])
                .trim();
            let title = if title.is_empty() {
                format!("Slide {}", idx + 1)
            } else {
                title.to_string()
            };
            let bullets = lines
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            Slide { title, bullets }
        })
        .collect()
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn project_dir(base: &Path, project_id: &ProjectId) -> Result<PathBuf> {
    let dir = base.join(project_id.as_str());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write `<base>/<project_id>/slides.html`
pub fn write_slides(base: &Path, project_id: &ProjectId, deck: &SlideDeck) -> Result<PathBuf> {
    let path = project_dir(base, project_id)?.join(SLIDES_FILE);
    fs::write(&path, deck.render_html())?;
    info!(path = %path.display(), slides = deck.len(), "Wrote slide deck");
    Ok(path)
}

/// Reduce a user-supplied name to `[A-Za-z0-9._-]`
pub fn sanitize_filename(name: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => DEFAULT_CODE_FILE.to_string(),
        _ => cleaned,
    }
}

/// Save `content` as a code artifact and return its path
pub fn save_code(
    base: &Path,
    project_id: &ProjectId,
    filename: Option<&str>,
    content: &str,
) -> Result<PathBuf> {
    let path = project_dir(base, project_id)?.join(sanitize_filename(filename));
    fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Saved code artifact");
    Ok(path)
}
