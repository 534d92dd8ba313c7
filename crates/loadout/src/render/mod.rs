use crate::services::{Build, Collection, Game, Guide, Tool};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A record that renders as a catalog card
pub trait Card {
    fn render_card(&self) -> String;
}

/// Cards for `items`, concatenated in order
pub fn render_cards<'a, T, I>(items: I) -> String
where
    T: Card + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(Card::render_card).collect()
}

fn cover(out: &mut String, path: &str, alt: &str) {
    if !path.is_empty() {
        let _ = write!(
            out,
            r#"<img class="card-cover" src="/{}" alt="{}" loading="lazy">"#,
            escape_html(path.trim_start_matches('/')),
            escape_html(alt)
        );
    }
}

fn optional(out: &mut String, template: &str, value: &str) {
    if !value.is_empty() {
        out.push_str(&template.replace("{}", &escape_html(value)));
    }
}

/// Label of the parent game: display name when known, else the slug
fn game_label<'a>(display_name: &'a str, slug: &'a str) -> &'a str {
    if display_name.is_empty() {
        slug
    } else {
        display_name
    }
}

impl Card for Game {
    fn render_card(&self) -> String {
        let mut out = format!(
            r#"<article class="card card-game" data-slug="{}" data-status="{}">"#,
            escape_html(&self.slug),
            self.status
        );
        cover(&mut out, &self.cover, &self.name);
        let _ = write!(
            out,
            r#"<span class="badge badge-status">{}</span>"#,
            self.status
        );
        let _ = write!(out, "<h3>{}</h3>", escape_html(&self.name));
        optional(&mut out, r#"<p class="card-summary">{}</p>"#, &self.short);
        optional(&mut out, r#"<p class="card-meta">{}</p>"#, &self.publisher);
        out.push_str("</article>");
        out
    }
}

impl Card for Build {
    fn render_card(&self) -> String {
        let mut out = format!(
            r#"<article class="card card-build" data-slug="{}" data-game="{}">"#,
            escape_html(&self.slug),
            escape_html(&self.game_name)
        );
        cover(&mut out, &self.cover, &self.title);
        optional(&mut out, r#"<span class="badge badge-tier">{}</span>"#, &self.tier);
        optional(
            &mut out,
            r#"<p class="card-game-name">{}</p>"#,
            game_label(&self.game_display_name, &self.game_name),
        );
        let _ = write!(out, "<h3>{}</h3>", escape_html(&self.title));
        optional(&mut out, r#"<p class="card-summary">{}</p>"#, &self.summary);
        optional(&mut out, r#"<p class="card-meta">Version {}</p>"#, &self.version);

        let href = match self.extras.get("href") {
            Some(Value::String(href)) => href.as_str(),
            _ => "",
        };
        if !self.updated_at.is_empty() || !href.is_empty() {
            out.push_str(r#"<footer class="card-footer">"#);
            optional(&mut out, r#"<span class="card-date">Updated {}</span>"#, &self.updated_at);
            optional(&mut out, r#"<a class="card-link" href="{}">View</a>"#, href);
            out.push_str("</footer>");
        }
        out.push_str("</article>");
        out
    }
}

impl Card for Guide {
    fn render_card(&self) -> String {
        let mut out = format!(
            r#"<article class="card card-guide" data-slug="{}" data-game="{}">"#,
            escape_html(&self.slug),
            escape_html(&self.game_name)
        );
        cover(&mut out, &self.cover, &self.title);
        let _ = write!(out, "<h3>{}</h3>", escape_html(&self.title));
        optional(
            &mut out,
            r#"<p class="card-game-name">{}</p>"#,
            game_label(&self.game_display_name, &self.game_name),
        );
        optional(
            &mut out,
            r#"<p class="card-meta">Resource: <strong>{}</strong></p>"#,
            &self.resource,
        );
        optional(&mut out, r#"<p class="card-summary">{}</p>"#, &self.route);
        optional(&mut out, r#"<time class="card-date">{}</time>"#, &self.date);
        out.push_str("</article>");
        out
    }
}

impl Card for Tool {
    fn render_card(&self) -> String {
        let mut out = format!(
            r#"<article class="card card-tool" data-slug="{}" data-game="{}">"#,
            escape_html(&self.slug),
            escape_html(&self.game_name)
        );
        cover(&mut out, &self.cover, &self.title);
        let _ = write!(out, "<h3>{}</h3>", escape_html(&self.title));
        optional(&mut out, r#"<span class="badge badge-kind">{}</span>"#, &self.kind);
        optional(
            &mut out,
            r#"<p class="card-game-name">{}</p>"#,
            game_label(&self.game_display_name, &self.game_name),
        );
        optional(&mut out, r#"<p class="card-summary">{}</p>"#, &self.notes);
        optional(
            &mut out,
            r#"<a class="card-link" href="{}" target="_blank" rel="noopener">Open</a>"#,
            &self.url,
        );
        out.push_str("</article>");
        out
    }
}

/// Writes card fragments to an output directory
pub struct RenderService {
    output_dir: PathBuf,
}

impl RenderService {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Write `<collection>.html` holding `markup`
    pub async fn write_fragment(&self, collection: Collection, markup: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let path = self.output_dir.join(format!("{}.html", collection));
        let mut body = markup.to_string();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
