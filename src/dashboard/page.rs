//! Dashboard HTML page.

use super::Panel;
use crate::models::Filters;
use html_escape::encode_text;
use std::ops::RangeInclusive;

/// Render the full dashboard page.
///
/// `span` bounds the year inputs and is absent for an empty dataset.
/// `panels` carries each panel's rendered SVG in page order.
pub fn render_page(
    span: Option<&RangeInclusive<i32>>,
    filters: &Filters,
    panels: &[(Panel, String)],
) -> String {
    let mut page = String::new();

    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    page.push_str("    <meta charset=\"utf-8\">\n");
    page.push_str("    <title>Video Games Reviews Dashboard</title>\n");
    page.push_str("    <style>\n");
    page.push_str("        body { font-family: Arial, sans-serif; margin: 20px; }\n");
    page.push_str("        h1 { text-align: center; }\n");
    page.push_str("        form { padding: 20px; display: flex; gap: 30px; justify-content: center; }\n");
    page.push_str("        .panels { display: flex; flex-wrap: wrap; gap: 20px; }\n");
    page.push_str("        .panel { flex: 1 1 45%; min-width: 480px; }\n");
    page.push_str("        .panel svg { width: 100%; height: auto; }\n");
    page.push_str("    </style>\n</head>\n<body>\n");
    page.push_str("    <h1>Video Games Reviews Dashboard</h1>\n");

    page.push_str(&render_filter_form(span, filters));

    page.push_str("    <div class=\"panels\">\n");
    for (panel, svg) in panels {
        page.push_str(&format!(
            "        <div class=\"panel\" id=\"{}\">\n            <h3>{}</h3>\n",
            panel.id(),
            encode_text(panel.title())
        ));
        page.push_str(&with_viewbox(svg));
        page.push_str("\n        </div>\n");
    }
    page.push_str("    </div>\n</body>\n</html>\n");

    page
}

fn render_filter_form(span: Option<&RangeInclusive<i32>>, filters: &Filters) -> String {
    let (min_attr, max_attr) = match span {
        Some(span) => (
            format!(" min=\"{}\"", span.start()),
            format!(" max=\"{}\"", span.end()),
        ),
        None => (String::new(), String::new()),
    };

    let number_input = |name: &str, value: String, min: &str, max: &str| {
        format!(
            "            <input type=\"number\" name=\"{}\" value=\"{}\"{}{} step=\"1\" onchange=\"this.form.submit()\">\n",
            name, value, min, max
        )
    };

    let mut form = String::new();
    form.push_str("    <form method=\"get\" action=\"/\">\n");

    form.push_str("        <label>Select Year Range:\n");
    form.push_str(&number_input(
        "year_min",
        filters.years.start().to_string(),
        &min_attr,
        &max_attr,
    ));
    form.push_str(&number_input(
        "year_max",
        filters.years.end().to_string(),
        &min_attr,
        &max_attr,
    ));
    form.push_str("        </label>\n");

    form.push_str("        <label>Select Rating:\n");
    form.push_str(&number_input(
        "rating_min",
        filters.ratings.start().to_string(),
        " min=\"1\"",
        " max=\"5\"",
    ));
    form.push_str(&number_input(
        "rating_max",
        filters.ratings.end().to_string(),
        " min=\"1\"",
        " max=\"5\"",
    ));
    form.push_str("        </label>\n");

    form.push_str("        <noscript><button type=\"submit\">Apply</button></noscript>\n");
    form.push_str("    </form>\n");
    form
}

/// Make a fixed-size SVG scale with its container.
fn with_viewbox(svg: &str) -> String {
    let open_tag = svg.split('>').next().unwrap_or("");
    if open_tag.contains("viewBox") {
        return svg.to_string();
    }
    match (attribute(open_tag, "width"), attribute(open_tag, "height")) {
        (Some(w), Some(h)) => {
            svg.replacen("<svg ", &format!("<svg viewBox=\"0 0 {} {}\" ", w, h), 1)
        }
        _ => svg.to_string(),
    }
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}
