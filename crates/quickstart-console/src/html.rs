//! HTML building blocks for the built-in console views.

/// Escape text for HTML bodies and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Page shell with the console navigation.
pub fn layout(title: &str, base_path: &str, content: &str) -> String {
    let title = html_escape(title);
    let base = html_escape(base_path);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Admin</title>
    <link rel="stylesheet" href="/static/console.css">
</head>
<body class="console">
    <nav class="console-nav">
        <a href="{base}/content" class="console-brand">Admin</a>
    </nav>
    <main class="console-main">
        <h1 class="console-title">{title}</h1>
        {content}
    </main>
</body>
</html>"##
    )
}

pub fn card(title: &str, content: &str) -> String {
    format!(
        r##"<section class="card">
    <header class="card-header"><h2>{}</h2></header>
    <div class="card-body">{}</div>
</section>"##,
        html_escape(title),
        content
    )
}

pub fn badge(text: &str, tone: &str) -> String {
    format!(
        r#"<span class="badge badge-{}">{}</span>"#,
        html_escape(tone),
        html_escape(text)
    )
}

/// Link button; `variant` is `primary`, `secondary` or `danger`.
pub fn link_button(text: &str, href: &str, variant: &str) -> String {
    format!(
        r#"<a href="{}" class="btn btn-{}">{}</a>"#,
        html_escape(href),
        variant,
        html_escape(text)
    )
}

/// Table with pre-rendered cell HTML.
pub fn table(id: &str, headers: &[String], rows: &[Vec<String>]) -> String {
    let headers_html: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let rows_html: String = rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|cell| format!("<td>{cell}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    format!(
        r##"<div class="table-wrap">
    <table id="{}" class="datatable">
        <thead><tr>{headers_html}</tr></thead>
        <tbody>{rows_html}</tbody>
    </table>
</div>"##,
        html_escape(id)
    )
}

pub fn empty_state(title: &str, description: &str, action: Option<(&str, &str)>) -> String {
    let action_html = action.map_or(String::new(), |(text, href)| {
        link_button(text, href, "primary")
    });
    format!(
        r##"<div class="empty-state">
    <h3>{}</h3>
    <p>{}</p>
    {action_html}
</div>"##,
        html_escape(title),
        html_escape(description)
    )
}

/// A dismissible notice, e.g. after a successful create.
pub fn notice(message: &str, tone: &str) -> String {
    format!(
        r#"<div class="notice notice-{}" role="status">{}</div>"#,
        html_escape(tone),
        html_escape(message)
    )
}

/// Description list of `label -> value HTML` pairs.
pub fn definition_list(items: &[(String, String)]) -> String {
    let body: String = items
        .iter()
        .map(|(label, value)| format!("<dt>{}</dt><dd>{}</dd>", html_escape(label), value))
        .collect();
    format!(r#"<dl class="details">{body}</dl>"#)
}
