//! Node renderers.

use markdown::mdast::{self, AlignKind, Node};

use super::context::Context;
use super::{HeadingEntry, Scope};
use crate::engine::FenceBlock;

/// Collects the text of `nodes` for slugs and heading entries.
fn extract_text(nodes: &[Node], buffer: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => buffer.push_str(&text.value),
            Node::InlineCode(code) => buffer.push_str(&code.value),
            _ => {
                if let Some(children) = node.children() {
                    extract_text(children, buffer);
                }
            }
        }
    }
}

fn render_children(children: &[Node], ctx: &mut Context<'_>) {
    for child in children {
        render_node(child, ctx);
    }
}

fn render_text(value: &str, ctx: &mut Context<'_>) {
    let breaks = ctx.options().breaks;
    for (index, line) in value.split('\n').enumerate() {
        if index > 0 {
            if breaks {
                ctx.push_void("<br");
            }
            ctx.push_raw("\n");
        }
        ctx.push_text(line);
    }
}

fn render_paragraph(para: &mdast::Paragraph, ctx: &mut Context<'_>) {
    let tight = ctx.is_in_tight_list();
    if !tight {
        ctx.push_raw("<p>");
    }
    ctx.enter(Scope::Paragraph);
    render_children(&para.children, ctx);
    ctx.exit();
    if !tight {
        ctx.push_raw("</p>\n");
    }
}

fn render_heading(heading: &mdast::Heading, ctx: &mut Context<'_>) {
    let mut raw = String::new();
    extract_text(&heading.children, &mut raw);
    let text = ctx.plain_text(&raw);
    let slug = match ctx.attrs_id(&raw) {
        Some(id) => id,
        None => ctx.next_slug(&text),
    };

    let anchors = ctx
        .engine()
        .heading_anchors()
        .filter(|anchors| heading.depth >= anchors.level);

    ctx.push_raw(&format!("<h{}", heading.depth));
    if anchors.is_some() {
        ctx.push_raw(" id=\"");
        ctx.push_attr_value(&slug);
        ctx.push_raw("\"");
    }
    ctx.push_raw(">");

    let permalink = anchors
        .filter(|anchors| anchors.permalink)
        .map(|anchors| anchors.permalink_html(&slug));
    let before = anchors.is_some_and(|anchors| anchors.permalink_before);
    if let (Some(link), true) = (&permalink, before) {
        ctx.push_raw(link);
        ctx.push_raw(" ");
    }

    ctx.enter(Scope::Heading);
    render_children(&heading.children, ctx);
    ctx.exit();

    if let (Some(link), false) = (&permalink, before) {
        ctx.push_raw(" ");
        ctx.push_raw(link);
    }
    ctx.push_raw(&format!("</h{}>\n", heading.depth));

    ctx.add_heading(HeadingEntry {
        depth: heading.depth,
        slug,
        text,
    });
}

fn render_list(list: &mdast::List, ctx: &mut Context<'_>) {
    let tight = !list.spread
        && list
            .children
            .iter()
            .all(|child| !matches!(child, Node::ListItem(item) if item.spread));
    let has_tasks = list
        .children
        .iter()
        .any(|child| matches!(child, Node::ListItem(item) if item.checked.is_some()));

    let tag = if list.ordered { "ol" } else { "ul" };
    ctx.push_raw("<");
    ctx.push_raw(tag);
    if let Some(start) = list.start.filter(|start| list.ordered && *start != 1) {
        ctx.push_raw(&format!(" start=\"{start}\""));
    }
    if has_tasks {
        ctx.push_raw(" class=\"task-list\"");
    }
    ctx.push_raw(">\n");

    ctx.enter(Scope::List { tight });
    render_children(&list.children, ctx);
    ctx.exit();

    ctx.push_raw(&format!("</{tag}>\n"));
}

/// Renders `<li>`. Task items get a disabled checkbox and a label around
/// the first paragraph.
fn render_list_item(item: &mdast::ListItem, ctx: &mut Context<'_>) {
    let tight = ctx.is_in_tight_list();
    ctx.push_raw(if item.checked.is_some() {
        "<li class=\"task-list-item\">"
    } else {
        "<li>"
    });

    for (index, child) in item.children.iter().enumerate() {
        let hidden = tight && matches!(child, Node::Paragraph(_));
        if !hidden && !ctx.ends_with_newline() {
            ctx.push_raw("\n");
        }
        match (index, item.checked, child) {
            (0, Some(checked), Node::Paragraph(para)) => render_task_paragraph(para, checked, ctx),
            _ => render_node(child, ctx),
        }
    }

    ctx.push_raw("</li>\n");
}

fn render_task_paragraph(para: &mdast::Paragraph, checked: bool, ctx: &mut Context<'_>) {
    let tight = ctx.is_in_tight_list();
    let id = ctx.next_task_id();
    if !tight {
        ctx.push_raw("<p>");
    }
    ctx.push_raw(&format!("<input type=\"checkbox\" id=\"cbx_{id}\" disabled=\"true\""));
    if checked {
        ctx.push_raw(" checked=\"true\"");
    }
    ctx.push_raw(&format!("><label for=\"cbx_{id}\">"));
    ctx.enter(Scope::Paragraph);
    render_children(&para.children, ctx);
    ctx.exit();
    ctx.push_raw("</label>");
    if !tight {
        ctx.push_raw("</p>\n");
    }
}

fn render_blockquote(quote: &mdast::Blockquote, ctx: &mut Context<'_>) {
    ctx.push_raw("<blockquote>\n");
    ctx.enter(Scope::Blockquote);
    render_children(&quote.children, ctx);
    ctx.exit();
    ctx.push_raw("</blockquote>\n");
}

fn render_code(code: &mdast::Code, ctx: &mut Context<'_>) {
    let lang = code.lang.as_deref().unwrap_or("");
    let info = match code.meta.as_deref() {
        Some(meta) => format!("{lang} {meta}"),
        None => lang.to_string(),
    };
    let fence = FenceBlock {
        lang,
        info: &info,
        code: &code.value,
        ordinal: ctx.next_fence_ordinal(),
    };
    let html = ctx.engine().render_fence(&fence);
    ctx.push_raw(&html);
    if !ctx.ends_with_newline() {
        ctx.push_raw("\n");
    }
}

fn render_html(html: &mdast::Html, ctx: &mut Context<'_>) {
    let block = !ctx.is_in_phrasing();
    if ctx.options().html {
        ctx.push_raw(&html.value);
    } else {
        log::debug!("raw HTML escaped: {}", html.value);
        ctx.push_text(&html.value);
    }
    if block {
        ctx.push_raw("\n");
    }
}

/// Characters kept as-is in URLs; everything else is percent-encoded.
fn is_url_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b";/?:@&=+$,-_.!~*'()#".contains(&byte)
}

fn normalize_url(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut out = String::with_capacity(url.len());
    for (index, &byte) in bytes.iter().enumerate() {
        let escaped_already = byte == b'%'
            && bytes.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(index + 2).is_some_and(u8::is_ascii_hexdigit);
        if is_url_safe(byte) || escaped_already {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Rejects script-capable protocols. `data:` is only allowed for images.
fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("data:") {
        return ["data:image/gif;", "data:image/png;", "data:image/jpeg;", "data:image/webp;"]
            .iter()
            .any(|prefix| lower.starts_with(prefix));
    }
    !["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn push_url(url: &str, ctx: &mut Context<'_>) {
    if is_safe_url(url) {
        ctx.push_attr_value(&normalize_url(url));
    } else {
        log::debug!("unsafe url dropped: {url}");
    }
}

fn render_link(url: &str, title: Option<&str>, children: &[Node], ctx: &mut Context<'_>) {
    ctx.push_raw("<a href=\"");
    push_url(url, ctx);
    ctx.push_raw("\"");
    if let Some(title) = title {
        ctx.push_raw(" title=\"");
        ctx.push_attr_value(title);
        ctx.push_raw("\"");
    }
    ctx.push_raw(">");
    render_children(children, ctx);
    ctx.push_raw("</a>");
}

fn render_image(url: &str, alt: &str, title: Option<&str>, ctx: &mut Context<'_>) {
    ctx.push_raw("<img src=\"");
    push_url(url, ctx);
    ctx.push_raw("\" alt=\"");
    let alt = ctx.plain_text(alt);
    ctx.push_attr_value(&alt);
    ctx.push_raw("\"");
    if let Some(title) = title {
        ctx.push_raw(" title=\"");
        ctx.push_attr_value(title);
        ctx.push_raw("\"");
    }
    ctx.push_void("");
}

fn render_table(table: &mdast::Table, ctx: &mut Context<'_>) {
    ctx.push_raw("<table>\n<thead>\n");
    if let Some(Node::TableRow(row)) = table.children.first() {
        render_table_row(row, "th", &table.align, ctx);
    }
    ctx.push_raw("</thead>\n");
    if table.children.len() > 1 {
        ctx.push_raw("<tbody>\n");
        for child in &table.children[1..] {
            if let Node::TableRow(row) = child {
                render_table_row(row, "td", &table.align, ctx);
            }
        }
        ctx.push_raw("</tbody>\n");
    }
    ctx.push_raw("</table>\n");
}

fn render_table_row(row: &mdast::TableRow, tag: &str, align: &[AlignKind], ctx: &mut Context<'_>) {
    ctx.push_raw("<tr>\n");
    for (index, cell) in row.children.iter().enumerate() {
        let Node::TableCell(cell) = cell else {
            continue;
        };
        let style = match align.get(index) {
            Some(AlignKind::Left) => " style=\"text-align:left\"",
            Some(AlignKind::Right) => " style=\"text-align:right\"",
            Some(AlignKind::Center) => " style=\"text-align:center\"",
            _ => "",
        };
        ctx.push_raw(&format!("<{tag}{style}>"));
        ctx.enter(Scope::TableCell);
        render_children(&cell.children, ctx);
        ctx.exit();
        ctx.push_raw(&format!("</{tag}>\n"));
    }
    ctx.push_raw("</tr>\n");
}

fn render_footnote_reference(reference: &mdast::FootnoteReference, ctx: &mut Context<'_>) {
    let (number, previous) = ctx.footnote_reference(&reference.identifier);
    let id = if previous == 0 {
        format!("fnref{number}")
    } else {
        format!("fnref{number}:{previous}")
    };
    ctx.push_raw(&format!(
        "<sup class=\"footnote-ref\"><a href=\"#fn{number}\" id=\"{id}\">[{number}]</a></sup>"
    ));
}

/// Appends the footnote list for every referenced footnote, numbered by
/// first reference. Back links go inside the last paragraph.
pub(crate) fn render_footnote_section(ctx: &mut Context<'_>) {
    if !ctx.has_footnotes() {
        return;
    }
    if !ctx.ends_with_newline() {
        ctx.push_raw("\n");
    }
    ctx.push_void("<hr class=\"footnotes-sep\"");
    ctx.push_raw("\n<section class=\"footnotes\">\n<ol class=\"footnotes-list\">\n");

    let mut index = 0;
    while let Some((_, body, _)) = ctx.footnote(index) {
        let number = index + 1;
        let mut html = ctx.capture(|ctx| {
            ctx.enter(Scope::FootnoteDefinition);
            render_children(body, ctx);
            ctx.exit();
        });
        let refs = ctx.footnote(index).map_or(0, |(_, _, refs)| refs);
        let backrefs: String = (0..refs)
            .map(|n| {
                let target = if n == 0 {
                    format!("fnref{number}")
                } else {
                    format!("fnref{number}:{n}")
                };
                format!(" <a href=\"#{target}\" class=\"footnote-backref\">\u{21a9}\u{fe0e}</a>")
            })
            .collect();
        match html.strip_suffix("</p>\n").map(str::len) {
            Some(at) => html.insert_str(at, &backrefs),
            None => html.push_str(&backrefs),
        }
        ctx.push_raw(&format!("<li id=\"fn{number}\" class=\"footnote-item\">"));
        ctx.push_raw(&html);
        ctx.push_raw("</li>\n");
        index += 1;
    }

    ctx.push_raw("</ol>\n</section>\n");
}

/// Renders `node` and its children.
pub(crate) fn render_node(node: &Node, ctx: &mut Context<'_>) {
    match node {
        Node::Root(root) => render_children(&root.children, ctx),
        Node::Paragraph(para) => render_paragraph(para, ctx),
        Node::Heading(heading) => render_heading(heading, ctx),
        Node::Text(text) => render_text(&text.value, ctx),
        Node::Emphasis(emphasis) => {
            ctx.push_raw("<em>");
            render_children(&emphasis.children, ctx);
            ctx.push_raw("</em>");
        }
        Node::Strong(strong) => {
            ctx.push_raw("<strong>");
            render_children(&strong.children, ctx);
            ctx.push_raw("</strong>");
        }
        Node::Delete(delete) => {
            ctx.push_raw("<s>");
            render_children(&delete.children, ctx);
            ctx.push_raw("</s>");
        }
        Node::InlineCode(code) => {
            ctx.push_raw("<code>");
            ctx.push_text(&code.value);
            ctx.push_raw("</code>");
        }
        Node::Break(_) => {
            ctx.push_void("<br");
            ctx.push_raw("\n");
        }
        Node::Link(link) => render_link(&link.url, link.title.as_deref(), &link.children, ctx),
        Node::LinkReference(reference) => match ctx.definition(&reference.identifier) {
            Some(target) => render_link(target.url, target.title, &reference.children, ctx),
            None => render_children(&reference.children, ctx),
        },
        Node::Image(image) => render_image(&image.url, &image.alt, image.title.as_deref(), ctx),
        Node::ImageReference(reference) => match ctx.definition(&reference.identifier) {
            Some(target) => render_image(target.url, &reference.alt, target.title, ctx),
            None => ctx.push_text(&reference.alt),
        },
        Node::List(list) => render_list(list, ctx),
        Node::ListItem(item) => render_list_item(item, ctx),
        Node::Blockquote(quote) => render_blockquote(quote, ctx),
        Node::Code(code) => render_code(code, ctx),
        Node::Html(html) => render_html(html, ctx),
        Node::ThematicBreak(_) => {
            ctx.push_void("<hr");
            ctx.push_raw("\n");
        }
        Node::Table(table) => render_table(table, ctx),
        Node::FootnoteReference(reference) => render_footnote_reference(reference, ctx),
        Node::Definition(_) | Node::FootnoteDefinition(_) => {}
        _ => {
            log::warn!("Unhandled markdown node type: {:?}", node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_percent_encoded_once() {
        assert_eq!(normalize_url("/a b/ü"), "/a%20b/%C3%BC");
        assert_eq!(normalize_url("/a%20b"), "/a%20b");
        assert_eq!(normalize_url("100%"), "100%25");
    }

    #[test]
    fn script_protocols_are_unsafe() {
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url(" VBScript:x"));
        assert!(!is_safe_url("data:text/html;base64,xx"));
        assert!(is_safe_url("data:image/png;base64,xx"));
        assert!(is_safe_url("https://example.com"));
    }
}
