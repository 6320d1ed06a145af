//! Fixed-width text rendering of a table view (CLI output).

use weedle_core::Record;

use crate::TableView;

fn fit(s: &str, width: usize) -> String {
    let n = s.chars().count();
    if n <= width {
        let mut out = s.to_string();
        out.extend(std::iter::repeat(' ').take(width - n));
        out
    } else if width == 0 {
        String::new()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}

pub fn render_text<R: Record>(view: &TableView<'_, R>) -> String {
    let mut out = String::new();
    out.push_str(view.title);
    out.push('\n');
    if view.search_term.is_empty() {
        out.push_str(&format!("[{}]\n", view.search_placeholder));
    } else {
        out.push_str(&format!("[{}]\n", view.search_term));
    }

    let widths: Vec<usize> = view
        .columns
        .iter()
        .zip(view.header.iter())
        // room for the sort indicator
        .map(|(c, h)| c.width.max(h.label.chars().count() + 2))
        .collect();

    let mut header_line = Vec::with_capacity(widths.len());
    let mut rule_line = Vec::with_capacity(widths.len());
    for (h, w) in view.header.iter().zip(widths.iter()) {
        let text = match h.indicator {
            Some(ind) => format!("{} {}", h.label, ind),
            None => h.label.clone(),
        };
        header_line.push(fit(&text, *w));
        let ch = if h.highlighted { "=" } else { "-" };
        rule_line.push(ch.repeat(*w));
    }
    out.push_str(header_line.join(" | ").trim_end());
    out.push('\n');
    out.push_str(&rule_line.join("-+-"));
    out.push('\n');

    for row in view.cells() {
        let line: Vec<String> = row.iter().zip(widths.iter()).map(|(v, w)| fit(&v.display(), *w)).collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }

    out.push_str(&view.summary());
    out.push('\n');
    let mut pager = String::new();
    pager.push_str(if view.can_prev { "«" } else { " " });
    for b in view.page_buttons.iter() {
        if b.active {
            pager.push_str(&format!(" [{}]", b.page));
        } else {
            pager.push_str(&format!(" {}", b.page));
        }
    }
    pager.push(' ');
    pager.push_str(if view.can_next { "»" } else { " " });
    out.push_str(pager.trim_end());
    out.push('\n');
    out
}
