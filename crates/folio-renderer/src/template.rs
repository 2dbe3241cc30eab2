//! Fixed HTML page template.

use crate::escape::escape_html;

const PAGE_TEMPLATE: &str = r"<!DOCTYPE html>
<html lang=en>
<head>
<meta charset=utf-8>
<meta name=viewport content='width=device-width, initial-scale=1'>
<title>{{title}}</title>
<style>
body { font-family: system-ui, sans-serif; line-height: 1.6; max-width: 46rem; margin: 0 auto; padding: 2rem 1rem; }
pre { background: #f4f4f4; padding: 0.75rem 1rem; overflow-x: auto; }
code { font-family: ui-monospace, monospace; font-size: 0.95em; }
blockquote { border-left: 3px solid #ccc; margin-left: 0; padding-left: 1rem; color: #555; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; }
img { max-width: 100%; }
</style>
</head>
<body>
<main>
{{content}}
</main>
</body>
</html>
";

/// Wrap a rendered fragment in the full HTML page.
pub(crate) fn page(title: &str, content: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &escape_html(title))
        .replace("{{content}}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_structure() {
        let html = page("Hello", "<p>body</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Hello</title>"));
        assert!(html.contains("<main>\n<p>body</p>\n</main>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_title_escaped() {
        let html = page("A <b>title</b>", "<p>x</p>");
        assert!(html.contains("<title>A &lt;b&gt;title&lt;/b&gt;</title>"));
    }

    #[test]
    fn test_content_not_escaped() {
        let html = page("T", r#"<h1 id="x">X</h1>"#);
        assert!(html.contains(r#"<h1 id="x">X</h1>"#));
    }
}
