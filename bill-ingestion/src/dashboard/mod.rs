//! Self-contained dashboard page: a static template with the records inlined.

use serde::Serialize;

/// Built-in page head, filter controls, canvases and table skeleton. Left
/// open so the data and script tags can be appended.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../assets/dashboard_top.html");

/// Client-side filtering, table and chart logic, written beside the page.
pub const CHARTS_SCRIPT: &str = include_str!("../../assets/dashboard_charts.js");

/// Compact JSON that is safe inside a `<script>` element.
///
/// `</` only occurs inside JSON strings, where `<\/` decodes to the same text.
pub fn embed_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// `template` followed by the inlined data, the chart script reference and
/// the closing tags.
pub fn render_page<R, P>(template: &str, records: &R, rolling: &P, script_src: &str) -> Result<String, serde_json::Error>
where
    R: Serialize + ?Sized,
    P: Serialize + ?Sized,
{
    let data = embed_json(records)?;
    let rolling = embed_json(rolling)?;

    let mut page = String::with_capacity(template.len() + data.len() + rolling.len() + 256);
    page.push_str(template);
    page.push_str("\n    <script>const allData = ");
    page.push_str(&data);
    page.push_str(";</script>\n    <script>const rollingAverage = ");
    page.push_str(&rolling);
    page.push_str(";</script>\n    <script src=\"");
    page.push_str(script_src);
    page.push_str("\"></script>\n</body>\n</html>");
    Ok(page)
}
