use crate::analysis::DataPoint;

const CHART_STYLES: &str = r#"<style>
.chart-wrapper {
  position: relative;
  display: inline-block;
  outline: none;
}
.chart-wrapper:focus {
  box-shadow: 0 0 0 3px #2684ff;
}
.chart-image {
  display: block;
  width: 100%;
  height: auto;
}
.chart-point {
  position: absolute;
  width: 1px;
  height: 1px;
  opacity: 0;
}
.chart-point:focus {
  opacity: 1;
  width: 16px;
  height: 16px;
  margin-left: -8px;
  margin-top: -8px;
  border-radius: 50%;
  border: 2px solid #2684ff;
  background: rgba(38, 132, 255, 0.2);
}
</style>"#;

/// Renders the chart wrapper with one focusable marker per data point
pub(super) fn render_markup(image_url: &str, summary: &str, data_points: &[DataPoint]) -> String {
    let summary = escape_html(summary);
    let mut lines = Vec::with_capacity(data_points.len() + 4);

    lines.push(format!(
        r#"<div class="chart-wrapper" role="img" aria-label="{}" tabindex="0">"#,
        summary
    ));
    lines.push(format!(
        r#"  <img src="{}" alt="{}" class="chart-image" />"#,
        escape_html(image_url),
        summary
    ));
    for point in data_points {
        lines.push(format!(
            r#"    <button class="chart-point" style="left: {}%; top: {}%;" aria-label="{}" tabindex="0"></button>"#,
            point.x_percent,
            point.y_percent,
            escape_html(&point.description)
        ));
    }
    lines.push("</div>".to_string());
    lines.push(CHART_STYLES.to_string());

    lines.join("\n")
}

/// Escapes text for use inside element content and double-quoted attributes
pub(super) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u32, x: f64, y: f64, description: &str) -> DataPoint {
        DataPoint {
            id,
            label: format!("Point {}", id),
            x_percent: x,
            y_percent: y,
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn markers_follow_point_order_with_verbatim_positions() {
        let points = vec![
            point(1, 75.0, 10.0, "first"),
            point(2, 25.0, 90.0, "second"),
            point(3, 125.5, -3.0, "third"),
        ];
        let markup = render_markup("http://host/a.png", "Summary", &points);

        let first = markup.find(r#"aria-label="first""#).unwrap();
        let second = markup.find(r#"aria-label="second""#).unwrap();
        let third = markup.find(r#"aria-label="third""#).unwrap();
        assert!(first < second && second < third);

        assert!(markup.contains("left: 75%; top: 10%;"));
        assert!(markup.contains("left: 125.5%; top: -3%;"));
        assert_eq!(markup.matches(r#"class="chart-point""#).count(), 3);
    }

    #[test]
    fn wrapper_announces_summary_and_embeds_image() {
        let markup = render_markup("http://host/a.png", "Monthly sales", &[]);
        assert!(markup.starts_with(r#"<div class="chart-wrapper" role="img" aria-label="Monthly sales""#));
        assert!(markup.contains(r#"src="http://host/a.png""#));
        assert!(markup.contains(".chart-point:focus"));
    }

    #[test]
    fn attribute_text_is_escaped() {
        let points = vec![point(1, 0.0, 0.0, r#"5 < 6 & "quoted""#)];
        let markup = render_markup("u", "a\"b", &points);
        assert!(markup.contains(r#"aria-label="5 &lt; 6 &amp; &quot;quoted&quot;""#));
        assert!(markup.contains(r#"aria-label="a&quot;b""#));
    }
}
