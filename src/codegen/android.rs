use super::CodeLanguage;
use crate::analysis::DataPoint;

/// Renders the `AccessibleChartActivity` source for Java or Kotlin
///
/// Any other language falls back to Kotlin syntax.
pub(super) fn render_activity(language: CodeLanguage, summary: &str, data_points: &[DataPoint]) -> String {
    let java = language == CodeLanguage::Java;
    let summary = escape_literal(summary, java);

    let points = data_points
        .iter()
        .map(|point| {
            let label = escape_literal(&point.label, java);
            if java {
                format!("                new ChartPoint(\"{}\", {})", label, point.value)
            } else {
                format!("                ChartPoint(\"{}\", {})", label, point.value)
            }
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let mut code = vec![
        "// Auto-generated accessible chart integration sample".to_string(),
        "package com.example.chart;".to_string(),
        String::new(),
        "import android.os.Bundle;".to_string(),
        "import androidx.appcompat.app.AppCompatActivity;".to_string(),
    ];
    if java {
        code.push("import java.util.Arrays;".to_string());
        code.push("import java.util.List;".to_string());
    }
    code.push(String::new());

    if java {
        code.extend([
            "public class AccessibleChartActivity extends AppCompatActivity {".to_string(),
            "    @Override".to_string(),
            "    protected void onCreate(Bundle savedInstanceState) {".to_string(),
            "        super.onCreate(savedInstanceState);".to_string(),
            "        setContentView(R.layout.activity_accessible_chart);".to_string(),
            "        AccessibleChartView chartView = findViewById(R.id.chartView);".to_string(),
            format!("        String chartSummary = \"{}\";", summary),
            format!("        List<ChartPoint> points = Arrays.asList(\n{}\n        );", points),
            "        ChartPointAdapter adapter = new ChartPointAdapter(points);".to_string(),
            "        chartView.setAdapter(adapter);".to_string(),
            "        chartView.render(points, chartSummary);".to_string(),
            "    }".to_string(),
            "}".to_string(),
        ]);
    } else {
        code.extend([
            "class AccessibleChartActivity : AppCompatActivity() {".to_string(),
            "    override fun onCreate(savedInstanceState: Bundle?) {".to_string(),
            "        super.onCreate(savedInstanceState)".to_string(),
            "        setContentView(R.layout.activity_accessible_chart)".to_string(),
            "        val chartView: AccessibleChartView = findViewById(R.id.chartView)".to_string(),
            format!("        val chartSummary = \"{}\"", summary),
            format!("        val points = listOf(\n{}\n        )", points),
            "        val adapter = ChartPointAdapter(points)".to_string(),
            "        chartView.adapter = adapter".to_string(),
            "        chartView.render(points, chartSummary)".to_string(),
            "    }".to_string(),
            "}".to_string(),
        ]);
    }

    code.join("\n")
}

/// Escapes text for a double-quoted string literal; Kotlin also needs `$`
fn escape_literal(input: &str, java: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if !java => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}
