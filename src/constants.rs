/// Placeholders every code template body must contain
///
/// This is the canonical, versioned template contract. Order matters only for
/// reporting missing placeholders.
pub const REQUIRED_PLACEHOLDERS: [&str; 4] = ["{title}", "{summary}", "{table_data}", "{data_points}"];

/// Number of points the simulated analyzer extracts from a chart
pub const DEFAULT_POINT_COUNT: usize = 5;

/// Summary produced by the simulated analyzer
pub const ANALYSIS_SUMMARY: &str = "Auto-generated accessible chart summary.";

/// Long description produced by the simulated analyzer
pub const ANALYSIS_DESCRIPTION: &str =
    "This chart visualises key data points extracted from the uploaded image.";

/// Default page size for task listings
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Upper bound on task listing page size
pub const MAX_PAGE_SIZE: i64 = 50;

/// Header carrying the caller identity established by the auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Integration steps shown next to the generated web snippet
pub const WEB_INTEGRATION_STEPS: &[&str] = &[
    "1. Copy the generated markup into the page where the chart should appear.",
    "2. Keep the `<style>` block (or move it into your stylesheet) so the focus ring is visible.",
    "3. Make sure the image URL is reachable from the page's origin.",
    "4. Tab through the chart with a screen reader and confirm each point is announced.",
];

/// Integration steps shown next to the generated Java activity
pub const JAVA_INTEGRATION_STEPS: &[&str] = &[
    "1. Enable viewBinding in the module's build.gradle and make sure minSdk is at least 21.",
    "2. Place the generated `AccessibleChartActivity.java` in `app/src/main/java/com/example/chart/`.",
    "3. Reference the custom `AccessibleChartView` in the layout and give it the id `@+id/chartView`.",
    "4. Verify with TalkBack that every data point is read out correctly.",
];

/// Integration steps shown next to the generated Kotlin activity
pub const KOTLIN_INTEGRATION_STEPS: &[&str] = &[
    "1. Enable viewBinding in the module's build.gradle.kts.",
    "2. Place `AccessibleChartActivity.kt` in `app/src/main/java/com/example/chart/`.",
    "3. Reference `AccessibleChartView` in the layout and keep its id as `chartView`.",
    "4. Build and run, then use an accessibility service to check the focus order.",
];

/// System template shipped for web pages
pub const SYSTEM_WEB_TEMPLATE: &str = r#"<!-- {title} -->
<figure class="accessible-chart" aria-describedby="chart-summary">
  <img src="{image_url}" alt="{summary}" />
  <figcaption id="chart-summary">{summary}</figcaption>
</figure>
<script>
  const chartTable = {table_data};
  const chartPoints = {data_points};
</script>
"#;

/// System template shipped for Java activities
pub const SYSTEM_JAVA_TEMPLATE: &str = r#"// {title}
String chartSummary = """
    {summary}""";
String tableJson = """
    {table_data}""";
String pointsJson = """
    {data_points}""";
"#;

/// System template shipped for Kotlin activities
pub const SYSTEM_KOTLIN_TEMPLATE: &str = r#"// {title}
val chartSummary = """{summary}"""
val tableJson = """{table_data}"""
val pointsJson = """{data_points}"""
"#;
