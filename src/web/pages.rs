//! Server-rendered HTML pages.

use crate::job::JobStatus;
use crate::queries::DatasetCounts;

use super::charts::{figure_script, Figure};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const FONT_AWESOME_CDN: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.2/css/all.min.css";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub const INVALID_SECRET: &str = "Invalid secret key. Please try again.";

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>{title} - Wiki Visualizer</title>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <script src="{tailwind}"></script>
    <link rel="stylesheet" href="{font_awesome}" />
    <style>
        body {{ background-color: #000; color: white; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}
    </style>
    {head_extra}
</head>
<body class="bg-black min-h-screen p-6">
    <div class="max-w-7xl mx-auto">
{body}
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        tailwind = TAILWIND_CDN,
        font_awesome = FONT_AWESOME_CDN,
        head_extra = head_extra,
        body = body,
    )
}

fn header(title: &str, icon: &str, back: Option<(&str, &str)>) -> String {
    let back_link = back
        .map(|(href, label)| {
            format!(
                r#"<a href="{}" class="px-4 py-2 bg-blue-600 hover:bg-blue-500 text-white rounded-lg transition-colors flex items-center gap-2"><i class="fa-solid fa-arrow-left"></i> {}</a>"#,
                href,
                escape_html(label)
            )
        })
        .unwrap_or_default();

    format!(
        r#"        <div class="mb-6 flex justify-between items-center">
            <h1 class="text-3xl font-bold text-white flex items-center gap-3">
                <i class="fa-solid {icon} text-blue-500"></i>
                {title}
            </h1>
            <div class="flex gap-3">
                {back_link}
                <a href="/" class="px-4 py-2 bg-gray-700 hover:bg-gray-600 text-white rounded-lg transition-colors flex items-center gap-2"><i class="fa-solid fa-home"></i> Home</a>
            </div>
        </div>
"#,
        icon = icon,
        title = escape_html(title),
        back_link = back_link,
    )
}

fn card_link(href: &str, icon: &str, title: &str, description: &str) -> String {
    format!(
        r#"            <a href="{href}" class="block bg-gray-900 hover:bg-gray-800 rounded-xl p-6 shadow-2xl transition-colors">
                <h2 class="text-xl font-semibold flex items-center gap-3"><i class="fa-solid {icon} text-blue-500"></i>{title}</h2>
                <p class="mt-2 text-gray-400">{description}</p>
            </a>
"#,
        href = href,
        icon = icon,
        title = escape_html(title),
        description = escape_html(description),
    )
}

fn stat(label: &str, value: i64) -> String {
    format!(
        r#"            <div class="bg-gray-900 rounded-xl p-6 text-center">
                <div class="text-4xl font-bold text-blue-400">{}</div>
                <div class="mt-1 text-gray-400">{}</div>
            </div>
"#,
        value,
        escape_html(label)
    )
}

/// Landing page with dataset counts
pub fn landing(counts: &DatasetCounts) -> String {
    let notice = if counts.is_empty() {
        r#"        <p class="mb-6 text-yellow-400">No data imported yet. <a class="underline" href="/scrape">Run an import</a> to populate the database.</p>
"#
    } else {
        ""
    };

    let body = format!(
        "{header}{notice}        <div class=\"grid grid-cols-3 gap-6 mb-8\">\n{countries}{continents}{languages}        </div>\n        <div class=\"grid grid-cols-2 gap-6\">\n{visualize}{scrape}        </div>\n",
        header = header("Wiki Visualizer", "fa-earth-americas", None),
        notice = notice,
        countries = stat("Countries", counts.countries),
        continents = stat("Continents", counts.continents),
        languages = stat("Languages", counts.languages),
        visualize = card_link(
            "/visualize",
            "fa-chart-line",
            "Visualizations",
            "Explore countries, continents and languages through interactive charts."
        ),
        scrape = card_link(
            "/scrape",
            "fa-download",
            "Import data",
            "Refresh the database from the countries API."
        ),
    );

    layout("Home", "", &body)
}

/// Import trigger form, optionally with an inline error
pub fn scrape_form(error: Option<&str>) -> String {
    let error_html = error
        .map(|message| {
            format!(
                r#"            <div class="mb-4 p-3 rounded-lg bg-red-900 text-red-200">{}</div>
"#,
                escape_html(message)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"{header}        <div class="bg-gray-900 rounded-xl p-6 shadow-2xl max-w-xl">
{error_html}            <form method="post" action="/scrape" class="flex flex-col gap-4">
                <label for="secret_key" class="text-gray-300">Secret key</label>
                <input type="password" id="secret_key" name="secret_key" required class="px-3 py-2 rounded-lg bg-gray-800 text-white" />
                <button type="submit" class="px-4 py-2 bg-blue-600 hover:bg-blue-500 text-white rounded-lg">Start import</button>
            </form>
        </div>
"#,
        header = header("Import data", "fa-download", None),
        error_html = error_html,
    );

    layout("Import", "", &body)
}

/// Polls `/scrape/status` and moves on once the job finishes
pub fn progress_page() -> String {
    let body = format!(
        r#"{header}        <div class="bg-gray-900 rounded-xl p-6 shadow-2xl">
            <p id="task" class="mb-4 text-gray-300">Starting import...</p>
            <div class="w-full bg-gray-700 rounded-full h-4">
                <div id="bar" class="bg-blue-500 h-4 rounded-full transition-all" style="width: 0%"></div>
            </div>
            <p id="percent" class="mt-2 text-gray-400">0%</p>
        </div>
        <script>
            async function poll() {{
                try {{
                    const response = await fetch("/scrape/status");
                    const status = await response.json();
                    document.getElementById("task").textContent = status.current_task;
                    document.getElementById("bar").style.width = status.progress + "%";
                    document.getElementById("percent").textContent = status.progress + "%";
                    if (status.completed || status.error) {{
                        window.location.href = "/scrape/completed";
                        return;
                    }}
                }} catch (e) {{
                    console.error(e);
                }}
                setTimeout(poll, 1000);
            }}
            poll();
        </script>
"#,
        header = header("Import in progress", "fa-spinner", None),
    );

    layout("Import progress", "", &body)
}

/// Result of a finished import
pub fn completed_page(status: &JobStatus) -> String {
    let (color, headline) = match &status.error {
        Some(_) => ("text-red-400", "Import failed"),
        None => ("text-green-400", "Import complete"),
    };
    let error_html = status
        .error
        .as_deref()
        .map(|error| {
            format!(
                r#"            <pre class="mt-4 p-3 rounded-lg bg-red-900 text-red-200 whitespace-pre-wrap">{}</pre>
"#,
                escape_html(error)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"{header}        <div class="bg-gray-900 rounded-xl p-6 shadow-2xl">
            <h2 class="text-2xl font-semibold {color}">{headline}</h2>
            <p class="mt-2 text-gray-300">{task}</p>
            <p class="mt-1 text-gray-500">Started {started}</p>
{error_html}            <div class="mt-6 flex gap-3">
                <a href="/visualize" class="px-4 py-2 bg-blue-600 hover:bg-blue-500 text-white rounded-lg">View visualizations</a>
                <a href="/scrape" class="px-4 py-2 bg-gray-700 hover:bg-gray-600 text-white rounded-lg">Run again</a>
            </div>
        </div>
"#,
        header = header("Import result", "fa-flag-checkered", None),
        color = color,
        headline = headline,
        task = escape_html(&status.current_task),
        started = escape_html(status.timestamp.as_deref().unwrap_or("-")),
        error_html = error_html,
    );

    layout("Import result", "", &body)
}

/// Chart categories
pub fn visualize_index() -> String {
    let body = format!(
        "{}        <div class=\"grid grid-cols-3 gap-6\">\n{}{}{}        </div>\n",
        header("Visualizations", "fa-chart-line", None),
        card_link(
            "/visualize/countries",
            "fa-flag",
            "Countries",
            "Population, area, density and regional breakdowns."
        ),
        card_link(
            "/visualize/continents",
            "fa-globe",
            "Continents",
            "Population distribution across continents."
        ),
        card_link(
            "/visualize/languages",
            "fa-language",
            "Languages",
            "Languages spoken in the most countries."
        ),
    );

    layout("Visualizations", "", &body)
}

/// Country chart index
pub fn countries_index() -> String {
    let body = format!(
        "{}        <div class=\"grid grid-cols-2 gap-6\">\n{}{}{}{}        </div>\n",
        header(
            "Country visualizations",
            "fa-flag",
            Some(("/visualize", "Back to Categories"))
        ),
        card_link(
            "/visualize/countries/population-area",
            "fa-circle-dot",
            "Population vs Area",
            "Log-scale scatter of every country, coloured by region."
        ),
        card_link(
            "/visualize/countries/population-density",
            "fa-users",
            "Population Density",
            "The 30 most densely populated countries."
        ),
        card_link(
            "/visualize/countries/by-region",
            "fa-table-cells-large",
            "Regional Analysis",
            "Country count, population and area per region."
        ),
        card_link(
            "/visualize/countries/world-map",
            "fa-map",
            "World Map",
            "Population by country on a world map."
        ),
    );

    layout("Countries", "", &body)
}

/// Full page embedding one Plotly figure
pub fn chart_page(title: &str, figure: &Figure) -> String {
    let head = format!(
        r#"<script src="{}"></script>
    <style>.plotly-graph-div {{ background-color: #111 !important; }}</style>"#,
        PLOTLY_CDN
    );
    let body = format!(
        r#"{header}        <div class="bg-gray-900 rounded-xl p-6 shadow-2xl">
            <div id="chart"></div>
        </div>
        <script>
            {script}
        </script>
"#,
        header = header(title, "fa-chart-line", Some(("/visualize", "Back to Categories"))),
        script = figure_script("chart", figure),
    );

    layout(title, &head, &body)
}

/// Shown instead of a chart when the query returned nothing
pub fn no_data(message: &str) -> String {
    let body = format!(
        r#"{header}        <div class="bg-gray-900 rounded-xl p-6 shadow-2xl">
            <h1 class="text-xl text-gray-300">{message}</h1>
        </div>
"#,
        header = header("No data", "fa-circle-info", Some(("/visualize", "Back to Categories"))),
        message = escape_html(message),
    );

    layout("No data", "", &body)
}
