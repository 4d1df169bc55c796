use crate::entities::TrafficCondition;
use crate::server::handlers::pages::PredictParams;

pub enum Outcome {
    Success { map_html: String, message: String },
    Failure { message: String },
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

fn traffic_options(selected: &str) -> String {
    TrafficCondition::ALL
        .iter()
        .map(|condition| {
            let value = condition.ordinal().to_string();
            let selected = if value == selected.trim() { " selected" } else { "" };

            format!(
                "<option value=\"{}\"{}>{}</option>",
                value,
                selected,
                condition.label()
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

fn outcome_html(outcome: Option<&Outcome>) -> String {
    match outcome {
        None => String::new(),
        Some(Outcome::Success { map_html, message }) => format!(
            "<section class=\"result\">{}<p class=\"success\">🚀 {}</p></section>",
            map_html,
            escape(message)
        ),
        Some(Outcome::Failure { message }) => {
            format!("<p class=\"error\">⚠️ {}</p>", escape(message))
        }
    }
}

/// The whole page: the input form, followed by the map and estimate or the
/// error of the last run.
pub fn render(params: &PredictParams, outcome: Option<&Outcome>) -> String {
    let battery = params
        .battery_level
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| (0..=100).contains(v))
        .unwrap_or(80);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>EV Smart Route &amp; Charging Finder</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; }}
.success {{ color: #176317; }}
.error {{ color: #a11; }}
</style>
</head>
<body>
<h1>⚡ EV Smart Route &amp; Charging Finder 🚗🔋</h1>
<form method="post" action="/predict">
<label>Enter Origin (lat,lon) <input type="text" name="origin" value="{origin}"/></label>
<label>Enter Destination (lat,lon) <input type="text" name="destination" value="{destination}"/></label>
<label>Traffic Condition <select name="traffic_condition">{traffic}</select></label>
<label>Battery Level (%) <input type="range" name="battery_level" min="0" max="100" value="{battery}" oninput="this.nextElementSibling.value = this.value"/><output>{battery}</output></label>
<p><button type="submit">🔍 Predict Best Route</button></p>
</form>
{outcome}
</body>
</html>
"#,
        origin = escape(&params.origin),
        destination = escape(&params.destination),
        traffic = traffic_options(&params.traffic_condition),
        battery = battery,
        outcome = outcome_html(outcome),
    )
}

#[test]
fn escape_html() {
    assert_eq!(
        escape("<b>\"Tom\" & 'Jerry'</b>"),
        "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
    );
}

#[test]
fn render_keeps_user_values_escaped() {
    let params = PredictParams {
        origin: "\"><script>".into(),
        destination: "13.0827,80.2707".into(),
        traffic_condition: "3".into(),
        battery_level: "42".into(),
    };

    let html = render(&params, None);

    assert!(html.contains("value=\"&quot;&gt;&lt;script&gt;\""));
    assert!(html.contains("<option value=\"3\" selected>Heavy</option>"));
    assert!(html.contains("value=\"42\""));
    assert!(!html.contains("class=\"error\""));
}

#[test]
fn render_outcomes() {
    let params = PredictParams::default();

    let html = render(
        &params,
        Some(&Outcome::Success {
            map_html: "<div id=\"map\"></div>".into(),
            message: "Estimated Travel Time: 45.00 minutes".into(),
        }),
    );
    let map_at = html.find("<div id=\"map\"></div>").unwrap();
    let message_at = html.find("Estimated Travel Time: 45.00 minutes").unwrap();
    assert!(map_at < message_at);

    let html = render(
        &params,
        Some(&Outcome::Failure {
            message: "Route Fetching Failed: 403 (<quota>)".into(),
        }),
    );
    assert!(html.contains("⚠️ Route Fetching Failed: 403 (&lt;quota&gt;)"));
}
