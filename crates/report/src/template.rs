use thiserror::Error;

use summa_import::AggregatedRow;

use crate::breakdown::Breakdown;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown template: {0:?}")]
    NotFound(String),
}

/// The closed set of document templates. Each section of the report is one
/// of these; an unknown name can only arise at the configuration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Table,
    CounterpartyList,
    Graph,
}

impl TemplateKind {
    pub fn from_name(name: &str) -> Result<Self, TemplateError> {
        match name {
            "table" => Ok(TemplateKind::Table),
            "counterparties" => Ok(TemplateKind::CounterpartyList),
            "graph" => Ok(TemplateKind::Graph),
            other => Err(TemplateError::NotFound(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::Table => "table",
            TemplateKind::CounterpartyList => "counterparties",
            TemplateKind::Graph => "graph",
        }
    }
}

/// Data bound into a template: the account summary name, the aggregated
/// rows (empty for the counterparty-list view), the distinct counterparty
/// roster, and the share breakdown.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub account_name: &'a str,
    pub rows: &'a [AggregatedRow],
    pub counterparties: &'a [String],
    pub breakdown: &'a Breakdown,
}

pub fn render(kind: TemplateKind, ctx: &ReportContext<'_>) -> String {
    match kind {
        TemplateKind::Table => render_table(ctx),
        TemplateKind::CounterpartyList => render_counterparty_list(ctx),
        TemplateKind::Graph => render_graph(ctx),
    }
}

const STYLE: &str = "\
body { font-family: 'Segoe UI', Arial, sans-serif; margin: 24px; color: #1a1a2e; }\
h1 { font-size: 22px; }\
table { border-collapse: collapse; width: 100%; font-size: 12px; }\
th, td { border: 1px solid #c9c9d9; padding: 6px 8px; text-align: left; vertical-align: top; }\
th { background: #eef0f6; }\
td.amount { text-align: right; white-space: nowrap; }\
ul { font-size: 14px; line-height: 1.6; }\
";

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

fn render_table(ctx: &ReportContext<'_>) -> String {
    let mut body = format!("<h1>Transactions — {}</h1>\n", escape(ctx.account_name));
    body.push_str(
        "<table>\n<tr><th>Date</th><th>Counterparty</th><th>Tax id</th>\
         <th>Amount</th><th>Payment description</th></tr>\n",
    );
    for row in ctx.rows {
        let date = row
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        // Descriptions carry their own <br><br> separators and are inserted
        // verbatim; every other field is escaped.
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"amount\">{}</td><td>{}</td></tr>\n",
            escape(&date),
            escape(&row.counterparty),
            escape(row.counterparty_id.as_str()),
            row.amount,
            row.descriptions,
        ));
    }
    body.push_str("</table>\n");
    shell(ctx.account_name, &body)
}

fn render_counterparty_list(ctx: &ReportContext<'_>) -> String {
    let mut body = format!("<h1>Counterparties — {}</h1>\n<ul>\n", escape(ctx.account_name));
    for name in ctx.counterparties {
        body.push_str(&format!("<li>{}</li>\n", escape(name)));
    }
    body.push_str("</ul>\n");
    shell(ctx.account_name, &body)
}

const GRAPH_TEMPLATE: &str = include_str!("templates/graph.html");

fn render_graph(ctx: &ReportContext<'_>) -> String {
    let data = serde_json::json!({
        "labels": ctx.breakdown.shares.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
        "values": ctx.breakdown.shares.iter().map(|s| s.value.to_f64()).collect::<Vec<_>>(),
    });
    GRAPH_TEMPLATE
        .replace("__TITLE__", &escape(ctx.account_name))
        .replace("__TOTAL__", &escape(&ctx.breakdown.formatted_total()))
        .replace("__DATA__", &data.to_string())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
