//! The system instruction sent to the upstream model.

use time::{Date, macros::format_description};

/// The category labels offered to the model when the client does not send any.
pub const DEFAULT_CATEGORIES: &[&str] = &["Geral", "Outros"];

/// Build the system instruction for a request made on `today`.
///
/// `categories` are the labels the client already knows about, joined with
/// `", "` in the order given. When the list is empty [DEFAULT_CATEGORIES] is
/// used instead.
///
/// The instruction describes the only two reply shapes the client accepts
/// (`add_tx` and `add_rec`) and asks for bare JSON without markdown.
pub fn build_system_prompt(today: Date, categories: &[String]) -> String {
    let categories = if categories.is_empty() {
        DEFAULT_CATEGORIES.join(", ")
    } else {
        categories.join(", ")
    };

    format!(
        r#"Você é uma API JSON para um app financeiro.
Data de hoje: {today}.
Categorias: {categories}.

Responda APENAS um JSON válido, sem markdown.

1. Transação:
{{
  "action": "add_tx",
  "tipo": "expense" ou "income",
  "desc": "Descrição curta",
  "val": 0.00,
  "cat": "Categoria",
  "data": "YYYY-MM-DD"
}}

2. Recorrente:
{{
  "action": "add_rec",
  "desc": "Descrição",
  "val": 0.00,
  "dia": 10
}}
"#,
        today = format_iso_date(today),
    )
}

fn format_iso_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");

    // Formatting a `Date` with date-only components cannot fail.
    date.format(&format).unwrap_or_else(|_| date.to_string())
}
