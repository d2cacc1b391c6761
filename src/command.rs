//! The command objects the upstream model is asked to produce.
//!
//! The relay forwards the model's reply unchanged, so these types are not used
//! to validate or rewrite anything. They document the two shapes requested by
//! the system prompt and let the pipeline log which one came back.

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Whether a transaction takes money out of or puts money into the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money spent.
    Expense,
    /// Money received.
    Income,
}

/// A one-off transaction to add to the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTransactionCommand {
    /// Expense or income.
    pub tipo: TransactionKind,
    /// A short description, e.g. "mercado".
    pub desc: String,
    /// The amount, never negative.
    pub val: f64,
    /// The category label, loosely matched against the client's categories.
    pub cat: String,
    /// The date the transaction happened.
    #[serde(with = "iso_date")]
    pub data: Date,
}

/// A monthly recurring entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRecurringCommand {
    /// A short description, e.g. "aluguel".
    pub desc: String,
    /// The amount.
    pub val: f64,
    /// The day of the month (1-31) the entry repeats on.
    pub dia: u8,
}

/// A command object, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Command {
    /// `"action": "add_tx"`
    #[serde(rename = "add_tx")]
    AddTransaction(AddTransactionCommand),
    /// `"action": "add_rec"`
    #[serde(rename = "add_rec")]
    AddRecurring(AddRecurringCommand),
}

impl Command {
    /// Try to read `value` as one of the two known command shapes.
    ///
    /// Returns `None` if the value does not match either shape exactly, e.g.
    /// a day of month outside 1-31 or an unknown `action`.
    pub fn recognize(value: &serde_json::Value) -> Option<Command> {
        let command: Command = serde_json::from_value(value.clone()).ok()?;

        match &command {
            Command::AddRecurring(recurring) if !(1..=31).contains(&recurring.dia) => None,
            Command::AddTransaction(transaction) if transaction.val < 0.0 => None,
            _ => Some(command),
        }
    }

    /// The value of the `action` field.
    pub fn action(&self) -> &'static str {
        match self {
            Command::AddTransaction(_) => "add_tx",
            Command::AddRecurring(_) => "add_rec",
        }
    }
}
