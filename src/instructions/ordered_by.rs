//! `orderedBy` → `ORDER BY <selector> [COLLATE NOCASE] ASC|DESC, ...`
//! (spec §4.3). `COLLATE NOCASE` is added for string fields only.
//! Expression leaves are wrapped in parentheses.

use crate::catalog::Catalogue;
use crate::catalog::model::FieldType;
use crate::compiler::scope::Scope;
use crate::error::Result;
use crate::ir::{Direction, OrderItem, OrderKey};

pub fn render_order_by(
    catalogue: &Catalogue,
    scope: &Scope,
    items: &[OrderItem],
) -> Result<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let dir = match item.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        let rendered = match &item.key {
            OrderKey::Field(field) => {
                let (f, selector) = catalogue.field(scope.model, field)?;
                let collate = if f.r#type == FieldType::String {
                    " COLLATE NOCASE"
                } else {
                    ""
                };
                format!("{}{collate} {dir}", selector.render())
            }
            OrderKey::Expression(expr) => format!("({expr}) {dir}"),
        };
        parts.push(rendered);
    }
    Ok(format!("ORDER BY {}", parts.join(", ")))
}

/// The default ordering applied to a plural `get` when none was supplied
/// (spec §4.4).
pub fn default_order() -> Vec<OrderItem> {
    vec![OrderItem {
        key: OrderKey::Field("ronin.createdAt".to_string()),
        direction: Direction::Desc,
    }]
}
