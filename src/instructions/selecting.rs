//! `selecting` → column projection (spec §4.3 "selecting"). `**` expands to
//! every user field; `!field` excludes a field already selected; explicit
//! fields add. `id` is always projected so joins and row inflation can key
//! off it even when the caller didn't ask for it.

use crate::catalog::Catalogue;
use crate::compiler::scope::Scope;
use crate::error::Result;
use crate::ir::SelectItem;

pub struct Projection {
    pub slug: String,
    pub selector_sql: String,
}

pub fn render_selection(catalogue: &Catalogue, scope: &Scope, items: Option<&[SelectItem]>) -> Result<Vec<Projection>> {
    let mut ordered: Vec<String> = Vec::new();

    match items {
        None => {
            for field in scope.model.user_fields() {
                ordered.push(field.slug.clone());
            }
        }
        Some(items) => {
            for item in items {
                match item {
                    SelectItem::AllUser => {
                        for field in scope.model.user_fields() {
                            if !ordered.contains(&field.slug) {
                                ordered.push(field.slug.clone());
                            }
                        }
                    }
                    SelectItem::Field(slug) => {
                        if !ordered.contains(slug) {
                            ordered.push(slug.clone());
                        }
                    }
                    SelectItem::Exclude(slug) => {
                        ordered.retain(|s| s != slug);
                    }
                }
            }
        }
    }

    if !ordered.iter().any(|s| s == "id") {
        ordered.insert(0, "id".to_string());
    }

    ordered
        .into_iter()
        .map(|slug| {
            let (_, selector) = catalogue.field(scope.model, &slug)?;
            Ok(Projection {
                slug,
                selector_sql: selector.render(),
            })
        })
        .collect()
}
