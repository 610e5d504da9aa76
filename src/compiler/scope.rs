//! Join/include scope chain, used to resolve `{__FIELD_PARENT_x}` /
//! `Value::ParentField` references while composing conditions inside a
//! nested `including` (spec §4.2, §4.3 "including").

use crate::catalog::model::Model;

pub struct Scope<'a> {
    pub model: &'a Model,
    pub alias: Option<&'a str>,
    pub parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn root(model: &'a Model) -> Self {
        Self {
            model,
            alias: None,
            parent: None,
        }
    }

    pub fn child(&'a self, model: &'a Model, alias: Option<&'a str>) -> Scope<'a> {
        Scope {
            model,
            alias,
            parent: Some(self),
        }
    }

    pub fn table_ref(&self) -> String {
        match self.alias {
            Some(alias) => crate::render::quote_ident(alias),
            None => crate::render::quote_ident(&self.model.table),
        }
    }

    /// Qualify a rendered column selector with this scope's table/alias.
    /// A `json_extract(...)` selector already names its column explicitly,
    /// so qualifying it would need to live inside the call - left bare.
    pub fn qualify(&self, rendered_selector: &str) -> String {
        if rendered_selector.starts_with("json_extract(") {
            rendered_selector.to_string()
        } else {
            format!("{}.{}", self.table_ref(), rendered_selector)
        }
    }
}
