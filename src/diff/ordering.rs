//! Dependency ordering for model creation/deletion (spec §4.6 "index diff
//! ordered last", cycle detection). Creates are emitted in dependency
//! order (a model is created after every model its links target); drops
//! are the reverse. Mirrors the teacher's `diff::diff_all` ordering pass,
//! built on the same graph library.

use crate::catalog::Catalogue;
use crate::catalog::id::ModelId;
use crate::catalog::model::Model;
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Topologically order `models` so that every link target precedes the
/// model that references it. Errors with [`Error::CycleDetected`] when the
/// link graph has a cycle (spec §4.6).
pub fn order_for_creation<'a>(catalogue: &Catalogue, models: &[&'a Model]) -> Result<Vec<&'a Model>> {
    let mut graph = DiGraph::<ModelId, ()>::new();
    let mut nodes = HashMap::new();

    for model in models {
        let id = ModelId::new(model.slug.clone());
        let idx = graph.add_node(id.clone());
        nodes.insert(id, idx);
    }

    for model in models {
        let id = ModelId::new(model.slug.clone());
        if let Some(&from) = nodes.get(&id) {
            for target in catalogue.forward_deps().get(&id).into_iter().flatten() {
                if target == &id {
                    // Self-links are allowed (spec §4.6) and trivially
                    // satisfiable - the model can always be created before
                    // any row references its own not-yet-existing rows.
                    continue;
                }
                if let Some(&to) = nodes.get(target) {
                    graph.add_edge(to, from, ());
                }
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        let involved = graph
            .node_weights()
            .map(|id| id.slug.clone())
            .collect::<Vec<_>>();
        let _ = cycle;
        Error::CycleDetected { involved }
    })?;

    Ok(order
        .into_iter()
        .map(|idx| {
            let slug = &graph[idx].slug;
            *models.iter().find(|m| &m.slug == slug).expect("node came from models")
        })
        .collect())
}

/// Reverse of [`order_for_creation`]: drop dependents before the models
/// they depend on.
pub fn order_for_deletion<'a>(catalogue: &Catalogue, models: &[&'a Model]) -> Result<Vec<&'a Model>> {
    let mut ordered = order_for_creation(catalogue, models)?;
    ordered.reverse();
    Ok(ordered)
}
