use std::collections::HashMap;

/// A category defined on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Resolve typed category names to server ids.
///
/// Names are matched case-insensitively. Each server category is used at
/// most once, so repeating a name does not repeat its id. Names the server
/// does not know are dropped. The output follows the order of `entered`,
/// which keeps the primary category first.
pub fn reconcile(entered: &[String], server: &[Category]) -> Vec<String> {
    let mut by_name: HashMap<String, &str> = server
        .iter()
        .map(|category| (category.name.to_lowercase(), category.id.as_str()))
        .collect();

    entered
        .iter()
        .filter_map(|name| by_name.remove(name.as_str()))
        .map(str::to_string)
        .collect()
}
