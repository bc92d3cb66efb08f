//! Operation selection over a parsed GraphQL document.

use crate::error::RequestError;
use crate::mock::OperationKind;
use graphql_parser::query::{Definition, OperationDefinition, Selection, SelectionSet};

/// The operation a request executes, reduced to what the resolver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOperation {
    pub kind: OperationKind,
    pub name: Option<String>,
    /// Top-level field names, in document order
    pub fields: Vec<String>,
}

/// Parse `query` and pick the operation to run.
///
/// With several operations in the document an `operation_name` is
/// mandatory. A supplied name must match one of the operations.
pub fn select_operation(
    query: &str,
    operation_name: Option<&str>,
) -> Result<SelectedOperation, RequestError> {
    let document = graphql_parser::parse_query::<String>(query)
        .map_err(|_| RequestError::InvalidQuery(query.to_string()))?;

    let operations: Vec<&OperationDefinition<'_, String>> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .collect();

    let operation = match (operation_name, operations.as_slice()) {
        (_, []) => return Err(RequestError::InvalidQuery(query.to_string())),
        (None, [single]) => *single,
        (None, _) => return Err(RequestError::OperationNameRequired(query.to_string())),
        (Some(name), _) => operations
            .iter()
            .copied()
            .find(|operation| operation_name_of(operation) == Some(name))
            .ok_or_else(|| RequestError::OperationNotFound(name.to_string()))?,
    };

    let (kind, selection_set) = match operation {
        OperationDefinition::SelectionSet(selection_set) => (OperationKind::Query, selection_set),
        OperationDefinition::Query(query) => (OperationKind::Query, &query.selection_set),
        OperationDefinition::Mutation(mutation) => {
            (OperationKind::Mutation, &mutation.selection_set)
        }
        OperationDefinition::Subscription(_) => {
            return Err(RequestError::UnsupportedOperation("subscription".to_string()))
        }
    };

    Ok(SelectedOperation {
        kind,
        name: operation_name_of(operation).map(str::to_string),
        fields: top_level_fields(selection_set)?,
    })
}

fn operation_name_of<'a>(operation: &'a OperationDefinition<'_, String>) -> Option<&'a str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

fn top_level_fields(selection_set: &SelectionSet<'_, String>) -> Result<Vec<String>, RequestError> {
    selection_set
        .items
        .iter()
        .map(|selection| match selection {
            Selection::Field(field) => Ok(field.name.clone()),
            Selection::FragmentSpread(spread) => Err(RequestError::UnsupportedSelection(
                format!("fragment spread \"{}\"", spread.fragment_name),
            )),
            Selection::InlineFragment(_) => Err(RequestError::UnsupportedSelection(
                "inline fragment".to_string(),
            )),
        })
        .collect()
}
