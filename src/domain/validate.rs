//! Bulk configuration validation
//!
//! [`validate`] is a pure function over a parsed [`BulkConfig`]. It collects
//! every violation instead of stopping at the first one; an empty result is
//! the only state in which the document may be applied.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::bulk::{BulkConfig, IntField, StatusConfig, TagConfig, TaskConfig};
use super::resource::is_hex_color;

/// Section of the document a violation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Tag,
    Status,
    Task,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Tag => "tag",
            ItemKind::Status => "status",
            ItemKind::Task => "task",
        })
    }
}

/// One violation in the document
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} \"{item}\": {message}")]
pub struct ValidationError {
    pub kind: ItemKind,
    /// Item name, or its position when unnamed; task paths join ancestors with " > "
    pub item: String,
    pub message: String,
}

impl ValidationError {
    fn new(kind: ItemKind, item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Validates the whole document, returning every violation found
pub fn validate(config: &BulkConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_tags(config.tags(), &mut errors);
    validate_statuses(config.statuses(), &mut errors);
    validate_tasks(config.tasks(), &mut errors);
    errors
}

fn label(name: &str, position: usize) -> String {
    if name.trim().is_empty() {
        format!("#{}", position + 1)
    } else {
        name.to_string()
    }
}

fn validate_tags(tags: &[TagConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for (i, tag) in tags.iter().enumerate() {
        let item = label(&tag.name, i);

        if tag.name.trim().is_empty() {
            errors.push(ValidationError::new(ItemKind::Tag, &item, "Tag name is required"));
        } else if !seen.insert(tag.name.trim().to_lowercase()) {
            errors.push(ValidationError::new(ItemKind::Tag, &item, "Duplicate tag name"));
        }

        for (field, value) in [("Background", &tag.bg_color), ("Foreground", &tag.fg_color)] {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(
                    ItemKind::Tag,
                    &item,
                    format!("{field} color is required"),
                ));
            } else if !is_hex_color(value) {
                errors.push(ValidationError::new(
                    ItemKind::Tag,
                    &item,
                    format!("{field} color must use #RRGGBB format (got {value})"),
                ));
            }
        }
    }
}

fn validate_statuses(statuses: &[StatusConfig], errors: &mut Vec<ValidationError>) {
    if statuses.is_empty() {
        return;
    }

    let mut seen = HashSet::new();
    for (i, status) in statuses.iter().enumerate() {
        let item = label(&status.name, i);

        if status.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                "Status name is required",
            ));
        } else if !seen.insert(status.name.trim().to_lowercase()) {
            errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                "Duplicate status name",
            ));
        }

        if status.color.trim().is_empty() {
            errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                "Status color is required",
            ));
        } else if !is_hex_color(&status.color) {
            errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                format!("Status color must use #RRGGBB format (got {})", status.color),
            ));
        }

        match &status.order {
            None => errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                "Status order is required",
            )),
            Some(IntField::Other(_)) => errors.push(ValidationError::new(
                ItemKind::Status,
                &item,
                format!(
                    "Status order must be a positive integer (got {})",
                    status.order.as_ref().map(IntField::describe).unwrap_or_default()
                ),
            )),
            Some(IntField::Int(_)) => {}
        }
    }

    // The set check needs every order; unusable ones were reported above
    let Some(mut orders) = statuses
        .iter()
        .map(|s| s.order.as_ref().and_then(IntField::as_int))
        .collect::<Option<Vec<i64>>>()
    else {
        return;
    };
    orders.sort_unstable();
    let contiguous = orders
        .iter()
        .enumerate()
        .all(|(i, &order)| order == i as i64 + 1);

    if !contiguous {
        errors.push(ValidationError::new(
            ItemKind::Status,
            "order",
            format!(
                "Status orders must be exactly 1..{} with no gaps or duplicates (got {:?})",
                statuses.len(),
                orders
            ),
        ));
    }
}

fn validate_tasks(tasks: &[TaskConfig], errors: &mut Vec<ValidationError>) {
    // (task, path) in document order
    let mut stack: Vec<(&TaskConfig, String)> = tasks
        .iter()
        .enumerate()
        .rev()
        .map(|(i, t)| (t, label(&t.name, i)))
        .collect();

    while let Some((task, path)) = stack.pop() {
        validate_task(task, &path, errors);

        for (i, sub) in task.subtasks.iter().enumerate().rev() {
            stack.push((sub, format!("{} > {}", path, label(&sub.name, i))));
        }
    }
}

fn validate_task(task: &TaskConfig, path: &str, errors: &mut Vec<ValidationError>) {
    if task.name.trim().is_empty() {
        errors.push(ValidationError::new(ItemKind::Task, path, "Task name is required"));
    }

    match &task.priority {
        None => errors.push(ValidationError::new(
            ItemKind::Task,
            path,
            "Task priority is required",
        )),
        Some(IntField::Int(p)) if !(1..=4).contains(p) => errors.push(ValidationError::new(
            ItemKind::Task,
            path,
            format!("Task priority must be between 1 and 4 (got {p})"),
        )),
        Some(other @ IntField::Other(_)) => errors.push(ValidationError::new(
            ItemKind::Task,
            path,
            format!(
                "Task priority must be an integer between 1 and 4 (got {})",
                other.describe()
            ),
        )),
        Some(IntField::Int(_)) => {}
    }

    if let Some(due) = task.due_date.as_deref() {
        if NaiveDate::parse_from_str(due.trim(), "%Y-%m-%d").is_err() {
            errors.push(ValidationError::new(
                ItemKind::Task,
                path,
                format!("Due date must use YYYY-MM-DD format (got {due})"),
            ));
        }
    }

    if task.tags.iter().any(|t| t.trim().is_empty()) {
        errors.push(ValidationError::new(
            ItemKind::Task,
            path,
            "Task tags must not be empty",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, order: i64) -> StatusConfig {
        StatusConfig {
            name: name.to_string(),
            color: "#d3d3d3".to_string(),
            order: Some(IntField::Int(order)),
        }
    }

    fn with_statuses(statuses: Vec<StatusConfig>) -> BulkConfig {
        BulkConfig {
            statuses: Some(statuses),
            ..Default::default()
        }
    }

    fn with_tasks(tasks: Vec<TaskConfig>) -> BulkConfig {
        BulkConfig {
            tasks: Some(tasks),
            ..Default::default()
        }
    }

    #[test]
    fn empty_document_is_valid() {
        assert!(validate(&BulkConfig::default()).is_empty());
    }

    #[test]
    fn accepts_any_permutation_of_contiguous_orders() {
        for orders in [[1, 2, 3], [3, 1, 2], [2, 3, 1], [3, 2, 1]] {
            let config = with_statuses(vec![
                status("a", orders[0]),
                status("b", orders[1]),
                status("c", orders[2]),
            ]);
            assert!(validate(&config).is_empty(), "orders {orders:?}");
        }
    }

    #[test]
    fn rejects_gap_in_orders_once() {
        let config = with_statuses(vec![status("a", 1), status("b", 2), status("c", 4)]);
        let errors = validate(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ItemKind::Status);
        assert_eq!(errors[0].item, "order");
    }

    #[test]
    fn rejects_duplicate_orders() {
        let config = with_statuses(vec![status("a", 1), status("b", 1)]);
        assert_eq!(validate(&config).len(), 1);
    }

    #[test]
    fn rejects_orders_not_starting_at_one() {
        let config = with_statuses(vec![status("a", 0), status("b", 1)]);
        assert_eq!(validate(&config).len(), 1);
    }

    #[test]
    fn status_names_are_unique_ignoring_case() {
        let config = with_statuses(vec![status("Backlog", 1), status("backlog", 2)]);
        let errors = validate(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Duplicate status name");
    }

    #[test]
    fn status_requires_name_and_color() {
        let config = with_statuses(vec![StatusConfig {
            name: String::new(),
            color: String::new(),
            order: Some(IntField::Int(1)),
        }]);
        let errors = validate(&config);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].item, "#1");
    }

    #[test]
    fn tags_need_name_and_hex_colors() {
        let config = BulkConfig {
            tags: Some(vec![
                TagConfig {
                    name: "ok".to_string(),
                    bg_color: "#FF9900".to_string(),
                    fg_color: "#FFFFFF".to_string(),
                },
                TagConfig {
                    name: String::new(),
                    bg_color: "orange".to_string(),
                    fg_color: String::new(),
                },
            ]),
            ..Default::default()
        };

        let errors = validate(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.kind == ItemKind::Tag && e.item == "#2"));
    }

    #[test]
    fn priority_must_be_present_and_in_range() {
        for p in 1..=4 {
            assert!(validate(&with_tasks(vec![TaskConfig::new("t", p)])).is_empty());
        }

        let too_high = validate(&with_tasks(vec![TaskConfig::new("t", 5)]));
        assert_eq!(too_high.len(), 1);
        assert!(too_high[0].message.contains("between 1 and 4"));

        let missing = validate(&with_tasks(vec![TaskConfig {
            name: "t".to_string(),
            ..Default::default()
        }]));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].message, "Task priority is required");
    }

    #[test]
    fn nested_violations_are_all_collected() {
        let root = TaskConfig::new("Root", 2)
            .with_subtask(TaskConfig::new("Bad child", 9))
            .with_subtask(TaskConfig::new("Good child", 3))
            .with_subtask(TaskConfig::new("", 1).with_subtask(TaskConfig::new("Deep", 0)));

        let errors = validate(&with_tasks(vec![root, TaskConfig::new("Sibling", 7)]));
        let items: Vec<_> = errors.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(
            items,
            vec!["Root > Bad child", "Root > #3", "Root > #3 > Deep", "Sibling"]
        );
    }

    #[test]
    fn non_integer_priority_is_reported_with_its_siblings() {
        let yaml = "tasks:\n  - name: A\n    priority: high\n  - name: ''\n    priority: 2\n  - name: C\n    priority: \"3\"\n";
        let config = BulkConfig::from_yaml(yaml).unwrap();

        let errors = validate(&config);
        let found: Vec<_> = errors
            .iter()
            .map(|e| (e.item.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(found.len(), 3);
        assert_eq!(
            found[..2],
            [
                ("A", "Task priority must be an integer between 1 and 4 (got high)"),
                ("#2", "Task name is required"),
            ]
        );
        // A quoted number is a string, not a priority
        assert_eq!(found[2].0, "C");
        assert!(found[2].1.starts_with("Task priority must be an integer"));
    }

    #[test]
    fn unusable_status_orders_are_reported_per_status() {
        let yaml = "statuses:\n  - name: a\n    color: \"#d3d3d3\"\n    order: first\n  - name: b\n    color: \"#d3d3d3\"\n";
        let config = BulkConfig::from_yaml(yaml).unwrap();

        let errors = validate(&config);
        let found: Vec<_> = errors
            .iter()
            .map(|e| (e.item.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("a", "Status order must be a positive integer (got first)"),
                ("b", "Status order is required"),
            ]
        );
    }

    #[test]
    fn due_date_must_be_iso() {
        let mut task = TaskConfig::new("t", 1);
        task.due_date = Some("2024-02-15".to_string());
        assert!(validate(&with_tasks(vec![task.clone()])).is_empty());

        task.due_date = Some("15/02/2024".to_string());
        assert_eq!(validate(&with_tasks(vec![task])).len(), 1);
    }

    #[test]
    fn display_names_kind_and_item() {
        let error = ValidationError::new(ItemKind::Task, "Root", "Task priority is required");
        assert_eq!(error.to_string(), "task \"Root\": Task priority is required");
    }
}
