use crate::dynamodb::Item;

use std::{collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// A condition expression together with its placeholder mappings.
///
/// ```rust
/// use lambda_commons::dynamodb::condition::ConditionExpression;
///
/// let condition = ConditionExpression::attribute_not_exists(&["user_id"]);
/// assert_eq!(condition.expression, "attribute_not_exists(#0)");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConditionExpression {
    /// The condition expression string.
    pub expression: String,
    /// Placeholder to attribute name mapping.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Placeholder to attribute value mapping.
    pub expression_attribute_values: Item,
}

impl ConditionExpression {
    /// Require every one of `names` to be absent from the stored item.
    ///
    /// This is what makes a put fail when the item already exists.
    pub fn attribute_not_exists(names: &[&str]) -> Self {
        let conditions = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let placeholder = format!("#{index}");
                Self {
                    expression: format!("attribute_not_exists({placeholder})"),
                    expression_attribute_names: collections::HashMap::from([(
                        placeholder,
                        name.to_string(),
                    )]),
                    ..Default::default()
                }
            })
            .collect();
        Self::merge(LogicalOperator::And, conditions)
    }

    /// Combine several conditions with `operator`.
    pub fn merge(operator: LogicalOperator, items: Vec<Self>) -> Self {
        let mut condition = Self::default();
        for item in items {
            condition
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            condition
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            condition.expression = if condition.expression.is_empty() {
                item.expression
            } else if item.expression.is_empty() {
                condition.expression
            } else {
                format!("{}{}{}", condition.expression, &*operator, item.expression)
            };
        }
        condition
    }

    /// Split into the optional parts expected by the SDK builders.
    ///
    /// DynamoDB rejects empty expressions and empty maps, so each empty part
    /// becomes `None`.
    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<String>,
        Option<collections::HashMap<String, String>>,
        Option<Item>,
    ) {
        let expression = Some(self.expression).filter(|expression| !expression.is_empty());
        let names = Some(self.expression_attribute_names).filter(|names| !names.is_empty());
        let values = Some(self.expression_attribute_values).filter(|values| !values.is_empty());
        (expression, names, values)
    }
}
