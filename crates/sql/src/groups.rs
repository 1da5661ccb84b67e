use dbcheck_core::Condition;

/// Conditions grouped by column, keeping the order in which columns and
/// conditions were first declared.
#[derive(Debug, Clone, Default)]
pub struct ColumnGroups {
    groups: Vec<(String, Vec<Condition>)>,
}

impl ColumnGroups {
    pub fn push(&mut self, condition: Condition) {
        match self
            .groups
            .iter_mut()
            .find(|(col, _)| col == condition.column())
        {
            Some((_, conditions)) => conditions.push(condition),
            None => self
                .groups
                .push((condition.column().to_string(), vec![condition])),
        }
    }

    pub fn get(&self, column: &str) -> Option<&[Condition]> {
        self.groups
            .iter()
            .find(|(col, _)| col == column)
            .map(|(_, conditions)| conditions.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(col, _)| col.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Condition])> {
        self.groups
            .iter()
            .map(|(col, conditions)| (col.as_str(), conditions.as_slice()))
    }

    /// All conditions, column group by column group.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|(_, conditions)| conditions.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct columns.
    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

impl FromIterator<Condition> for ColumnGroups {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut groups = ColumnGroups::default();
        for condition in iter {
            groups.push(condition);
        }
        groups
    }
}
