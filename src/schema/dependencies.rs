use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use std::collections::{HashMap, HashSet};

/// Orders tables by their foreign key dependencies
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let deps = ALL_TABLES
            .iter()
            .map(|table| (table.name, table.dependencies()))
            .collect();

        Self { deps }
    }

    /// Tables in creation order (parents before children)
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        // Registry order keeps the sort deterministic
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table in ALL_TABLES {
            if !visited.contains(table.name) {
                self.visit(table.name, &mut visited, &mut temp_visited, &mut result)?;
            }
        }

        Ok(result)
    }

    /// Tables in deletion order (children before parents)
    pub fn deletion_order(&self) -> Result<Vec<&'static TableSchema>, String> {
        let mut tables = self.creation_order()?;
        tables.reverse();
        Ok(tables)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut deps: Vec<_> = deps.iter().copied().collect();
            deps.sort_unstable();
            for dep in deps {
                if dep != name {
                    self.visit(dep, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        match get_table(name) {
            Some(table) => result.push(table),
            None => return Err(format!("Unknown table: {}", name)),
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
