//! The planner's output.

use crate::Change;

/// One executable DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The statement to run.
    pub forward: String,
    /// A statement that, run right after `forward`, restores the prior
    /// structure. Absent when no exact inverse exists.
    pub reverse: Option<String>,
    /// Human-readable description, e.g. `create "user" table`.
    pub comment: String,
    /// The change this statement realizes. Batched table alterations carry a
    /// synthesized `ModifyTable` holding only the sub-changes of their batch.
    pub source: Change,
}

impl Statement {
    pub fn is_reversible(&self) -> bool {
        self.reverse.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// An ordered list of statements realizing a change set.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub name: String,
    /// Always false: DDL causes implicit commits, so the plan must not be
    /// wrapped in one transaction.
    pub transactional: bool,
    /// Whether every statement has a reverse.
    pub reversible: bool,
    pub statements: Vec<Statement>,
}

impl Plan {
    pub(crate) fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        let reversible = statements.iter().all(Statement::is_reversible);
        Self {
            name: name.into(),
            transactional: false,
            reversible,
            statements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render the migration script: each statement preceded by its comment.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for stmt in &self.statements {
            sql.push_str(&format!("-- {}\n", capitalize(&stmt.comment)));
            sql.push_str(&stmt.forward);
            sql.push_str(";\n");
        }
        sql
    }

    /// Render the rollback script, or `None` if the plan is not reversible.
    ///
    /// Reverses run in the opposite order of their statements.
    pub fn reverse_sql(&self) -> Option<String> {
        if !self.reversible {
            return None;
        }
        let mut sql = String::new();
        for stmt in self.statements.iter().rev() {
            let reverse = stmt.reverse.as_deref()?;
            sql.push_str(&format!("-- reverse: {}\n", stmt.comment));
            sql.push_str(reverse);
            sql.push_str(";\n");
        }
        Some(sql)
    }

    /// A stable digest of the forward script.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.to_sql().as_bytes()).to_hex().to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
