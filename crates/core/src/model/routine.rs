/// Sequence generator. Extracted for PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub start: Option<i64>,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cache: Option<i64>,
    pub cycle: bool,
    pub owner: Option<String>,
}

impl Sequence {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            increment: None,
            min_value: None,
            max_value: None,
            cache: None,
            cycle: false,
            owner: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSecurity {
    Definer,
    Invoker,
}

/// Stored function. Two overloads differ by argument signature, so the
/// metadata keys functions by `name(argument_signature)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub schema: String,
    pub return_type: String,
    pub language: String,
    pub body: String,
    pub argument_signature: String,
    pub volatility: Option<Volatility>,
    pub strict: bool,
    pub security: Option<FunctionSecurity>,
}

impl Function {
    /// The key under which the metadata stores this function.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}({})", self.name, self.argument_signature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::InsteadOf => "INSTEAD OF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerLevel {
    Row,
    Statement,
}

/// Trigger. Extracted for PostgreSQL and SQL Server.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub table: String,
    pub timing: TriggerTiming,
    /// Possibly composite (`INSERT OR UPDATE`).
    pub events: Vec<TriggerEvent>,
    pub level: TriggerLevel,
    pub function_name: Option<String>,
    pub when_clause: Option<String>,
}
