//! Default-value normalisation.
//!
//! Catalogs report default expressions in engine-specific wrappings: SQL
//! Server parenthesises everything (sometimes several layers deep),
//! PostgreSQL attaches `::type` casts to literals, and most engines quote
//! string literals. Normalisation peels the wrapping so that two schemas
//! carrying the same default compare equal. Applying the normaliser twice is
//! identical to applying it once.

use crate::DialectKind;

/// Normalises a raw catalog default expression. Returns `None` for an empty
/// or all-whitespace value.
#[must_use]
pub fn normalize_default(dialect: DialectKind, raw: &str) -> Option<String> {
    let mut value = raw.trim().to_string();
    if value.is_empty() {
        return None;
    }

    if dialect == DialectKind::Mssql {
        value = strip_wrapping_parens(&value);
    }

    value = strip_wrapping_quotes(&value);

    if dialect == DialectKind::Postgres {
        value = strip_postgres_casts(&value);
    }

    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// SQL Server wraps defaults as `((42))` or `('active')`. Strips one pair of
/// outer parentheses at a time while both ends are parenthesised.
fn strip_wrapping_parens(value: &str) -> String {
    let mut current = value;
    while current.len() >= 2 && current.starts_with('(') && current.ends_with(')') {
        current = current[1..current.len() - 1].trim();
    }
    current.to_string()
}

fn strip_wrapping_quotes(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// Removes `::typename` casts attached to literal defaults and inside
/// `nextval` references: `'active'::character varying` becomes `active`,
/// `nextval('users_id_seq'::regclass)` becomes `nextval('users_id_seq')`.
fn strip_postgres_casts(value: &str) -> String {
    if let Some(rest) = value.strip_prefix("nextval(")
        && let Some(inner) = rest.strip_suffix(')')
    {
        let argument = match inner.find("::") {
            Some(cast) => &inner[..cast],
            None => inner,
        };
        return format!("nextval({})", argument.trim());
    }

    if value.starts_with('\'') {
        // A quoted literal with a trailing cast: take the literal's inner
        // text, honouring '' escapes.
        if let Some((inner, rest)) = split_quoted_literal(value)
            && rest.trim_start().starts_with("::")
        {
            return inner;
        }
        return value.to_string();
    }

    // Unquoted literal with a cast, e.g. `0::smallint`.
    if let Some(cast) = value.find("::")
        && value[cast + 2..]
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == ' ' || ch == '_' || ch == '(' || ch == ')')
    {
        return value[..cast].to_string();
    }

    value.to_string()
}

/// Splits `'literal' rest` into the unescaped inner text and the remainder.
fn split_quoted_literal(value: &str) -> Option<(String, &str)> {
    let bytes = value.as_bytes();
    if bytes.first() != Some(&b'\'') {
        return None;
    }

    let mut inner = String::new();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                inner.push('\'');
                i += 2;
                continue;
            }
            return Some((inner, &value[i + 1..]));
        }
        let ch = value[i..].chars().next()?;
        inner.push(ch);
        i += ch.len_utf8();
    }
    None
}
