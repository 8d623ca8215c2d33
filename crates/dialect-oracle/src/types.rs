/// Assembles the displayed datatype, preserving Oracle's uppercase spelling.
///
/// NUMBER is rendered in three forms: bare when the dictionary reports no
/// precision, `NUMBER(p)` when only a precision is set, and `NUMBER(p,s)`
/// when the scale is positive.
pub(crate) fn assemble_datatype(
    data_type: &str,
    precision: Option<i64>,
    scale: Option<i64>,
    char_length: Option<i64>,
) -> String {
    let base = data_type.trim().to_uppercase();

    match base.as_str() {
        "NUMBER" => match (precision, scale) {
            (Some(precision), Some(scale)) if scale > 0 => {
                format!("NUMBER({precision},{scale})")
            }
            (Some(precision), _) => format!("NUMBER({precision})"),
            (None, _) => base,
        },
        "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" | "RAW" => match char_length {
            Some(length) if length > 0 => format!("{base}({length})"),
            _ => base,
        },
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_stays_bare() {
        assert_eq!(assemble_datatype("NUMBER", None, None, None), "NUMBER");
    }

    #[test]
    fn number_with_precision_only() {
        assert_eq!(
            assemble_datatype("NUMBER", Some(10), Some(0), None),
            "NUMBER(10)"
        );
        assert_eq!(assemble_datatype("NUMBER", Some(10), None, None), "NUMBER(10)");
    }

    #[test]
    fn number_with_positive_scale() {
        assert_eq!(
            assemble_datatype("NUMBER", Some(10), Some(2), None),
            "NUMBER(10,2)"
        );
    }

    #[test]
    fn character_types_use_char_length() {
        assert_eq!(
            assemble_datatype("VARCHAR2", None, None, Some(255)),
            "VARCHAR2(255)"
        );
    }

    #[test]
    fn other_types_pass_through_uppercased() {
        assert_eq!(assemble_datatype("DATE", None, None, None), "DATE");
        assert_eq!(
            assemble_datatype("TIMESTAMP(6)", None, None, None),
            "TIMESTAMP(6)"
        );
    }
}
